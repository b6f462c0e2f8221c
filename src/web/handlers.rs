//! HTTP request handlers.

use super::AppState;
use crate::capture::{escape_html, render_image, GeoError, GeoFix, Resolved};
use crate::scheduler::PanelId;
use crate::store::{find_station, station_stats, submit_report, ReportDraft, STATIONS};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{Html, IntoResponse, Json, Response},
};
use futures_core::Stream;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

// ============================================================================
// Templates
// ============================================================================

const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");

/// Reports rendered server-side on the dashboard; the rest arrive over the stream.
const DASHBOARD_REPORTS: usize = 12;

#[derive(Embed)]
#[folder = "src/web/static/"]
struct Assets;

// ============================================================================
// Dashboard
// ============================================================================

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let stations_json = serde_json::to_string(STATIONS).unwrap_or_else(|_| "[]".to_string());

    let station_rows: String = STATIONS
        .iter()
        .map(|s| {
            format!(
                r#"<tr data-station="{}"><td>{}</td><td>{}</td><td class="status-{}">{}</td><td>{}</td></tr>"#,
                s.id,
                s.id,
                escape_html(s.name),
                s.status.as_str(),
                s.status.as_str(),
                escape_html(s.last_update),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut report_cards = Vec::new();
    for report in state.registry.list().await.into_iter().take(DASHBOARD_REPORTS) {
        let image = state.images.resolve(&report.image_data).await;
        report_cards.push(format!(
            r#"<article class="report">{}<p>{}</p><small>{} &middot; {:.4}, {:.4}</small></article>"#,
            render_image(&image, &report.description),
            escape_html(&report.description),
            escape_html(&report.submitted_by),
            report.location.latitude,
            report.location.longitude,
        ));
    }

    let content = DASHBOARD_TEMPLATE
        .replace("{{stations_json}}", &stations_json)
        .replace("{{station_rows}}", &station_rows)
        .replace("{{report_cards}}", &report_cards.join("\n"))
        .replace("{{report_count}}", &state.registry.len().await.to_string())
        .replace("{{refresh_secs}}", &state.scheduler.refresh_interval().as_secs().to_string());

    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "Snapby Coastal Dashboard")
        .replace("{{content}}", &content);

    Html(page)
}

// ============================================================================
// API: Stations
// ============================================================================

pub async fn handle_get_stations() -> impl IntoResponse {
    Json(STATIONS)
}

pub async fn handle_get_station(Path(id): Path<String>) -> impl IntoResponse {
    match find_station(&id) {
        Some(station) => Json(station).into_response(),
        None => (StatusCode::NOT_FOUND, "Station not found").into_response(),
    }
}

pub async fn handle_station_stats() -> impl IntoResponse {
    Json(station_stats(STATIONS))
}

// ============================================================================
// API: Panels
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MountResponse {
    pub id: PanelId,
    pub refresh_secs: u64,
}

pub async fn handle_mount_panel(State(state): State<AppState>) -> impl IntoResponse {
    match state.scheduler.mount_panel().await {
        Ok(id) => {
            let body = MountResponse {
                id,
                refresh_secs: state.scheduler.refresh_interval().as_secs(),
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

pub async fn handle_unmount_panel(
    State(state): State<AppState>,
    Path(id): Path<PanelId>,
) -> impl IntoResponse {
    if state.scheduler.unmount_panel(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn handle_get_series(
    State(state): State<AppState>,
    Path(id): Path<PanelId>,
) -> impl IntoResponse {
    match state.scheduler.series(id).await {
        Some(series) => Json(series).into_response(),
        None => (StatusCode::NOT_FOUND, "Panel not mounted").into_response(),
    }
}

pub async fn handle_get_current(
    State(state): State<AppState>,
    Path(id): Path<PanelId>,
) -> impl IntoResponse {
    match state.scheduler.snapshot(id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::NOT_FOUND, "Panel not mounted").into_response(),
    }
}

// ============================================================================
// API: Reports
// ============================================================================

pub async fn handle_get_reports(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list().await)
}

pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.registry.get(id).await {
        Some(report) => Json(report).into_response(),
        None => (StatusCode::NOT_FOUND, "Report not found").into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitReportRequest {
    #[serde(flatten)]
    pub draft: ReportDraft,
    /// Device fix, when the browser produced one
    #[serde(default)]
    pub position: Option<GeoFix>,
    #[serde(default)]
    pub geolocation_error: Option<GeoError>,
}

pub async fn handle_create_report(
    State(state): State<AppState>,
    Json(req): Json<SubmitReportRequest>,
) -> impl IntoResponse {
    let position = match req.position {
        Some(fix) => Ok(fix),
        None => Err(req.geolocation_error.unwrap_or(GeoError::Unsupported)),
    };

    match submit_report(&state.registry, req.draft, position).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Server-sent events for every report added after the client connects.
pub async fn handle_report_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.registry.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(report) => {
                    if let Ok(json) = serde_json::to_string(&report) {
                        yield Ok(Event::default().event("report").data(json));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Report stream lagged, skipped {} reports", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image: Resolved<String>,
    pub html: String,
}

pub async fn handle_check_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> impl IntoResponse {
    let image = state.images.resolve(&query.src).await;
    let html = render_image(&image, query.alt.as_deref().unwrap_or(""));
    Json(ImageResponse { image, html })
}

// ============================================================================
// API: Assistant
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

pub async fn handle_get_chat(
    State(state): State<AppState>,
    Path(conversation): Path<String>,
) -> impl IntoResponse {
    Json(state.chat.history(&conversation).await)
}

pub async fn handle_post_chat(
    State(state): State<AppState>,
    Path(conversation): Path<String>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    match state.chat.send(&conversation, &req.content).await {
        Ok(msg) => (StatusCode::ACCEPTED, Json(msg)).into_response(),
        Err(e) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_static(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=300".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#0e7490"/>
        <path d="M15 55 Q27 40 39 55 T63 55 T87 55" stroke="white" stroke-width="6" fill="none"/>
    </svg>"##;

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
