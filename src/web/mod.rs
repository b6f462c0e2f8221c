//! Web server module.

mod handlers;

pub use handlers::*;

use crate::capture::ImageResolver;
use crate::chat::ChatService;
use crate::config::ServerConfig;
use crate::scheduler::Scheduler;
use crate::store::UploadRegistry;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub registry: Arc<UploadRegistry>,
    pub scheduler: Arc<Scheduler>,
    pub chat: Arc<ChatService>,
    pub images: ImageResolver,
}

/// Web server for Snapby.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(
        config: ServerConfig,
        registry: Arc<UploadRegistry>,
        scheduler: Arc<Scheduler>,
        chat: Arc<ChatService>,
        images: ImageResolver,
    ) -> Self {
        Self {
            state: AppState {
                config,
                registry,
                scheduler,
                chat,
                images,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        Router::new()
            // Dashboard
            .route("/", get(handlers::handle_dashboard))
            // Stations
            .route("/api/stations", get(handlers::handle_get_stations))
            .route("/api/stations/stats", get(handlers::handle_station_stats))
            .route("/api/stations/{id}", get(handlers::handle_get_station))
            // Panels
            .route("/api/panels", post(handlers::handle_mount_panel))
            .route("/api/panels/{id}", delete(handlers::handle_unmount_panel))
            .route("/api/panels/{id}/series", get(handlers::handle_get_series))
            .route("/api/panels/{id}/current", get(handlers::handle_get_current))
            // Reports
            .route("/api/reports", get(handlers::handle_get_reports))
            .route("/api/reports", post(handlers::handle_create_report))
            .route("/api/reports/stream", get(handlers::handle_report_stream))
            .route("/api/reports/{id}", get(handlers::handle_get_report))
            .route("/api/image", get(handlers::handle_check_image))
            // Assistant
            .route("/api/chat/{conversation}", get(handlers::handle_get_chat))
            .route("/api/chat/{conversation}", post(handlers::handle_post_chat))
            // Static assets
            .route("/static/{*path}", get(handlers::handle_static))
            .route("/favicon.ico", get(handlers::handle_favicon))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_bytes))
            .with_state(self.state.clone())
    }

    /// Serve on the configured port until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
