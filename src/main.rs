//! Snapby - Coastal Hazard Monitoring Dashboard
//!
//! Serves synthetic ocean telemetry, a static station catalog, session
//! hazard reports and a demo alert assistant.

mod capture;
mod chat;
mod config;
mod feed;
mod scheduler;
mod store;
mod web;

use capture::ImageResolver;
use chat::ChatService;
use config::ServerConfig;
use feed::{SeriesSource, SyntheticSeries};
use scheduler::Scheduler;
use store::UploadRegistry;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("snapby=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Snapby on port {}...", cfg.http_port);
    tracing::info!(
        "Panels refresh every {}s, labels at UTC{:+} minutes",
        cfg.refresh_interval.as_secs(),
        cfg.display_offset_minutes
    );
    match cfg.max_reports {
        Some(max) => tracing::info!("Keeping at most {} session reports", max),
        None => tracing::info!("Session reports are unbounded"),
    }

    let registry = Arc::new(UploadRegistry::new(cfg.max_reports));
    let source: Arc<dyn SeriesSource> = Arc::new(SyntheticSeries::with_offset_minutes(cfg.display_offset_minutes));
    let scheduler = Arc::new(
        Scheduler::new(source, cfg.refresh_interval).with_limits(cfg.panel_idle_timeout, cfg.max_panels),
    );
    let chat = Arc::new(ChatService::new(cfg.reply_delay_ms.clone()).with_max_conversations(cfg.max_conversations));
    let images = ImageResolver::new(cfg.image_timeout);

    // Start web server
    let server = Server::new(cfg, registry, scheduler.clone(), chat, images);
    server.start(shutdown_signal()).await?;

    // Stop any panel loops left by clients that never unmounted
    scheduler.shutdown().await;
    tracing::info!("Snapby stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
