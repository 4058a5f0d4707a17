//! Campus bot - stateful conversation router for a student chat bot
//!
//! Platform adapters forward every message over HTTP; the router walks the
//! user's persisted session through registration, schedules, lecture links,
//! computational queries, graphs and user-taught answers.

mod api;
mod config;
mod db;
mod moderation;
mod runtime;
mod services;
mod shutdown;
mod state_machine;

use api::{create_router, AppState};
use config::BotConfig;
use db::Database;
use runtime::Router;
use services::{
    CsvLinks, CsvSchedule, FileKeyboards, GraphService, QueryService, Services, TextFilter,
    UnavailableService, WolframAlpha, WordListFilter,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up a local .env before reading any configuration
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;
    tracing::info!(
        platform = %config.platform,
        admins = config.admins.len(),
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path, config.platform)?;

    // A restart abandons every flow in progress
    let reset = db.reset_all_sessions()?;
    tracing::info!(sessions = reset, "Sessions reset to idle");

    let content = config::load_content(&config.content_path())?;
    if !content.is_empty() {
        let seeded = db.seed_content(&content)?;
        tracing::info!(entries = seeded, "Built-in answers loaded");
    }

    let services = build_services(&config).with_logging();
    let router = Router::new(db, services, config.admins.clone(), config.other_materials.clone());
    let state = AppState::new(router);
    let app = create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Campus bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    let reset = state.router.reset_all().await?;
    tracing::info!(sessions = reset, "Server stopped, sessions reset to idle");

    Ok(())
}

/// Wire collaborators from configuration. Anything missing degrades to an
/// adapter that fails every call, so the affected flows answer with their
/// failure message.
fn build_services(config: &BotConfig) -> Services {
    let (query, graph): (Arc<dyn QueryService>, Arc<dyn GraphService>) = match &config.wolfram_app_id {
        Some(app_id) => match WolframAlpha::new(app_id.clone(), config.graphs_dir()) {
            Ok(wolfram) => {
                let wolfram = Arc::new(wolfram);
                let query: Arc<dyn QueryService> = wolfram.clone();
                let graph: Arc<dyn GraphService> = wolfram;
                (query, graph)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wolfram client unavailable");
                unavailable_compute()
            }
        },
        None => {
            tracing::warn!("WOLFRAM_APP_ID not set; queries and graphs are disabled");
            unavailable_compute()
        }
    };

    let filter: Arc<dyn TextFilter> = match WordListFilter::load(&config.filter_path()) {
        Ok(filter) => Arc::new(filter),
        Err(e) => {
            tracing::warn!(error = %e, path = %config.filter_path().display(), "Word filter unavailable; teaching is disabled");
            Arc::new(UnavailableService::new("filter"))
        }
    };

    Services {
        links: Arc::new(CsvLinks::new(config.links_dir())),
        schedule: Arc::new(CsvSchedule::new(config.schedule_dir())),
        query,
        graph,
        filter,
        keyboards: Arc::new(FileKeyboards::load(&config.keyboards_dir(), config.platform)),
    }
}

fn unavailable_compute() -> (Arc<dyn QueryService>, Arc<dyn GraphService>) {
    let service = Arc::new(UnavailableService::new("wolfram"));
    let query: Arc<dyn QueryService> = service.clone();
    let graph: Arc<dyn GraphService> = service;
    (query, graph)
}
