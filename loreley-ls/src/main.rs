//! loreley-ls - Synchronized Lyrics Service
//!
//! Resolves, scores and synchronizes time-coded lyrics for audio tracks:
//! concurrent provider search with streaming auto-promotion, LRC parsing,
//! per-track selection persistence, and an HTTP + SSE surface for clients.

use anyhow::Result;
use loreley_common::config;
use loreley_common::events::EventBus;
use loreley_ls::db::LyricsStore;
use loreley_ls::providers::{LrclibProvider, LyricsProvider, NeteaseProvider, QqMusicProvider};
use loreley_ls::services::{
    Aggregator, MusicBrainzRegistry, QueryResolver, SelectionController,
};
use loreley_ls::{build_router, AppState};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_PORT: u16 = 5733;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting loreley-ls (Synchronized Lyrics Service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml_config = config::load_toml_config(None)?;
    let data_folder = config::resolve_data_folder(std::env::args().nth(1).as_deref(), &toml_config);
    let db_path = data_folder.join("loreley.db");
    info!("Database: {}", db_path.display());

    let db_pool = loreley_common::db::init_database_pool(&db_path).await?;
    loreley_ls::db::init_tables(&db_pool).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    let registry = Arc::new(MusicBrainzRegistry::with_base_url(
        toml_config
            .recording_registry_url
            .clone()
            .unwrap_or_else(|| "https://musicbrainz.org/ws/2".to_string()),
    )?);
    let resolver = QueryResolver::new(registry);

    let providers: Vec<Arc<dyn LyricsProvider>> = vec![
        Arc::new(NeteaseProvider::new(toml_config.providers.netease_url.clone())?),
        Arc::new(QqMusicProvider::new(toml_config.providers.qq_url.clone())?),
        Arc::new(LrclibProvider::new(toml_config.providers.lrclib_url.clone())?),
    ];
    let provider_count = providers.len();
    info!(providers = provider_count, "Lyrics providers registered");

    let aggregator = Aggregator::new(resolver, providers);
    let store = LyricsStore::new(db_pool);
    let controller = Arc::new(SelectionController::new(
        store,
        aggregator,
        event_bus.clone(),
    ));

    let state = AppState::new(controller, event_bus, provider_count);
    let app = build_router(state);

    let port = toml_config.port.unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
