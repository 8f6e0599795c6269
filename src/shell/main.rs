use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use time_control::adapters::clock::SystemClock;
use time_control::adapters::in_memory::in_memory_control_store::InMemoryControlStore;
use time_control::adapters::in_memory::in_memory_status_vocabulary::InMemoryStatusVocabulary;
use time_control::adapters::in_memory::in_memory_tracked_entities::InMemoryTrackedEntities;
use time_control::core::control::status::StatusCatalog;
use time_control::shell::config::Settings;
use time_control::shell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::from_env()?;

    // In-memory deps for now
    let vocabulary = InMemoryStatusVocabulary::with_names(&settings.status_names);
    let catalog = StatusCatalog::resolve(&vocabulary, &settings.status_names).await?;

    let state = AppState::new(
        Arc::new(InMemoryControlStore::new()),
        Arc::new(InMemoryTrackedEntities::accepting_unknown()),
        catalog,
        Arc::new(SystemClock),
        settings.live_total_period,
    );
    let app = time_control::shell::app(state);

    tracing::info!("HTTP endpoint: http://{}/controls", settings.addr);
    tracing::info!("GraphQL endpoint: http://{}/gql", settings.addr);
    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
