// Application state wired with in-memory adapters.

use crate::adapters::clock::SystemClock;
use crate::adapters::in_memory::in_memory_control_store::InMemoryControlStore;
use crate::adapters::in_memory::in_memory_status_vocabulary::InMemoryStatusVocabulary;
use crate::adapters::in_memory::in_memory_tracked_entities::InMemoryTrackedEntities;
use crate::core::control::status::{StatusCatalog, StatusNames};
use crate::core::ports::Clock;
use crate::shell::state::AppState;
use std::sync::Arc;
use std::time::Duration;

pub async fn test_state() -> AppState {
    test_state_with_clock(Arc::new(SystemClock)).await
}

pub async fn test_state_with_clock(clock: Arc<dyn Clock>) -> AppState {
    let catalog = StatusCatalog::resolve(
        &InMemoryStatusVocabulary::with_defaults(),
        &StatusNames::default(),
    )
    .await
    .expect("default vocabulary resolves");
    AppState::new(
        Arc::new(InMemoryControlStore::new()),
        Arc::new(InMemoryTrackedEntities::accepting_unknown()),
        catalog,
        clock,
        Duration::from_millis(50),
    )
}
