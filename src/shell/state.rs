use crate::adapters::in_memory::in_memory_control_store::InMemoryControlStore;
use crate::adapters::in_memory::in_memory_tracked_entities::InMemoryTrackedEntities;
use crate::application::command_handlers::control_handler::ControlCommandHandler;
use crate::application::query_handlers::control_queries::ControlQueryHandler;
use crate::core::control::status::StatusCatalog;
use crate::core::ports::Clock;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<ControlCommandHandler<InMemoryControlStore, InMemoryTrackedEntities>>,
    pub queries: Arc<ControlQueryHandler<InMemoryControlStore>>,
    pub live_total_period: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<InMemoryControlStore>,
        entities: Arc<InMemoryTrackedEntities>,
        catalog: StatusCatalog,
        clock: Arc<dyn Clock>,
        live_total_period: Duration,
    ) -> Self {
        let commands = ControlCommandHandler::new(store.clone(), entities, clock.clone());
        let queries = ControlQueryHandler::new(store, Arc::new(catalog), clock);
        Self {
            commands: Arc::new(commands),
            queries: Arc::new(queries),
            live_total_period,
        }
    }
}
