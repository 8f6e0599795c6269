// Composition root for the time control service.
//
// Responsibilities
// - Read settings from the environment.
// - Instantiate concrete adapters and wire them into the handlers.
// - Mount the HTTP and GraphQL surfaces on one router.

pub mod config;
pub mod graphql;
pub mod http;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shell::state::AppState;

pub fn app(state: AppState) -> Router {
    let schema = graphql::schema(state.clone());
    http::router(state)
        .merge(graphql::router(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
