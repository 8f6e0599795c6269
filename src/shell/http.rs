use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::adapters::inbound::http;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/controls", post(http::create_control).get(http::list_controls))
        .route("/controls/{id}", get(http::get_control))
        .route("/controls/{id}/start", post(http::start_timer))
        .route("/controls/{id}/pause", post(http::pause_timer))
        .route("/controls/{id}/complete", post(http::complete))
        .route("/controls/{id}/reactivate", post(http::reactivate))
        .route("/controls/{id}/manual-entries", post(http::add_manual_time))
        .route("/entities/{kind}/{id}/controls", get(http::list_entity_controls))
        .route("/time-entries/{id}", delete(http::delete_time_entry))
        .route("/manual-entries/{id}", delete(http::delete_manual_time))
        .with_state(state)
}
