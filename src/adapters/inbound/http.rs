// HTTP inbound adapter.
//
// Responsibilities
// - Parse requests into commands and queries, generating ids for new rows.
// - Map the application error taxonomy onto status codes.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::core::control::decider::add_manual_time::command::AddManualTime;
use crate::core::control::decider::create_control::command::CreateControl;
use crate::core::control::state::{EntityKind, EntityRef};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct CreateControlBody {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub user_id: Option<String>,
    pub requested_by: String,
}

#[derive(Deserialize)]
pub struct ListControlsParams {
    pub user_id: String,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub sort_desc: Option<bool>,
}

#[derive(Deserialize)]
pub struct AddManualTimeBody {
    pub user_id: String,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub description: String,
    pub created_by: String,
}

pub fn status_of(error: &ApplicationError) -> StatusCode {
    match error {
        ApplicationError::NotFound(_) | ApplicationError::NotFoundOrForbidden(_) => {
            StatusCode::NOT_FOUND
        }
        ApplicationError::Permission(_) => StatusCode::FORBIDDEN,
        ApplicationError::InvalidState(_) | ApplicationError::Conflict { .. } => {
            StatusCode::CONFLICT
        }
        ApplicationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationError::Entity(_) | ApplicationError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: ApplicationError) -> Response {
    let status = status_of(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    }
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, ApplicationError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub async fn create_control(
    State(state): State<AppState>,
    body: Result<Json<CreateControlBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    let command = CreateControl {
        control_id: Uuid::now_v7(),
        entity: EntityRef::new(body.entity_kind, body.entity_id),
        user_id: body.user_id,
        requested_by: body.requested_by,
    };
    respond(
        StatusCode::CREATED,
        state.commands.create_control(command).await,
    )
}

pub async fn list_controls(
    State(state): State<AppState>,
    Query(params): Query<ListControlsParams>,
) -> Response {
    let result = state
        .queries
        .list_by_user_id(
            &params.user_id,
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(20),
            params.sort_desc.unwrap_or(true),
        )
        .await;
    respond(StatusCode::OK, result)
}

pub async fn list_entity_controls(
    State(state): State<AppState>,
    Path((kind, id)): Path<(EntityKind, String)>,
) -> Response {
    let entity = EntityRef::new(kind, id);
    respond(StatusCode::OK, state.queries.list_by_entity(&entity).await)
}

pub async fn get_control(State(state): State<AppState>, Path(control_id): Path<Uuid>) -> Response {
    respond(StatusCode::OK, state.queries.get(control_id).await)
}

pub async fn start_timer(State(state): State<AppState>, Path(control_id): Path<Uuid>) -> Response {
    respond(StatusCode::OK, state.commands.start_timer(control_id).await)
}

pub async fn pause_timer(State(state): State<AppState>, Path(control_id): Path<Uuid>) -> Response {
    respond(StatusCode::OK, state.commands.pause_timer(control_id).await)
}

pub async fn complete(State(state): State<AppState>, Path(control_id): Path<Uuid>) -> Response {
    respond(StatusCode::OK, state.commands.complete(control_id).await)
}

pub async fn reactivate(State(state): State<AppState>, Path(control_id): Path<Uuid>) -> Response {
    respond(StatusCode::OK, state.commands.reactivate(control_id).await)
}

pub async fn add_manual_time(
    State(state): State<AppState>,
    Path(control_id): Path<Uuid>,
    body: Result<Json<AddManualTimeBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    let command = AddManualTime {
        entry_id: Uuid::now_v7(),
        user_id: body.user_id,
        date: body.date,
        duration_minutes: body.duration_minutes,
        description: body.description,
        created_by: body.created_by,
    };
    respond(
        StatusCode::CREATED,
        state.commands.add_manual_time(control_id, command).await,
    )
}

pub async fn delete_time_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Response {
    respond(StatusCode::OK, state.commands.delete_time_entry(entry_id).await)
}

pub async fn delete_manual_time(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Response {
    respond(StatusCode::OK, state.commands.delete_manual_time(entry_id).await)
}
