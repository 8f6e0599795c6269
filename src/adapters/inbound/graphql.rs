// GraphQL inbound adapter: queries, mutations and the live total subscription.

use async_graphql::{Context, ErrorExtensions, ID, Object, Result as GqlResult, SimpleObject, Subscription};
use chrono::{DateTime, NaiveDate, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::application::query_handlers::control_queries::{ControlDetail, ControlView};
use crate::core::control::decider::add_manual_time::command::AddManualTime;
use crate::core::control::decider::create_control::command::CreateControl;
use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use crate::core::control::state::{EntityKind, EntityRef};
use crate::shell::state::AppState;

#[derive(SimpleObject, Clone)]
pub struct GqlControl {
    pub id: ID,
    pub entity_kind: String,
    pub entity_id: String,
    pub user_id: String,
    pub status: String,
    pub status_id: String,
    pub is_timer_active: bool,
    pub timer_start_at: Option<String>,
    pub assigned_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub total_time_minutes: i64,
    pub live_total_minutes: i64,
    pub effective_total_minutes: i64,
    pub is_consistent: bool,
    pub formatted_total: String,
    pub formatted_live_total: String,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

impl From<ControlView> for GqlControl {
    fn from(v: ControlView) -> Self {
        Self {
            id: ID(v.id.to_string()),
            entity_kind: v.entity_kind.to_string(),
            entity_id: v.entity_id,
            user_id: v.user_id,
            status: v.status.to_string(),
            status_id: v.status_id.to_string(),
            is_timer_active: v.is_timer_active,
            timer_start_at: v.timer_start_at.map(rfc3339),
            assigned_at: rfc3339(v.assigned_at),
            started_at: v.started_at.map(rfc3339),
            completed_at: v.completed_at.map(rfc3339),
            total_time_minutes: v.total_time_minutes,
            live_total_minutes: v.live_total_minutes,
            effective_total_minutes: v.effective_total_minutes,
            is_consistent: v.is_consistent,
            formatted_total: v.formatted_total,
            formatted_live_total: v.formatted_live_total,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct GqlTimeEntry {
    pub id: ID,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
}

impl From<TimeEntry> for GqlTimeEntry {
    fn from(e: TimeEntry) -> Self {
        Self {
            id: ID(e.id.to_string()),
            start_time: rfc3339(e.start_time),
            end_time: e.end_time.map(rfc3339),
            duration_minutes: e.duration_minutes,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct GqlManualEntry {
    pub id: ID,
    pub date: String,
    pub duration_minutes: i64,
    pub description: String,
    pub created_by: String,
}

impl From<ManualTimeEntry> for GqlManualEntry {
    fn from(e: ManualTimeEntry) -> Self {
        Self {
            id: ID(e.id.to_string()),
            date: e.date.to_string(),
            duration_minutes: e.duration_minutes,
            description: e.description,
            created_by: e.created_by,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlControlDetail {
    pub control: GqlControl,
    pub time_entries: Vec<GqlTimeEntry>,
    pub manual_entries: Vec<GqlManualEntry>,
}

impl From<ControlDetail> for GqlControlDetail {
    fn from(d: ControlDetail) -> Self {
        Self {
            control: d.control.into(),
            time_entries: d.time_entries.into_iter().map(Into::into).collect(),
            manual_entries: d.manual_entries.into_iter().map(Into::into).collect(),
        }
    }
}

fn gql_error(error: ApplicationError) -> async_graphql::Error {
    let code = match &error {
        ApplicationError::NotFound(_) => "NOT_FOUND",
        ApplicationError::NotFoundOrForbidden(_) => "NOT_FOUND_OR_FORBIDDEN",
        ApplicationError::Permission(_) => "PERMISSION",
        ApplicationError::InvalidState(_) => "INVALID_STATE",
        ApplicationError::Conflict { .. } => "CONFLICT",
        ApplicationError::Validation(_) => "VALIDATION",
        ApplicationError::Entity(_) | ApplicationError::Store(_) => "INTERNAL",
    };
    async_graphql::Error::new(error.to_string()).extend_with(|_, e| e.set("code", code))
}

fn parse_id(id: &ID) -> GqlResult<Uuid> {
    Uuid::parse_str(id).map_err(|e| async_graphql::Error::new(format!("invalid id {}: {e}", id.as_str())))
}

async fn control_view(state: &AppState, control_id: Uuid) -> GqlResult<GqlControl> {
    let detail = state.queries.get(control_id).await.map_err(gql_error)?;
    Ok(detail.control.into())
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn control(&self, context: &Context<'_>, id: ID) -> GqlResult<GqlControlDetail> {
        let state = context.data_unchecked::<AppState>();
        let detail = state.queries.get(parse_id(&id)?).await.map_err(gql_error)?;
        Ok(detail.into())
    }

    async fn controls_by_user(
        &self,
        context: &Context<'_>,
        user_id: String,
        offset: Option<i64>,
        limit: Option<i64>,
        sort_desc: Option<bool>,
    ) -> GqlResult<Vec<GqlControl>> {
        let state = context.data_unchecked::<AppState>();
        let list = state
            .queries
            .list_by_user_id(
                &user_id,
                offset.unwrap_or(0).max(0) as u64,
                limit.unwrap_or(20).max(0) as u64,
                sort_desc.unwrap_or(true),
            )
            .await
            .map_err(gql_error)?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn controls_by_entity(
        &self,
        context: &Context<'_>,
        entity_kind: String,
        entity_id: String,
    ) -> GqlResult<Vec<GqlControl>> {
        let state = context.data_unchecked::<AppState>();
        let kind: EntityKind = entity_kind.parse().map_err(async_graphql::Error::new)?;
        let list = state
            .queries
            .list_by_entity(&EntityRef::new(kind, entity_id))
            .await
            .map_err(gql_error)?;
        Ok(list.into_iter().map(Into::into).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_control(
        &self,
        context: &Context<'_>,
        entity_kind: String,
        entity_id: String,
        user_id: Option<String>,
        requested_by: String,
    ) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let kind: EntityKind = entity_kind.parse().map_err(async_graphql::Error::new)?;
        let command = CreateControl {
            control_id: Uuid::now_v7(),
            entity: EntityRef::new(kind, entity_id),
            user_id,
            requested_by,
        };
        let record = state
            .commands
            .create_control(command)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    async fn start_timer(&self, context: &Context<'_>, control_id: ID) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .start_timer(parse_id(&control_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    async fn pause_timer(&self, context: &Context<'_>, control_id: ID) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .pause_timer(parse_id(&control_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    async fn complete(&self, context: &Context<'_>, control_id: ID) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .complete(parse_id(&control_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    async fn reactivate(&self, context: &Context<'_>, control_id: ID) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .reactivate(parse_id(&control_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    /// `date` is a calendar date such as 2024-03-01.
    async fn add_manual_time(
        &self,
        context: &Context<'_>,
        control_id: ID,
        user_id: String,
        date: String,
        duration_minutes: i64,
        description: String,
        created_by: String,
    ) -> GqlResult<ID> {
        let state = context.data_unchecked::<AppState>();
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| async_graphql::Error::new(format!("invalid date {date}: {e}")))?;
        let command = AddManualTime {
            entry_id: Uuid::now_v7(),
            user_id,
            date,
            duration_minutes,
            description,
            created_by,
        };
        let entry = state
            .commands
            .add_manual_time(parse_id(&control_id)?, command)
            .await
            .map_err(gql_error)?;
        Ok(ID(entry.id.to_string()))
    }

    async fn delete_time_entry(&self, context: &Context<'_>, entry_id: ID) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .delete_time_entry(parse_id(&entry_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }

    async fn delete_manual_time(
        &self,
        context: &Context<'_>,
        entry_id: ID,
    ) -> GqlResult<GqlControl> {
        let state = context.data_unchecked::<AppState>();
        let record = state
            .commands
            .delete_manual_time(parse_id(&entry_id)?)
            .await
            .map_err(gql_error)?;
        control_view(state, record.id).await
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Emits the live total right away, then whenever it changes. Ends once the timer stops.
    async fn live_total(
        &self,
        context: &Context<'_>,
        control_id: ID,
    ) -> async_graphql::Result<impl Stream<Item = i64>> {
        let state = context.data_unchecked::<AppState>();
        let ticker = state
            .queries
            .watch_live_total(parse_id(&control_id)?, state.live_total_period)
            .await
            .map_err(gql_error)?;
        let receiver = ticker.subscribe();
        Ok(futures::stream::unfold(
            (ticker, receiver, true),
            |(ticker, mut receiver, first)| async move {
                if !first {
                    receiver.changed().await.ok()?;
                }
                let total = *receiver.borrow_and_update();
                Some((total, (ticker, receiver, false)))
            },
        ))
    }
}
