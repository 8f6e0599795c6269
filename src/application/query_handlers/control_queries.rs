// Read side for controls.
//
// Purpose
// - Turn stored aggregates into views with live, recomputed and effective totals.
// - Translate the internal status into the external status id at the boundary.

use crate::application::errors::ApplicationError;
use crate::application::live_total::LiveTotal;
use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use crate::core::control::reconcile::Totals;
use crate::core::control::state::{ControlAggregate, ControlStatus, EntityKind, EntityRef};
use crate::core::control::status::{StatusCatalog, StatusId};
use crate::core::duration::format_minutes;
use crate::core::ports::{Clock, ControlStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlView {
    pub id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub user_id: String,
    pub status: ControlStatus,
    pub status_id: StatusId,
    pub is_timer_active: bool,
    pub timer_start_at: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_time_minutes: i64,
    pub live_total_minutes: i64,
    pub recomputed_total_minutes: i64,
    pub effective_total_minutes: i64,
    pub is_consistent: bool,
    pub formatted_total: String,
    pub formatted_live_total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlDetail {
    #[serde(flatten)]
    pub control: ControlView,
    pub time_entries: Vec<TimeEntry>,
    pub manual_entries: Vec<ManualTimeEntry>,
}

pub struct ControlQueryHandler<TStore>
where
    TStore: ControlStore + 'static,
{
    store: Arc<TStore>,
    catalog: Arc<StatusCatalog>,
    clock: Arc<dyn Clock>,
}

impl<TStore> ControlQueryHandler<TStore>
where
    TStore: ControlStore + 'static,
{
    pub fn new(store: Arc<TStore>, catalog: Arc<StatusCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            catalog,
            clock,
        }
    }

    pub async fn get(&self, control_id: Uuid) -> Result<ControlDetail, ApplicationError> {
        Ok(self.detail(self.load(control_id).await?))
    }

    /// Starts a ticker that follows the stored control until its timer stops.
    /// Dropping it stops the ticking early.
    pub async fn watch_live_total(
        &self,
        control_id: Uuid,
        period: Duration,
    ) -> Result<LiveTotal, ApplicationError> {
        let aggregate = self.load(control_id).await?;
        Ok(LiveTotal::spawn(
            self.store.clone(),
            &aggregate.record,
            self.clock.clone(),
            period,
        ))
    }

    pub async fn list_by_user_id(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
        newest_first: bool,
    ) -> Result<Vec<ControlView>, ApplicationError> {
        let aggregates = self
            .store
            .list_by_user_id(user_id, offset, limit, newest_first)
            .await?;
        let now = self.clock.now();
        Ok(aggregates.iter().map(|a| self.view(a, now)).collect())
    }

    pub async fn list_by_entity(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<ControlView>, ApplicationError> {
        let aggregates = self.store.list_by_entity(entity).await?;
        let now = self.clock.now();
        Ok(aggregates.iter().map(|a| self.view(a, now)).collect())
    }

    async fn load(&self, control_id: Uuid) -> Result<ControlAggregate, ApplicationError> {
        self.store
            .load(control_id)
            .await?
            .map(|loaded| loaded.aggregate)
            .ok_or_else(|| ApplicationError::NotFound(format!("control {control_id}")))
    }

    fn detail(&self, mut aggregate: ControlAggregate) -> ControlDetail {
        let control = self.view(&aggregate, self.clock.now());
        aggregate
            .time_entries
            .sort_by(|a, b| (b.start_time, b.id).cmp(&(a.start_time, a.id)));
        aggregate
            .manual_entries
            .sort_by(|a, b| (b.date, b.created_at, b.id).cmp(&(a.date, a.created_at, a.id)));
        ControlDetail {
            control,
            time_entries: aggregate.time_entries,
            manual_entries: aggregate.manual_entries,
        }
    }

    fn view(&self, aggregate: &ControlAggregate, now: DateTime<Utc>) -> ControlView {
        let record = &aggregate.record;
        let totals = Totals::of(aggregate, now);
        if !totals.is_consistent && !record.is_timer_active {
            tracing::warn!(
                control_id = %record.id,
                committed = totals.committed_minutes,
                recomputed = totals.recomputed_minutes,
                "stored total disagrees with entries"
            );
        }
        ControlView {
            id: record.id,
            entity_kind: record.entity.kind,
            entity_id: record.entity.id.clone(),
            user_id: record.user_id.clone(),
            status: record.status,
            status_id: self.catalog.id_of(record.status).clone(),
            is_timer_active: record.is_timer_active,
            timer_start_at: record.timer_start_at,
            assigned_at: record.assigned_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            total_time_minutes: record.total_time_minutes,
            live_total_minutes: totals.live_minutes,
            recomputed_total_minutes: totals.recomputed_minutes,
            effective_total_minutes: totals.effective_minutes,
            is_consistent: totals.is_consistent,
            formatted_total: format_minutes(totals.effective_minutes),
            formatted_live_total: format_minutes(totals.live_minutes),
        }
    }
}
