// Builder for control aggregates in a known state.
//
// Entries added through the builder keep the stored total in sync with the entries,
// so aggregates start out consistent unless a test breaks them on purpose.

use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use crate::core::control::state::{ControlAggregate, ControlRecord, ControlStatus, EntityRef};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

pub const FIXED_USER: &str = "user-fixed-0001";

pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub struct ControlAggregateBuilder {
    inner: ControlAggregate,
}

impl Default for ControlAggregateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl ControlAggregateBuilder {
    pub fn new() -> Self {
        Self {
            inner: ControlAggregate::new(ControlRecord::new(
                Uuid::now_v7(),
                EntityRef::todo("todo-fixed-0001"),
                FIXED_USER,
                t0(),
            )),
        }
    }

    pub fn entity(mut self, entity: EntityRef) -> Self {
        self.inner.record.entity = entity;
        self
    }

    pub fn with_closed_entry(mut self, start: DateTime<Utc>, minutes: i64) -> Self {
        let record = &mut self.inner.record;
        let entry = TimeEntry::closed(
            Uuid::now_v7(),
            record.id,
            record.user_id.clone(),
            start,
            start + Duration::minutes(minutes),
        );
        record.started_at.get_or_insert(start);
        record.total_time_minutes += minutes;
        self.inner.time_entries.push(entry);
        self
    }

    pub fn with_manual_entry(mut self, minutes: i64) -> Self {
        let record = &mut self.inner.record;
        record.total_time_minutes += minutes;
        self.inner.manual_entries.push(ManualTimeEntry {
            id: Uuid::now_v7(),
            control_id: record.id,
            user_id: record.user_id.clone(),
            date: NaiveDate::from_ymd_opt(2023, 11, 14).unwrap(),
            duration_minutes: minutes,
            description: "Manual work".to_string(),
            created_by: record.user_id.clone(),
            created_at: t0(),
        });
        self
    }

    pub fn running_since(mut self, start: DateTime<Utc>) -> Self {
        let record = &mut self.inner.record;
        record.status = ControlStatus::InProgress;
        record.is_timer_active = true;
        record.timer_start_at = Some(start);
        record.started_at.get_or_insert(start);
        let entry = TimeEntry::open(Uuid::now_v7(), record.id, record.user_id.clone(), start);
        self.inner.time_entries.push(entry);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        let record = &mut self.inner.record;
        record.status = ControlStatus::Completed;
        record.completed_at = Some(at);
        record.is_timer_active = false;
        record.timer_start_at = None;
        self
    }

    pub fn build(self) -> ControlAggregate {
        self.inner
    }
}
