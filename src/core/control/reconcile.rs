// Reconciliation of committed, live and recomputed totals.
//
// Purpose
// - Live total: committed minutes plus the running segment, for display only.
// - Recomputed total: closed automatic entries plus manual entries, the source of truth.
//
// Responsibilities
// - Never write anything back. Only pause and the entry commands commit minutes.

use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use crate::core::control::state::{ControlAggregate, ControlRecord};
use crate::core::duration::{elapsed_minutes, sum_durations};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub fn live_total(record: &ControlRecord, now: DateTime<Utc>) -> i64 {
    let running = record
        .running_since()
        .map(|started| elapsed_minutes(started, now))
        .unwrap_or(0);
    record.total_time_minutes + running
}

pub fn recompute_total(time_entries: &[TimeEntry], manual_entries: &[ManualTimeEntry]) -> i64 {
    sum_durations(time_entries) + sum_durations(manual_entries)
}

/// The stored total, unless it is missing and the entries say otherwise.
pub fn effective_total(aggregate: &ControlAggregate) -> i64 {
    if aggregate.record.total_time_minutes > 0 {
        aggregate.record.total_time_minutes
    } else {
        recompute_total(&aggregate.time_entries, &aggregate.manual_entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub committed_minutes: i64,
    pub live_minutes: i64,
    pub recomputed_minutes: i64,
    pub effective_minutes: i64,
    pub is_consistent: bool,
}

impl Totals {
    pub fn of(aggregate: &ControlAggregate, now: DateTime<Utc>) -> Self {
        let recomputed = recompute_total(&aggregate.time_entries, &aggregate.manual_entries);
        Self {
            committed_minutes: aggregate.record.total_time_minutes,
            live_minutes: live_total(&aggregate.record, now),
            recomputed_minutes: recomputed,
            effective_minutes: effective_total(aggregate),
            is_consistent: recomputed == aggregate.record.total_time_minutes,
        }
    }
}
