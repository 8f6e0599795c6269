// Pure decision function for pausing a timer.
//
// Responsibilities
// - Commit the running segment: floor(now - timer_start_at) minutes.
// - Close the open entry with the latest start time.
// - When no open entry exists, record the segment as a new closed entry so totals stay reconcilable.

use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::decider::pause_timer::command::PauseTimer;
use crate::core::control::entries::TimeEntry;
use crate::core::control::mutation::Mutation;
use crate::core::control::state::{ControlAggregate, ControlRecord};
use crate::core::duration::elapsed_minutes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn decide_pause_timer(
    state: &ControlAggregate,
    command: PauseTimer,
    now: DateTime<Utc>,
) -> Decision {
    let mut next = state.record.clone();
    let closing = close_running_segment(state, &mut next, command.fallback_entry_id, now)?;
    Ok(vec![closing, Mutation::SaveControl(next)])
}

/// Stops the timer on `next` and returns the mutation that commits the segment.
pub(crate) fn close_running_segment(
    state: &ControlAggregate,
    next: &mut ControlRecord,
    fallback_entry_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Mutation, DecideError> {
    let started = next.running_since().ok_or(DecideError::TimerNotRunning)?;
    let duration = elapsed_minutes(started, now);

    next.is_timer_active = false;
    next.timer_start_at = None;
    next.total_time_minutes += duration;

    let closing = match state.latest_open_entry() {
        Some(entry) => Mutation::CloseTimeEntry {
            entry_id: entry.id,
            end_time: now,
            duration_minutes: duration,
        },
        None => {
            tracing::warn!(
                control_id = %next.id,
                "no open time entry for a running timer, recording the segment as a new entry"
            );
            let mut entry = TimeEntry::open(fallback_entry_id, next.id, next.user_id.clone(), started);
            entry.close(now, duration);
            Mutation::OpenTimeEntry(entry)
        }
    };
    Ok(closing)
}
