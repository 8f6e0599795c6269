// Pure decision function for completing a control.
//
// Responsibilities
// - A running timer is paused as part of the same batch.
// - Completion sets completed_at and leaves no timer running.
// - The owning entity flag is not written here; the command handler owns that write.

use crate::core::control::decider::complete::command::Complete;
use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::decider::pause_timer::decide::close_running_segment;
use crate::core::control::mutation::Mutation;
use crate::core::control::state::{ControlAggregate, ControlStatus};
use chrono::{DateTime, Utc};

pub fn decide_complete(state: &ControlAggregate, command: Complete, now: DateTime<Utc>) -> Decision {
    if state.record.is_completed() {
        return Err(DecideError::ControlCompleted);
    }

    let mut next = state.record.clone();
    let mut mutations = Vec::with_capacity(2);
    if next.running_since().is_some() {
        mutations.push(close_running_segment(
            state,
            &mut next,
            command.fallback_entry_id,
            now,
        )?);
    }

    next.status = ControlStatus::Completed;
    next.completed_at = Some(now);
    next.is_timer_active = false;
    next.timer_start_at = None;
    mutations.push(Mutation::SaveControl(next));
    Ok(mutations)
}
