// Pure decision function for adding manual time.
//
// Responsibilities
// - Duration must be positive and the description must contain more than whitespace.
// - The control total grows by exactly the declared duration.

use crate::core::control::decider::add_manual_time::command::AddManualTime;
use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::entries::ManualTimeEntry;
use crate::core::control::mutation::Mutation;
use crate::core::control::state::ControlAggregate;
use chrono::{DateTime, Utc};

pub fn decide_add_manual_time(
    state: &ControlAggregate,
    command: AddManualTime,
    now: DateTime<Utc>,
) -> Decision {
    if command.duration_minutes <= 0 {
        return Err(DecideError::NonPositiveDuration(command.duration_minutes));
    }
    if command.description.trim().is_empty() {
        return Err(DecideError::EmptyDescription);
    }

    let entry = ManualTimeEntry {
        id: command.entry_id,
        control_id: state.record.id,
        user_id: command.user_id,
        date: command.date,
        duration_minutes: command.duration_minutes,
        description: command.description.trim().to_string(),
        created_by: command.created_by,
        created_at: now,
    };
    let mut next = state.record.clone();
    next.total_time_minutes += entry.duration_minutes;
    Ok(vec![Mutation::AddManualEntry(entry), Mutation::SaveControl(next)])
}
