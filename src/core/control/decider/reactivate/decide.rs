// Pure decision function for reactivating a completed control.
//
// Responsibilities
// - Back to pending with completed_at cleared.
// - Logged time and entries are kept as they are.

use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::mutation::Mutation;
use crate::core::control::state::{ControlAggregate, ControlStatus};

pub fn decide_reactivate(state: &ControlAggregate) -> Decision {
    if !state.record.is_completed() {
        return Err(DecideError::ControlNotCompleted);
    }
    let mut next = state.record.clone();
    next.status = ControlStatus::Pending;
    next.completed_at = None;
    Ok(vec![Mutation::SaveControl(next)])
}
