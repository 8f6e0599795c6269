// Pure decision function for deleting an entry.
//
// Responsibilities
// - Only closed automatic entries may be deleted; a running segment belongs to the timer.
// - The control total is recomputed from the remaining entries, never decremented.

use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::decider::delete_entry::command::DeleteEntry;
use crate::core::control::entries::EntryKind;
use crate::core::control::mutation::Mutation;
use crate::core::control::reconcile::recompute_total;
use crate::core::control::state::ControlAggregate;

pub fn decide_delete_entry(state: &ControlAggregate, command: DeleteEntry) -> Decision {
    let entry_id = command.entry_id;
    let removal = match command.kind {
        EntryKind::Automatic => {
            let entry = state
                .time_entry(entry_id)
                .ok_or(DecideError::EntryNotFound(entry_id))?;
            if entry.is_open() {
                return Err(DecideError::EntryStillRunning(entry_id));
            }
            Mutation::DeleteTimeEntry { entry_id }
        }
        EntryKind::Manual => {
            state
                .manual_entry(entry_id)
                .ok_or(DecideError::EntryNotFound(entry_id))?;
            Mutation::DeleteManualEntry { entry_id }
        }
    };

    let mut remaining = state.clone();
    remaining.time_entries.retain(|entry| entry.id != entry_id);
    remaining.manual_entries.retain(|entry| entry.id != entry_id);

    let mut next = state.record.clone();
    next.total_time_minutes = recompute_total(&remaining.time_entries, &remaining.manual_entries);
    Ok(vec![removal, Mutation::SaveControl(next)])
}
