use crate::core::control::entries::EntryKind;
use uuid::Uuid;

/// Deletes an automatic or manual entry from a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub entry_id: Uuid,
    pub kind: EntryKind,
}
