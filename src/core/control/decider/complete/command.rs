use uuid::Uuid;

/// Completes a control, stopping its timer first when it is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complete {
    /// Id for a replacement segment, used only when the running timer has no open entry.
    pub fallback_entry_id: Uuid,
}
