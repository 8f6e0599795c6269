use uuid::Uuid;

/// Pauses the running timer of a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseTimer {
    /// Id for a replacement segment, used only when no open entry can be found.
    pub fallback_entry_id: Uuid,
}
