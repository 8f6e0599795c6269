use uuid::Uuid;

/// Starts the timer of a control. `entry_id` names the segment that will be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTimer {
    pub entry_id: Uuid,
}
