// Command data type for assigning a case or TODO to a user for time tracking.

use crate::core::control::state::EntityRef;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateControl {
    pub control_id: Uuid,
    pub entity: EntityRef,
    /// Assignee. Falls back to `requested_by` when absent.
    pub user_id: Option<String>,
    pub requested_by: String,
}

impl CreateControl {
    pub fn assignee(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.requested_by)
    }
}
