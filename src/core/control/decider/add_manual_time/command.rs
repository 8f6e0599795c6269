// Command data type for logging manual time against a control.
//
// Purpose
// - Express a block of work the timer did not measure: a calendar date, minutes and a description.

use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddManualTime {
    pub entry_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub description: String,
    pub created_by: String,
}
