// Builders for commands with sensible defaults.

use crate::core::control::decider::add_manual_time::command::AddManualTime;
use crate::test_support::fixtures::controls::FIXED_USER;
use chrono::NaiveDate;
use uuid::Uuid;

pub struct AddManualTimeBuilder {
    inner: AddManualTime,
}

impl Default for AddManualTimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl AddManualTimeBuilder {
    pub fn new() -> Self {
        Self {
            inner: AddManualTime {
                entry_id: Uuid::now_v7(),
                user_id: FIXED_USER.to_string(),
                date: NaiveDate::from_ymd_opt(2023, 11, 14).unwrap(),
                duration_minutes: 30,
                description: "Reviewed the customer logs".to_string(),
                created_by: FIXED_USER.to_string(),
            },
        }
    }

    pub fn user_id(mut self, v: impl Into<String>) -> Self {
        self.inner.user_id = v.into();
        self
    }

    pub fn date(mut self, v: NaiveDate) -> Self {
        self.inner.date = v;
        self
    }

    pub fn duration_minutes(mut self, v: i64) -> Self {
        self.inner.duration_minutes = v;
        self
    }

    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.inner.description = v.into();
        self
    }

    pub fn created_by(mut self, v: impl Into<String>) -> Self {
        self.inner.created_by = v.into();
        self
    }

    pub fn build(self) -> AddManualTime {
        self.inner
    }
}
