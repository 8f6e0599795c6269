// Time entries kept under a control.
//
// Purpose
// - TimeEntry: one automatic timer segment, open while the timer runs.
// - ManualTimeEntry: a block of work declared by a user, counted from creation.

use crate::core::duration::{HasDuration, elapsed_minutes};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub control_id: Uuid,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

impl TimeEntry {
    pub fn open(
        id: Uuid,
        control_id: Uuid,
        user_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            control_id,
            user_id: user_id.into(),
            start_time,
            end_time: None,
            duration_minutes: None,
        }
    }

    pub fn closed(
        id: Uuid,
        control_id: Uuid,
        user_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let mut entry = Self::open(id, control_id, user_id, start_time);
        entry.close(end_time, elapsed_minutes(start_time, end_time));
        entry
    }

    pub fn close(&mut self, end_time: DateTime<Utc>, duration_minutes: i64) {
        self.end_time = Some(end_time);
        self.duration_minutes = Some(duration_minutes);
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::Automatic
    }
}

impl HasDuration for TimeEntry {
    fn duration_minutes(&self) -> Option<i64> {
        self.duration_minutes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTimeEntry {
    pub id: Uuid,
    pub control_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ManualTimeEntry {
    pub fn kind(&self) -> EntryKind {
        EntryKind::Manual
    }
}

impl HasDuration for ManualTimeEntry {
    fn duration_minutes(&self) -> Option<i64> {
        Some(self.duration_minutes)
    }
}

#[cfg(test)]
mod time_entry_tests {
    use super::*;
    use crate::core::duration::sum_durations;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    fn it_should_open_without_end_or_duration() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let entry = TimeEntry::open(Uuid::now_v7(), Uuid::now_v7(), "user-1", start);
        assert!(entry.is_open());
        assert_eq!(entry.duration_minutes, None);
        assert_eq!(entry.kind(), EntryKind::Automatic);
    }

    #[rstest]
    fn it_should_close_with_a_floored_duration() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let entry = TimeEntry::closed(
            Uuid::now_v7(),
            Uuid::now_v7(),
            "user-1",
            start,
            start + Duration::seconds(30 * 60 + 59),
        );
        assert!(!entry.is_open());
        assert_eq!(entry.duration_minutes, Some(30));
    }

    #[rstest]
    fn it_should_not_count_open_entries_in_sums() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let control_id = Uuid::now_v7();
        let entries = vec![
            TimeEntry::closed(
                Uuid::now_v7(),
                control_id,
                "u",
                start,
                start + Duration::minutes(10),
            ),
            TimeEntry::open(Uuid::now_v7(), control_id, "u", start + Duration::minutes(20)),
        ];
        assert_eq!(sum_durations(&entries), 10);
    }
}
