// Pure decision function for starting a timer.
//
// Responsibilities
// - At most one open automatic entry per control: a running timer cannot be started again.
// - A completed control must be reactivated first.
// - started_at is set by the first start only.

use crate::core::control::decider::decision::{DecideError, Decision};
use crate::core::control::decider::start_timer::command::StartTimer;
use crate::core::control::entries::TimeEntry;
use crate::core::control::mutation::Mutation;
use crate::core::control::state::{ControlAggregate, ControlStatus};
use chrono::{DateTime, Utc};

pub fn decide_start_timer(
    state: &ControlAggregate,
    command: StartTimer,
    now: DateTime<Utc>,
) -> Decision {
    let record = &state.record;
    if record.is_completed() {
        return Err(DecideError::ControlCompleted);
    }
    if record.is_timer_active {
        return Err(DecideError::TimerAlreadyRunning);
    }

    let mut next = record.clone();
    next.status = ControlStatus::InProgress;
    next.is_timer_active = true;
    next.timer_start_at = Some(now);
    next.started_at.get_or_insert(now);

    let entry = TimeEntry::open(command.entry_id, record.id, record.user_id.clone(), now);
    Ok(vec![Mutation::SaveControl(next), Mutation::OpenTimeEntry(entry)])
}

#[cfg(test)]
mod start_timer_decide_tests {
    use super::*;
    use crate::test_support::fixtures::controls::{ControlAggregateBuilder, t0};
    use chrono::Duration;
    use rstest::rstest;
    use uuid::Uuid;

    fn command() -> StartTimer {
        StartTimer {
            entry_id: Uuid::now_v7(),
        }
    }

    #[rstest]
    fn it_should_start_the_timer_and_open_a_segment() {
        let state = ControlAggregateBuilder::new().build();
        let command = command();
        let now = t0() + Duration::minutes(3);
        let mutations = decide_start_timer(&state, command.clone(), now).unwrap();
        match mutations.as_slice() {
            [Mutation::SaveControl(record), Mutation::OpenTimeEntry(entry)] => {
                assert_eq!(record.status, ControlStatus::InProgress);
                assert!(record.is_timer_active);
                assert_eq!(record.timer_start_at, Some(now));
                assert_eq!(record.started_at, Some(now));
                assert_eq!(entry.id, command.entry_id);
                assert_eq!(entry.control_id, state.record.id);
                assert_eq!(entry.start_time, now);
                assert!(entry.is_open());
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
    }

    #[rstest]
    fn it_should_keep_the_first_started_at() {
        let first_start = t0() + Duration::minutes(1);
        let state = ControlAggregateBuilder::new()
            .with_closed_entry(first_start, 10)
            .build();
        let now = t0() + Duration::hours(2);
        let mutations = decide_start_timer(&state, command(), now).unwrap();
        let Some(Mutation::SaveControl(record)) = mutations.first() else {
            panic!("expected SaveControl first");
        };
        assert_eq!(record.started_at, Some(first_start));
        assert_eq!(record.total_time_minutes, 10);
    }

    #[rstest]
    fn it_should_reject_a_second_start() {
        let state = ControlAggregateBuilder::new().running_since(t0()).build();
        assert_eq!(
            decide_start_timer(&state, command(), t0() + Duration::minutes(1)),
            Err(DecideError::TimerAlreadyRunning)
        );
    }

    #[rstest]
    fn it_should_reject_a_completed_control() {
        let state = ControlAggregateBuilder::new().completed_at(t0()).build();
        assert_eq!(
            decide_start_timer(&state, command(), t0()),
            Err(DecideError::ControlCompleted)
        );
    }
}
