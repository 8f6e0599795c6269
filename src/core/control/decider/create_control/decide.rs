// Pure decision function for creating a control.
//
// Responsibilities
// - One control per (entity, assignee). An existing control is reused, nothing is written.
// - A new control starts pending, with no time and no running timer.

use crate::core::control::decider::create_control::command::CreateControl;
use crate::core::control::decider::decision::Decision;
use crate::core::control::mutation::Mutation;
use crate::core::control::state::ControlRecord;
use chrono::{DateTime, Utc};

pub fn decide_create_control(
    existing: Option<&ControlRecord>,
    command: CreateControl,
    now: DateTime<Utc>,
) -> Decision {
    if existing.is_some() {
        return Ok(Vec::new());
    }
    let user_id = command.assignee().to_string();
    let record = ControlRecord::new(command.control_id, command.entity, user_id, now);
    Ok(vec![Mutation::SaveControl(record)])
}

#[cfg(test)]
mod create_control_decide_tests {
    use super::*;
    use crate::core::control::state::{ControlStatus, EntityRef};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn command() -> CreateControl {
        CreateControl {
            control_id: Uuid::now_v7(),
            entity: EntityRef::todo("todo-7"),
            user_id: Some("assignee-1".into()),
            requested_by: "lead-1".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[rstest]
    fn it_should_save_a_pending_control(command: CreateControl) {
        let mutations = decide_create_control(None, command.clone(), now()).unwrap();
        match mutations.as_slice() {
            [Mutation::SaveControl(record)] => {
                assert_eq!(record.id, command.control_id);
                assert_eq!(record.entity, command.entity);
                assert_eq!(record.user_id, "assignee-1");
                assert_eq!(record.status, ControlStatus::Pending);
                assert_eq!(record.total_time_minutes, 0);
                assert!(!record.is_timer_active);
                assert_eq!(record.assigned_at, now());
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
    }

    #[rstest]
    fn it_should_assign_the_requester_when_no_user_is_given(mut command: CreateControl) {
        command.user_id = None;
        let mutations = decide_create_control(None, command, now()).unwrap();
        assert!(matches!(
            mutations.as_slice(),
            [Mutation::SaveControl(record)] if record.user_id == "lead-1"
        ));
    }

    #[rstest]
    fn it_should_write_nothing_when_the_assignment_already_exists(command: CreateControl) {
        let existing = ControlRecord::new(Uuid::now_v7(), command.entity.clone(), "assignee-1", now());
        let mutations = decide_create_control(Some(&existing), command, now()).unwrap();
        assert!(mutations.is_empty());
    }
}
