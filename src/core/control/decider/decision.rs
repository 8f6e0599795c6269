// Outcome of a decider.
//
// Purpose
// - Name every rule a command can break. The application layer maps these to its error taxonomy.

use uuid::Uuid;

use crate::core::control::mutation::Mutation;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecideError {
    #[error("timer is already running")]
    TimerAlreadyRunning,

    #[error("timer is not running")]
    TimerNotRunning,

    #[error("control is completed")]
    ControlCompleted,

    #[error("control is not completed")]
    ControlNotCompleted,

    #[error("duration must be a positive number of minutes, got {0}")]
    NonPositiveDuration(i64),

    #[error("description must not be empty")]
    EmptyDescription,

    #[error("entry {0} does not belong to this control")]
    EntryNotFound(Uuid),

    #[error("entry {0} is still running")]
    EntryStillRunning(Uuid),
}

pub type Decision = Result<Vec<Mutation>, DecideError>;
