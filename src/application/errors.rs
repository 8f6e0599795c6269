use crate::core::control::decider::decision::DecideError;
use crate::core::control::mutation::ApplyError;
use crate::core::control::status::CatalogError;
use crate::core::ports::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("entry {0} not found or not accessible")]
    NotFoundOrForbidden(Uuid),

    #[error("concurrent update: expected version {expected}, actual {actual}")]
    Conflict { expected: i64, actual: i64 },

    #[error("tracked entity update failed: {0}")]
    Entity(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<DecideError> for ApplicationError {
    fn from(error: DecideError) -> Self {
        match error {
            DecideError::NonPositiveDuration(_) | DecideError::EmptyDescription => {
                ApplicationError::Validation(error.to_string())
            }
            DecideError::EntryNotFound(entry_id) => ApplicationError::NotFoundOrForbidden(entry_id),
            DecideError::TimerAlreadyRunning
            | DecideError::TimerNotRunning
            | DecideError::ControlCompleted
            | DecideError::ControlNotCompleted
            | DecideError::EntryStillRunning(_) => ApplicationError::InvalidState(error.to_string()),
        }
    }
}

impl From<StoreError> for ApplicationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionMismatch { expected, actual } => {
                ApplicationError::Conflict { expected, actual }
            }
            StoreError::Forbidden { control_id } => {
                ApplicationError::Permission(format!("control {control_id}"))
            }
            StoreError::Rejected(ApplyError::MissingRow(row)) => {
                ApplicationError::NotFoundOrForbidden(row)
            }
            other => ApplicationError::Store(other),
        }
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::Missing { .. } => ApplicationError::NotFound(error.to_string()),
            CatalogError::Vocabulary(reason) => {
                ApplicationError::Store(StoreError::Backend(reason))
            }
        }
    }
}

#[cfg(test)]
mod application_error_tests {
    use super::*;
    use crate::core::control::state::ControlStatus;
    use rstest::rstest;

    #[rstest]
    #[case(DecideError::NonPositiveDuration(0), "Validation")]
    #[case(DecideError::EmptyDescription, "Validation")]
    #[case(DecideError::TimerNotRunning, "InvalidState")]
    #[case(DecideError::TimerAlreadyRunning, "InvalidState")]
    #[case(DecideError::ControlNotCompleted, "InvalidState")]
    #[case(DecideError::EntryNotFound(Uuid::nil()), "NotFoundOrForbidden")]
    fn it_should_map_rule_violations_to_the_taxonomy(
        #[case] error: DecideError,
        #[case] expected: &str,
    ) {
        let mapped = ApplicationError::from(error);
        assert!(
            format!("{mapped:?}").starts_with(expected),
            "{mapped:?} is not {expected}"
        );
    }

    #[rstest]
    fn it_should_map_a_version_mismatch_to_a_conflict() {
        let mapped = ApplicationError::from(StoreError::VersionMismatch {
            expected: 2,
            actual: 3,
        });
        assert!(matches!(
            mapped,
            ApplicationError::Conflict {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[rstest]
    fn it_should_map_hidden_rows_to_permission_errors() {
        let mapped = ApplicationError::from(StoreError::Forbidden {
            control_id: Uuid::nil(),
        });
        assert!(matches!(mapped, ApplicationError::Permission(_)));
    }

    #[rstest]
    fn it_should_map_a_missing_status_to_not_found() {
        let mapped = ApplicationError::from(CatalogError::Missing {
            status: ControlStatus::Pending,
            name: "PENDIENTE".into(),
        });
        assert!(matches!(mapped, ApplicationError::NotFound(_)));
    }
}
