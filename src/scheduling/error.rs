//! Scheduling-domain errors.

use std::fmt;

/// Errors raised by session scheduling, dispatch, and lifecycle handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The session does not exist.
    SessionNotFound { session_id: String },
    /// An event name the orchestrator has no handler for.
    UnknownEvent { event: String },
    /// A required dispatch field is absent.
    MissingField { field: String },
    /// A dispatch field is present but unparseable.
    InvalidField { field: String, reason: String },
    /// A session already occupies this (enrollment, sequence) slot.
    DuplicateSequence {
        enrollment_id: String,
        sequence_number: u32,
    },
    /// The calendar collaborator failed.
    CalendarFailure { operation: String, message: String },
    /// The session is in a state that doesn't admit the transition.
    InvalidTransition {
        session_id: String,
        from: String,
        to: String,
    },
}

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound { session_id } => {
                write!(f, "Session not found: {}", session_id)
            }
            Self::UnknownEvent { event } => {
                write!(f, "Unknown event: {}", event)
            }
            Self::MissingField { field } => {
                write!(f, "{} required", field)
            }
            Self::InvalidField { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::DuplicateSequence {
                enrollment_id,
                sequence_number,
            } => {
                write!(
                    f,
                    "Enrollment {} already has an active session #{}",
                    enrollment_id, sequence_number
                )
            }
            Self::CalendarFailure { operation, message } => {
                write!(f, "Calendar {} failed: {}", operation, message)
            }
            Self::InvalidTransition { session_id, from, to } => {
                write!(f, "Session {} cannot move from {} to {}", session_id, from, to)
            }
        }
    }
}

impl std::error::Error for SchedulingError {}

impl From<SchedulingError> for crate::error::CoachwayError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::SessionNotFound { .. } => {
                crate::error::CoachwayError::NotFound(err.to_string())
            }
            SchedulingError::UnknownEvent { .. }
            | SchedulingError::MissingField { .. }
            | SchedulingError::InvalidField { .. } => {
                crate::error::CoachwayError::BadRequest(err.to_string())
            }
            SchedulingError::DuplicateSequence { .. }
            | SchedulingError::InvalidTransition { .. } => {
                crate::error::CoachwayError::Conflict(err.to_string())
            }
            SchedulingError::CalendarFailure { .. } => {
                crate::error::CoachwayError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoachwayError;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = SchedulingError::MissingField {
            field: "sessionId".to_string(),
        };
        assert_eq!(err.to_string(), "sessionId required");
    }

    #[test]
    fn test_unknown_event_display() {
        let err = SchedulingError::UnknownEvent {
            event: "not.a.real.event".to_string(),
        };
        assert!(err.to_string().contains("Unknown event"));
    }

    #[test]
    fn test_http_mapping() {
        let err: CoachwayError = SchedulingError::DuplicateSequence {
            enrollment_id: "e1".to_string(),
            sequence_number: 3,
        }
        .into();
        assert!(matches!(err, CoachwayError::Conflict(_)));

        let err: CoachwayError = SchedulingError::MissingField {
            field: "newDate".to_string(),
        }
        .into();
        assert!(matches!(err, CoachwayError::BadRequest(_)));
    }
}
