//! Enrollment-domain errors.

use std::fmt;

/// Errors raised by enrollment assignment and onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentError {
    /// No active coach has a free slot. The caller must not create the
    /// enrollment's session chain in this state.
    NoCoachAvailable,
    /// The enrollment does not exist.
    EnrollmentNotFound { enrollment_id: String },
    /// The referenced coach does not exist.
    CoachNotFound { coach_id: String },
    /// The enrollment is in a state that doesn't admit the operation.
    InvalidState { enrollment_id: String, status: String },
}

impl fmt::Display for EnrollmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCoachAvailable => {
                write!(f, "No active coach with available capacity")
            }
            Self::EnrollmentNotFound { enrollment_id } => {
                write!(f, "Enrollment not found: {}", enrollment_id)
            }
            Self::CoachNotFound { coach_id } => {
                write!(f, "Coach not found: {}", coach_id)
            }
            Self::InvalidState { enrollment_id, status } => {
                write!(f, "Enrollment {} is {}", enrollment_id, status)
            }
        }
    }
}

impl std::error::Error for EnrollmentError {}

impl From<EnrollmentError> for crate::error::CoachwayError {
    fn from(err: EnrollmentError) -> Self {
        match &err {
            EnrollmentError::NoCoachAvailable => {
                crate::error::CoachwayError::ServiceUnavailable(err.to_string())
            }
            EnrollmentError::EnrollmentNotFound { .. } | EnrollmentError::CoachNotFound { .. } => {
                crate::error::CoachwayError::NotFound(err.to_string())
            }
            EnrollmentError::InvalidState { .. } => {
                crate::error::CoachwayError::Conflict(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoachwayError;

    #[test]
    fn test_display() {
        assert_eq!(
            EnrollmentError::NoCoachAvailable.to_string(),
            "No active coach with available capacity"
        );
        assert_eq!(
            EnrollmentError::CoachNotFound { coach_id: "c9".to_string() }.to_string(),
            "Coach not found: c9"
        );
    }

    #[test]
    fn test_http_mapping() {
        let err: CoachwayError = EnrollmentError::NoCoachAvailable.into();
        assert!(matches!(err, CoachwayError::ServiceUnavailable(_)));

        let err: CoachwayError = EnrollmentError::EnrollmentNotFound {
            enrollment_id: "e1".to_string(),
        }
        .into();
        assert!(matches!(err, CoachwayError::NotFound(_)));
    }
}
