use crate::error::CoachwayError;
use thiserror::Error;

/// Errors raised while allocating enrollment revenue.
#[derive(Debug, Error)]
pub enum RevenueError {
    /// Revenue for this enrollment has already been recorded.
    #[error("Revenue already calculated for enrollment {0}")]
    AlreadyCalculated(String),

    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(String),

    #[error("Coach not found: {0}")]
    CoachNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid split configuration: {0}")]
    InvalidConfig(String),

    /// No split configuration is active for the requested date.
    #[error("No active split configuration as of {0}")]
    NoSplitConfig(chrono::NaiveDate),

    /// Payout rows could not be written after the revenue record was
    /// committed. Requires operator remediation, not rollback.
    #[error("Failed to persist payout schedule for enrollment {0}: {1}")]
    PayoutInsertFailed(String, String),
}

impl From<RevenueError> for CoachwayError {
    fn from(err: RevenueError) -> Self {
        match &err {
            RevenueError::AlreadyCalculated(_) => CoachwayError::conflict(err.to_string()),
            RevenueError::EnrollmentNotFound(_) | RevenueError::CoachNotFound(_) => {
                CoachwayError::not_found(err.to_string())
            }
            RevenueError::InvalidAmount(_) | RevenueError::InvalidConfig(_) => {
                CoachwayError::bad_request(err.to_string())
            }
            RevenueError::NoSplitConfig(_) => CoachwayError::internal(err.to_string()),
            RevenueError::PayoutInsertFailed(_, _) => CoachwayError::database(err.to_string()),
        }
    }
}
