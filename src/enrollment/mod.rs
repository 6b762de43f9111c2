//! Enrollments and coaches.
//!
//! An enrollment is one program purchase by a parent for a child. This module
//! owns the enrollment and coach records, the storage traits behind them, the
//! least-loaded coach assignment selector, and the onboarding flow that
//! strings assignment, session scheduling, and revenue calculation together.

pub mod assignment;
mod error;
pub mod memory;
pub mod onboarding;
pub mod storage;

pub use assignment::CoachAssignment;
pub use error::EnrollmentError;
pub use memory::{InMemoryCoachStore, InMemoryEnrollmentStore};
pub use onboarding::{EnrollmentOnboarding, OnboardingOutcome};
pub use storage::{
    Coach, CoachStore, Enrollment, EnrollmentStatus, EnrollmentStore, LeadSource,
};
