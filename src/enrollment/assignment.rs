//! Coach assignment selector.
//!
//! Picks the least-loaded active coach with free capacity for a new
//! enrollment. The selector only *chooses*; the `current_students` counter is
//! incremented by the onboarding flow after session creation succeeds, so a
//! downstream failure doesn't strand a slot.

use super::error::EnrollmentError;
use super::storage::{Coach, CoachStore};
use crate::error::Result;
use std::sync::Arc;

/// Least-loaded-active coach selector.
pub struct CoachAssignment {
    coaches: Arc<dyn CoachStore>,
}

impl CoachAssignment {
    #[must_use]
    pub fn new(coaches: Arc<dyn CoachStore>) -> Self {
        Self { coaches }
    }

    /// Select a coach for a new enrollment.
    ///
    /// Active coaches with `current_students < max_capacity`, ordered by
    /// ascending load; ties broken by coach id so selection is deterministic.
    ///
    /// # Errors
    /// [`EnrollmentError::NoCoachAvailable`] when no coach qualifies — the
    /// caller must not create the enrollment's session chain in that case.
    pub async fn select(&self) -> Result<Coach> {
        let mut candidates: Vec<Coach> = self
            .coaches
            .list_active()
            .await?
            .into_iter()
            .filter(Coach::has_capacity)
            .collect();

        candidates.sort_by(|a, b| {
            a.current_students
                .cmp(&b.current_students)
                .then_with(|| a.id.cmp(&b.id))
        });

        match candidates.into_iter().next() {
            Some(coach) => {
                tracing::info!(
                    coach_id = %coach.id,
                    current_students = coach.current_students,
                    "Coach selected for enrollment"
                );
                Ok(coach)
            }
            None => Err(EnrollmentError::NoCoachAvailable.into()),
        }
    }
}
