//! Enrollment onboarding.
//!
//! Strings together the post-payment steps for a new enrollment: coach
//! assignment, session schedule generation, counter updates, revenue
//! allocation, and the welcome notification. Ordering matters:
//!
//! 1. A coach is selected and recorded before any booking, so every session
//!    row carries its coach.
//! 2. `current_students` moves only after at least one session actually
//!    persisted, so a dead calendar doesn't strand a capacity slot.
//! 3. Revenue runs last and is tolerated-on-failure here: the ledger's own
//!    idempotency makes a follow-up calculation safe, so a revenue problem
//!    must not undo an otherwise-live enrollment.

use super::assignment::CoachAssignment;
use super::error::EnrollmentError;
use super::storage::{CoachStore, Enrollment, EnrollmentStatus, EnrollmentStore};
use crate::error::Result;
use crate::notify::{send_best_effort, Channel, Notification, NotificationTemplate, Notifier};
use crate::revenue::{RevenueBreakdown, RevenueCalculator};
use crate::scheduling::curriculum::Curriculum;
use crate::scheduling::generator::{ScheduleFailure, ScheduleGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What onboarding produced for one enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingOutcome {
    pub enrollment_id: String,
    pub coach_id: String,
    pub sessions_scheduled: usize,
    pub schedule_failures: Vec<ScheduleFailure>,
    pub revenue: Option<RevenueBreakdown>,
    /// Set when revenue allocation failed; the enrollment is live and the
    /// calculation can be re-run safely.
    pub revenue_error: Option<String>,
}

/// Runs the onboarding flow for paid enrollments.
pub struct EnrollmentOnboarding {
    enrollments: Arc<dyn EnrollmentStore>,
    coaches: Arc<dyn CoachStore>,
    assignment: CoachAssignment,
    generator: Arc<ScheduleGenerator>,
    calculator: Arc<RevenueCalculator>,
    notifier: Arc<dyn Notifier>,
}

impl EnrollmentOnboarding {
    #[must_use]
    pub fn new(
        enrollments: Arc<dyn EnrollmentStore>,
        coaches: Arc<dyn CoachStore>,
        generator: Arc<ScheduleGenerator>,
        calculator: Arc<RevenueCalculator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let assignment = CoachAssignment::new(coaches.clone());
        Self {
            enrollments,
            coaches,
            assignment,
            generator,
            calculator,
            notifier,
        }
    }

    /// Onboard one enrollment.
    ///
    /// # Errors
    /// Fails without activating the enrollment when it is not pending, when
    /// no coach has capacity, or when not a single session could be booked.
    pub async fn run(&self, enrollment_id: &str) -> Result<OnboardingOutcome> {
        let enrollment = self
            .enrollments
            .get(enrollment_id)
            .await?
            .ok_or_else(|| EnrollmentError::EnrollmentNotFound {
                enrollment_id: enrollment_id.to_string(),
            })?;

        if enrollment.status != EnrollmentStatus::PendingStart {
            return Err(EnrollmentError::InvalidState {
                enrollment_id: enrollment.id,
                status: enrollment.status.to_string(),
            }
            .into());
        }

        let coach = self.assignment.select().await?;
        self.enrollments
            .set_coaching_coach(&enrollment.id, &coach.id)
            .await?;
        let enrollment = Enrollment {
            coaching_coach_id: Some(coach.id.clone()),
            ..enrollment
        };

        let report = self
            .generator
            .generate(&enrollment, &coach, &Curriculum::standard_12_week())
            .await?;

        if report.scheduled.is_empty() {
            tracing::error!(
                enrollment_id = %enrollment.id,
                failures = report.failures.len(),
                "No sessions could be booked; enrollment stays pending"
            );
            return Err(crate::error::CoachwayError::service_unavailable(format!(
                "Could not book any sessions for enrollment {}",
                enrollment.id
            )));
        }

        // Capacity moves only once sessions actually exist.
        self.coaches.adjust_student_count(&coach.id, 1).await?;
        self.enrollments
            .set_status(&enrollment.id, EnrollmentStatus::Active)
            .await?;

        let (revenue, revenue_error) = match self.calculator.calculate(&enrollment.id).await {
            Ok(breakdown) => (Some(breakdown), None),
            Err(e) => {
                tracing::warn!(
                    enrollment_id = %enrollment.id,
                    error = %e,
                    "Revenue allocation failed during onboarding; safe to re-run"
                );
                (None, Some(e.to_string()))
            }
        };

        let notification = Notification::new(
            NotificationTemplate::ScheduleConfirmed,
            Channel::Whatsapp,
            &enrollment.parent_email,
        )
        .variable("child_name", &enrollment.child_name)
        .variable("coach_name", &coach.name)
        .variable("session_count", report.scheduled.len().to_string());
        send_best_effort(self.notifier.as_ref(), notification).await;

        tracing::info!(
            enrollment_id = %enrollment.id,
            coach_id = %coach.id,
            sessions = report.scheduled.len(),
            failures = report.failures.len(),
            "Enrollment onboarded"
        );

        Ok(OnboardingOutcome {
            enrollment_id: enrollment.id,
            coach_id: coach.id,
            sessions_scheduled: report.scheduled.len(),
            schedule_failures: report.failures,
            revenue,
            revenue_error,
        })
    }
}
