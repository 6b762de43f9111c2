//! Session schedule generator.
//!
//! Expands a curriculum into concrete calendar bookings and session rows for
//! one enrollment. Each entry is independent: a calendar failure on one entry
//! is recorded and the rest of the batch continues — there is no rollback of
//! siblings. Session persistence failures, by contrast, are fatal to the
//! request (a required record could not be written).

use super::calendar::{CalendarClient, CalendarEventRequest};
use super::curriculum::Curriculum;
use super::session::{ScheduledSession, SessionStatus, SessionStore, SessionType};
use crate::config::SchedulingConfig;
use crate::enrollment::{Coach, Enrollment};
use crate::error::Result;
use crate::scheduling::bot::RecordingBotClient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One failed entry in a generation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleFailure {
    pub sequence_number: u32,
    pub session_type: SessionType,
    pub scheduled_date: NaiveDate,
    pub error: String,
}

/// Outcome of one generation batch. Partial success is the normal shape:
/// "9 scheduled, 1 failed" rather than all-or-nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub scheduled: Vec<ScheduledSession>,
    pub failures: Vec<ScheduleFailure>,
}

impl ScheduleReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Expands curricula into booked sessions.
pub struct ScheduleGenerator {
    sessions: Arc<dyn SessionStore>,
    calendar: Arc<dyn CalendarClient>,
    bot: Arc<dyn RecordingBotClient>,
    config: SchedulingConfig,
}

impl ScheduleGenerator {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        calendar: Arc<dyn CalendarClient>,
        bot: Arc<dyn RecordingBotClient>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            sessions,
            calendar,
            bot,
            config,
        }
    }

    /// Generate and persist the full session chain for an enrollment.
    ///
    /// Entries are processed in curriculum order, one at a time, with a
    /// cooperative throttle between calendar calls. A calendar failure is
    /// reported in the result and does not abort the batch; a session-store
    /// failure aborts with an error.
    pub async fn generate(
        &self,
        enrollment: &Enrollment,
        coach: &Coach,
        curriculum: &Curriculum,
    ) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();

        for (index, entry) in curriculum.entries.iter().enumerate() {
            let sequence_number = (index + 1) as u32;
            let date = entry.date_from(enrollment.program_start);
            let time = entry.time_of_day.default_start();
            let start = date.and_time(time);
            let end = start + chrono::Duration::minutes(entry.duration_minutes as i64);

            if index > 0 && self.config.throttle_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.throttle_ms)).await;
            }

            let request = CalendarEventRequest {
                title: session_title(entry.session_type, sequence_number, &enrollment.child_name),
                description: format!(
                    "{} session #{} for {} with {}",
                    entry.session_type, sequence_number, enrollment.child_name, coach.name
                ),
                start,
                end,
                attendees: vec![enrollment.parent_email.clone(), coach.email.clone()],
                organizer_email: self.config.organizer_email.clone(),
            };

            let handle = match self.calendar.create_event(&request).await {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(
                        enrollment_id = %enrollment.id,
                        sequence_number,
                        error = %e,
                        "Calendar booking failed; continuing with remaining sessions"
                    );
                    report.failures.push(ScheduleFailure {
                        sequence_number,
                        session_type: entry.session_type,
                        scheduled_date: date,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let session = ScheduledSession {
                id: uuid::Uuid::new_v4().to_string(),
                enrollment_id: enrollment.id.clone(),
                coach_id: coach.id.clone(),
                session_type: entry.session_type,
                sequence_number,
                scheduled_date: date,
                scheduled_time: time,
                duration_minutes: entry.duration_minutes,
                calendar_event_id: Some(handle.event_id),
                meeting_link: Some(handle.meeting_link.clone()),
                bot_id: None,
                status: SessionStatus::Scheduled,
            };

            // Required record: a failure here is fatal to the request.
            self.sessions.insert(&session).await?;

            // Recording bot is best-effort.
            match self
                .bot
                .schedule(&session.id, &handle.meeting_link, start)
                .await
            {
                Ok(bot_id) => {
                    self.sessions.set_bot(&session.id, Some(bot_id)).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id,
                        error = %e,
                        "Recording bot scheduling failed; session proceeds without bot"
                    );
                }
            }

            let session = self
                .sessions
                .get(&session.id)
                .await?
                .unwrap_or(session);
            report.scheduled.push(session);
        }

        tracing::info!(
            enrollment_id = %enrollment.id,
            scheduled = report.scheduled.len(),
            failed = report.failures.len(),
            "Schedule generation finished"
        );
        Ok(report)
    }
}

fn session_title(session_type: SessionType, sequence: u32, child_name: &str) -> String {
    match session_type {
        SessionType::Coaching => format!("Reading coaching #{} — {}", sequence, child_name),
        SessionType::ParentCheckin => format!("Parent check-in — {}", child_name),
        SessionType::Remedial => format!("Remedial session #{} — {}", sequence, child_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::{EnrollmentStatus, LeadSource};
    use crate::scheduling::bot::MockRecordingBotClient;
    use crate::scheduling::calendar::MockCalendarClient;
    use crate::scheduling::session::InMemorySessionStore;

    fn enrollment() -> Enrollment {
        Enrollment {
            id: "e1".to_string(),
            child_id: "ch1".to_string(),
            child_name: "Meera".to_string(),
            parent_email: "parent@example.com".to_string(),
            total_amount: 5999,
            lead_source: LeadSource::Parent,
            lead_source_coach_id: None,
            coaching_coach_id: Some("c1".to_string()),
            program_start: chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            program_end: chrono::NaiveDate::from_ymd_opt(2026, 11, 24).unwrap(),
            status: EnrollmentStatus::PendingStart,
        }
    }

    fn coach() -> Coach {
        Coach {
            id: "c1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_active: true,
            max_capacity: 10,
            current_students: 0,
            fiscal_year_earnings: 0,
        }
    }

    fn generator(
        sessions: &InMemorySessionStore,
        calendar: Arc<MockCalendarClient>,
    ) -> ScheduleGenerator {
        let config = SchedulingConfig {
            throttle_ms: 0,
            ..SchedulingConfig::default()
        };
        ScheduleGenerator::new(
            Arc::new(sessions.clone()),
            calendar,
            Arc::new(MockRecordingBotClient::new()),
            config,
        )
    }

    #[tokio::test]
    async fn test_full_curriculum_scheduled() {
        let sessions = InMemorySessionStore::new();
        let calendar = Arc::new(MockCalendarClient::new());
        let generator = generator(&sessions, calendar.clone());

        let report = generator
            .generate(&enrollment(), &coach(), &Curriculum::standard_12_week())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.scheduled.len(), 15);
        assert_eq!(calendar.create_count(), 15);

        // Sequence numbers are assigned in curriculum order.
        let seqs: Vec<u32> = report.scheduled.iter().map(|s| s.sequence_number).collect();
        assert_eq!(seqs, (1..=15).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_bot_scheduled_best_effort() {
        let sessions = InMemorySessionStore::new();
        let calendar = Arc::new(MockCalendarClient::new());
        let bot = Arc::new(MockRecordingBotClient::new());
        bot.fail_all();

        let config = SchedulingConfig {
            throttle_ms: 0,
            ..SchedulingConfig::default()
        };
        let generator = ScheduleGenerator::new(
            Arc::new(sessions.clone()),
            calendar,
            bot,
            config,
        );

        // Bot failures never fail the batch.
        let report = generator
            .generate(&enrollment(), &coach(), &Curriculum::standard_12_week())
            .await
            .unwrap();
        assert!(report.is_complete());
        assert!(report.scheduled.iter().all(|s| s.bot_id.is_none()));
    }

    #[tokio::test]
    async fn test_dates_follow_week_offsets() {
        let sessions = InMemorySessionStore::new();
        let calendar = Arc::new(MockCalendarClient::new());
        let generator = generator(&sessions, calendar);

        let report = generator
            .generate(&enrollment(), &coach(), &Curriculum::standard_12_week())
            .await
            .unwrap();

        // Entry 1 is week 0; the 6th entry is the week-4 coaching session
        // (the week-3 check-in sits at position 5).
        assert_eq!(
            report.scheduled[0].scheduled_date,
            chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
        );
        assert_eq!(
            report.scheduled[5].scheduled_date,
            chrono::NaiveDate::from_ymd_opt(2026, 9, 29).unwrap()
        );
    }
}
