//! Scheduled sessions.
//!
//! One row per calendar occurrence tied to an enrollment. Sessions are never
//! hard-deleted; every lifecycle change is a status transition, so the table
//! doubles as an audit trail.

use super::error::SchedulingError;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// What kind of session this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Child reading-coaching session.
    Coaching,
    /// Parent progress check-in.
    ParentCheckin,
    /// Extra session to close a specific gap.
    Remedial,
}

impl SessionType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coaching => "coaching",
            Self::ParentCheckin => "parent_checkin",
            Self::Remedial => "remedial",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    /// Child/parent didn't show.
    NoShow,
    CoachNoShow,
    /// Session happened but was cut short.
    Partial,
    /// Session happened but the recording bot failed.
    BotError,
    /// Superseded by a replacement row with the same sequence number.
    Rescheduled,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
            Self::CoachNoShow => "coach_no_show",
            Self::Partial => "partial",
            Self::BotError => "bot_error",
            Self::Rescheduled => "rescheduled",
        }
    }

    /// Whether this session still occupies its (enrollment, sequence) slot.
    ///
    /// Cancelled and rescheduled rows are terminal and vacate the slot; every
    /// other status holds it, which is how the one-active-session-per-sequence
    /// invariant is defined.
    #[must_use]
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Rescheduled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One calendar occurrence tied to an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledSession {
    pub id: String,
    pub enrollment_id: String,
    pub coach_id: String,
    pub session_type: SessionType,
    /// Position in the curriculum, 1-based. Replacement rows created by a
    /// reschedule keep the sequence number of the row they supersede.
    pub sequence_number: u32,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: u32,
    pub calendar_event_id: Option<String>,
    pub meeting_link: Option<String>,
    pub bot_id: Option<String>,
    pub status: SessionStatus,
}

impl ScheduledSession {
    /// Combined start timestamp.
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }
}

/// Storage for scheduled sessions.
///
/// Implementations must enforce the slot invariant on insert: at most one
/// session whose status [`SessionStatus::occupies_slot`] per
/// (enrollment, sequence_number).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<ScheduledSession>>;

    /// Insert a new session, rejecting a second active row for the same
    /// (enrollment, sequence) slot with a conflict error.
    async fn insert(&self, session: &ScheduledSession) -> Result<()>;

    async fn set_status(&self, session_id: &str, status: SessionStatus) -> Result<()>;

    async fn set_bot(&self, session_id: &str, bot_id: Option<String>) -> Result<()>;

    async fn list_by_enrollment(&self, enrollment_id: &str) -> Result<Vec<ScheduledSession>>;

    /// Upcoming sessions still in `scheduled` status for a coach, on or
    /// after `from`.
    async fn list_scheduled_by_coach(
        &self,
        coach_id: &str,
        from: NaiveDate,
    ) -> Result<Vec<ScheduledSession>>;
}

/// In-memory [`SessionStore`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    inner: std::sync::Arc<std::sync::RwLock<Vec<ScheduledSession>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows, for test assertions.
    pub fn all(&self) -> Vec<ScheduledSession> {
        self.inner.read().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<ScheduledSession>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn insert(&self, session: &ScheduledSession) -> Result<()> {
        let mut sessions = self.inner.write().unwrap();

        let slot_taken = sessions.iter().any(|s| {
            s.enrollment_id == session.enrollment_id
                && s.sequence_number == session.sequence_number
                && s.status.occupies_slot()
        });
        if slot_taken && session.status.occupies_slot() {
            return Err(SchedulingError::DuplicateSequence {
                enrollment_id: session.enrollment_id.clone(),
                sequence_number: session.sequence_number,
            }
            .into());
        }

        sessions.push(session.clone());
        Ok(())
    }

    async fn set_status(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        let mut sessions = self.inner.write().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SchedulingError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        session.status = status;
        Ok(())
    }

    async fn set_bot(&self, session_id: &str, bot_id: Option<String>) -> Result<()> {
        let mut sessions = self.inner.write().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SchedulingError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        session.bot_id = bot_id;
        Ok(())
    }

    async fn list_by_enrollment(&self, enrollment_id: &str) -> Result<Vec<ScheduledSession>> {
        let mut sessions: Vec<ScheduledSession> = self
            .inner
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.enrollment_id == enrollment_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.sequence_number);
        Ok(sessions)
    }

    async fn list_scheduled_by_coach(
        &self,
        coach_id: &str,
        from: NaiveDate,
    ) -> Result<Vec<ScheduledSession>> {
        let mut sessions: Vec<ScheduledSession> = self
            .inner
            .read()
            .unwrap()
            .iter()
            .filter(|s| {
                s.coach_id == coach_id
                    && s.status == SessionStatus::Scheduled
                    && s.scheduled_date >= from
            })
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.scheduled_date, s.scheduled_time));
        Ok(sessions)
    }
}
