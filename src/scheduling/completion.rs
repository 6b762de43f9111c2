//! Session completion and post-session intelligence capture.
//!
//! When a session ends, the engine marks the row, stores whatever artifacts
//! the recording pipeline produced, and forwards them to downstream
//! intelligence consumers. The forward is fire-and-forget; analysis never
//! blocks or fails the completion itself.

use super::error::SchedulingError;
use super::session::{SessionStatus, SessionStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Artifacts captured from one completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIntelligence {
    pub session_id: String,
    pub enrollment_id: String,
    pub recording_url: Option<String>,
    pub transcript: Option<String>,
    pub coach_notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// What the coach or recording pipeline reports at the end of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionReport {
    pub recording_url: Option<String>,
    pub transcript: Option<String>,
    pub coach_notes: Option<String>,
    /// The session happened but was cut short.
    pub partial: bool,
    /// The session happened but the recording bot failed to capture it.
    pub bot_failed: bool,
}

impl CompletionReport {
    fn final_status(&self) -> SessionStatus {
        if self.partial {
            SessionStatus::Partial
        } else if self.bot_failed {
            SessionStatus::BotError
        } else {
            SessionStatus::Completed
        }
    }
}

/// Persistence for captured session intelligence.
#[async_trait]
pub trait IntelligenceStore: Send + Sync {
    async fn insert(&self, intelligence: &SessionIntelligence) -> Result<()>;

    async fn list_by_enrollment(&self, enrollment_id: &str) -> Result<Vec<SessionIntelligence>>;
}

/// In-memory [`IntelligenceStore`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemoryIntelligenceStore {
    records: Arc<Mutex<Vec<SessionIntelligence>>>,
}

impl InMemoryIntelligenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntelligenceStore for InMemoryIntelligenceStore {
    async fn insert(&self, intelligence: &SessionIntelligence) -> Result<()> {
        self.records.lock().unwrap().push(intelligence.clone());
        Ok(())
    }

    async fn list_by_enrollment(&self, enrollment_id: &str) -> Result<Vec<SessionIntelligence>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }
}

/// Downstream consumer of session intelligence (analysis pipelines,
/// progress dashboards). Delivery failures are the sink's problem.
#[async_trait]
pub trait IntelligenceSink: Send + Sync {
    async fn publish(&self, intelligence: SessionIntelligence);
}

/// Publishes intelligence to the structured log.
#[derive(Default, Clone)]
pub struct TracingIntelligenceSink;

#[async_trait]
impl IntelligenceSink for TracingIntelligenceSink {
    async fn publish(&self, intelligence: SessionIntelligence) {
        tracing::info!(
            session_id = %intelligence.session_id,
            enrollment_id = %intelligence.enrollment_id,
            has_recording = intelligence.recording_url.is_some(),
            has_transcript = intelligence.transcript.is_some(),
            "Session intelligence captured"
        );
    }
}

/// Marks sessions complete and routes their artifacts.
pub struct CompletionRecorder {
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn IntelligenceStore>,
    sink: Arc<dyn IntelligenceSink>,
}

impl CompletionRecorder {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        store: Arc<dyn IntelligenceStore>,
        sink: Arc<dyn IntelligenceSink>,
    ) -> Self {
        Self {
            sessions,
            store,
            sink,
        }
    }

    /// Record a session as finished.
    ///
    /// The status transition and the intelligence row are the durable
    /// outcome; publishing to the sink happens off the request path.
    pub async fn complete(
        &self,
        session_id: &str,
        report: CompletionReport,
    ) -> Result<SessionIntelligence> {
        let session = self.sessions.get(session_id).await?.ok_or_else(|| {
            SchedulingError::SessionNotFound {
                session_id: session_id.to_string(),
            }
        })?;

        let status = report.final_status();
        if !session.status.occupies_slot() || session.status == SessionStatus::Completed {
            return Err(SchedulingError::InvalidTransition {
                session_id: session.id,
                from: session.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }

        self.sessions.set_status(&session.id, status).await?;

        let intelligence = SessionIntelligence {
            session_id: session.id.clone(),
            enrollment_id: session.enrollment_id.clone(),
            recording_url: report.recording_url,
            transcript: report.transcript,
            coach_notes: report.coach_notes,
            recorded_at: Utc::now(),
        };
        self.store.insert(&intelligence).await?;

        let sink = self.sink.clone();
        let published = intelligence.clone();
        tokio::spawn(async move {
            sink.publish(published).await;
        });

        tracing::info!(session_id = %session.id, status = %status, "Session completed");
        Ok(intelligence)
    }
}
