//! Idempotent session-event dispatch.
//!
//! Events arrive as JSON envelopes (`event` name plus a payload) from
//! upstream automation. The orchestrator validates the declared identifier
//! fields, fingerprints the request, short-circuits replays from the cache,
//! and otherwise routes to a registered handler.
//!
//! Dispatch never surfaces handler problems as transport errors: unknown
//! events, missing fields, and handler failures all come back as a
//! `DispatchResult` with `success: false`, so upstream retry machinery can
//! tell "processed, and it failed" apart from "never reached us".

use crate::cache::{Cache, CacheExt};
use crate::config::OrchestratorConfig;
use crate::enrollment::{CoachStore, EnrollmentStore};
use crate::error::Result;
use crate::notify::Notifier;
use crate::scheduling::bot::RecordingBotClient;
use crate::scheduling::calendar::CalendarClient;
use crate::scheduling::error::SchedulingError;
use crate::scheduling::generator::ScheduleGenerator;
use crate::scheduling::session::SessionStore;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

/// Shared dependencies handed to every event handler.
pub struct SchedulingContext {
    pub enrollments: Arc<dyn EnrollmentStore>,
    pub coaches: Arc<dyn CoachStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub calendar: Arc<dyn CalendarClient>,
    pub bot: Arc<dyn RecordingBotClient>,
    pub notifier: Arc<dyn Notifier>,
    pub generator: ScheduleGenerator,
}

/// Boxed async handler: payload in, result payload out.
pub type EventHandler = Arc<
    dyn Fn(Value, Arc<SchedulingContext>) -> BoxFuture<'static, Result<Value>> + Send + Sync,
>;

/// Outcome envelope returned for every dispatch, cached for replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    fn ok(event: &str, data: Value) -> Self {
        Self {
            success: true,
            event: event.to_string(),
            data: Some(data),
            error: None,
        }
    }

    fn failed(event: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            event: event.to_string(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Identifier fields that must be present, per event. `requestId` is
/// required on every event; it feeds replay detection but is excluded from
/// the fingerprint so that upstream retries with fresh request ids still
/// hit the cache.
fn required_fields(event: &str) -> Option<&'static [&'static str]> {
    match event {
        "session.cancel" | "session.no_show" => Some(&["sessionId"]),
        "session.reschedule" => Some(&["sessionId", "newDate", "newTime"]),
        "coach.unavailable" | "coach.return" | "coach.exit" => Some(&["coachId"]),
        "enrollment.schedule_sessions" => Some(&["enrollmentId"]),
        _ => None,
    }
}

/// Routes session events to handlers with cache-backed idempotency.
pub struct EventOrchestrator {
    handlers: HashMap<String, EventHandler>,
    context: Arc<SchedulingContext>,
    cache: Arc<dyn Cache>,
    config: OrchestratorConfig,
}

impl EventOrchestrator {
    #[must_use]
    pub fn new(
        context: Arc<SchedulingContext>,
        cache: Arc<dyn Cache>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            handlers: HashMap::new(),
            context,
            cache,
            config,
        }
    }

    /// Register a handler for an event name, replacing any previous one.
    pub fn register<F>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn(Value, Arc<SchedulingContext>) -> BoxFuture<'static, Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(event.into(), Arc::new(handler));
    }

    #[must_use]
    pub fn registered_events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        events
    }

    /// Dispatch one event envelope.
    ///
    /// Validation failures and handler errors come back as unsuccessful
    /// [`DispatchResult`]s; an `Err` from this method means the envelope
    /// itself was unusable.
    pub async fn dispatch(&self, event: &str, payload: Value) -> Result<DispatchResult> {
        // Recognize the event before inspecting its fields; an unknown event
        // must never be reported as a missing-field problem.
        let Some(handler) = self.handlers.get(event) else {
            let err = SchedulingError::UnknownEvent {
                event: event.to_string(),
            };
            tracing::warn!(event, "Rejecting unknown event");
            return Ok(DispatchResult::failed(event, err.to_string()));
        };

        for field in ["requestId"]
            .iter()
            .chain(required_fields(event).unwrap_or_default())
        {
            if !has_field(&payload, field) {
                let err = SchedulingError::MissingField {
                    field: field.to_string(),
                };
                tracing::warn!(event, field = %field, "Rejecting event with missing field");
                return Ok(DispatchResult::failed(event, err.to_string()));
            }
        }

        let key = self.fingerprint(event, &payload);

        // Cache problems degrade to a miss; idempotency is best-effort when
        // the cache is down, never a reason to drop the event.
        match self.cache.get::<DispatchResult>(&key).await {
            Ok(Some(cached)) => {
                tracing::info!(event, fingerprint = %key, "Replayed cached dispatch result");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(event, error = %e, "Idempotency cache lookup failed");
            }
        }

        let result = match handler(payload, self.context.clone()).await {
            Ok(data) => DispatchResult::ok(event, data),
            Err(e) => {
                tracing::warn!(event, error = %e, "Event handler failed");
                DispatchResult::failed(event, e.to_string())
            }
        };

        let ttl = if result.success {
            Some(Duration::from_secs(self.config.success_ttl_secs))
        } else {
            self.config.failure_ttl_secs.map(Duration::from_secs)
        };
        if let Some(ttl) = ttl {
            if let Err(e) = self.cache.set(&key, &result, Some(ttl)).await {
                tracing::warn!(event, error = %e, "Failed to cache dispatch result");
            }
        }

        Ok(result)
    }

    /// Stable key over the event name and its declared identifier fields.
    /// `requestId` is deliberately left out so retried deliveries of the
    /// same logical operation collapse to one execution.
    fn fingerprint(&self, event: &str, payload: &Value) -> String {
        let mut hasher = DefaultHasher::new();
        event.hash(&mut hasher);
        if let Some(fields) = required_fields(event) {
            for field in fields {
                if let Some(v) = payload.get(field) {
                    field.hash(&mut hasher);
                    v.to_string().hash(&mut hasher);
                }
            }
        }
        format!("dispatch:{}:{:016x}", event, hasher.finish())
    }
}

fn has_field(payload: &Value, field: &str) -> bool {
    match payload.get(field) {
        Some(Value::Null) | None => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
