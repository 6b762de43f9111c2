//! Calendar/meeting adapter.
//!
//! The engine depends on, but does not implement, an external calendar with
//! attached video meetings. Updates and cancellations are idempotent per
//! event id; creation is NOT — every create books a new event, so callers
//! must not blind-retry an uncertain create (duplicate-booking risk is
//! accepted and reported instead).

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A request to book one calendar event with a meeting link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub attendees: Vec<String>,
    pub organizer_email: String,
}

/// Handle returned by a successful booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventHandle {
    pub event_id: String,
    pub meeting_link: String,
}

/// Partial update to an existing event. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarEventChanges {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub location: Option<String>,
    /// Strip the attached video meeting from the event.
    pub remove_meet: bool,
}

/// External calendar collaborator interface.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Book a new event. Not idempotent.
    async fn create_event(&self, request: &CalendarEventRequest) -> Result<CalendarEventHandle>;

    /// Apply changes to an existing event. Idempotent per event id.
    async fn update_event(&self, event_id: &str, changes: &CalendarEventChanges) -> Result<()>;

    /// Cancel an event. Idempotent; cancelling a missing event is a no-op.
    async fn cancel_event(&self, event_id: &str) -> Result<()>;
}

/// HTTP client for a calendar bridge service.
///
/// Expects a service exposing `POST /events`, `PATCH /events/{id}`, and
/// `DELETE /events/{id}`, authenticated with a bearer token.
pub struct HttpCalendarClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpCalendarClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl CalendarClient for HttpCalendarClient {
    async fn create_event(&self, request: &CalendarEventRequest) -> Result<CalendarEventHandle> {
        let response = self
            .http
            .post(format!("{}/events", self.base_url))
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let handle: CalendarEventHandle = response.json().await?;
        tracing::debug!(event_id = %handle.event_id, "Calendar event created");
        Ok(handle)
    }

    async fn update_event(&self, event_id: &str, changes: &CalendarEventChanges) -> Result<()> {
        self.http
            .patch(format!("{}/events/{}", self.base_url, event_id))
            .bearer_auth(&self.api_token)
            .json(changes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn cancel_event(&self, event_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/events/{}", self.base_url, event_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        // Already-gone events are a successful cancel.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }
}

/// Scriptable in-memory calendar for tests.
///
/// Records every call, hands out sequential event ids, and can be told to
/// fail specific create calls by 1-based call index.
#[derive(Default)]
pub struct MockCalendarClient {
    state: std::sync::Mutex<MockCalendarState>,
}

#[derive(Default)]
struct MockCalendarState {
    create_calls: u32,
    fail_creates_at: Vec<u32>,
    created: Vec<CalendarEventRequest>,
    updated: Vec<String>,
    cancelled: Vec<String>,
}

impl MockCalendarClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the nth create call (1-based).
    pub fn fail_create_at(&self, call_index: u32) {
        self.state.lock().unwrap().fail_creates_at.push(call_index);
    }

    pub fn create_count(&self) -> u32 {
        self.state.lock().unwrap().create_calls
    }

    pub fn cancelled_events(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn updated_events(&self) -> Vec<String> {
        self.state.lock().unwrap().updated.clone()
    }
}

#[async_trait]
impl CalendarClient for MockCalendarClient {
    async fn create_event(&self, request: &CalendarEventRequest) -> Result<CalendarEventHandle> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        let call = state.create_calls;

        if state.fail_creates_at.contains(&call) {
            return Err(crate::error::CoachwayError::service_unavailable(format!(
                "calendar create failed (call {})",
                call
            )));
        }

        state.created.push(request.clone());
        Ok(CalendarEventHandle {
            event_id: format!("evt-{}", call),
            meeting_link: format!("https://meet.example.com/{}", call),
        })
    }

    async fn update_event(&self, event_id: &str, _changes: &CalendarEventChanges) -> Result<()> {
        self.state.lock().unwrap().updated.push(event_id.to_string());
        Ok(())
    }

    async fn cancel_event(&self, event_id: &str) -> Result<()> {
        self.state.lock().unwrap().cancelled.push(event_id.to_string());
        Ok(())
    }
}
