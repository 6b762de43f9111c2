//! Recording-bot adapter.
//!
//! The bot joins the video call to record it. Strictly best-effort: bot
//! failures are logged, they never block session creation or mutation.

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

/// External recording-bot collaborator interface.
#[async_trait]
pub trait RecordingBotClient: Send + Sync {
    /// Schedule a bot to join `meeting_url` at `scheduled_at`.
    async fn schedule(
        &self,
        session_id: &str,
        meeting_url: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<String>;

    /// Cancel a scheduled bot. Returns whether a bot was actually cancelled.
    async fn cancel(&self, bot_id: &str) -> Result<bool>;
}

#[derive(Serialize)]
struct ScheduleBotBody<'a> {
    session_id: &'a str,
    meeting_url: &'a str,
    scheduled_at: NaiveDateTime,
}

/// HTTP client for the recording-bot service.
pub struct HttpRecordingBotClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpRecordingBotClient {
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
impl RecordingBotClient for HttpRecordingBotClient {
    async fn schedule(
        &self,
        session_id: &str,
        meeting_url: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct BotResponse {
            bot_id: String,
        }

        let response: BotResponse = self
            .http
            .post(format!("{}/bots", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&ScheduleBotBody {
                session_id,
                meeting_url,
                scheduled_at,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.bot_id)
    }

    async fn cancel(&self, bot_id: &str) -> Result<bool> {
        let response = self
            .http
            .delete(format!("{}/bots/{}", self.base_url, bot_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }
}

/// In-memory bot client for tests.
#[derive(Default)]
pub struct MockRecordingBotClient {
    state: std::sync::Mutex<MockBotState>,
}

#[derive(Default)]
struct MockBotState {
    scheduled: u32,
    cancelled: Vec<String>,
    fail_all: bool,
}

impl MockRecordingBotClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, to exercise the best-effort paths.
    pub fn fail_all(&self) {
        self.state.lock().unwrap().fail_all = true;
    }

    pub fn scheduled_count(&self) -> u32 {
        self.state.lock().unwrap().scheduled
    }

    pub fn cancelled_bots(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl RecordingBotClient for MockRecordingBotClient {
    async fn schedule(
        &self,
        _session_id: &str,
        _meeting_url: &str,
        _scheduled_at: NaiveDateTime,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all {
            return Err(crate::error::CoachwayError::service_unavailable(
                "bot service down",
            ));
        }
        state.scheduled += 1;
        Ok(format!("bot-{}", state.scheduled))
    }

    async fn cancel(&self, bot_id: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all {
            return Err(crate::error::CoachwayError::service_unavailable(
                "bot service down",
            ));
        }
        state.cancelled.push(bot_id.to_string());
        Ok(true)
    }
}
