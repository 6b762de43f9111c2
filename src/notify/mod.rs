//! Notifications.
//!
//! Template-based parent/coach notifications over email or WhatsApp. From the
//! scheduling core's perspective these are strictly fire-and-forget: a
//! delivery failure is logged and never fails the owning operation. Delivery
//! mechanics live behind the [`Notifier`] trait; a console backend is
//! provided for development.

mod console;

pub use console::ConsoleNotifier;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Whatsapp,
}

/// Named message templates. The rendering (copy, layout) belongs to the
/// delivery service; the core only picks the template and fills variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    ScheduleConfirmed,
    SessionCancelled,
    SessionRescheduled,
    SessionCompleted,
    NoShowFollowUp,
    CoachReassigned,
}

impl NotificationTemplate {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleConfirmed => "schedule_confirmed",
            Self::SessionCancelled => "session_cancelled",
            Self::SessionRescheduled => "session_rescheduled",
            Self::SessionCompleted => "session_completed",
            Self::NoShowFollowUp => "no_show_follow_up",
            Self::CoachReassigned => "coach_reassigned",
        }
    }
}

/// One notification to send.
#[derive(Debug, Clone)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub channel: Channel,
    pub recipient: String,
    pub variables: HashMap<String, String>,
}

impl Notification {
    pub fn new(
        template: NotificationTemplate,
        channel: Channel,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            template,
            channel,
            recipient: recipient.into(),
            variables: HashMap::new(),
        }
    }

    /// Add a template variable.
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// Notification delivery backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Send without letting a delivery failure propagate.
///
/// This is the only way the scheduling core sends notifications.
pub async fn send_best_effort(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification).await {
        tracing::warn!(
            template = notification.template.as_str(),
            recipient = %notification.recipient,
            error = %e,
            "Notification delivery failed; continuing"
        );
    }
}
