use super::{Notification, Notifier};
use crate::error::Result;
use async_trait::async_trait;

/// Development notifier that logs instead of delivering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            template = notification.template.as_str(),
            channel = ?notification.channel,
            recipient = %notification.recipient,
            variables = ?notification.variables,
            "Notification (console backend)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Channel, NotificationTemplate};

    #[tokio::test]
    async fn test_console_notifier_always_succeeds() {
        let notification = Notification::new(
            NotificationTemplate::ScheduleConfirmed,
            Channel::Email,
            "parent@example.com",
        );
        ConsoleNotifier.send(&notification).await.unwrap();
    }
}
