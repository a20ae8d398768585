pub mod twilio;

use async_trait::async_trait;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

/// Used when no SMS provider is configured; messages only reach the log.
pub struct LogMessaging;

#[async_trait]
impl MessagingProvider for LogMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to, body, "SMS disabled, message not sent");
        Ok(())
    }
}
