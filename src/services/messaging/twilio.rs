use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;
use crate::config::AppConfig;

pub struct TwilioSmsProvider {
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl TwilioSmsProvider {
    /// `None` unless both the account SID and sender number are set.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.sms_enabled() {
            return None;
        }
        Some(Self {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_phone_number.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

#[async_trait]
impl MessagingProvider for TwilioSmsProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .with_context(|| format!("failed to send SMS to {to}"))?
            .error_for_status()
            .context("SMS provider rejected the message")?;

        tracing::info!(to, "SMS sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sid: &str, number: &str) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.twilio_account_sid = sid.to_string();
        config.twilio_auth_token = "token".to_string();
        config.twilio_phone_number = number.to_string();
        config
    }

    #[test]
    fn test_disabled_without_credentials() {
        assert!(TwilioSmsProvider::from_config(&config("", "+447700900000")).is_none());
        assert!(TwilioSmsProvider::from_config(&config("AC123", "")).is_none());
    }

    #[test]
    fn test_messages_url() {
        let provider = TwilioSmsProvider::from_config(&config("AC123", "+447700900000")).unwrap();
        assert_eq!(
            provider.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
