use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub local_store_url: String,
    pub admin_token: String,
    pub remote_url: Option<String>,
    pub remote_api_key: String,
    pub remote_poll_secs: u64,
    pub refresh_throttle_ms: u64,
    pub default_job_minutes: u32,
    pub business_name: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "valetdesk.db".to_string()),
            local_store_url: env::var("LOCAL_STORE_URL")
                .unwrap_or_else(|_| "valetdesk-local.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            remote_url: env::var("REMOTE_URL").ok().filter(|v| !v.is_empty()),
            remote_api_key: env::var("REMOTE_API_KEY").unwrap_or_default(),
            remote_poll_secs: env::var("REMOTE_POLL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            refresh_throttle_ms: env::var("REFRESH_THROTTLE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            default_job_minutes: env::var("DEFAULT_JOB_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Valeting".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
        }
    }

    pub fn refresh_throttle(&self) -> Duration {
        Duration::from_millis(self.refresh_throttle_ms)
    }

    pub fn remote_poll_interval(&self) -> Duration {
        Duration::from_secs(self.remote_poll_secs.max(1))
    }

    pub fn sms_enabled(&self) -> bool {
        !self.twilio_account_sid.is_empty() && !self.twilio_phone_number.is_empty()
    }
}
