use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::date_time;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub booking_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(with = "date_time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub booking_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}
