use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::date_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoKind {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    pub booking_id: String,
    #[serde(rename = "type")]
    pub kind: PhotoKind,
    /// URL or data URI of the image.
    pub image: String,
    #[serde(with = "date_time")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
}
