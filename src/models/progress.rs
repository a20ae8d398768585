use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::opt_date_time;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTask {
    pub id: String,
    pub name: String,
    /// Allocated minutes.
    pub duration: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub actual_duration: Option<u32>,
    #[serde(default, with = "opt_date_time")]
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProgress {
    pub booking_id: String,
    #[serde(default)]
    pub tasks: Vec<ServiceTask>,
    #[serde(default, with = "opt_date_time")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, with = "opt_date_time")]
    pub updated_at: Option<NaiveDateTime>,
}

impl ServiceProgress {
    pub fn new(booking_id: impl Into<String>, tasks: Vec<ServiceTask>, now: NaiveDateTime) -> Self {
        Self {
            booking_id: booking_id.into(),
            tasks,
            started_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn is_done(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed)
    }
}
