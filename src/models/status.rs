use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Inspecting,
    Inspected,
    InProgress,
    Completed,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0:?}")]
pub struct UnknownStatus(pub String);

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Inspecting,
        BookingStatus::Inspected,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Finished,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Inspecting => "inspecting",
            BookingStatus::Inspected => "inspected",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Finished => "finished",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Lenient parse used on the local path: anything outside the vocabulary
    /// becomes `Pending`.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or(BookingStatus::Pending)
    }

    /// User-facing message shown after a successful transition into this status.
    pub fn transition_message(&self) -> String {
        match self {
            BookingStatus::Confirmed => "Booking confirmed".to_string(),
            BookingStatus::Inspecting => "Pre-inspection started".to_string(),
            BookingStatus::Inspected => "Pre-inspection complete".to_string(),
            BookingStatus::InProgress => "Job started".to_string(),
            BookingStatus::Finished => "Job finished".to_string(),
            BookingStatus::Cancelled => "Booking cancelled".to_string(),
            other => format!("Status updated to {}", other.as_str()),
        }
    }
}

/// Normalizes an arbitrary status string to a member of the vocabulary.
pub fn validate_status(s: &str) -> &'static str {
    BookingStatus::parse(s).as_str()
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BookingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(BookingStatus::parse).unwrap_or(BookingStatus::Pending))
    }
}
