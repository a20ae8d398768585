use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::datetime::{date_time, opt_date_time, opt_hhmm};
use super::BookingStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub package_type: String,
    #[serde(with = "date_time")]
    pub date: NaiveDateTime,
    #[serde(default, with = "opt_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "opt_hhmm")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub condition: Option<u8>,
    #[serde(default)]
    pub staff: Vec<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub additional_services: Vec<String>,
    #[serde(default, with = "opt_date_time")]
    pub created_at: Option<NaiveDateTime>,
}

/// The two local lists a booking can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Pending,
    Confirmed,
}

impl Booking {
    pub fn with_status(&self, status: BookingStatus) -> Booking {
        Booking {
            status,
            ..self.clone()
        }
    }

    /// Explicit start time if one was set, otherwise the time of day of `date`.
    pub fn start(&self) -> NaiveTime {
        self.start_time.unwrap_or_else(|| self.date.time())
    }

    /// Cancelled bookings are not listed in either local bucket.
    pub fn bucket(&self) -> Option<Bucket> {
        match self.status {
            BookingStatus::Pending => Some(Bucket::Pending),
            BookingStatus::Cancelled => None,
            _ => Some(Bucket::Confirmed),
        }
    }
}

// ── Intake ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub package_type: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub condition: Option<u8>,
    #[serde(default)]
    pub staff: Vec<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub additional_services: Vec<String>,
}

impl NewBooking {
    /// Checks the submission and builds a pending booking. Nothing is
    /// persisted when this fails.
    pub fn into_booking(self, id: String, now: NaiveDateTime) -> Result<Booking, String> {
        let mut missing = vec![];
        if self.customer.trim().is_empty() {
            missing.push("customer");
        }
        if self.vehicle.trim().is_empty() {
            missing.push("vehicle");
        }
        if self.package_type.trim().is_empty() {
            missing.push("packageType");
        }
        if self.date.trim().is_empty() {
            missing.push("date");
        }
        let has_contact = [&self.phone, &self.email]
            .iter()
            .any(|c| c.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !has_contact {
            missing.push("phone or email");
        }
        if !missing.is_empty() {
            return Err(format!("missing required fields: {}", missing.join(", ")));
        }

        let date = super::datetime::parse_date_time(&self.date)
            .ok_or_else(|| format!("invalid date: {}", self.date))?;
        let start_time = parse_optional_time(self.start_time.as_deref(), "startTime")?;
        let end_time = parse_optional_time(self.end_time.as_deref(), "endTime")?;

        if let Some(score) = self.condition {
            if !(1..=10).contains(&score) {
                return Err(format!("condition must be between 1 and 10, got {score}"));
            }
        }
        if let Some(price) = self.total_price {
            if price < 0.0 {
                return Err("totalPrice cannot be negative".to_string());
            }
        }

        Ok(Booking {
            id,
            customer: self.customer.trim().to_string(),
            vehicle: self.vehicle.trim().to_string(),
            package_type: self.package_type.trim().to_string(),
            date,
            start_time,
            end_time,
            location: self.location.trim().to_string(),
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            email: self.email.filter(|e| !e.trim().is_empty()),
            notes: self.notes,
            status: BookingStatus::Pending,
            condition: self.condition,
            staff: self.staff,
            total_price: self.total_price,
            additional_services: self.additional_services,
            created_at: Some(now),
        })
    }
}

fn parse_optional_time(raw: Option<&str>, field: &str) -> Result<Option<NaiveTime>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => super::datetime::parse_hhmm(s)
            .map(Some)
            .ok_or_else(|| format!("invalid {field}: {s}")),
    }
}
