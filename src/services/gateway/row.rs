use serde::{Deserialize, Serialize};

use crate::models::datetime::{format_hhmm, parse_date_time, parse_hhmm};
use crate::models::{Booking, BookingStatus};

/// Raw shape of a row in the hosted `bookings` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRow {
    pub id: String,
    pub customer_name: Option<String>,
    pub vehicle_type: Option<String>,
    pub package_type: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub condition: Option<i64>,
    pub staff: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub total_price: Option<f64>,
    pub additional_services: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("row {id}: missing required column {column}")]
    MissingColumn { id: String, column: &'static str },
    #[error("row {id}: unknown status {status:?}")]
    UnknownStatus { id: String, status: String },
    #[error("row {id}: invalid {column} value {value:?}")]
    InvalidValue {
        id: String,
        column: &'static str,
        value: String,
    },
    #[error("row {id}: condition {value} outside 1-10")]
    ConditionOutOfRange { id: String, value: i64 },
}

fn required(value: Option<String>, id: &str, column: &'static str) -> Result<String, DecodeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DecodeError::MissingColumn {
            id: id.to_string(),
            column,
        })
}

fn optional_time(
    value: Option<&str>,
    id: &str,
    column: &'static str,
) -> Result<Option<chrono::NaiveTime>, DecodeError> {
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => parse_hhmm(raw).map(Some).ok_or_else(|| DecodeError::InvalidValue {
            id: id.to_string(),
            column,
            value: raw.to_string(),
        }),
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = DecodeError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        if id.trim().is_empty() {
            return Err(DecodeError::MissingColumn {
                id: String::new(),
                column: "id",
            });
        }

        let customer = required(row.customer_name, &id, "customer_name")?;
        let raw_status = required(row.status, &id, "status")?;
        let status: BookingStatus = raw_status
            .parse()
            .map_err(|_| DecodeError::UnknownStatus {
                id: id.clone(),
                status: raw_status.clone(),
            })?;

        let raw_date = required(row.date, &id, "date")?;
        let mut date = parse_date_time(&raw_date).ok_or_else(|| DecodeError::InvalidValue {
            id: id.clone(),
            column: "date",
            value: raw_date.clone(),
        })?;
        if let Some(time) = optional_time(row.time.as_deref(), &id, "time")? {
            date = date.date().and_time(time);
        }

        let condition = match row.condition {
            None => None,
            Some(value @ 1..=10) => Some(value as u8),
            Some(value) => return Err(DecodeError::ConditionOutOfRange { id, value }),
        };

        let created_at = match row.created_at.as_deref().filter(|v| !v.trim().is_empty()) {
            None => None,
            Some(raw) => Some(parse_date_time(raw).ok_or_else(|| DecodeError::InvalidValue {
                id: id.clone(),
                column: "created_at",
                value: raw.to_string(),
            })?),
        };

        Ok(Booking {
            start_time: optional_time(row.start_time.as_deref(), &id, "start_time")?,
            end_time: optional_time(row.end_time.as_deref(), &id, "end_time")?,
            id,
            customer,
            vehicle: row.vehicle_type.unwrap_or_default(),
            package_type: row.package_type.unwrap_or_default(),
            date,
            location: row.location.unwrap_or_default(),
            phone: row.customer_phone,
            email: row.customer_email,
            notes: row.notes,
            status,
            condition,
            staff: row.staff.unwrap_or_default(),
            total_price: row.total_price,
            additional_services: row.additional_services.unwrap_or_default(),
            created_at,
        })
    }
}

impl From<&Booking> for BookingRow {
    fn from(b: &Booking) -> Self {
        BookingRow {
            id: b.id.clone(),
            customer_name: Some(b.customer.clone()),
            vehicle_type: Some(b.vehicle.clone()),
            package_type: Some(b.package_type.clone()),
            date: Some(b.date.format("%Y-%m-%d").to_string()),
            time: Some(format_hhmm(&b.date.time())),
            start_time: b.start_time.as_ref().map(format_hhmm),
            end_time: b.end_time.as_ref().map(format_hhmm),
            location: Some(b.location.clone()),
            customer_phone: b.phone.clone(),
            customer_email: b.email.clone(),
            notes: b.notes.clone(),
            status: Some(b.status.as_str().to_string()),
            condition: b.condition.map(i64::from),
            staff: Some(b.staff.clone()),
            created_at: b
                .created_at
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            total_price: b.total_price,
            additional_services: Some(b.additional_services.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> BookingRow {
        BookingRow {
            id: "r-1".to_string(),
            customer_name: Some("Jo Bloggs".to_string()),
            vehicle_type: Some("Ford Transit".to_string()),
            package_type: Some("interior".to_string()),
            date: Some("2024-06-01".to_string()),
            time: Some("14:30".to_string()),
            status: Some("confirmed".to_string()),
            staff: Some(vec!["Ali".to_string(), "Kim".to_string()]),
            condition: Some(7),
            total_price: Some(85.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_renames_columns() {
        let booking = Booking::try_from(row()).unwrap();
        assert_eq!(booking.customer, "Jo Bloggs");
        assert_eq!(booking.vehicle, "Ford Transit");
        assert_eq!(booking.package_type, "interior");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.date.format("%Y-%m-%d %H:%M").to_string(), "2024-06-01 14:30");
        assert_eq!(booking.staff, vec!["Ali", "Kim"]);
        assert_eq!(booking.condition, Some(7));
    }

    #[test]
    fn test_round_trip_preserves_core_fields() {
        let original = row();
        let booking = Booking::try_from(original.clone()).unwrap();
        let back = BookingRow::from(&booking);
        assert_eq!(back.customer_name, original.customer_name);
        assert_eq!(back.package_type, original.package_type);
        assert_eq!(back.status, original.status);
        assert_eq!(back.date, original.date);
        assert_eq!(back.time, original.time);
    }

    #[test]
    fn test_decode_rejects_unknown_status() {
        let mut r = row();
        r.status = Some("archived".to_string());
        assert!(matches!(
            Booking::try_from(r),
            Err(DecodeError::UnknownStatus { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_missing_customer_and_date() {
        let mut r = row();
        r.customer_name = None;
        assert!(matches!(
            Booking::try_from(r),
            Err(DecodeError::MissingColumn { column: "customer_name", .. })
        ));

        let mut r = row();
        r.date = Some("  ".to_string());
        assert!(matches!(
            Booking::try_from(r),
            Err(DecodeError::MissingColumn { column: "date", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_condition_out_of_range() {
        let mut r = row();
        r.condition = Some(0);
        assert!(matches!(
            Booking::try_from(r),
            Err(DecodeError::ConditionOutOfRange { value: 0, .. })
        ));
    }

    #[test]
    fn test_decode_from_json_with_nulls() {
        let json = r#"{"id":"r-2","customer_name":"Max","date":"2024-06-03T08:00:00","status":"pending","staff":null,"total_price":null}"#;
        let r: BookingRow = serde_json::from_str(json).unwrap();
        let booking = Booking::try_from(r).unwrap();
        assert!(booking.staff.is_empty());
        assert_eq!(booking.date.format("%H:%M").to_string(), "08:00");
    }
}
