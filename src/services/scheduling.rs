use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::datetime::{format_hhmm, parse_hhmm};
use crate::models::{Booking, BookingStatus, ServiceTask};

/// Anything carrying an allocated duration in minutes.
pub trait Timed {
    fn minutes(&self) -> u32;
}

impl Timed for u32 {
    fn minutes(&self) -> u32 {
        *self
    }
}

impl Timed for ServiceTask {
    fn minutes(&self) -> u32 {
        self.duration
    }
}

/// Saturates at `u32::MAX` instead of overflowing.
fn sum_minutes(minutes: impl Iterator<Item = u32>) -> u32 {
    minutes.fold(0u32, u32::saturating_add)
}

pub fn total_booking_time<A: Timed, B: Timed>(services: &[A], additional: &[B]) -> u32 {
    sum_minutes(services.iter().map(Timed::minutes))
        .saturating_add(sum_minutes(additional.iter().map(Timed::minutes)))
}

pub fn remaining_time(tasks: &[ServiceTask]) -> u32 {
    let done = sum_minutes(tasks.iter().filter(|t| t.completed).map(|t| t.duration));
    total_booking_time(tasks, &[] as &[u32]).saturating_sub(done)
}

pub fn progress_percent(tasks: &[ServiceTask]) -> u8 {
    let total = total_booking_time(tasks, &[] as &[u32]);
    if total == 0 {
        return 0;
    }
    let done = total - remaining_time(tasks);
    ((done as u64 * 100) / total as u64) as u8
}

/// Wraps past midnight.
pub fn add_minutes(start: NaiveTime, minutes: u32) -> NaiveTime {
    start + Duration::minutes(minutes as i64)
}

/// `HH:MM` start plus hours and minutes, wrapping at 24h. `None` when the
/// start does not parse.
pub fn end_time(start: &str, hours: u32, minutes: u32) -> Option<String> {
    let start = parse_hhmm(start)?;
    Some(format_hhmm(&add_minutes(
        start,
        hours.saturating_mul(60).saturating_add(minutes),
    )))
}

/// Calendar-date equality; the time of day is ignored.
pub fn is_same_day(dt: &NaiveDateTime, day: NaiveDate) -> bool {
    dt.date() == day
}

pub fn bookings_on(bookings: &[Booking], day: NaiveDate) -> Vec<&Booking> {
    let mut matching: Vec<&Booking> = bookings.iter().filter(|b| is_same_day(&b.date, day)).collect();
    matching.sort_by_key(|b| b.start());
    matching
}

/// Explicit end time when set, otherwise start plus `default_minutes`.
pub fn booking_end(booking: &Booking, default_minutes: u32) -> NaiveTime {
    booking
        .end_time
        .unwrap_or_else(|| add_minutes(booking.start(), default_minutes))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffConflict {
    pub staff: String,
    pub booking_id: String,
    pub other_booking_id: String,
}

/// Staff members assigned to `candidate` who are also on another booking that
/// overlaps it on the same day. Cancelled bookings never conflict.
pub fn staff_conflicts(
    bookings: &[Booking],
    candidate: &Booking,
    default_minutes: u32,
) -> Vec<StaffConflict> {
    if candidate.status == BookingStatus::Cancelled {
        return vec![];
    }
    let start = candidate.start();
    let end = booking_end(candidate, default_minutes);

    let mut conflicts = vec![];
    for other in bookings_on(bookings, candidate.date.date()) {
        if other.id == candidate.id || other.status == BookingStatus::Cancelled {
            continue;
        }
        let other_start = other.start();
        let other_end = booking_end(other, default_minutes);
        // Overlap: other starts before candidate ends AND other ends after candidate starts
        if !(other_start < end && other_end > start) {
            continue;
        }
        for name in candidate.staff.iter().filter(|s| other.staff.contains(*s)) {
            conflicts.push(StaffConflict {
                staff: name.clone(),
                booking_id: candidate.id.clone(),
                other_booking_id: other.id.clone(),
            });
        }
    }
    conflicts
}
