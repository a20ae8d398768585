use chrono::NaiveDateTime;

use crate::models::Booking;
use crate::services::scheduling;

/// Commas, semicolons and newlines must be escaped in iCalendar text values.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

pub fn generate_ics(booking: &Booking, business_name: &str, default_minutes: u32) -> String {
    let start = booking.date.date().and_time(booking.start());
    let mut end = booking
        .date
        .date()
        .and_time(scheduling::booking_end(booking, default_minutes));
    if end <= start {
        // Job runs past midnight
        end += chrono::Duration::days(1);
    }
    let stamp: NaiveDateTime = booking.created_at.unwrap_or(start);

    let uid = format!("{}@valetdesk", booking.id);
    let summary = escape_text(&format!(
        "{} - {} ({})",
        business_name, booking.package_type, booking.customer
    ));
    let mut description = format!("Vehicle: {}\nStatus: {}", booking.vehicle, booking.status);
    if !booking.staff.is_empty() {
        description.push_str(&format!("\nStaff: {}", booking.staff.join(", ")));
    }
    if let Some(notes) = booking.notes.as_deref() {
        description.push_str(&format!("\nNotes: {notes}"));
    }

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Valetdesk//Planner//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{}\r\n\
         DTSTART:{}\r\n\
         DTEND:{}\r\n\
         SUMMARY:{summary}\r\n\
         LOCATION:{}\r\n\
         DESCRIPTION:{}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        stamp.format("%Y%m%dT%H%M%S"),
        start.format("%Y%m%dT%H%M%S"),
        end.format("%Y%m%dT%H%M%S"),
        escape_text(&booking.location),
        escape_text(&description),
    )
}
