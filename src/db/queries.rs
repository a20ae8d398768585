use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::Invoice;
use crate::services::gateway::BookingRow;

const BOOKING_COLUMNS: &str = "id, customer_name, vehicle_type, package_type, date, time, start_time, end_time, \
     location, customer_phone, customer_email, notes, status, condition, staff, created_at, total_price, \
     additional_services";

// ── Bookings ──

pub fn select_bookings(
    conn: &Connection,
    statuses: Option<&[&str]>,
) -> anyhow::Result<Vec<BookingRow>> {
    let sql = match statuses {
        Some(list) if !list.is_empty() => {
            let placeholders = (1..=list.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status IN ({placeholders}) ORDER BY date ASC, time ASC"
            )
        }
        _ => format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date ASC, time ASC"),
    };

    let mut stmt = conn.prepare(&sql)?;
    let bind: Vec<&str> = statuses.unwrap_or(&[]).to_vec();
    let rows = stmt.query_map(params_from_iter(bind.iter()), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingRow>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn insert_booking(conn: &Connection, row: &BookingRow) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            row.id,
            row.customer_name,
            row.vehicle_type.as_deref().unwrap_or_default(),
            row.package_type.as_deref().unwrap_or_default(),
            row.date,
            row.time,
            row.start_time,
            row.end_time,
            row.location.as_deref().unwrap_or_default(),
            row.customer_phone,
            row.customer_email,
            row.notes,
            row.status.as_deref().unwrap_or("pending"),
            row.condition,
            serde_json::to_string(row.staff.as_deref().unwrap_or_default())?,
            row.created_at,
            row.total_price,
            serde_json::to_string(row.additional_services.as_deref().unwrap_or_default())?,
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, row: &BookingRow) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            customer_name = ?2, vehicle_type = ?3, package_type = ?4, date = ?5, time = ?6,
            start_time = ?7, end_time = ?8, location = ?9, customer_phone = ?10,
            customer_email = ?11, notes = ?12, status = ?13, condition = ?14, staff = ?15,
            total_price = ?16, additional_services = ?17
         WHERE id = ?1",
        params![
            row.id,
            row.customer_name,
            row.vehicle_type.as_deref().unwrap_or_default(),
            row.package_type.as_deref().unwrap_or_default(),
            row.date,
            row.time,
            row.start_time,
            row.end_time,
            row.location.as_deref().unwrap_or_default(),
            row.customer_phone,
            row.customer_email,
            row.notes,
            row.status.as_deref().unwrap_or("pending"),
            row.condition,
            serde_json::to_string(row.staff.as_deref().unwrap_or_default())?,
            row.total_price,
            serde_json::to_string(row.additional_services.as_deref().unwrap_or_default())?,
        ],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<BookingRow> {
    let staff_json: Option<String> = row.get(14)?;
    let services_json: Option<String> = row.get(17)?;

    Ok(BookingRow {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        vehicle_type: row.get(2)?,
        package_type: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        location: row.get(8)?,
        customer_phone: row.get(9)?,
        customer_email: row.get(10)?,
        notes: row.get(11)?,
        status: row.get(12)?,
        condition: row.get(13)?,
        staff: staff_json.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(15)?,
        total_price: row.get(16)?,
        additional_services: services_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

// ── Invoices ──

pub fn list_invoices(conn: &Connection) -> anyhow::Result<Vec<Invoice>> {
    let mut stmt = conn.prepare("SELECT id, booking_id, amount, paid FROM invoices ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Invoice {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            amount: row.get(2)?,
            paid: row.get::<_, i64>(3)? != 0,
        })
    })?;

    let mut invoices = vec![];
    for row in rows {
        invoices.push(row?);
    }
    Ok(invoices)
}

pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO invoices (id, booking_id, amount, paid) VALUES (?1, ?2, ?3, ?4)",
        params![invoice.id, invoice.booking_id, invoice.amount, invoice.paid as i64],
    )?;
    Ok(())
}

pub fn set_invoice_paid(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("UPDATE invoices SET paid = 1 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Local Store ──

pub fn get_value(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM local_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn put_value(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO local_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_value(conn: &Connection, key: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM local_store WHERE key = ?1", params![key])?;
    Ok(count > 0)
}
