use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingStatus};

const BOOKING_SELECT: &str = "SELECT r.id, r.client_id, r.salon_id, r.stylist_id, r.date, r.start_time, r.end_time,
        r.status, r.total_price_cents, r.total_duration_minutes, r.deposit_required, r.notes,
        r.payment_method, r.paid_amount_cents,
        (SELECT GROUP_CONCAT(rs.service_id) FROM rendezvous_services rs WHERE rs.rendezvous_id = r.id),
        r.created_at, r.updated_at
     FROM rendezvous r";

/// Inserts the booking row and its service associations. Callers run this
/// inside the transaction that re-checked the slot.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let updated_at = booking.updated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO rendezvous (id, client_id, salon_id, stylist_id, date, start_time, end_time, status,
            total_price_cents, total_duration_minutes, deposit_required, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.client_id,
            booking.salon_id,
            booking.stylist_id,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.status.as_str(),
            booking.total_price_cents,
            booking.total_duration_minutes,
            booking.deposit_required,
            booking.notes,
            created_at,
            updated_at,
        ],
    )?;

    for service_id in &booking.service_ids {
        conn.execute(
            "INSERT INTO rendezvous_services (rendezvous_id, service_id) VALUES (?1, ?2)",
            params![booking.id, service_id],
        )?;
    }
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("{BOOKING_SELECT} WHERE r.id = ?1");
    let booking = conn
        .query_row(&sql, params![id], parse_booking_row)
        .optional()?;
    Ok(booking)
}

/// Pending and confirmed bookings of a stylist on one date, earliest first.
pub fn get_occupying_bookings(
    conn: &Connection,
    stylist_id: &str,
    date: &str,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "{BOOKING_SELECT}
         WHERE r.stylist_id = ?1 AND r.date = ?2 AND r.status IN ('PENDING', 'CONFIRMED')
         ORDER BY r.start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![stylist_id, date], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn list_bookings_for_client(conn: &Connection, client_id: &str) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "{BOOKING_SELECT} WHERE r.client_id = ?1 ORDER BY r.date DESC, r.start_time DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![client_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn list_bookings_for_salon(
    conn: &Connection,
    salon_id: &str,
    date: Option<&str>,
    status: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "{BOOKING_SELECT}
         WHERE r.salon_id = ?1
           AND (?2 IS NULL OR r.date = ?2)
           AND (?3 IS NULL OR r.status = ?3)
         ORDER BY r.date ASC, r.start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![salon_id, date, status.map(|s| s.as_str())],
        parse_booking_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE rendezvous SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn record_payment(
    conn: &Connection,
    id: &str,
    payment_method: &str,
    paid_amount_cents: i64,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rendezvous SET payment_method = ?1, paid_amount_cents = ?2 WHERE id = ?3",
        params![payment_method, paid_amount_cents, id],
    )?;
    Ok(count > 0)
}

pub fn count_client_bookings(conn: &Connection, client_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rendezvous WHERE client_id = ?1",
        params![client_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn has_completed_booking_at_salon(
    conn: &Connection,
    client_id: &str,
    salon_id: &str,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rendezvous WHERE client_id = ?1 AND salon_id = ?2 AND status = 'COMPLETED'",
        params![client_id, salon_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(7)?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;
    let service_ids: Option<String> = row.get(14)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        client_id: row.get(1)?,
        salon_id: row.get(2)?,
        stylist_id: row.get(3)?,
        date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        status,
        total_price_cents: row.get(8)?,
        total_duration_minutes: row.get(9)?,
        deposit_required: row.get(10)?,
        notes: row.get(11)?,
        payment_method: row.get(12)?,
        paid_amount_cents: row.get(13)?,
        service_ids: service_ids
            .map(|ids| ids.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        created_at,
        updated_at,
    })
}
