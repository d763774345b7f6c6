use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Availability, Service, Stylist};

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, salon_id, name, description, duration_minutes, price_cents, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.id,
            service.salon_id,
            service.name,
            service.description,
            service.duration_minutes,
            service.price_cents,
            service.is_active,
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, duration_minutes = ?3, price_cents = ?4, is_active = ?5
         WHERE id = ?6",
        params![
            service.name,
            service.description,
            service.duration_minutes,
            service.price_cents,
            service.is_active,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            "SELECT id, salon_id, name, description, duration_minutes, price_cents, is_active
             FROM services WHERE id = ?1",
            params![id],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

pub fn list_services(conn: &Connection, salon_id: &str, active_only: bool) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, salon_id, name, description, duration_minutes, price_cents, is_active
         FROM services WHERE salon_id = ?1 AND (?2 = 0 OR is_active = 1)
         ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![salon_id, active_only], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        salon_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        price_cents: row.get(5)?,
        is_active: row.get(6)?,
    })
}

// ── Stylists ──

pub fn create_stylist(conn: &Connection, stylist: &Stylist) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO stylists (id, salon_id, name, specialty, buffer_minutes, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stylist.id,
            stylist.salon_id,
            stylist.name,
            stylist.specialty,
            stylist.buffer_minutes,
            stylist.is_active,
        ],
    )?;
    Ok(())
}

pub fn update_stylist(conn: &Connection, stylist: &Stylist) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE stylists SET name = ?1, specialty = ?2, buffer_minutes = ?3, is_active = ?4 WHERE id = ?5",
        params![
            stylist.name,
            stylist.specialty,
            stylist.buffer_minutes,
            stylist.is_active,
            stylist.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_stylist(conn: &Connection, id: &str) -> anyhow::Result<Option<Stylist>> {
    let stylist = conn
        .query_row(
            "SELECT id, salon_id, name, specialty, buffer_minutes, is_active FROM stylists WHERE id = ?1",
            params![id],
            parse_stylist_row,
        )
        .optional()?;
    Ok(stylist)
}

pub fn list_stylists(conn: &Connection, salon_id: &str, active_only: bool) -> anyhow::Result<Vec<Stylist>> {
    let mut stmt = conn.prepare(
        "SELECT id, salon_id, name, specialty, buffer_minutes, is_active
         FROM stylists WHERE salon_id = ?1 AND (?2 = 0 OR is_active = 1)
         ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![salon_id, active_only], parse_stylist_row)?;

    let mut stylists = vec![];
    for row in rows {
        stylists.push(row?);
    }
    Ok(stylists)
}

fn parse_stylist_row(row: &rusqlite::Row) -> rusqlite::Result<Stylist> {
    Ok(Stylist {
        id: row.get(0)?,
        salon_id: row.get(1)?,
        name: row.get(2)?,
        specialty: row.get(3)?,
        buffer_minutes: row.get(4)?,
        is_active: row.get(5)?,
    })
}

// ── Availability ──

pub fn get_availability(
    conn: &Connection,
    stylist_id: &str,
    day_of_week: u8,
) -> anyhow::Result<Option<Availability>> {
    let availability = conn
        .query_row(
            "SELECT stylist_id, day_of_week, start_time, end_time, is_available
             FROM availabilities WHERE stylist_id = ?1 AND day_of_week = ?2",
            params![stylist_id, day_of_week],
            parse_availability_row,
        )
        .optional()?;
    Ok(availability)
}

pub fn list_availability(conn: &Connection, stylist_id: &str) -> anyhow::Result<Vec<Availability>> {
    let mut stmt = conn.prepare(
        "SELECT stylist_id, day_of_week, start_time, end_time, is_available
         FROM availabilities WHERE stylist_id = ?1 ORDER BY day_of_week ASC",
    )?;
    let rows = stmt.query_map(params![stylist_id], parse_availability_row)?;

    let mut days = vec![];
    for row in rows {
        days.push(row?);
    }
    Ok(days)
}

/// Replaces the whole weekly schedule of a stylist in one transaction.
pub fn replace_availability(
    conn: &Connection,
    stylist_id: &str,
    days: &[Availability],
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM availabilities WHERE stylist_id = ?1",
        params![stylist_id],
    )?;
    for day in days {
        tx.execute(
            "INSERT INTO availabilities (stylist_id, day_of_week, start_time, end_time, is_available)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stylist_id,
                day.day_of_week,
                day.start_time,
                day.end_time,
                day.is_available,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn parse_availability_row(row: &rusqlite::Row) -> rusqlite::Result<Availability> {
    Ok(Availability {
        stylist_id: row.get(0)?,
        day_of_week: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        is_available: row.get(4)?,
    })
}
