use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Salon, SalonImage};

const SALON_SELECT: &str = "SELECT s.id, s.owner_id, s.name, s.address, s.city, s.phone, s.description, s.is_active,
        (SELECT AVG(r.rating) FROM reviews r WHERE r.salon_id = s.id),
        (SELECT COUNT(*) FROM reviews r WHERE r.salon_id = s.id),
        s.created_at, s.updated_at
     FROM salons s";

pub fn create_salon(conn: &Connection, salon: &Salon) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO salons (id, owner_id, name, address, city, phone, description, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            salon.id,
            salon.owner_id,
            salon.name,
            salon.address,
            salon.city,
            salon.phone,
            salon.description,
            salon.is_active,
        ],
    )?;
    Ok(())
}

pub fn update_salon(conn: &Connection, salon: &Salon) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE salons SET name = ?1, address = ?2, city = ?3, phone = ?4, description = ?5,
            updated_at = datetime('now')
         WHERE id = ?6",
        params![
            salon.name,
            salon.address,
            salon.city,
            salon.phone,
            salon.description,
            salon.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_salon(conn: &Connection, id: &str) -> anyhow::Result<Option<Salon>> {
    let sql = format!("{SALON_SELECT} WHERE s.id = ?1");
    let salon = conn
        .query_row(&sql, params![id], parse_salon_row)
        .optional()?;
    Ok(salon)
}

/// Public discovery: active salons only, optionally filtered by city and a
/// free-text match on name or description.
pub fn list_active_salons(
    conn: &Connection,
    city: Option<&str>,
    search: Option<&str>,
) -> anyhow::Result<Vec<Salon>> {
    let pattern = search.map(|q| format!("%{q}%"));
    let sql = format!(
        "{SALON_SELECT}
         WHERE s.is_active = 1
           AND (?1 IS NULL OR s.city = ?1 COLLATE NOCASE)
           AND (?2 IS NULL OR s.name LIKE ?2 OR s.description LIKE ?2)
         ORDER BY s.name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![city, pattern], parse_salon_row)?;

    let mut salons = vec![];
    for row in rows {
        salons.push(row?);
    }
    Ok(salons)
}

pub fn list_salons_by_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Salon>> {
    let sql = format!("{SALON_SELECT} WHERE s.owner_id = ?1 ORDER BY s.created_at ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], parse_salon_row)?;

    let mut salons = vec![];
    for row in rows {
        salons.push(row?);
    }
    Ok(salons)
}

pub fn list_all_salons(conn: &Connection) -> anyhow::Result<Vec<Salon>> {
    let sql = format!("{SALON_SELECT} ORDER BY s.created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], parse_salon_row)?;

    let mut salons = vec![];
    for row in rows {
        salons.push(row?);
    }
    Ok(salons)
}

pub fn set_salon_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE salons SET is_active = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![active, id],
    )?;
    Ok(count > 0)
}

fn parse_salon_row(row: &rusqlite::Row) -> rusqlite::Result<Salon> {
    Ok(Salon {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        phone: row.get(5)?,
        description: row.get(6)?,
        is_active: row.get(7)?,
        average_rating: row.get(8)?,
        review_count: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

// ── Images ──

pub fn add_salon_image(conn: &Connection, image: &SalonImage) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO salon_images (id, salon_id, url, position) VALUES (?1, ?2, ?3, ?4)",
        params![image.id, image.salon_id, image.url, image.position],
    )?;
    Ok(())
}

pub fn next_image_position(conn: &Connection, salon_id: &str) -> anyhow::Result<i64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM salon_images WHERE salon_id = ?1",
        params![salon_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

pub fn delete_salon_image(conn: &Connection, salon_id: &str, image_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM salon_images WHERE id = ?1 AND salon_id = ?2",
        params![image_id, salon_id],
    )?;
    Ok(count > 0)
}

pub fn list_salon_images(conn: &Connection, salon_id: &str) -> anyhow::Result<Vec<SalonImage>> {
    let mut stmt = conn.prepare(
        "SELECT id, salon_id, url, position FROM salon_images WHERE salon_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![salon_id], |row| {
        Ok(SalonImage {
            id: row.get(0)?,
            salon_id: row.get(1)?,
            url: row.get(2)?,
            position: row.get(3)?,
        })
    })?;

    let mut images = vec![];
    for row in rows {
        images.push(row?);
    }
    Ok(images)
}
