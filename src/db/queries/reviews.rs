use rusqlite::{params, Connection};

use crate::models::{Favorite, Review};

// ── Reviews ──

pub fn create_review(conn: &Connection, review: &Review) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, salon_id, client_id, rating, comment) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            review.id,
            review.salon_id,
            review.client_id,
            review.rating,
            review.comment,
        ],
    )?;
    Ok(())
}

pub fn has_reviewed(conn: &Connection, client_id: &str, salon_id: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE client_id = ?1 AND salon_id = ?2",
        params![client_id, salon_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_reviews(conn: &Connection, salon_id: &str) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.salon_id, r.client_id, u.full_name, r.rating, r.comment, r.created_at
         FROM reviews r LEFT JOIN users u ON u.id = r.client_id
         WHERE r.salon_id = ?1
         ORDER BY r.created_at DESC",
    )?;
    let rows = stmt.query_map(params![salon_id], |row| {
        Ok(Review {
            id: row.get(0)?,
            salon_id: row.get(1)?,
            client_id: row.get(2)?,
            client_name: row.get(3)?,
            rating: row.get(4)?,
            comment: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

// ── Favorites ──

pub fn add_favorite(conn: &Connection, client_id: &str, salon_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO favorites (client_id, salon_id) VALUES (?1, ?2)
         ON CONFLICT(client_id, salon_id) DO NOTHING",
        params![client_id, salon_id],
    )?;
    Ok(())
}

pub fn remove_favorite(conn: &Connection, client_id: &str, salon_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM favorites WHERE client_id = ?1 AND salon_id = ?2",
        params![client_id, salon_id],
    )?;
    Ok(count > 0)
}

pub fn list_favorites(conn: &Connection, client_id: &str) -> anyhow::Result<Vec<Favorite>> {
    let mut stmt = conn.prepare(
        "SELECT f.salon_id, s.name, s.city, f.created_at
         FROM favorites f INNER JOIN salons s ON s.id = f.salon_id
         WHERE f.client_id = ?1 AND s.is_active = 1
         ORDER BY f.created_at DESC",
    )?;
    let rows = stmt.query_map(params![client_id], |row| {
        Ok(Favorite {
            salon_id: row.get(0)?,
            salon_name: row.get(1)?,
            city: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    let mut favorites = vec![];
    for row in rows {
        favorites.push(row?);
    }
    Ok(favorites)
}
