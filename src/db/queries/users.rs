use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Role, User};

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, phone, role, salon_id, is_active, created_at";

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, full_name, phone, role, salon_id, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.email,
            user.password_hash,
            user.full_name,
            user.phone,
            user.role.as_str(),
            user.salon_id,
            user.is_active,
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let user = conn
        .query_row(&sql, params![id], parse_user_row)
        .optional()?;
    Ok(user)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE");
    let user = conn
        .query_row(&sql, params![email], parse_user_row)
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection, role: Option<Role>, limit: i64) -> anyhow::Result<Vec<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY created_at DESC, email ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![role.map(|r| r.as_str()), limit], parse_user_row)?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

pub fn list_cashiers(conn: &Connection, salon_id: &str) -> anyhow::Result<Vec<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = 'CAISSIER' AND salon_id = ?1 ORDER BY full_name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![salon_id], parse_user_row)?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

pub fn set_user_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET is_active = ?1 WHERE id = ?2",
        params![active, id],
    )?;
    Ok(count > 0)
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(5)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown role: {role_str}").into(),
        )
    })?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        phone: row.get(4)?,
        role,
        salon_id: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}
