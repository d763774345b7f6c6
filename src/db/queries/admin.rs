use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub clients: i64,
    pub salon_owners: i64,
    pub salons: i64,
    pub active_salons: i64,
    pub bookings: i64,
    pub pending_bookings: i64,
    pub completed_bookings: i64,
    pub revenue_cents: i64,
}

pub fn get_admin_stats(conn: &Connection) -> anyhow::Result<AdminStats> {
    let count = |sql: &str| -> anyhow::Result<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };

    Ok(AdminStats {
        users: count("SELECT COUNT(*) FROM users")?,
        clients: count("SELECT COUNT(*) FROM users WHERE role = 'CLIENT'")?,
        salon_owners: count("SELECT COUNT(*) FROM users WHERE role = 'SALON_OWNER'")?,
        salons: count("SELECT COUNT(*) FROM salons")?,
        active_salons: count("SELECT COUNT(*) FROM salons WHERE is_active = 1")?,
        bookings: count("SELECT COUNT(*) FROM rendezvous")?,
        pending_bookings: count("SELECT COUNT(*) FROM rendezvous WHERE status = 'PENDING'")?,
        completed_bookings: count("SELECT COUNT(*) FROM rendezvous WHERE status = 'COMPLETED'")?,
        revenue_cents: count(
            "SELECT COALESCE(SUM(COALESCE(paid_amount_cents, total_price_cents)), 0)
             FROM rendezvous WHERE status = 'COMPLETED'",
        )?,
    })
}
