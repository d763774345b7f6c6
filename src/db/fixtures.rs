//! Seed data shared by unit tests.

use chrono::Utc;
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::models::{Availability, Booking, BookingStatus, Role, Salon, Service, Stylist, User};

pub struct Ids {
    pub owner_id: String,
    pub client_id: String,
    pub salon_id: String,
    pub stylist_id: String,
    pub service_id: String,
}

pub fn setup_db() -> Connection {
    db::init_db(":memory:").unwrap()
}

pub fn user(conn: &Connection, id: &str, role: Role) -> String {
    queries::create_user(
        conn,
        &User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password_hash: "x".to_string(),
            full_name: format!("User {id}"),
            phone: None,
            role,
            salon_id: None,
            is_active: true,
            created_at: String::new(),
        },
    )
    .unwrap();
    id.to_string()
}

/// An owner, a client, one active salon with one stylist and one 30-minute
/// service. No availability is configured.
pub fn seed(conn: &Connection) -> Ids {
    let owner_id = user(conn, "owner", Role::SalonOwner);
    let client_id = user(conn, "client", Role::Client);

    let salon_id = "salon-1".to_string();
    queries::create_salon(
        conn,
        &Salon {
            id: salon_id.clone(),
            owner_id: owner_id.clone(),
            name: "Chez Nadia".to_string(),
            address: "1 rue de la Paix".to_string(),
            city: "Tunis".to_string(),
            phone: None,
            description: None,
            is_active: true,
            average_rating: None,
            review_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        },
    )
    .unwrap();

    let stylist_id = "stylist-1".to_string();
    queries::create_stylist(
        conn,
        &Stylist {
            id: stylist_id.clone(),
            salon_id: salon_id.clone(),
            name: "Nadia".to_string(),
            specialty: None,
            buffer_minutes: None,
            is_active: true,
        },
    )
    .unwrap();

    let service_id = "service-1".to_string();
    queries::create_service(
        conn,
        &Service {
            id: service_id.clone(),
            salon_id: salon_id.clone(),
            name: "Brushing".to_string(),
            description: None,
            duration_minutes: 30,
            price_cents: 2500,
            is_active: true,
        },
    )
    .unwrap();

    Ids {
        owner_id,
        client_id,
        salon_id,
        stylist_id,
        service_id,
    }
}

pub fn set_day(conn: &Connection, stylist_id: &str, day: u8, start: &str, end: &str, is_available: bool) {
    let mut days: Vec<Availability> = queries::list_availability(conn, stylist_id)
        .unwrap()
        .into_iter()
        .filter(|a| a.day_of_week != day)
        .collect();
    days.push(Availability {
        stylist_id: stylist_id.to_string(),
        day_of_week: day,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_available,
    });
    queries::replace_availability(conn, stylist_id, &days).unwrap();
}

pub fn insert_booking(
    conn: &Connection,
    ids: &Ids,
    date: &str,
    start: &str,
    end: &str,
    status: BookingStatus,
) -> String {
    let now = Utc::now().naive_utc();
    let id = uuid::Uuid::new_v4().to_string();
    queries::insert_booking(
        conn,
        &Booking {
            id: id.clone(),
            client_id: ids.client_id.clone(),
            salon_id: ids.salon_id.clone(),
            stylist_id: ids.stylist_id.clone(),
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            status,
            total_price_cents: 2500,
            total_duration_minutes: 30,
            deposit_required: false,
            notes: None,
            payment_method: None,
            paid_amount_cents: None,
            service_ids: vec![ids.service_id.clone()],
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
    id
}
