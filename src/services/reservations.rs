use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::availability::format_time;
use crate::models::{Booking, BookingStatus, PaymentMethod, Salon, ScoreEvent, Service, Stylist};
use crate::services::{scheduling, scoring};

pub struct NewBooking {
    pub client_id: String,
    pub salon: Salon,
    pub stylist: Stylist,
    pub services: Vec<Service>,
    pub date: NaiveDate,
    pub start: u32,
    pub notes: Option<String>,
}

/// Creates a pending booking. The slot re-check, the insert of the booking
/// and its services, and the booking-related score event share one
/// `IMMEDIATE` transaction.
pub fn create_booking(conn: &Connection, request: NewBooking) -> Result<Booking, AppError> {
    let NewBooking {
        client_id,
        salon,
        stylist,
        services,
        date,
        start,
        notes,
    } = request;

    if !salon.is_active {
        return Err(AppError::conflict("salon is not active"));
    }
    if stylist.salon_id != salon.id || !stylist.is_active {
        return Err(AppError::not_found("stylist"));
    }
    if services.is_empty() {
        return Err(AppError::validation("at least one service is required"));
    }
    let mut seen = HashSet::new();
    for service in &services {
        if service.salon_id != salon.id || !service.is_active {
            return Err(AppError::not_found(format!("service {}", service.id)));
        }
        if !seen.insert(service.id.as_str()) {
            return Err(AppError::validation(format!("service {} selected twice", service.id)));
        }
    }

    let duration: i64 = services.iter().map(|s| s.duration_minutes).sum();
    let price: i64 = services.iter().map(|s| s.price_cents).sum();
    let duration_minutes =
        u32::try_from(duration).map_err(|_| AppError::validation("invalid total duration"))?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let end = scheduling::validate_booking_time(&tx, &stylist, &date, start, duration_minutes)?;

    let prior_bookings = queries::count_client_bookings(&tx, &client_id)?;
    let returning = queries::has_completed_booking_at_salon(&tx, &client_id, &salon.id)?;
    let score = queries::get_client_score(&tx, &client_id)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        client_id,
        salon_id: salon.id,
        stylist_id: stylist.id,
        date: date.format("%Y-%m-%d").to_string(),
        start_time: format_time(start),
        end_time: format_time(end),
        status: BookingStatus::Pending,
        total_price_cents: price,
        total_duration_minutes: duration,
        deposit_required: score.requires_deposit,
        notes,
        payment_method: None,
        paid_amount_cents: None,
        service_ids: services.into_iter().map(|s| s.id).collect(),
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&tx, &booking)?;

    let event = if prior_bookings == 0 {
        Some(ScoreEvent::FirstBooking)
    } else if returning {
        Some(ScoreEvent::RepeatBooking)
    } else {
        None
    };
    if let Some(event) = event {
        scoring::record_event(&tx, &booking.client_id, event, Some(&booking.id))?;
    }

    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        stylist_id = %booking.stylist_id,
        date = %booking.date,
        start = %booking.start_time,
        end = %booking.end_time,
        "booking created"
    );

    Ok(booking)
}

/// Moves a booking to `next` and records the score event that status
/// implies.
pub fn change_status(conn: &Connection, booking: &Booking, next: BookingStatus) -> Result<Booking, AppError> {
    ensure_transition(booking, next)?;

    let tx = conn.unchecked_transaction()?;
    queries::update_booking_status(&tx, &booking.id, next)?;
    if let Some(event) = scoring::event_for_status(next) {
        scoring::record_event(&tx, &booking.client_id, event, Some(&booking.id))?;
    }
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        from = booking.status.as_str(),
        to = next.as_str(),
        "booking status changed"
    );

    reload(conn, &booking.id)
}

/// Cancels a booking. Cancellations by the client are scored by how early
/// they happen; salon-side cancellations are not scored.
pub fn cancel(
    conn: &Connection,
    booking: &Booking,
    by_client: bool,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    ensure_transition(booking, BookingStatus::Cancelled)?;

    let tx = conn.unchecked_transaction()?;
    queries::update_booking_status(&tx, &booking.id, BookingStatus::Cancelled)?;
    if by_client {
        let event = scoring::cancellation_event(booking.starts_at()?, now);
        scoring::record_event(&tx, &booking.client_id, event, Some(&booking.id))?;
    }
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, by_client, "booking cancelled");

    reload(conn, &booking.id)
}

/// Point-of-sale checkout: completes the booking and records how it was
/// paid.
pub fn checkout(
    conn: &Connection,
    booking: &Booking,
    method: PaymentMethod,
    amount_cents: Option<i64>,
) -> Result<Booking, AppError> {
    ensure_transition(booking, BookingStatus::Completed)?;
    let amount = amount_cents.unwrap_or(booking.total_price_cents);
    if amount < 0 {
        return Err(AppError::validation("amount must not be negative"));
    }

    let tx = conn.unchecked_transaction()?;
    queries::update_booking_status(&tx, &booking.id, BookingStatus::Completed)?;
    queries::record_payment(&tx, &booking.id, method.as_str(), amount)?;
    scoring::record_event(&tx, &booking.client_id, ScoreEvent::OnTime, Some(&booking.id))?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        method = method.as_str(),
        amount_cents = amount,
        "booking checked out"
    );

    reload(conn, &booking.id)
}

fn ensure_transition(booking: &Booking, next: BookingStatus) -> Result<(), AppError> {
    if booking.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "cannot change booking from {} to {}",
            booking.status.as_str(),
            next.as_str()
        )))
    }
}

fn reload(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or_else(|| AppError::not_found("booking"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{self, Ids};
    use crate::models::availability::parse_time;

    const MONDAY: &str = "2030-06-17";

    fn request(conn: &Connection, ids: &Ids, start: &str) -> NewBooking {
        NewBooking {
            client_id: ids.client_id.clone(),
            salon: queries::get_salon(conn, &ids.salon_id).unwrap().unwrap(),
            stylist: queries::get_stylist(conn, &ids.stylist_id).unwrap().unwrap(),
            services: vec![queries::get_service(conn, &ids.service_id).unwrap().unwrap()],
            date: NaiveDate::parse_from_str(MONDAY, "%Y-%m-%d").unwrap(),
            start: parse_time(start).unwrap(),
            notes: None,
        }
    }

    fn setup() -> (Connection, Ids) {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);
        fixtures::set_day(&conn, &ids.stylist_id, 1, "09:00", "18:00", true);
        (conn, ids)
    }

    #[test]
    fn test_create_booking_persists_services_and_totals() {
        let (conn, ids) = setup();

        let booking = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.end_time, "10:30");
        assert_eq!(booking.total_price_cents, 2500);

        let stored = queries::get_booking(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.service_ids, vec![ids.service_id.clone()]);
        assert_eq!(stored.start_time, "10:00");
    }

    #[test]
    fn test_multiple_services_sum_duration() {
        let (conn, ids) = setup();
        let color = Service {
            id: "service-2".to_string(),
            salon_id: ids.salon_id.clone(),
            name: "Color".to_string(),
            description: None,
            duration_minutes: 60,
            price_cents: 6000,
            is_active: true,
        };
        queries::create_service(&conn, &color).unwrap();

        let mut req = request(&conn, &ids, "10:00");
        req.services.push(color);
        let booking = create_booking(&conn, req).unwrap();
        assert_eq!(booking.end_time, "11:30");
        assert_eq!(booking.total_duration_minutes, 90);
        assert_eq!(booking.total_price_cents, 8500);
    }

    #[test]
    fn test_second_booking_in_buffer_rejected() {
        let (conn, ids) = setup();
        let first = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        queries::update_booking_status(&conn, &first.id, BookingStatus::Confirmed).unwrap();

        let err = create_booking(&conn, request(&conn, &ids, "10:30")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("10:00 to 10:30"));

        assert!(create_booking(&conn, request(&conn, &ids, "10:35")).is_ok());
    }

    #[test]
    fn test_failed_booking_leaves_nothing_behind() {
        let (conn, ids) = setup();
        create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let _ = create_booking(&conn, request(&conn, &ids, "10:10")).unwrap_err();

        let bookings = queries::list_bookings_for_client(&conn, &ids.client_id).unwrap();
        assert_eq!(bookings.len(), 1);
    }

    #[test]
    fn test_inactive_salon_rejected() {
        let (conn, ids) = setup();
        queries::set_salon_active(&conn, &ids.salon_id, false).unwrap();

        let err = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "salon is not active"));
    }

    #[test]
    fn test_first_booking_scored_once() {
        let (conn, ids) = setup();
        create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        create_booking(&conn, request(&conn, &ids, "11:00")).unwrap();

        let score = queries::get_client_score(&conn, &ids.client_id).unwrap();
        assert_eq!(score.score, 105);
        assert_eq!(score.event_count, 1);
    }

    #[test]
    fn test_repeat_booking_after_completed_visit() {
        let (conn, ids) = setup();
        let first = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let confirmed = change_status(&conn, &first, BookingStatus::Confirmed).unwrap();
        change_status(&conn, &confirmed, BookingStatus::Completed).unwrap();

        create_booking(&conn, request(&conn, &ids, "12:00")).unwrap();

        let events = queries::list_score_events(&conn, &ids.client_id).unwrap();
        let kinds: Vec<ScoreEvent> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![ScoreEvent::FirstBooking, ScoreEvent::OnTime, ScoreEvent::RepeatBooking]
        );
    }

    #[test]
    fn test_no_show_scores_client() {
        let (conn, ids) = setup();
        let booking = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let updated = change_status(&conn, &booking, BookingStatus::NoShow).unwrap();
        assert_eq!(updated.status, BookingStatus::NoShow);

        let score = queries::get_client_score(&conn, &ids.client_id).unwrap();
        // +5 first booking, -20 no-show
        assert_eq!(score.score, 85);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let (conn, ids) = setup();
        let booking = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let err = change_status(&conn, &booking, BookingStatus::Completed).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_client_cancellation_frees_slot_and_scores() {
        let (conn, ids) = setup();
        let booking = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let now = NaiveDateTime::parse_from_str("2030-06-17 09:00", "%Y-%m-%d %H:%M").unwrap();

        let cancelled = cancel(&conn, &booking, true, now).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let events = queries::list_score_events(&conn, &ids.client_id).unwrap();
        assert_eq!(events.last().unwrap().event_type, ScoreEvent::LateCancellation);

        assert!(create_booking(&conn, request(&conn, &ids, "10:00")).is_ok());
    }

    #[test]
    fn test_checkout_records_payment() {
        let (conn, ids) = setup();
        let booking = create_booking(&conn, request(&conn, &ids, "10:00")).unwrap();
        let confirmed = change_status(&conn, &booking, BookingStatus::Confirmed).unwrap();

        let paid = checkout(&conn, &confirmed, PaymentMethod::Card, None).unwrap();
        assert_eq!(paid.status, BookingStatus::Completed);
        assert_eq!(paid.payment_method.as_deref(), Some("CARD"));
        assert_eq!(paid.paid_amount_cents, Some(2500));
    }
}
