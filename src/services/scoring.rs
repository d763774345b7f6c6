use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{BookingStatus, ClientScore, ScoreEvent};

/// Cancelling at least this long before the start counts as early.
pub const EARLY_CANCELLATION_HOURS: i64 = 24;

/// Applies `event` to the client's score and appends it to the history.
///
/// Does not open a transaction of its own: callers run it on the transaction
/// that carries the change causing the event.
pub fn record_event(
    conn: &Connection,
    client_id: &str,
    event: ScoreEvent,
    rendezvous_id: Option<&str>,
) -> anyhow::Result<ClientScore> {
    let current = queries::get_client_score(conn, client_id)?;
    let updated = current.apply(event);

    queries::save_client_score(conn, &updated)?;
    queries::insert_score_event(conn, client_id, event, updated.score, rendezvous_id)?;

    tracing::info!(
        client_id,
        event = event.as_str(),
        delta = event.delta(),
        score = updated.score,
        level = updated.level.as_str(),
        "client score adjusted"
    );

    Ok(updated)
}

pub fn event_for_status(status: BookingStatus) -> Option<ScoreEvent> {
    match status {
        BookingStatus::Completed => Some(ScoreEvent::OnTime),
        BookingStatus::Late => Some(ScoreEvent::Late),
        BookingStatus::NoShow => Some(ScoreEvent::NoShow),
        _ => None,
    }
}

pub fn event_for_review(rating: i64) -> Option<ScoreEvent> {
    match rating {
        4..=5 => Some(ScoreEvent::PositiveReview),
        1..=2 => Some(ScoreEvent::NegativeReview),
        _ => None,
    }
}

pub fn cancellation_event(starts_at: NaiveDateTime, now: NaiveDateTime) -> ScoreEvent {
    if starts_at - now >= Duration::hours(EARLY_CANCELLATION_HOURS) {
        ScoreEvent::EarlyCancellation
    } else {
        ScoreEvent::LateCancellation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::models::ScoreLevel;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_record_no_show() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);

        let score = record_event(&conn, &ids.client_id, ScoreEvent::NoShow, None).unwrap();
        assert_eq!(score.score, 80);
        assert_eq!(score.level, ScoreLevel::Normal);
        assert_eq!(score.event_count, 1);

        let stored = queries::get_client_score(&conn, &ids.client_id).unwrap();
        assert_eq!(stored, score);

        let events = queries::list_score_events(&conn, &ids.client_id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ScoreEvent::NoShow);
        assert_eq!(events[0].delta, -20);
        assert_eq!(events[0].score_after, 80);
    }

    #[test]
    fn test_history_keeps_nominal_delta_when_clamped() {
        let conn = fixtures::setup_db();
        let ids = fixtures::seed(&conn);

        for _ in 0..6 {
            record_event(&conn, &ids.client_id, ScoreEvent::NoShow, None).unwrap();
        }
        let score = queries::get_client_score(&conn, &ids.client_id).unwrap();
        assert_eq!(score.score, 0);
        assert_eq!(score.event_count, 6);
        assert!(score.requires_deposit);

        let events = queries::list_score_events(&conn, &ids.client_id).unwrap();
        assert_eq!(events.last().unwrap().delta, -20);
        assert_eq!(events.last().unwrap().score_after, 0);
    }

    #[test]
    fn test_unknown_client_starts_at_default() {
        let conn = fixtures::setup_db();
        let score = queries::get_client_score(&conn, "nobody").unwrap();
        assert_eq!(score.score, 100);
        assert_eq!(score.event_count, 0);
    }

    #[test]
    fn test_cancellation_event_threshold() {
        let start = dt("2030-06-17 10:00");
        assert_eq!(
            cancellation_event(start, dt("2030-06-16 10:00")),
            ScoreEvent::EarlyCancellation
        );
        assert_eq!(
            cancellation_event(start, dt("2030-06-16 10:01")),
            ScoreEvent::LateCancellation
        );
    }

    #[test]
    fn test_review_events() {
        assert_eq!(event_for_review(5), Some(ScoreEvent::PositiveReview));
        assert_eq!(event_for_review(4), Some(ScoreEvent::PositiveReview));
        assert_eq!(event_for_review(3), None);
        assert_eq!(event_for_review(2), Some(ScoreEvent::NegativeReview));
        assert_eq!(event_for_review(1), Some(ScoreEvent::NegativeReview));
    }

    #[test]
    fn test_status_events() {
        assert_eq!(event_for_status(BookingStatus::Completed), Some(ScoreEvent::OnTime));
        assert_eq!(event_for_status(BookingStatus::NoShow), Some(ScoreEvent::NoShow));
        assert_eq!(event_for_status(BookingStatus::Late), Some(ScoreEvent::Late));
        assert_eq!(event_for_status(BookingStatus::Confirmed), None);
    }
}
