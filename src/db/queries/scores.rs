use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{ClientScore, ScoreEvent, ScoreEventRecord};

/// Stored score of a client, or a fresh starting score if none has been
/// recorded yet.
pub fn get_client_score(conn: &Connection, client_id: &str) -> anyhow::Result<ClientScore> {
    let stored = conn
        .query_row(
            "SELECT score, event_count FROM client_scores WHERE client_id = ?1",
            params![client_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    Ok(match stored {
        Some((score, event_count)) => ClientScore::from_parts(client_id, score, event_count),
        None => ClientScore::new(client_id),
    })
}

pub fn save_client_score(conn: &Connection, score: &ClientScore) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO client_scores (client_id, score, level, event_count, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(client_id) DO UPDATE SET
           score = excluded.score,
           level = excluded.level,
           event_count = excluded.event_count,
           updated_at = excluded.updated_at",
        params![
            score.client_id,
            score.score,
            score.level.as_str(),
            score.event_count,
        ],
    )?;
    Ok(())
}

pub fn insert_score_event(
    conn: &Connection,
    client_id: &str,
    event: ScoreEvent,
    score_after: i64,
    rendezvous_id: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO client_score_events (client_id, event_type, delta, score_after, rendezvous_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![client_id, event.as_str(), event.delta(), score_after, rendezvous_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_score_events(conn: &Connection, client_id: &str) -> anyhow::Result<Vec<ScoreEventRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, event_type, delta, score_after, rendezvous_id, created_at
         FROM client_score_events WHERE client_id = ?1
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![client_id], |row| {
        let event_str: String = row.get(2)?;
        let event_type = ScoreEvent::parse(&event_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown score event: {event_str}").into(),
            )
        })?;
        Ok(ScoreEventRecord {
            id: row.get(0)?,
            client_id: row.get(1)?,
            event_type,
            delta: row.get(3)?,
            score_after: row.get(4)?,
            rendezvous_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}
