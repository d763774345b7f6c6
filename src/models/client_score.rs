use serde::{Deserialize, Serialize};

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 200;
pub const INITIAL_SCORE: i64 = 100;
const DEPOSIT_THRESHOLD: i64 = 70;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreEvent {
    NoShow,
    Late,
    LateCancellation,
    OnTime,
    EarlyCancellation,
    PositiveReview,
    NegativeReview,
    FirstBooking,
    RepeatBooking,
}

impl ScoreEvent {
    pub fn delta(&self) -> i64 {
        match self {
            ScoreEvent::NoShow => -20,
            ScoreEvent::Late => -5,
            ScoreEvent::LateCancellation => -10,
            ScoreEvent::OnTime => 2,
            ScoreEvent::EarlyCancellation => 1,
            ScoreEvent::PositiveReview => 3,
            ScoreEvent::NegativeReview => -2,
            ScoreEvent::FirstBooking => 5,
            ScoreEvent::RepeatBooking => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreEvent::NoShow => "NO_SHOW",
            ScoreEvent::Late => "LATE",
            ScoreEvent::LateCancellation => "LATE_CANCELLATION",
            ScoreEvent::OnTime => "ON_TIME",
            ScoreEvent::EarlyCancellation => "EARLY_CANCELLATION",
            ScoreEvent::PositiveReview => "POSITIVE_REVIEW",
            ScoreEvent::NegativeReview => "NEGATIVE_REVIEW",
            ScoreEvent::FirstBooking => "FIRST_BOOKING",
            ScoreEvent::RepeatBooking => "REPEAT_BOOKING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NO_SHOW" => Some(ScoreEvent::NoShow),
            "LATE" => Some(ScoreEvent::Late),
            "LATE_CANCELLATION" => Some(ScoreEvent::LateCancellation),
            "ON_TIME" => Some(ScoreEvent::OnTime),
            "EARLY_CANCELLATION" => Some(ScoreEvent::EarlyCancellation),
            "POSITIVE_REVIEW" => Some(ScoreEvent::PositiveReview),
            "NEGATIVE_REVIEW" => Some(ScoreEvent::NegativeReview),
            "FIRST_BOOKING" => Some(ScoreEvent::FirstBooking),
            "REPEAT_BOOKING" => Some(ScoreEvent::RepeatBooking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreLevel {
    Reliable,
    Normal,
    AtRisk,
}

impl ScoreLevel {
    pub fn from_score(score: i64) -> Self {
        if score >= 120 {
            ScoreLevel::Reliable
        } else if score >= 80 {
            ScoreLevel::Normal
        } else {
            ScoreLevel::AtRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLevel::Reliable => "RELIABLE",
            ScoreLevel::Normal => "NORMAL",
            ScoreLevel::AtRisk => "AT_RISK",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientScore {
    pub client_id: String,
    pub score: i64,
    pub level: ScoreLevel,
    pub event_count: i64,
    pub requires_deposit: bool,
}

impl ClientScore {
    pub fn new(client_id: &str) -> Self {
        Self::from_parts(client_id, INITIAL_SCORE, 0)
    }

    /// Rebuilds the derived fields from a stored score.
    pub fn from_parts(client_id: &str, score: i64, event_count: i64) -> Self {
        let score = score.clamp(MIN_SCORE, MAX_SCORE);
        let level = ScoreLevel::from_score(score);
        Self {
            client_id: client_id.to_string(),
            score,
            level,
            event_count,
            requires_deposit: level == ScoreLevel::AtRisk || score < DEPOSIT_THRESHOLD,
        }
    }

    /// Applies one event and returns the updated score. The score stays in
    /// `[MIN_SCORE, MAX_SCORE]` whatever the accumulated deltas.
    pub fn apply(&self, event: ScoreEvent) -> Self {
        Self::from_parts(
            &self.client_id,
            self.score + event.delta(),
            self.event_count + 1,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEventRecord {
    pub id: i64,
    pub client_id: String,
    pub event_type: ScoreEvent,
    pub delta: i64,
    pub score_after: i64,
    pub rendezvous_id: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_normal_without_deposit() {
        let score = ClientScore::new("c1");
        assert_eq!(score.score, 100);
        assert_eq!(score.level, ScoreLevel::Normal);
        assert_eq!(score.event_count, 0);
        assert!(!score.requires_deposit);
    }

    #[test]
    fn test_no_show_drops_twenty() {
        let score = ClientScore::new("c1").apply(ScoreEvent::NoShow);
        assert_eq!(score.score, 80);
        assert_eq!(score.level, ScoreLevel::Normal);
        assert_eq!(score.event_count, 1);
    }

    #[test]
    fn test_levels() {
        assert_eq!(ScoreLevel::from_score(200), ScoreLevel::Reliable);
        assert_eq!(ScoreLevel::from_score(120), ScoreLevel::Reliable);
        assert_eq!(ScoreLevel::from_score(119), ScoreLevel::Normal);
        assert_eq!(ScoreLevel::from_score(80), ScoreLevel::Normal);
        assert_eq!(ScoreLevel::from_score(79), ScoreLevel::AtRisk);
        assert_eq!(ScoreLevel::from_score(0), ScoreLevel::AtRisk);
    }

    #[test]
    fn test_at_risk_requires_deposit() {
        let mut score = ClientScore::new("c1");
        score = score.apply(ScoreEvent::NoShow);
        assert!(!score.requires_deposit);
        score = score.apply(ScoreEvent::Late);
        assert_eq!(score.score, 75);
        assert_eq!(score.level, ScoreLevel::AtRisk);
        assert!(score.requires_deposit);
    }

    #[test]
    fn test_score_clamped_at_bounds() {
        let mut score = ClientScore::new("c1");
        for _ in 0..20 {
            score = score.apply(ScoreEvent::NoShow);
        }
        assert_eq!(score.score, MIN_SCORE);
        assert_eq!(score.event_count, 20);

        for _ in 0..100 {
            score = score.apply(ScoreEvent::FirstBooking);
        }
        assert_eq!(score.score, MAX_SCORE);
        assert_eq!(score.level, ScoreLevel::Reliable);
    }

    #[test]
    fn test_event_names_parse_back() {
        for event in [
            ScoreEvent::NoShow,
            ScoreEvent::Late,
            ScoreEvent::LateCancellation,
            ScoreEvent::OnTime,
            ScoreEvent::EarlyCancellation,
            ScoreEvent::PositiveReview,
            ScoreEvent::NegativeReview,
            ScoreEvent::FirstBooking,
            ScoreEvent::RepeatBooking,
        ] {
            assert_eq!(ScoreEvent::parse(event.as_str()), Some(event));
        }
    }
}
