use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GroupId = String;
pub type UserId = String;
pub type RoundId = String;
pub type CharaId = u32;

/// Image encoded for transport, `base64://<png bytes>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EncodedImage(pub String);

impl EncodedImage {
    pub const PREFIX: &'static str = "base64://";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    /// No round in this group
    Idle,
    /// Round running, nobody has answered yet
    Open,
    /// Winner recorded, round not yet ended
    Resolved,
}

/// Per-group game record. Created lazily and reused across rounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub is_playing: bool,
    pub round_id: Option<RoundId>,
    pub answer_id: Option<CharaId>,
    pub answer_name: Option<String>,
    pub answer_alt_name: Option<String>,
    pub answer_image: Option<EncodedImage>,
    pub winner_user_id: Option<UserId>,
    pub started_at: Option<DateTime<Utc>>,
}

impl GameState {
    pub fn phase(&self) -> RoundPhase {
        match (self.is_playing, &self.winner_user_id) {
            (false, _) => RoundPhase::Idle,
            (true, None) => RoundPhase::Open,
            (true, Some(_)) => RoundPhase::Resolved,
        }
    }

    /// Clear every answer-specific field, keeping the record for the next round
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of a round taken at the moment it was resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub round_id: RoundId,
    pub answer_id: CharaId,
    pub answer_name: String,
    pub answer_alt_name: String,
    pub answer_image: Option<EncodedImage>,
    /// `None` when the round ran out of time
    pub winner_user_id: Option<UserId>,
}
