use super::{take_resolution, GameError, GameManager};
use crate::types::*;

impl GameManager {
    /// Open a round in the group.
    /// Rejected without touching the record if a round is already open.
    pub async fn start(
        &self,
        group_id: &str,
        answer_id: CharaId,
        name: &str,
        alt_name: &str,
    ) -> Result<RoundId, GameError> {
        let mut games = self.games.write().await;
        let state = games.entry(group_id.to_string()).or_default();

        if state.is_playing {
            return Err(GameError::AlreadyActive);
        }

        let round_id = ulid::Ulid::new().to_string();
        *state = GameState {
            is_playing: true,
            round_id: Some(round_id.clone()),
            answer_id: Some(answer_id),
            answer_name: Some(name.to_string()),
            answer_alt_name: Some(alt_name.to_string()),
            answer_image: None,
            winner_user_id: None,
            started_at: Some(chrono::Utc::now()),
        };

        tracing::info!(
            "Round {} started in group {} (answer {})",
            round_id,
            group_id,
            answer_id
        );
        Ok(round_id)
    }

    /// End whatever round is running. Returns whether one was running.
    pub async fn end(&self, group_id: &str) -> bool {
        let mut games = self.games.write().await;
        let state = games.entry(group_id.to_string()).or_default();

        let was_playing = state.is_playing;
        state.reset();

        if was_playing {
            tracing::info!("Round ended in group {}", group_id);
        }
        was_playing
    }

    /// End the round only if `round_id` is still the open round.
    /// Used to clean up after a failed start.
    pub async fn abort(&self, group_id: &str, round_id: &str) -> bool {
        let mut games = self.games.write().await;
        match games.get_mut(group_id) {
            Some(state) if state.is_playing && state.round_id.as_deref() == Some(round_id) => {
                state.reset();
                tracing::info!("Round {} aborted in group {}", round_id, group_id);
                true
            }
            _ => false,
        }
    }

    /// Store the revealed image for the running round
    pub async fn set_answer_image(
        &self,
        group_id: &str,
        image: EncodedImage,
    ) -> Result<(), GameError> {
        let mut games = self.games.write().await;
        match games.get_mut(group_id) {
            Some(state) if state.is_playing => {
                state.answer_image = Some(image);
                Ok(())
            }
            _ => Err(GameError::NoActiveGame),
        }
    }

    /// Close the round on timeout.
    ///
    /// Only succeeds if `round_id` is still the open round and nobody has
    /// won it; the record is reset in the same critical section.
    pub async fn resolve_timeout(
        &self,
        group_id: &str,
        round_id: &str,
    ) -> Result<Resolution, GameError> {
        let mut games = self.games.write().await;
        let state = games.get_mut(group_id).ok_or(GameError::NoActiveGame)?;

        if !state.is_playing {
            return Err(GameError::NoActiveGame);
        }
        if state.round_id.as_deref() != Some(round_id) {
            return Err(GameError::RoundMismatch(round_id.to_string()));
        }
        if state.winner_user_id.is_some() {
            return Err(GameError::AlreadyWon);
        }

        take_resolution(state, None).ok_or(GameError::NoActiveGame)
    }
}
