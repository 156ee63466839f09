mod guess;
mod round;

use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("a round is already running in this group")]
    AlreadyActive,

    #[error("no round is running in this group")]
    NoActiveGame,

    #[error("the round already has a winner")]
    AlreadyWon,

    #[error("round {0} is no longer the current round")]
    RoundMismatch(RoundId),
}

/// Per-group game records, shared between handlers and round timers.
///
/// Every resolving transition checks and mutates a record under one write
/// lock, so a guess and a timer racing for the same round cannot both win.
#[derive(Clone, Default)]
pub struct GameManager {
    games: Arc<RwLock<HashMap<GroupId, GameState>>>,
}

impl GameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the group's record, creating an idle one on first access
    pub async fn get_or_create(&self, group_id: &str) -> GameState {
        self.games
            .write()
            .await
            .entry(group_id.to_string())
            .or_default()
            .clone()
    }

    /// Snapshot without creating a record
    pub async fn get(&self, group_id: &str) -> Option<GameState> {
        self.games.read().await.get(group_id).cloned()
    }

    pub async fn is_playing(&self, group_id: &str) -> bool {
        self.games
            .read()
            .await
            .get(group_id)
            .is_some_and(|g| g.is_playing)
    }

    /// Number of groups with a round currently running
    pub async fn active_rounds(&self) -> usize {
        self.games
            .read()
            .await
            .values()
            .filter(|g| g.is_playing)
            .count()
    }

    /// Number of groups that have a record
    pub async fn group_count(&self) -> usize {
        self.games.read().await.len()
    }
}

/// Capture the finished round and reset the record in the same step
fn take_resolution(state: &mut GameState, winner: Option<UserId>) -> Option<Resolution> {
    let resolution = Resolution {
        round_id: state.round_id.clone()?,
        answer_id: state.answer_id?,
        answer_name: state.answer_name.clone().unwrap_or_default(),
        answer_alt_name: state.answer_alt_name.clone().unwrap_or_default(),
        answer_image: state.answer_image.clone(),
        winner_user_id: winner,
    };
    state.reset();
    Some(resolution)
}
