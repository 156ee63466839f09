use super::{take_resolution, GameError, GameManager};
use crate::answer_key::AnswerKey;
use crate::matcher;
use crate::types::*;

impl GameManager {
    /// Record the winner of the open round. The first winner sticks.
    pub async fn set_winner(&self, group_id: &str, user_id: &str) -> Result<(), GameError> {
        let mut games = self.games.write().await;
        let state = games.get_mut(group_id).ok_or(GameError::NoActiveGame)?;

        if !state.is_playing {
            return Err(GameError::NoActiveGame);
        }
        if state.winner_user_id.is_some() {
            return Err(GameError::AlreadyWon);
        }

        state.winner_user_id = Some(user_id.to_string());
        Ok(())
    }

    /// Check a guess and, if it is correct, win and end the round in one step.
    ///
    /// Returns `None` when no round is open, the round is already won, or the
    /// guess does not match.
    pub async fn resolve_guess(
        &self,
        group_id: &str,
        user_id: &str,
        text: &str,
        key: &AnswerKey,
    ) -> Option<Resolution> {
        let mut games = self.games.write().await;
        let state = games.get_mut(group_id)?;

        if !state.is_playing || state.winner_user_id.is_some() {
            return None;
        }

        let answer_id = state.answer_id?;
        let answer_name = state.answer_name.as_deref().unwrap_or_default();
        if !matcher::matches(text, answer_id, answer_name, key) {
            return None;
        }

        state.winner_user_id = Some(user_id.to_string());
        tracing::info!(
            "User {} guessed {} in group {}",
            user_id,
            answer_id,
            group_id
        );
        take_resolution(state, Some(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_winner_first_wins() {
        let games = GameManager::new();
        games.start("g1", 25, "皮卡丘", "Pikachu").await.unwrap();

        assert!(games.set_winner("g1", "u1").await.is_ok());
        assert_eq!(games.set_winner("g1", "u2").await, Err(GameError::AlreadyWon));

        let state = games.get_or_create("g1").await;
        assert_eq!(state.winner_user_id.as_deref(), Some("u1"));
        assert_eq!(state.phase(), RoundPhase::Resolved);
    }

    #[tokio::test]
    async fn test_set_winner_without_round() {
        let games = GameManager::new();
        assert_eq!(
            games.set_winner("g1", "u1").await,
            Err(GameError::NoActiveGame)
        );

        games.get_or_create("g1").await;
        assert_eq!(
            games.set_winner("g1", "u1").await,
            Err(GameError::NoActiveGame)
        );
    }

    #[tokio::test]
    async fn test_resolve_guess() {
        let games = GameManager::new();
        let key = AnswerKey::builtin();
        let round_id = games.start("g1", 25, "皮卡丘", "Pikachu").await.unwrap();

        assert!(games.resolve_guess("g1", "u1", "妙蛙种子", &key).await.is_none());
        assert!(games.is_playing("g1").await);

        let resolution = games
            .resolve_guess("g1", "u2", "pikachu", &key)
            .await
            .unwrap();
        assert_eq!(resolution.round_id, round_id);
        assert_eq!(resolution.winner_user_id.as_deref(), Some("u2"));
        assert!(!games.is_playing("g1").await);

        // Late correct guess finds the round closed
        assert!(games.resolve_guess("g1", "u3", "25", &key).await.is_none());
        assert_eq!(
            games.resolve_timeout("g1", &round_id).await,
            Err(GameError::NoActiveGame)
        );
    }

    #[tokio::test]
    async fn test_resolve_guess_respects_recorded_winner() {
        let games = GameManager::new();
        let key = AnswerKey::builtin();
        games.start("g1", 25, "皮卡丘", "Pikachu").await.unwrap();
        games.set_winner("g1", "u1").await.unwrap();

        assert!(games.resolve_guess("g1", "u2", "pikachu", &key).await.is_none());
        let state = games.get_or_create("g1").await;
        assert_eq!(state.winner_user_id.as_deref(), Some("u1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_guesses_single_winner() {
        let games = Arc::new(GameManager::new());
        let key = Arc::new(AnswerKey::builtin());
        games.start("g1", 25, "皮卡丘", "Pikachu").await.unwrap();

        let tasks = (0..32).map(|i| {
            let games = games.clone();
            let key = key.clone();
            tokio::spawn(async move {
                games
                    .resolve_guess("g1", &format!("u{}", i), "皮卡丘", &key)
                    .await
            })
        });

        let winners = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter_map(|r| r.unwrap())
            .count();
        assert_eq!(winners, 1);
    }
}
