//! Staked quiz game
//!
//! A player picks a topic, a text model writes ten questions of random
//! difficulty, and the player stakes the sum of the question costs on the
//! quiz contract. Answers are committed as Keccak-256 digests while the game
//! runs and revealed only at settlement, where every correct answer pays its
//! cost times the win multiplier.

pub mod admin;
pub mod commitment;
pub mod error;
pub mod game;
pub mod generator;
pub mod question;

pub use admin::{OwnerConsole, OwnerStatus};
pub use commitment::{AnswerDigest, CommitmentScheme, Keccak256Scheme};
pub use error::{ContentGenerationError, GameError, Result};
pub use game::{
    ActivityLog, ClockDriver, Countdown, GameEvent, GameEventKind, GameRules, GameSnapshot,
    GameState, QuizGame, Settlement,
};
pub use generator::QuizGenerator;
pub use question::{AnswerReviewEntry, GameSession, PriceTier, Question, UserAnswerRecord};

use quizonaire_core::{ContractGateway, QuizConfig, TextModel};
use std::sync::Arc;

/// Build a game wired to `model` and `gateway` with the rules from `config`.
pub fn create_game(
    config: &QuizConfig,
    model: Arc<dyn TextModel>,
    gateway: Arc<dyn ContractGateway>,
) -> QuizGame {
    let generator = QuizGenerator::from_config(model, config);
    QuizGame::new(GameRules::from(config), generator, gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizonaire_core::{CannedModel, MemoryGateway};

    #[tokio::test]
    async fn test_create_game_uses_config() {
        let config = QuizConfig {
            win_multiplier: 2.0,
            min_question_secs: 20,
            ..QuizConfig::default()
        };
        let mut game = create_game(
            &config,
            Arc::new(CannedModel::sample_deck()),
            Arc::new(MemoryGateway::new("0x00000000000000000000000000000000000000aa")),
        );

        assert_eq!(game.rules().win_multiplier, 2.0);
        assert_eq!(game.state(), GameState::Idle);

        game.dispatch(GameEvent::Open).await.unwrap();
        game.dispatch(GameEvent::Generate {
            topic: "Rust".into(),
            base_price: config.base_price,
        })
        .await
        .unwrap();
        game.dispatch(GameEvent::Start).await.unwrap();
        assert!(game.remaining_secs() >= 20);
    }
}
