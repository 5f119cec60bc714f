//! Game lifecycle.
//!
//! [`QuizGame`] owns one session at a time and moves it through
//!
//! ```text
//! IDLE -> CUSTOMIZING -> GENERATING_QUIZ -> QUIZ_READY -> AWAITING_COMMIT
//!      -> GAME_IN_PROGRESS <-> GAME_WAIT_NEXT_QUESTION -> GAME_FINISHED
//!      -> AWAITING_REVEAL -> GAME_OVER
//! ```
//!
//! All mutation goes through [`QuizGame::dispatch`]. Events that make no sense
//! in the current state are refused without touching anything. Ledger calls
//! are awaited inside `dispatch` while the machine sits in one of the two
//! awaiting states; a failed call puts it back where it was before the call.

pub mod log;
pub mod settlement;
pub mod timer;

pub use log::{ActivityLog, LogEntry, LogLevel};
pub use settlement::{settle, Settlement};
pub use timer::{question_duration, ClockDriver, Countdown};

use crate::commitment::{self, AnswerDigest};
use crate::error::{GameError, Result};
use crate::generator::QuizGenerator;
use crate::question::{AnswerReviewEntry, GameSession, Question, UserAnswerRecord};
use quizonaire_core::{ContractGateway, QuizConfig, TransactionError, TxReceipt, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Idle,
    Customizing,
    GeneratingQuiz,
    QuizReady,
    AwaitingCommit,
    GameInProgress,
    GameWaitNextQuestion,
    GameFinished,
    AwaitingReveal,
    GameOver,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "IDLE",
            GameState::Customizing => "CUSTOMIZING",
            GameState::GeneratingQuiz => "GENERATING_QUIZ",
            GameState::QuizReady => "QUIZ_READY",
            GameState::AwaitingCommit => "AWAITING_COMMIT",
            GameState::GameInProgress => "GAME_IN_PROGRESS",
            GameState::GameWaitNextQuestion => "GAME_WAIT_NEXT_QUESTION",
            GameState::GameFinished => "GAME_FINISHED",
            GameState::AwaitingReveal => "AWAITING_REVEAL",
            GameState::GameOver => "GAME_OVER",
        }
    }

    /// States in which the player's stake is locked but not yet settled.
    pub fn is_staked(&self) -> bool {
        matches!(
            self,
            GameState::GameInProgress
                | GameState::GameWaitNextQuestion
                | GameState::GameFinished
                | GameState::AwaitingReveal
        )
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Open,
    Generate { topic: String, base_price: f64 },
    Start,
    /// Text of the selected option.
    Answer(String),
    Tick,
    Timeout,
    Next,
    End,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEventKind {
    Open,
    Generate,
    Start,
    Answer,
    Tick,
    Timeout,
    Next,
    End,
    Reset,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::Open => GameEventKind::Open,
            GameEvent::Generate { .. } => GameEventKind::Generate,
            GameEvent::Start => GameEventKind::Start,
            GameEvent::Answer(_) => GameEventKind::Answer,
            GameEvent::Tick => GameEventKind::Tick,
            GameEvent::Timeout => GameEventKind::Timeout,
            GameEvent::Next => GameEventKind::Next,
            GameEvent::End => GameEventKind::End,
            GameEvent::Reset => GameEventKind::Reset,
        }
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameEventKind::Open => "open",
            GameEventKind::Generate => "generate",
            GameEventKind::Start => "start",
            GameEventKind::Answer => "answer",
            GameEventKind::Tick => "tick",
            GameEventKind::Timeout => "timeout",
            GameEventKind::Next => "next",
            GameEventKind::End => "end",
            GameEventKind::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Read-only view published on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub session: Option<GameSession>,
    pub current_index: usize,
    pub remaining_secs: u32,
    pub answered: usize,
    pub prize: Option<f64>,
    pub correct_answers: Option<usize>,
    pub review: Vec<AnswerReviewEntry>,
    pub start_tx: Option<String>,
    pub end_tx: Option<String>,
    pub last_error: Option<String>,
}

impl GameSnapshot {
    fn initial() -> Self {
        Self {
            state: GameState::Idle,
            session: None,
            current_index: 0,
            remaining_secs: 0,
            answered: 0,
            prize: None,
            correct_answers: None,
            review: Vec::new(),
            start_tx: None,
            end_tx: None,
            last_error: None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.question(self.current_index)
    }
}

/// Rules that shape a game independently of its content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameRules {
    pub win_multiplier: f64,
    pub min_question_secs: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            win_multiplier: 1.5,
            min_question_secs: 15,
        }
    }
}

impl From<&QuizConfig> for GameRules {
    fn from(config: &QuizConfig) -> Self {
        Self {
            win_multiplier: config.win_multiplier,
            min_question_secs: config.min_question_secs,
        }
    }
}

pub struct QuizGame {
    rules: GameRules,
    generator: QuizGenerator,
    gateway: Arc<dyn ContractGateway>,
    state: GameState,
    session: Option<GameSession>,
    current_index: usize,
    answers: Vec<UserAnswerRecord>,
    countdown: Countdown,
    settlement: Option<Settlement>,
    start_receipt: Option<TxReceipt>,
    end_receipt: Option<TxReceipt>,
    last_error: Option<String>,
    log: ActivityLog,
    snapshots: watch::Sender<GameSnapshot>,
}

impl QuizGame {
    pub fn new(rules: GameRules, generator: QuizGenerator, gateway: Arc<dyn ContractGateway>) -> Self {
        let (snapshots, _) = watch::channel(GameSnapshot::initial());
        Self {
            rules,
            generator,
            gateway,
            state: GameState::Idle,
            session: None,
            current_index: 0,
            answers: Vec::new(),
            countdown: Countdown::new(),
            settlement: None,
            start_receipt: None,
            end_receipt: None,
            last_error: None,
            log: ActivityLog::new(),
            snapshots,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.question(self.current_index)
    }

    pub fn answers(&self) -> &[UserAnswerRecord] {
        &self.answers
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    pub fn review(&self) -> &[AnswerReviewEntry] {
        self.settlement
            .as_ref()
            .map(|s| s.review.as_slice())
            .unwrap_or(&[])
    }

    pub fn start_receipt(&self) -> Option<&TxReceipt> {
        self.start_receipt.as_ref()
    }

    pub fn end_receipt(&self) -> Option<&TxReceipt> {
        self.end_receipt.as_ref()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn rules(&self) -> GameRules {
        self.rules
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            session: self.session.clone(),
            current_index: self.current_index,
            remaining_secs: self.countdown.remaining(),
            answered: self.answers.len(),
            prize: self.settlement.as_ref().map(|s| s.prize),
            correct_answers: self.settlement.as_ref().map(|s| s.correct),
            review: self.review().to_vec(),
            start_tx: self.start_receipt.as_ref().map(|r| r.tx_hash.clone()),
            end_tx: self.end_receipt.as_ref().map(|r| r.tx_hash.clone()),
            last_error: self.last_error.clone(),
        }
    }

    /// Receive a fresh snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.subscribe()
    }

    /// Apply one event. Returns the resulting state.
    pub async fn dispatch(&mut self, event: GameEvent) -> Result<GameState> {
        let kind = event.kind();
        match (self.state, event) {
            (_, GameEvent::Reset) => self.reset(),
            (GameState::Idle, GameEvent::Open) => {
                self.transition(GameState::Customizing);
            }
            (GameState::Customizing, GameEvent::Generate { topic, base_price }) => {
                self.generate(&topic, base_price).await?;
            }
            (GameState::QuizReady, GameEvent::Start) => self.start().await?,
            (GameState::GameInProgress, GameEvent::Answer(selected)) => {
                self.record_answer(commitment::hash(&selected))?;
            }
            (GameState::GameInProgress, GameEvent::Tick) => {
                if self.countdown.tick() {
                    self.time_out()?;
                } else {
                    self.publish();
                }
            }
            (_, GameEvent::Tick) => {}
            (GameState::GameInProgress, GameEvent::Timeout) => self.time_out()?,
            (GameState::GameWaitNextQuestion, GameEvent::Next) => self.next_question()?,
            (GameState::GameFinished, GameEvent::End) => self.end().await?,
            (state, _) => {
                return Err(GameError::InvalidTransition { state, event: kind });
            }
        }
        Ok(self.state)
    }

    fn transition(&mut self, to: GameState) {
        self.log.info(format!("{} -> {}", self.state, to));
        self.state = to;
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn reset(&mut self) {
        self.log.clear();
        if self.state.is_staked() {
            let session_id = self.session.as_ref().map_or(0, |s| s.id());
            self.log.warn(format!(
                "Game {} reset from {} before settlement, stake stays locked until the owner finalizes expired games",
                session_id, self.state
            ));
        }

        self.session = None;
        self.current_index = 0;
        self.answers.clear();
        self.countdown.cancel();
        self.settlement = None;
        self.start_receipt = None;
        self.end_receipt = None;
        self.last_error = None;
        self.log.info("Ready for a new quiz");
        self.transition(GameState::Customizing);
    }

    async fn generate(&mut self, topic: &str, base_price: f64) -> Result<()> {
        let topic = topic.trim();
        self.last_error = None;
        self.transition(GameState::GeneratingQuiz);
        self.log.info(format!(
            "Generating quiz about \"{}\" with {}",
            topic,
            self.generator.model_name()
        ));

        match self.generator.generate(topic, base_price).await {
            Ok(session) => {
                self.log.info(format!(
                    "Quiz {} ready: {} questions, total cost {}",
                    session.id(),
                    session.len(),
                    session.total_cost()
                ));
                self.session = Some(session);
                self.transition(GameState::QuizReady);
                Ok(())
            }
            Err(e) => {
                self.fail(GameState::Customizing, format!("Quiz generation failed: {}", e));
                Err(e)
            }
        }
    }

    async fn start(&mut self) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| GameError::invariant("QUIZ_READY without a session"))?;
        let session_id = session.id();
        let total_cost = session.total_cost();

        if !self.gateway.is_connected() {
            let err = TransactionError::NotConnected;
            self.fail(GameState::QuizReady, format!("Cannot start game: {}", err));
            return Err(err.into());
        }

        let value = match Wei::from_coins(total_cost) {
            Ok(value) => value,
            Err(e) => {
                self.fail(GameState::QuizReady, format!("Cannot start game: {}", e));
                return Err(e.into());
            }
        };

        self.last_error = None;
        self.transition(GameState::AwaitingCommit);
        self.log.info(format!(
            "Starting game {} with stake {}",
            session_id, value
        ));

        match self.gateway.start_game(session_id, value).await {
            Ok(receipt) => {
                self.log.info(format!("Game started, tx {}", receipt.tx_hash));
                self.start_receipt = Some(receipt);
                self.current_index = 0;
                self.answers.clear();
                self.arm_countdown()?;
                self.transition(GameState::GameInProgress);
                Ok(())
            }
            Err(e) => {
                self.fail(GameState::QuizReady, format!("Start game failed: {}", e));
                Err(e.into())
            }
        }
    }

    fn arm_countdown(&mut self) -> Result<()> {
        let difficulty = self
            .current_question()
            .ok_or_else(|| GameError::invariant("no question at the current index"))?
            .difficulty;
        self.countdown
            .arm(question_duration(difficulty, self.rules.min_question_secs));
        Ok(())
    }

    fn time_out(&mut self) -> Result<()> {
        self.log
            .warn(format!("Time is up for question {}", self.current_index + 1));
        self.record_answer(AnswerDigest::forfeit())
    }

    fn record_answer(&mut self, answer_digest: AnswerDigest) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| GameError::invariant("game in progress without a session"))?;
        let question = session
            .question(self.current_index)
            .ok_or_else(|| GameError::invariant("no question at the current index"))?;
        if self.answers.len() != self.current_index {
            return Err(GameError::invariant(format!(
                "{} answers recorded at question {}",
                self.answers.len(),
                self.current_index
            )));
        }

        let question_id = question.id;
        let is_last = self.current_index + 1 >= session.len();

        self.countdown.cancel();
        self.answers.push(UserAnswerRecord {
            question_id,
            answer_digest,
        });
        self.log
            .info(format!("Answer {} committed", self.current_index + 1));

        if is_last {
            self.transition(GameState::GameFinished);
        } else {
            self.transition(GameState::GameWaitNextQuestion);
        }
        Ok(())
    }

    fn next_question(&mut self) -> Result<()> {
        self.current_index += 1;
        self.arm_countdown()?;
        self.transition(GameState::GameInProgress);
        Ok(())
    }

    async fn end(&mut self) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| GameError::invariant("GAME_FINISHED without a session"))?;
        let session_id = session.id();
        let settlement = settle(session, &self.answers, self.rules.win_multiplier);
        let prize = match Wei::from_coins(settlement.prize) {
            Ok(prize) => prize,
            Err(e) => {
                self.fail(GameState::GameFinished, format!("Cannot settle game: {}", e));
                return Err(e.into());
            }
        };

        self.log.info(format!(
            "{} of {} correct, claiming {}",
            settlement.correct,
            session.len(),
            prize
        ));
        self.settlement = Some(settlement);
        self.last_error = None;
        self.transition(GameState::AwaitingReveal);

        match self.gateway.end_game(session_id, prize).await {
            Ok(receipt) => {
                self.log.info(format!("Game settled, tx {}", receipt.tx_hash));
                self.end_receipt = Some(receipt);
                self.transition(GameState::GameOver);
                Ok(())
            }
            Err(e) => {
                self.fail(GameState::GameFinished, format!("End game failed: {}", e));
                Err(e.into())
            }
        }
    }

    fn fail(&mut self, back_to: GameState, message: String) {
        self.log.warn(message.clone());
        self.last_error = Some(message);
        self.transition(back_to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentGenerationError;
    use quizonaire_core::gateway::GatewayCall;
    use quizonaire_core::{CannedModel, MemoryGateway, QuizonaireError};

    const PLAYER: &str = "0x00000000000000000000000000000000000000aa";

    fn gateway() -> Arc<MemoryGateway> {
        Arc::new(MemoryGateway::new(PLAYER).with_house_balance(Wei::from_wei(10u128.pow(24))))
    }

    fn game_with(gateway: Arc<MemoryGateway>, levels: Vec<u8>) -> QuizGame {
        let generator =
            QuizGenerator::new(Arc::new(CannedModel::sample_deck()), "human", 10).with_fixed_levels(levels);
        QuizGame::new(GameRules::default(), generator, gateway)
    }

    async fn ready_game(gateway: Arc<MemoryGateway>, levels: Vec<u8>, base_price: f64) -> QuizGame {
        let mut game = game_with(gateway, levels);
        game.dispatch(GameEvent::Open).await.unwrap();
        game.dispatch(GameEvent::Generate {
            topic: "Rust".into(),
            base_price,
        })
        .await
        .unwrap();
        assert_eq!(game.state(), GameState::QuizReady);
        game
    }

    fn correct_text(game: &QuizGame) -> String {
        game.current_question()
            .and_then(|q| q.correct_answer())
            .unwrap()
            .to_string()
    }

    fn wrong_text(game: &QuizGame) -> String {
        let question = game.current_question().unwrap();
        let correct = question.correct_answer().unwrap();
        question
            .options
            .iter()
            .find(|o| o.as_str() != correct)
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_scenario_a_total_cost() {
        let levels: Vec<u8> = (0..10).map(|i| i * 10).collect();
        let game = ready_game(gateway(), levels, 0.0001).await;

        let session = game.session().unwrap();
        assert!((session.total_cost() - 0.045).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_scenario_b_timer_floor() {
        let mut game = ready_game(gateway(), vec![30; 10], 0.0001).await;
        game.dispatch(GameEvent::Start).await.unwrap();

        assert_eq!(game.state(), GameState::GameInProgress);
        assert_eq!(game.remaining_secs(), 15);
    }

    #[tokio::test]
    async fn test_scenario_c_full_game_all_correct() {
        let gateway = gateway();
        let mut game = ready_game(gateway.clone(), vec![100; 10], 0.01).await;
        let session_id = game.session().unwrap().id();

        game.dispatch(GameEvent::Start).await.unwrap();
        for i in 0..10 {
            let answer = correct_text(&game);
            let state = game.dispatch(GameEvent::Answer(answer)).await.unwrap();
            if i < 9 {
                assert_eq!(state, GameState::GameWaitNextQuestion);
                game.dispatch(GameEvent::Next).await.unwrap();
            } else {
                assert_eq!(state, GameState::GameFinished);
            }
        }

        assert_eq!(game.dispatch(GameEvent::End).await.unwrap(), GameState::GameOver);

        let settlement = game.settlement().unwrap();
        assert_eq!(settlement.prize, 15.0);
        assert_eq!(settlement.correct, 10);
        assert!(game.review().iter().all(|r| r.is_correct()));

        let calls = gateway.calls();
        assert_eq!(
            calls,
            vec![
                GatewayCall::StartGame {
                    session_id,
                    value: Wei::from_wei(10 * 10u128.pow(18)),
                },
                GatewayCall::EndGame {
                    session_id,
                    prize: Wei::from_wei(15 * 10u128.pow(18)),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_scenario_d_timeout_fires_once() {
        let mut game = ready_game(gateway(), vec![30; 10], 0.0001).await;
        game.dispatch(GameEvent::Start).await.unwrap();

        for _ in 0..14 {
            assert_eq!(
                game.dispatch(GameEvent::Tick).await.unwrap(),
                GameState::GameInProgress
            );
        }
        assert_eq!(
            game.dispatch(GameEvent::Tick).await.unwrap(),
            GameState::GameWaitNextQuestion
        );

        // further ticks are ignored while waiting
        for _ in 0..5 {
            game.dispatch(GameEvent::Tick).await.unwrap();
        }

        assert_eq!(game.answers().len(), 1);
        let record = &game.answers()[0];
        let question = &game.session().unwrap().questions()[0];
        assert!(record.answer_digest.is_forfeit());
        assert_ne!(record.answer_digest, question.correct_digest);
        assert_eq!(game.remaining_secs(), 0);
    }

    #[tokio::test]
    async fn test_scenario_e_rejected_start_keeps_session() {
        let gateway = gateway();
        let mut game = ready_game(gateway.clone(), vec![50; 10], 0.001).await;
        let before = game.session().cloned();

        gateway.fail_next(TransactionError::UserRejected);
        let err = game.dispatch(GameEvent::Start).await.unwrap_err();

        assert!(err.transaction().unwrap().is_user_rejection());
        assert_eq!(game.state(), GameState::QuizReady);
        assert_eq!(game.session().cloned(), before);
        assert!(game.snapshot().last_error.is_some());
        assert_eq!(gateway.open_games(), 0);

        // safe to retry
        game.dispatch(GameEvent::Start).await.unwrap();
        assert_eq!(game.state(), GameState::GameInProgress);
    }

    #[tokio::test]
    async fn test_failed_end_is_retryable() {
        let gateway = gateway();
        let mut game = ready_game(gateway.clone(), vec![40; 10], 0.001).await;
        game.dispatch(GameEvent::Start).await.unwrap();
        for i in 0..10 {
            let answer = wrong_text(&game);
            game.dispatch(GameEvent::Answer(answer)).await.unwrap();
            if i < 9 {
                game.dispatch(GameEvent::Next).await.unwrap();
            }
        }

        gateway.fail_next(TransactionError::Rpc {
            code: -32603,
            message: "internal error".into(),
        });
        let err = game.dispatch(GameEvent::End).await.unwrap_err();
        assert!(err.transaction().unwrap().is_transient());
        assert_eq!(game.state(), GameState::GameFinished);
        assert_eq!(game.answers().len(), 10);

        game.dispatch(GameEvent::End).await.unwrap();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.settlement().unwrap().prize, 0.0);
        assert!(game.end_receipt().is_some());
    }

    #[tokio::test]
    async fn test_answers_follow_question_order() {
        let mut game = ready_game(gateway(), vec![20; 10], 0.001).await;
        game.dispatch(GameEvent::Start).await.unwrap();

        for i in 0..4 {
            let answer = if i % 2 == 0 { correct_text(&game) } else { wrong_text(&game) };
            game.dispatch(GameEvent::Answer(answer)).await.unwrap();
            game.dispatch(GameEvent::Next).await.unwrap();
        }

        let session = game.session().unwrap();
        assert!(game.answers().len() <= session.len());
        for (i, record) in game.answers().iter().enumerate() {
            assert_eq!(record.question_id, session.questions()[i].id);
        }
    }

    /// Drive a fresh game forward until it rests in `target`.
    async fn game_in(gateway: Arc<MemoryGateway>, target: GameState) -> QuizGame {
        let mut game = game_with(gateway, vec![10; 10]);
        let steps = [
            GameState::Customizing,
            GameState::QuizReady,
            GameState::GameInProgress,
            GameState::GameWaitNextQuestion,
            GameState::GameFinished,
            GameState::GameOver,
        ];

        for step in steps {
            if game.state() == target {
                break;
            }
            match step {
                GameState::Customizing => {
                    game.dispatch(GameEvent::Open).await.unwrap();
                }
                GameState::QuizReady => {
                    game.dispatch(GameEvent::Generate {
                        topic: "Rust".into(),
                        base_price: 0.001,
                    })
                    .await
                    .unwrap();
                }
                GameState::GameInProgress => {
                    game.dispatch(GameEvent::Start).await.unwrap();
                }
                GameState::GameWaitNextQuestion => {
                    let answer = correct_text(&game);
                    game.dispatch(GameEvent::Answer(answer)).await.unwrap();
                }
                GameState::GameFinished => {
                    loop {
                        game.dispatch(GameEvent::Next).await.unwrap();
                        let answer = correct_text(&game);
                        if game.dispatch(GameEvent::Answer(answer)).await.unwrap()
                            == GameState::GameFinished
                        {
                            break;
                        }
                    }
                }
                _ => {
                    game.dispatch(GameEvent::End).await.unwrap();
                }
            }
            assert_eq!(game.state(), step);
        }

        assert_eq!(game.state(), target);
        game
    }

    #[tokio::test]
    async fn test_reset_from_every_reachable_state() {
        let resting = [
            GameState::Idle,
            GameState::Customizing,
            GameState::QuizReady,
            GameState::GameInProgress,
            GameState::GameWaitNextQuestion,
            GameState::GameFinished,
            GameState::GameOver,
        ];

        for from in resting {
            let mut game = game_in(gateway(), from).await;
            game.dispatch(GameEvent::Reset).await.unwrap();

            let snapshot = game.snapshot();
            assert_eq!(snapshot.state, GameState::Customizing, "reset from {}", from);
            assert!(snapshot.session.is_none());
            assert_eq!(snapshot.answered, 0);
            assert!(snapshot.review.is_empty());
            assert_eq!(snapshot.remaining_secs, 0);
            assert!(snapshot.prize.is_none());
            assert!(snapshot.start_tx.is_none());
            assert!(snapshot.end_tx.is_none());

            // idempotent
            game.dispatch(GameEvent::Reset).await.unwrap();
            assert_eq!(game.snapshot(), snapshot);
        }
    }

    #[tokio::test]
    async fn test_staked_reset_keeps_locked_stake_warning() {
        for from in [
            GameState::GameInProgress,
            GameState::GameWaitNextQuestion,
            GameState::GameFinished,
        ] {
            let mut game = game_in(gateway(), from).await;
            let session_id = game.session().unwrap().id();
            game.dispatch(GameEvent::Reset).await.unwrap();

            let warning = game
                .log()
                .entries()
                .iter()
                .find(|e| e.level == LogLevel::Warn)
                .expect("locked stake warning");
            assert!(warning.message.contains("stake stays locked"));
            assert!(warning.message.contains(&session_id.to_string()));
            assert_eq!(
                game.log().last().unwrap().message,
                format!("{} -> CUSTOMIZING", from)
            );
        }

        // nothing is locked before the stake or after settlement
        for from in [GameState::QuizReady, GameState::GameOver] {
            let mut game = game_in(gateway(), from).await;
            game.dispatch(GameEvent::Reset).await.unwrap();
            assert!(game.log().entries().iter().all(|e| e.level == LogLevel::Info));
        }
    }

    #[tokio::test]
    async fn test_every_transition_is_logged() {
        let mut game = game_with(gateway(), vec![10; 10]);
        assert!(game.log().is_empty());

        game.dispatch(GameEvent::Open).await.unwrap();
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.log().last().unwrap().message, "IDLE -> CUSTOMIZING");

        let mut game = game_in(gateway(), GameState::GameWaitNextQuestion).await;
        let before = game.log().len();
        game.dispatch(GameEvent::Next).await.unwrap();
        assert_eq!(game.log().len(), before + 1);
        assert_eq!(
            game.log().last().unwrap().message,
            "GAME_WAIT_NEXT_QUESTION -> GAME_IN_PROGRESS"
        );
    }

    #[tokio::test]
    async fn test_unpayable_stake_is_logged_and_refused() {
        let gateway = gateway();
        // 10 questions x 100 points x 1e20 overflows the wei range
        let mut game = ready_game(gateway.clone(), vec![100; 10], 1e20).await;

        let err = game.dispatch(GameEvent::Start).await.unwrap_err();
        assert!(matches!(err, GameError::Core(QuizonaireError::InvalidAmount(_))));
        assert_eq!(game.state(), GameState::QuizReady);
        assert!(game.snapshot().last_error.is_some());

        let last = game.log().last().unwrap();
        assert_eq!(last.level, LogLevel::Warn);
        assert!(last.message.starts_with("Cannot start game"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_events_are_refused() {
        let mut game = game_with(gateway(), vec![10; 10]);

        let err = game.dispatch(GameEvent::Start).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidTransition {
                state: GameState::Idle,
                event: GameEventKind::Start
            }
        ));
        assert_eq!(game.state(), GameState::Idle);

        // ticks outside a question are ignored
        assert_eq!(game.dispatch(GameEvent::Tick).await.unwrap(), GameState::Idle);

        let mut game = ready_game(gateway(), vec![10; 10], 0.001).await;
        assert!(game
            .dispatch(GameEvent::Answer("anything".into()))
            .await
            .is_err());
        assert!(game.dispatch(GameEvent::End).await.is_err());
        assert_eq!(game.state(), GameState::QuizReady);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_to_customizing() {
        let generator = QuizGenerator::new(Arc::new(CannedModel::new("not json")), "human", 10);
        let mut game = QuizGame::new(GameRules::default(), generator, gateway());
        game.dispatch(GameEvent::Open).await.unwrap();

        let err = game
            .dispatch(GameEvent::Generate {
                topic: "Rust".into(),
                base_price: 0.001,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GameError::ContentGeneration(ContentGenerationError::NotJsonArray(_))
        ));
        assert_eq!(game.state(), GameState::Customizing);
        assert!(game.session().is_none());
    }

    #[tokio::test]
    async fn test_start_requires_connected_gateway() {
        let gateway = Arc::new(MemoryGateway::disconnected(PLAYER));
        let mut game = ready_game(gateway.clone(), vec![10; 10], 0.001).await;

        let err = game.dispatch(GameEvent::Start).await.unwrap_err();
        assert_eq!(err.transaction(), Some(&TransactionError::NotConnected));
        assert_eq!(game.state(), GameState::QuizReady);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let mut game = ready_game(gateway(), vec![10; 10], 0.001).await;
        let mut rx = game.subscribe();

        game.dispatch(GameEvent::Start).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.state, GameState::GameInProgress);
        assert_eq!(snapshot.current_question().unwrap().index, 0);
        assert!(snapshot.start_tx.is_some());
    }
}
