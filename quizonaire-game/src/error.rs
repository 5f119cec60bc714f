use crate::game::{GameEventKind, GameState};
use quizonaire_core::{QuizonaireError, TransactionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Quizonaire core error: {0}")]
    Core(#[from] QuizonaireError),

    #[error("Content generation failed: {0}")]
    ContentGeneration(#[from] ContentGenerationError),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Event {event} is not accepted in state {state}")]
    InvalidTransition {
        state: GameState,
        event: GameEventKind,
    },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid base price: {0}")]
    InvalidBasePrice(f64),
}

impl GameError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// The underlying ledger failure, if this error came from a transaction.
    pub fn transaction(&self) -> Option<&TransactionError> {
        match self {
            GameError::Transaction(e) => Some(e),
            GameError::Core(QuizonaireError::Transaction(e)) => Some(e),
            _ => None,
        }
    }
}

/// Why a generated question set was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentGenerationError {
    #[error("Text model request failed: {0}")]
    Service(String),

    #[error("Quiz is empty")]
    EmptyResponse,

    #[error("Response is not a JSON array of questions: {0}")]
    NotJsonArray(String),

    #[error("Question array is empty")]
    EmptyArray,

    #[error("Expected {expected} questions, got {actual}")]
    WrongQuestionCount { expected: usize, actual: usize },

    #[error("Question {index} has {count} options instead of 4")]
    WrongOptionCount { index: usize, count: usize },

    #[error("Question {index} repeats an option")]
    DuplicateOptions { index: usize },

    #[error("Question {index}: correct answer is not one of the options")]
    AnswerNotInOptions { index: usize },

    #[error("Question {index} has empty text")]
    EmptyQuestion { index: usize },

    #[error("Difficulty {0} is outside 0..=100")]
    DifficultyOutOfRange(u8),
}
