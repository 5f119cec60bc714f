//! Quiz content generation.
//!
//! A fresh difficulty sequence is rolled for every quiz, embedded in the
//! prompt, and the model's answer is parsed and validated before any
//! [`Question`] is built from it.

pub mod parse;
pub mod prompt;

pub use parse::{parse_question_set, RawQuestion, ValidQuestion};
pub use prompt::{quiz_prompt, MAX_QUESTION_CHARS};

use crate::error::{ContentGenerationError, GameError, Result};
use crate::question::{GameSession, Question, MAX_DIFFICULTY};
use chrono::Utc;
use quizonaire_core::{QuizConfig, TextModel};
use rand::Rng;
use std::sync::Arc;

pub struct QuizGenerator {
    model: Arc<dyn TextModel>,
    persona: String,
    question_count: usize,
    fixed_levels: Option<Vec<u8>>,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn TextModel>, persona: impl Into<String>, question_count: usize) -> Self {
        Self {
            model,
            persona: persona.into(),
            question_count,
            fixed_levels: None,
        }
    }

    /// Always use `levels` instead of rolling a new sequence.
    pub fn with_fixed_levels(mut self, levels: Vec<u8>) -> Self {
        self.question_count = levels.len();
        self.fixed_levels = Some(levels);
        self
    }

    pub fn from_config(model: Arc<dyn TextModel>, config: &QuizConfig) -> Self {
        Self::new(model, config.persona.clone(), config.question_count)
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// One independent uniform draw from `0..=100` per question.
    pub fn roll_difficulties(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        (0..self.question_count)
            .map(|_| rng.gen_range(0..=MAX_DIFFICULTY))
            .collect()
    }

    /// Generate a quiz about `topic` priced at `base_price` per difficulty point.
    pub async fn generate(&self, topic: &str, base_price: f64) -> Result<GameSession> {
        let levels = match &self.fixed_levels {
            Some(levels) => levels.clone(),
            None => self.roll_difficulties(),
        };
        self.generate_with_levels(topic, base_price, &levels).await
    }

    /// Generate a quiz with a fixed difficulty sequence.
    pub async fn generate_with_levels(
        &self,
        topic: &str,
        base_price: f64,
        levels: &[u8],
    ) -> Result<GameSession> {
        if !base_price.is_finite() || base_price <= 0.0 {
            return Err(GameError::InvalidBasePrice(base_price));
        }
        if let Some(&level) = levels.iter().find(|&&l| l > MAX_DIFFICULTY) {
            return Err(ContentGenerationError::DifficultyOutOfRange(level).into());
        }

        let prompt = quiz_prompt(topic, &self.persona, levels);
        tracing::debug!(
            "Requesting {} questions about {:?} from {}",
            levels.len(),
            topic,
            self.model.name()
        );

        let raw = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| ContentGenerationError::Service(e.to_string()))?;

        let parsed = parse_question_set(&raw, levels.len())?;

        let questions = parsed
            .into_iter()
            .zip(levels.iter().copied())
            .enumerate()
            .map(|(index, (q, difficulty))| {
                Question::new(
                    index,
                    q.question,
                    q.options,
                    &q.correct_answer,
                    difficulty,
                    base_price,
                )
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let session_id = Utc::now().timestamp_millis().max(0) as u64;
        let session = GameSession::new(session_id, topic.to_string(), base_price, questions)?;

        tracing::info!(
            "Generated quiz {} about {:?}: {} questions, total cost {}",
            session.id(),
            topic,
            session.len(),
            session.total_cost()
        );

        Ok(session)
    }
}
