use crate::commitment::{self, AnswerDigest};
use crate::error::{ContentGenerationError, GameError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_DIFFICULTY: u8 = 100;

/// One generated question. Only the digest of the correct answer is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub index: usize,
    pub id: Uuid,
    pub prompt: String,
    pub options: [String; 4],
    pub correct_digest: AnswerDigest,
    pub difficulty: u8,
    pub cost: f64,
}

impl Question {
    pub fn new(
        index: usize,
        prompt: String,
        options: [String; 4],
        correct_answer: &str,
        difficulty: u8,
        base_price: f64,
    ) -> std::result::Result<Self, ContentGenerationError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ContentGenerationError::DifficultyOutOfRange(difficulty));
        }

        Ok(Self {
            index,
            id: Uuid::new_v4(),
            prompt,
            options,
            correct_digest: commitment::hash(correct_answer),
            difficulty,
            cost: question_cost(difficulty, base_price),
        })
    }

    pub fn correct_answer(&self) -> Option<&str> {
        commitment::reveal(&self.options, &self.correct_digest)
    }
}

pub fn question_cost(difficulty: u8, base_price: f64) -> f64 {
    f64::from(difficulty) * base_price
}

/// A generated quiz. Immutable once built: every cost is fixed before any
/// stake is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    id: u64,
    topic: String,
    base_price: f64,
    questions: Vec<Question>,
    total_cost: f64,
}

impl GameSession {
    pub fn new(id: u64, topic: String, base_price: f64, questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(GameError::invariant("a session needs at least one question"));
        }
        if questions.iter().enumerate().any(|(i, q)| q.index != i) {
            return Err(GameError::invariant("question indices must follow presentation order"));
        }

        let total_cost = questions.iter().map(|q| q.cost).sum();

        Ok(Self {
            id,
            topic,
            base_price,
            questions,
            total_cost,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }
}

/// The player's committed answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswerRecord {
    pub question_id: Uuid,
    pub answer_digest: AnswerDigest,
}

/// Post-game view of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReviewEntry {
    pub question: String,
    pub correct_answer: Option<String>,
    /// `None` when the player ran out of time.
    pub player_answer: Option<String>,
}

impl AnswerReviewEntry {
    pub fn is_correct(&self) -> bool {
        self.player_answer.is_some() && self.player_answer == self.correct_answer
    }
}

/// Named base prices offered before generating a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTier {
    Novice,
    Acolyte,
    Adept,
    Master,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::Novice,
        PriceTier::Acolyte,
        PriceTier::Adept,
        PriceTier::Master,
    ];

    pub fn base_price(&self) -> f64 {
        match self {
            PriceTier::Novice => 0.00001,
            PriceTier::Acolyte => 0.0001,
            PriceTier::Adept => 0.001,
            PriceTier::Master => 0.01,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceTier::Novice => "Novice",
            PriceTier::Acolyte => "Acolyte",
            PriceTier::Adept => "Adept",
            PriceTier::Master => "Master",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PriceTier::Novice => "A super light trial",
            PriceTier::Acolyte => "A light trial",
            PriceTier::Adept => "A worthy challenge",
            PriceTier::Master => "A trial of legends",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(value.trim()))
    }
}
