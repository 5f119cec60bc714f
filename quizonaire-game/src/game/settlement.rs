use crate::commitment;
use crate::question::{AnswerReviewEntry, GameSession, UserAnswerRecord};
use serde::{Deserialize, Serialize};

/// Outcome of revealing a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub prize: f64,
    pub correct: usize,
    pub review: Vec<AnswerReviewEntry>,
}

/// Reveal every answer and compute the prize.
///
/// A question pays `cost * multiplier` when the record at its position has
/// the question's id and a digest equal to the correct digest. Questions
/// without a record (or with a forfeit record) pay nothing.
pub fn settle(session: &GameSession, answers: &[UserAnswerRecord], multiplier: f64) -> Settlement {
    let mut prize = 0.0;
    let mut correct = 0;
    let mut review = Vec::with_capacity(session.len());

    for (i, question) in session.questions().iter().enumerate() {
        let record = answers.get(i).filter(|r| r.question_id == question.id);

        let won = record.map_or(false, |r| {
            !r.answer_digest.is_forfeit() && r.answer_digest == question.correct_digest
        });
        if won {
            prize += question.cost * multiplier;
            correct += 1;
        }

        review.push(AnswerReviewEntry {
            question: question.prompt.clone(),
            correct_answer: question.correct_answer().map(str::to_string),
            player_answer: record
                .and_then(|r| commitment::reveal(&question.options, &r.answer_digest))
                .map(str::to_string),
        });
    }

    Settlement {
        prize,
        correct,
        review,
    }
}
