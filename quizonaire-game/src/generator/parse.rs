//! Parsing and validation of model output.
//!
//! The response is untrusted input: nothing becomes a [`Question`] until the
//! whole set has the expected shape.
//!
//! [`Question`]: crate::question::Question

use crate::error::ContentGenerationError;
use serde::Deserialize;
use std::collections::HashSet;

/// One question exactly as the model wrote it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// A question that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidQuestion {
    pub question: String,
    pub options: [String; 4],
    pub correct_answer: String,
}

/// Drop code fences and any prose around the outermost JSON array.
pub fn strip_wrapping(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim(),
    }
}

/// Parse the raw response into an array of questions.
pub fn parse_response(raw: &str) -> Result<Vec<RawQuestion>, ContentGenerationError> {
    if raw.trim().is_empty() {
        return Err(ContentGenerationError::EmptyResponse);
    }

    let body = strip_wrapping(raw);
    let questions: Vec<RawQuestion> = serde_json::from_str(body)
        .map_err(|e| ContentGenerationError::NotJsonArray(e.to_string()))?;

    if questions.is_empty() {
        return Err(ContentGenerationError::EmptyArray);
    }

    Ok(questions)
}

/// Check the parsed set against the requested shape.
pub fn validate(
    questions: Vec<RawQuestion>,
    expected: usize,
) -> Result<Vec<ValidQuestion>, ContentGenerationError> {
    if questions.len() != expected {
        return Err(ContentGenerationError::WrongQuestionCount {
            expected,
            actual: questions.len(),
        });
    }

    questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| validate_one(index, raw))
        .collect()
}

fn validate_one(index: usize, raw: RawQuestion) -> Result<ValidQuestion, ContentGenerationError> {
    if raw.question.trim().is_empty() {
        return Err(ContentGenerationError::EmptyQuestion { index });
    }

    let count = raw.options.len();
    let options: [String; 4] = raw
        .options
        .try_into()
        .map_err(|_| ContentGenerationError::WrongOptionCount { index, count })?;

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(ContentGenerationError::DuplicateOptions { index });
    }

    if !options.contains(&raw.correct_answer) {
        return Err(ContentGenerationError::AnswerNotInOptions { index });
    }

    Ok(ValidQuestion {
        question: raw.question,
        options,
        correct_answer: raw.correct_answer,
    })
}

/// Parse and validate in one step.
pub fn parse_question_set(
    raw: &str,
    expected: usize,
) -> Result<Vec<ValidQuestion>, ContentGenerationError> {
    validate(parse_response(raw)?, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str, options: &[&str], answer: &str) -> String {
        serde_json::json!({
            "question": question,
            "options": options,
            "correctAnswer": answer,
        })
        .to_string()
    }

    fn deck(n: usize) -> String {
        let entries: Vec<String> = (0..n)
            .map(|i| entry(&format!("Question {}?", i), &["a", "b", "c", "d"], "b"))
            .collect();
        format!("[{}]", entries.join(","))
    }

    #[test]
    fn test_strips_code_fences_and_prose() {
        let fenced = format!("```json\n{}\n```", deck(2));
        assert_eq!(parse_response(&fenced).unwrap().len(), 2);

        let chatty = format!("Sure! Here is your quiz:\n{}\nEnjoy.", deck(3));
        assert_eq!(parse_response(&chatty).unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert_eq!(parse_response("  "), Err(ContentGenerationError::EmptyResponse));
        assert_eq!(parse_response("[]"), Err(ContentGenerationError::EmptyArray));
        assert!(matches!(
            parse_response("{\"question\": \"x\"}"),
            Err(ContentGenerationError::NotJsonArray(_))
        ));
        assert!(matches!(
            parse_response("I cannot help with that."),
            Err(ContentGenerationError::NotJsonArray(_))
        ));
    }

    #[test]
    fn test_valid_deck() {
        let questions = parse_question_set(&deck(10), 10).unwrap();
        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0].options[1], "b");
        assert_eq!(questions[9].correct_answer, "b");
    }

    #[test]
    fn test_wrong_question_count() {
        assert_eq!(
            parse_question_set(&deck(9), 10),
            Err(ContentGenerationError::WrongQuestionCount {
                expected: 10,
                actual: 9
            })
        );
    }

    #[test]
    fn test_option_rules() {
        let three = format!("[{}]", entry("q", &["a", "b", "c"], "a"));
        assert_eq!(
            parse_question_set(&three, 1),
            Err(ContentGenerationError::WrongOptionCount { index: 0, count: 3 })
        );

        let duplicate = format!("[{}]", entry("q", &["a", "a", "c", "d"], "a"));
        assert_eq!(
            parse_question_set(&duplicate, 1),
            Err(ContentGenerationError::DuplicateOptions { index: 0 })
        );

        let wrong_case = format!("[{}]", entry("q", &["Roach", "b", "c", "d"], "roach"));
        assert_eq!(
            parse_question_set(&wrong_case, 1),
            Err(ContentGenerationError::AnswerNotInOptions { index: 0 })
        );

        let blank = format!("[{}]", entry(" ", &["a", "b", "c", "d"], "a"));
        assert_eq!(
            parse_question_set(&blank, 1),
            Err(ContentGenerationError::EmptyQuestion { index: 0 })
        );
    }
}
