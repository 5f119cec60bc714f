/// Longest question text the model is asked to produce.
pub const MAX_QUESTION_CHARS: usize = 120;

/// Build the generation prompt for `topic`, asking for one question per
/// difficulty level, in order.
pub fn quiz_prompt(topic: &str, persona: &str, difficulty_levels: &[u8]) -> String {
    let count = difficulty_levels.len();
    let levels = difficulty_levels
        .iter()
        .map(|level| level.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"You are {persona}. Write a quiz of {count} distinct questions about the topic: "{topic}".

Each question has a difficulty between 0 and 100. 0 is a basic question almost anyone familiar with "{topic}" could answer; 100 needs deep, expert knowledge of "{topic}".

The difficulty of question 1 through {count}, in order, is: {levels}. Follow this sequence exactly.

---
RESPONSE FORMAT:
Return ONLY one valid JSON array containing exactly {count} objects.
Every object is one question with these keys:
- "question" (string): the question text, at most {max_chars} characters.
- "options" (array of 4 strings): four different possible answers, exactly one of them correct.
- "correctAnswer" (string): the correct answer, an exact case-sensitive copy of one of the four "options".

---
EXAMPLE (topic "The Solar System"; do not reuse it, write about "{topic}"):

[
  {{
    "question": "Which planet is closest to the Sun?",
    "options": ["Venus", "Mercury", "Mars", "Earth"],
    "correctAnswer": "Mercury"
  }},
  {{
    "question": "What is the name of the largest moon of Neptune?",
    "options": ["Nereid", "Proteus", "Triton", "Larissa"],
    "correctAnswer": "Triton"
  }}
]

The whole response MUST start with [ and end with ]. No other text, comments or markdown such as ```json.
"#,
        persona = persona,
        count = count,
        topic = topic,
        levels = levels,
        max_chars = MAX_QUESTION_CHARS,
    )
}
