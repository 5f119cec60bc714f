use super::TextModel;
use crate::error::Result;
use async_trait::async_trait;

/// Ten questions used when playing offline.
pub const SAMPLE_DECK: &str = r#"```json
[
  {
    "question": "Which keyword introduces an immutable variable binding in Rust?",
    "options": ["var", "let", "const", "static"],
    "correctAnswer": "let"
  },
  {
    "question": "What is the name of Rust's package manager and build tool?",
    "options": ["Cargo", "Crate", "Rustup", "Pip"],
    "correctAnswer": "Cargo"
  },
  {
    "question": "Which trait must a type implement to be printed with {:?}?",
    "options": ["Display", "Debug", "Format", "Show"],
    "correctAnswer": "Debug"
  },
  {
    "question": "What does the ? operator do with an Err value?",
    "options": ["Panics", "Ignores it", "Returns it early", "Logs it"],
    "correctAnswer": "Returns it early"
  },
  {
    "question": "Which smart pointer gives shared ownership across threads?",
    "options": ["Rc", "Box", "Arc", "Cell"],
    "correctAnswer": "Arc"
  },
  {
    "question": "Which marker trait means a type can be moved to another thread?",
    "options": ["Sync", "Send", "Copy", "Unpin"],
    "correctAnswer": "Send"
  },
  {
    "question": "What is the size in bytes of a u128 value?",
    "options": ["8", "12", "16", "32"],
    "correctAnswer": "16"
  },
  {
    "question": "Which edition introduced async/await as stable syntax?",
    "options": ["2015", "2018", "2021", "2024"],
    "correctAnswer": "2018"
  },
  {
    "question": "What does a lifetime parameter like 'a describe?",
    "options": ["A thread id", "How long a reference is valid", "A heap size", "A loop label"],
    "correctAnswer": "How long a reference is valid"
  },
  {
    "question": "Which hash function does the EVM expose as the SHA3 opcode?",
    "options": ["SHA-256", "BLAKE2b", "Keccak-256", "RIPEMD-160"],
    "correctAnswer": "Keccak-256"
  }
]
```"#;

/// Returns the same response for every prompt.
pub struct CannedModel {
    response: String,
}

impl CannedModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    pub fn sample_deck() -> Self {
        Self::new(SAMPLE_DECK)
    }
}

#[async_trait]
impl TextModel for CannedModel {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
