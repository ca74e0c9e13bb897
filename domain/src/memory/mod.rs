//! Conversation memory: the append-only record of completed chat turns.

use serde::{Deserialize, Serialize};

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub input: String,
    pub output: String,
}

impl Turn {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Ordered history of [`Turn`]s.
///
/// Grows by one turn per successful, persisted chat. The only way to drop
/// turns is an explicit [`clear`](Self::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.turns.push(Turn::new(input, output));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Render as `Human:` / `AI:` lines for the `history` slot.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Human: {}\nAI: {}", t.input, t.output))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
