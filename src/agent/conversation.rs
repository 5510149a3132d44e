//! Conversation history management
//!
//! The history is an ordered list of provider-neutral turns whose first
//! element is always the system turn. Codecs encode it per request.

use crate::core::{Role, Turn};

/// Number of recent turns kept verbatim by a compaction
pub const KEPT_TAIL: usize = 2;

/// Owns the history of one conversation model
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create a conversation holding only the system turn
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    /// Replace the system turn's text
    pub fn set_system(&mut self, prompt: impl Into<String>) {
        let turn = Turn::system(prompt);
        match self.turns.first_mut() {
            Some(first) if first.role == Role::System => *first = turn,
            _ => self.turns.insert(0, turn),
        }
    }

    /// Text of the system turn
    pub fn system(&self) -> String {
        self.turns
            .first()
            .map(Turn::text_content)
            .unwrap_or_default()
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Every turn, system first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Get turn count, system turn included
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Get the last N turns, never reaching into the system turn
    pub fn last_n(&self, n: usize) -> &[Turn] {
        let n = n.min(self.turns.len().saturating_sub(1));
        &self.turns[self.turns.len() - n..]
    }

    /// Turns a compaction would fold into the summary: everything between
    /// the system turn and the kept tail
    pub fn summarizable(&self) -> &[Turn] {
        let end = self.turns.len().saturating_sub(KEPT_TAIL).max(1);
        self.turns.get(1..end).unwrap_or(&[])
    }

    /// Replace the history with `[system, summary, tail]`
    pub fn compact(&mut self, summary: impl Into<String>) {
        let system = self.turns[0].clone();
        let tail = self.last_n(KEPT_TAIL).to_vec();

        let mut turns = Vec::with_capacity(KEPT_TAIL + 2);
        turns.push(system);
        turns.push(Turn::system(summary));
        turns.extend(tail);
        self.turns = turns;
    }

    /// Replace everything after the system turn
    pub fn reset_to(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.truncate(1);
        self.turns.extend(turns);
    }

    /// Drop everything after the system turn
    pub fn clear(&mut self) {
        self.turns.truncate(1);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new("")
    }
}
