use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
	pub question: String,
	pub answer: String,
}
impl ConversationTurn {
	pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
		Self { question: question.into(), answer: answer.into() }
	}
}

/// Append-only log of one session's successful exchanges, oldest first.
///
/// Not synchronized; the owning session serializes access.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
	turns: Vec<ConversationTurn>,
}
impl ConversationMemory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn append(&mut self, turn: ConversationTurn) {
		self.turns.push(turn);
	}

	pub fn history(&self) -> &[ConversationTurn] {
		&self.turns
	}

	pub fn len(&self) -> usize {
		self.turns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.turns.is_empty()
	}
}
