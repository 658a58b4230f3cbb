use std::{
	collections::HashMap,
	sync::{Arc, Mutex, PoisonError},
};

use pqa_domain::ConversationMemory;

use crate::SessionStore;

/// One conversation. The memory lock is held for a whole turn, so turns of the same session
/// never interleave.
#[derive(Debug, Default)]
pub struct Session {
	memory: tokio::sync::Mutex<ConversationMemory>,
}
impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn memory(&self) -> &tokio::sync::Mutex<ConversationMemory> {
		&self.memory
	}
}

/// Process-local sessions keyed by caller handle. The map lock only covers lookup and removal.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
	sessions: Mutex<HashMap<String, Arc<Session>>>,
}
impl InMemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl SessionStore for InMemorySessionStore {
	fn session(&self, handle: &str) -> Arc<Session> {
		let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

		sessions.entry(handle.to_string()).or_default().clone()
	}

	fn end(&self, handle: &str) -> bool {
		self.sessions.lock().unwrap_or_else(PoisonError::into_inner).remove(handle).is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_handle_shares_one_session() {
		let store = InMemorySessionStore::new();
		let first = store.session("a");
		let second = store.session("a");

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn ended_session_starts_fresh() {
		let store = InMemorySessionStore::new();
		let first = store.session("a");

		assert!(store.end("a"));
		assert!(!store.end("a"));
		assert!(store.is_empty());
		assert!(!Arc::ptr_eq(&first, &store.session("a")));
	}
}
