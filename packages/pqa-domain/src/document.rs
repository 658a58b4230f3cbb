use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stored fact as returned by the index: the rendered text plus its metadata attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
	pub content: String,
	#[serde(default)]
	pub metadata: BTreeMap<String, String>,
}
impl RetrievedDocument {
	pub fn new(content: impl Into<String>) -> Self {
		Self { content: content.into(), metadata: BTreeMap::new() }
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata.insert(key.into(), value.into());

		self
	}

	pub fn metadata_value(&self, key: &str) -> Option<&str> {
		self.metadata.get(key).map(String::as_str)
	}
}
