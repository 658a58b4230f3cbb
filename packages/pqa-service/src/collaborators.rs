//! Default collaborators backed by Qdrant and OpenAI-compatible HTTP endpoints.

use std::sync::Arc;

use color_eyre::eyre;

use pqa_config::{EmbeddingProviderConfig, LlmProviderConfig};
use pqa_domain::{CompiledFilter, ConversationTurn, RetrievedDocument};
use pqa_providers::{chat, embedding, prompt};
use pqa_storage::{index, qdrant::QdrantStore};

use crate::{BoxFuture, Generator, VectorIndex};

pub struct QdrantIndex {
	store: Arc<QdrantStore>,
	embedding: EmbeddingProviderConfig,
	llm: LlmProviderConfig,
	fallback_k: u32,
}
impl QdrantIndex {
	pub fn new(
		store: Arc<QdrantStore>,
		embedding: EmbeddingProviderConfig,
		llm: LlmProviderConfig,
		fallback_k: u32,
	) -> Self {
		Self { store, embedding, llm, fallback_k }
	}

	async fn embed_one(&self, text: &str) -> color_eyre::Result<Vec<f32>> {
		let vectors = embedding::embed(&self.embedding, &[text.to_string()]).await?;

		vectors.into_iter().next().ok_or_else(|| eyre::eyre!("Embedding response is empty."))
	}

	/// Rewrites a follow-up into a standalone question. Without history the question is used
	/// as is.
	async fn standalone_question(
		&self,
		question: &str,
		history: &[ConversationTurn],
	) -> color_eyre::Result<String> {
		if history.is_empty() {
			return Ok(question.to_string());
		}

		let rewritten =
			chat::complete(&self.llm, &prompt::contextualize_messages(history, question)).await?;

		tracing::debug!(original = question, rewritten = %rewritten, "Rewrote follow-up question.");

		Ok(rewritten)
	}

	async fn search_filtered(
		&self,
		query: &str,
		filter: &CompiledFilter,
		k: u32,
	) -> color_eyre::Result<Vec<RetrievedDocument>> {
		let vector = self.embed_one(query).await?;

		Ok(index::search(&self.store, vector, filter, u64::from(k)).await?)
	}

	async fn search_with_history(
		&self,
		question: &str,
		history: &[ConversationTurn],
	) -> color_eyre::Result<Vec<RetrievedDocument>> {
		let query = self.standalone_question(question, history).await?;
		let vector = self.embed_one(&query).await?;

		Ok(index::search(
			&self.store,
			vector,
			&CompiledFilter::Unconstrained,
			u64::from(self.fallback_k),
		)
		.await?)
	}
}
impl VectorIndex for QdrantIndex {
	fn filtered_search<'a>(
		&'a self,
		query: &'a str,
		filter: &'a CompiledFilter,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>> {
		Box::pin(self.search_filtered(query, filter, k))
	}

	fn history_aware_retrieve<'a>(
		&'a self,
		question: &'a str,
		history: &'a [ConversationTurn],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>> {
		Box::pin(self.search_with_history(question, history))
	}

	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move { Ok(index::count(&self.store).await?) })
	}
}

pub struct LlmGenerator {
	llm: LlmProviderConfig,
}
impl LlmGenerator {
	pub fn new(llm: LlmProviderConfig) -> Self {
		Self { llm }
	}
}
impl Generator for LlmGenerator {
	fn generate<'a>(
		&'a self,
		history: &'a [ConversationTurn],
		documents: &'a [RetrievedDocument],
		question: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			let messages = prompt::answer_messages(history, documents, question);

			Ok(chat::complete(&self.llm, &messages).await?)
		})
	}
}
