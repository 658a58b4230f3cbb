pub mod assembler;
pub mod collaborators;
pub mod router;
pub mod session;

mod error;

pub use assembler::{AnswerAssembler, AnswerResult};
pub use collaborators::{LlmGenerator, QdrantIndex};
pub use error::{Error, Result};
pub use router::{RetrievalRouter, RouteOutcome};
pub use session::{InMemorySessionStore, Session};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;

use pqa_config::{Chat, Config, Retrieval};
use pqa_domain::{
	CompiledFilter, ConversationTurn, PatternExtractor, PredicateExtractor, RetrievedDocument,
	sentinel,
};
use pqa_storage::qdrant::QdrantStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Similarity search for `query` restricted to documents matching `filter`.
	fn filtered_search<'a>(
		&'a self,
		query: &'a str,
		filter: &'a CompiledFilter,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>>;

	/// Unfiltered retrieval that may use `history` to resolve references in `question`.
	fn history_aware_retrieve<'a>(
		&'a self,
		question: &'a str,
		history: &'a [ConversationTurn],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>>;

	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>>;
}

pub trait Generator
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		history: &'a [ConversationTurn],
		documents: &'a [RetrievedDocument],
		question: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the session for `handle`, creating it on first use.
	fn session(&self, handle: &str) -> Arc<Session>;

	/// Drops the session. Returns false when no session existed.
	fn end(&self, handle: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	Validation,
	Retrieval,
	Generation,
	Configuration,
}
impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Validation => "VALIDATION",
			Self::Retrieval => "RETRIEVAL",
			Self::Generation => "GENERATION",
			Self::Configuration => "CONFIGURATION",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminationResult {
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
	pub kind: ErrorKind,
	pub message: String,
}
impl From<Error> for ErrorResult {
	fn from(err: Error) -> Self {
		Self { kind: err.kind(), message: err.message().to_string() }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
	Answer(AnswerResult),
	Terminated(TerminationResult),
	Failed(ErrorResult),
}

#[derive(Clone)]
pub struct Collaborators {
	pub index: Arc<dyn VectorIndex>,
	pub generator: Arc<dyn Generator>,
}

pub struct ChatService {
	pub retrieval: Retrieval,
	pub chat: Chat,
	pub extractor: Arc<dyn PredicateExtractor>,
	pub collaborators: Collaborators,
	pub sessions: Arc<dyn SessionStore>,
}
impl ChatService {
	pub fn new(
		retrieval: Retrieval,
		chat: Chat,
		extractor: Arc<dyn PredicateExtractor>,
		collaborators: Collaborators,
		sessions: Arc<dyn SessionStore>,
	) -> Self {
		Self { retrieval, chat, extractor, collaborators, sessions }
	}

	/// Wires the regex extractor, the Qdrant index, the LLM generator and an in-memory session
	/// store from `cfg`.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let extractor = PatternExtractor::new().map_err(|err| Error::Configuration {
			message: format!("Failed to compile extractor patterns: {err}"),
		})?;
		let store = QdrantStore::new(&cfg.storage.qdrant).map_err(|err| Error::Configuration {
			message: format!("Failed to build Qdrant client: {err}"),
		})?;
		let collaborators = Collaborators {
			index: Arc::new(QdrantIndex::new(
				Arc::new(store),
				cfg.providers.embedding.clone(),
				cfg.providers.llm.clone(),
				cfg.retrieval.fallback_k,
			)),
			generator: Arc::new(LlmGenerator::new(cfg.providers.llm.clone())),
		};

		Ok(Self::new(
			cfg.retrieval.clone(),
			cfg.chat.clone(),
			Arc::new(extractor),
			collaborators,
			Arc::new(InMemorySessionStore::new()),
		))
	}

	/// Answers one turn of session `handle`. Failures come back as [`ChatOutcome::Failed`].
	pub async fn chat(&self, handle: &str, question: &str) -> ChatOutcome {
		match self.try_chat(handle, question).await {
			Ok(outcome) => outcome,
			Err(err) => {
				tracing::warn!(
					session = handle,
					kind = ?err.kind(),
					error = %err,
					"Chat turn failed."
				);

				ChatOutcome::Failed(err.into())
			},
		}
	}

	pub fn end_session(&self, handle: &str) -> bool {
		let ended = self.sessions.end(handle);

		tracing::info!(session = handle, ended, "Session end requested.");

		ended
	}

	/// Fails when the index holds no documents, so a server never starts against an empty
	/// collection.
	pub async fn ensure_ready(&self) -> Result<u64> {
		let count = self
			.collaborators
			.index
			.count()
			.await
			.map_err(|err| Error::Configuration { message: err.to_string() })?;

		if count == 0 {
			return Err(Error::Configuration {
				message: "The vector index is empty. Run ingestion first.".to_string(),
			});
		}

		Ok(count)
	}

	async fn try_chat(&self, handle: &str, question: &str) -> Result<ChatOutcome> {
		if handle.trim().is_empty() {
			return Err(Error::Validation { message: "session_id must be non-empty.".to_string() });
		}
		if question.trim().is_empty() {
			return Err(Error::Validation { message: "question must be non-empty.".to_string() });
		}
		if sentinel::is_termination(question, &self.chat.termination_tokens) {
			tracing::info!(session = handle, "Termination token received.");

			return Ok(ChatOutcome::Terminated(TerminationResult {
				message: self.chat.termination_message.clone(),
			}));
		}

		let session = self.sessions.session(handle);
		let mut memory = session.memory().lock().await;
		let router = RetrievalRouter {
			extractor: self.extractor.as_ref(),
			index: self.collaborators.index.as_ref(),
			anchor_query: &self.retrieval.anchor_query,
			filtered_k: self.retrieval.filtered_k,
		};
		let route = router.route(question, memory.history()).await?;
		let assembler = AnswerAssembler { generator: self.collaborators.generator.as_ref() };
		let answer = assembler.assemble(question, &mut memory, route).await?;

		tracing::info!(
			session = handle,
			used_filtered_path = answer.used_filtered_path,
			retrieved_count = answer.retrieved_count,
			history_len = memory.len(),
			"Chat turn answered."
		);

		Ok(ChatOutcome::Answer(answer))
	}
}
