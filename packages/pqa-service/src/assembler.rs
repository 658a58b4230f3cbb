use serde::Serialize;

use pqa_domain::{ConversationMemory, ConversationTurn, RetrievedDocument};

use crate::{Error, Generator, Result, RouteOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
	pub answer: String,
	pub sources: Vec<RetrievedDocument>,
	pub retrieved_count: usize,
	pub used_filtered_path: bool,
}

pub struct AnswerAssembler<'a> {
	pub generator: &'a dyn Generator,
}
impl AnswerAssembler<'_> {
	/// Calls the generator once, even with no documents, and records the turn only on success.
	pub async fn assemble(
		&self,
		question: &str,
		memory: &mut ConversationMemory,
		route: RouteOutcome,
	) -> Result<AnswerResult> {
		let RouteOutcome { documents, used_filtered_path, .. } = route;
		let answer = self
			.generator
			.generate(memory.history(), &documents, question)
			.await
			.map_err(|err| Error::Generation { message: format!("{err:#}") })?;

		memory.append(ConversationTurn::new(question, answer.as_str()));

		Ok(AnswerResult {
			answer,
			retrieved_count: documents.len(),
			sources: documents,
			used_filtered_path,
		})
	}
}
