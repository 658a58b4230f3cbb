use pqa_domain::{CompiledFilter, ConversationTurn, PredicateExtractor, RetrievedDocument, compile};

use crate::{Error, Result, VectorIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
	pub documents: Vec<RetrievedDocument>,
	pub used_filtered_path: bool,
	pub filter: CompiledFilter,
}

/// Chooses between the metadata-filtered search and the history-aware fallback.
pub struct RetrievalRouter<'a> {
	pub extractor: &'a dyn PredicateExtractor,
	pub index: &'a dyn VectorIndex,
	/// Fixed query embedded for the filtered path; the filter carries the question's constraints.
	pub anchor_query: &'a str,
	pub filtered_k: u32,
}
impl RetrievalRouter<'_> {
	/// The fallback runs exactly once when the filter is unconstrained or the filtered search
	/// returns nothing. Index failures are not retried.
	pub async fn route(
		&self,
		question: &str,
		history: &[ConversationTurn],
	) -> Result<RouteOutcome> {
		let predicates = self.extractor.extract(question);
		let filter = compile(&predicates);

		tracing::debug!(filter = %filter.to_value(), "Compiled question filter.");

		if !filter.is_unconstrained() {
			let documents = self
				.index
				.filtered_search(self.anchor_query, &filter, self.filtered_k)
				.await
				.map_err(|err| Error::Retrieval { message: format!("{err:#}") })?;

			if !documents.is_empty() {
				tracing::debug!(returned = documents.len(), "Filtered search matched.");

				return Ok(RouteOutcome { documents, used_filtered_path: true, filter });
			}

			tracing::debug!("Filtered search returned nothing. Falling back.");
		}

		let documents = self
			.index
			.history_aware_retrieve(question, history)
			.await
			.map_err(|err| Error::Retrieval { message: format!("{err:#}") })?;

		Ok(RouteOutcome { documents, used_filtered_path: false, filter })
	}
}
