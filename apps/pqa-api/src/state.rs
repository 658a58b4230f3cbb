use std::sync::Arc;

use pqa_service::ChatService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ChatService>,
	/// Generation model name reported by `/health`.
	pub model: String,
}
impl AppState {
	/// Builds the default service and refuses to start against an empty collection.
	pub async fn new(config: &pqa_config::Config) -> color_eyre::Result<Self> {
		let service = ChatService::from_config(config)?;
		let vectors = service.ensure_ready().await?;

		tracing::info!(
			collection = %config.storage.qdrant.collection,
			vectors,
			"Vector index is ready."
		);

		Ok(Self { service: Arc::new(service), model: config.providers.llm.model.clone() })
	}
}
