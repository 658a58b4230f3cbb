use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub chat: Chat,
	#[serde(default)]
	pub ingest: Ingest,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	/// Fixed query text embedded for the filtered path. The user's question is not used there
	/// because the metadata filter already carries its constraints.
	#[serde(default = "default_anchor_query")]
	pub anchor_query: String,
	#[serde(default = "default_filtered_k")]
	pub filtered_k: u32,
	#[serde(default = "default_fallback_k")]
	pub fallback_k: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			anchor_query: default_anchor_query(),
			filtered_k: default_filtered_k(),
			fallback_k: default_fallback_k(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
	/// Compared against the trimmed, lowercased question.
	#[serde(default = "default_termination_tokens")]
	pub termination_tokens: Vec<String>,
	#[serde(default = "default_termination_message")]
	pub termination_message: String,
}
impl Default for Chat {
	fn default() -> Self {
		Self {
			termination_tokens: default_termination_tokens(),
			termination_message: default_termination_message(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	#[serde(default = "default_batch_pause_ms")]
	pub batch_pause_ms: u64,
}
impl Default for Ingest {
	fn default() -> Self {
		Self { batch_size: default_batch_size(), batch_pause_ms: default_batch_pause_ms() }
	}
}

fn default_anchor_query() -> String {
	"白菜 价格".to_string()
}

fn default_filtered_k() -> u32 {
	10
}

fn default_fallback_k() -> u32 {
	6
}

fn default_termination_tokens() -> Vec<String> {
	vec!["exit".to_string(), "quit".to_string(), "退出".to_string()]
}

fn default_termination_message() -> String {
	"对话结束，感谢使用！".to_string()
}

fn default_batch_size() -> u32 {
	60
}

fn default_batch_pause_ms() -> u64 {
	1_000
}
