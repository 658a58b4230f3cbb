use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

const REASONING_OPEN: &str = "<think>";
const REASONING_CLOSE: &str = "</think>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
	pub role: ChatRole,
	pub content: String,
}
impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: ChatRole::System, content: content.into() }
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self { role: ChatRole::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: ChatRole::Assistant, content: content.into() }
	}
}

/// Single chat-completions call. Failures are returned as-is; callers own retry policy.
pub async fn complete(
	cfg: &pqa_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(&json)
}

/// Drops a leading `<think>...</think>` block emitted by reasoning models.
pub fn strip_reasoning(content: &str) -> &str {
	let trimmed = content.trim_start();

	if trimmed.starts_with(REASONING_OPEN)
		&& let Some(end) = trimmed.find(REASONING_CLOSE)
	{
		return trimmed[end + REASONING_CLOSE.len()..].trim();
	}

	content.trim()
}

fn parse_completion(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;
	let answer = strip_reasoning(content);

	if answer.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Completion response content is empty.".to_string(),
		});
	}

	Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "  平均价1.2元。 " } }
			]
		});

		assert_eq!(parse_completion(&json).expect("parse failed"), "平均价1.2元。");
	}

	#[test]
	fn strips_leading_reasoning_block() {
		assert_eq!(strip_reasoning("<think>看看数据</think>\n平均价1.2元"), "平均价1.2元");
		assert_eq!(strip_reasoning("平均价<think>1.2</think>"), "平均价<think>1.2</think>");
	}

	#[test]
	fn rejects_reasoning_only_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "<think>...</think>" } }]
		});

		assert!(parse_completion(&json).is_err());
	}

	#[test]
	fn rejects_missing_choices() {
		assert!(parse_completion(&serde_json::json!({ "error": "quota" })).is_err());
	}

	#[test]
	fn serializes_roles_in_lowercase() {
		let value = serde_json::to_value(ChatMessage::assistant("ok")).expect("serialize failed");

		assert_eq!(value, serde_json::json!({ "role": "assistant", "content": "ok" }));
	}
}
