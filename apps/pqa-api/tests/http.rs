use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use color_eyre::eyre;
use serde_json::Value;
use tower::util::ServiceExt;

use pqa_api::{routes, state::AppState};
use pqa_config::{Chat, Retrieval};
use pqa_domain::{CompiledFilter, ConversationTurn, PatternExtractor, RetrievedDocument};
use pqa_service::{
	BoxFuture, ChatService, Collaborators, Generator, InMemorySessionStore, VectorIndex,
};

struct StaticIndex {
	documents: Vec<RetrievedDocument>,
}
impl VectorIndex for StaticIndex {
	fn filtered_search<'a>(
		&'a self,
		_query: &'a str,
		_filter: &'a CompiledFilter,
		_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>> {
		Box::pin(async move { Ok(self.documents.clone()) })
	}

	fn history_aware_retrieve<'a>(
		&'a self,
		_question: &'a str,
		_history: &'a [ConversationTurn],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RetrievedDocument>>> {
		Box::pin(async move { Ok(self.documents.clone()) })
	}

	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move { Ok(self.documents.len() as u64) })
	}
}

struct CountingGenerator {
	calls: Arc<AtomicUsize>,
	fail: bool,
}
impl Generator for CountingGenerator {
	fn generate<'a>(
		&'a self,
		history: &'a [ConversationTurn],
		_documents: &'a [RetrievedDocument],
		_question: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail {
			Err(eyre::eyre!("upstream timeout"))
		} else {
			Ok(format!("第{}轮回答", history.len() + 1))
		};

		Box::pin(async move { result })
	}
}

fn test_app(fail_generation: bool) -> (Router, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let index = StaticIndex {
		documents: vec![
			RetrievedDocument::new("品种：大白菜，批发市场：北京新发地农产品批发市场，平均价：1.2元")
				.with_metadata("province", "北京"),
		],
	};
	let service = ChatService::new(
		Retrieval::default(),
		Chat::default(),
		Arc::new(PatternExtractor::new().expect("Failed to compile extractor patterns.")),
		Collaborators {
			index: Arc::new(index),
			generator: Arc::new(CountingGenerator { calls: calls.clone(), fail: fail_generation }),
		},
		Arc::new(InMemorySessionStore::new()),
	);
	let state = AppState { service: Arc::new(service), model: "test-model".to_string() };

	(routes::router(state), calls)
}

fn chat_request(body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/v1/chat")
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_reports_index_size_and_model() {
	let (app, _) = test_app(false);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "ok");
	assert_eq!(json["vectors"], 1);
	assert_eq!(json["model"], "test-model");
}

#[tokio::test]
async fn chat_without_session_id_assigns_one() {
	let (app, calls) = test_app(false);
	let response = app
		.oneshot(chat_request(serde_json::json!({ "question": "北京的白菜多少钱" })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert!(!json["session_id"].as_str().unwrap_or_default().is_empty());
	assert_eq!(json["answer"], "第1轮回答");
	assert_eq!(json["retrieved_count"], 1);
	assert_eq!(json["used_filtered_path"], true);
	assert_eq!(json["terminated"], false);
	assert_eq!(json["sources"][0]["metadata"]["province"], "北京");
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_id_carries_history_across_requests() {
	let (app, _) = test_app(false);
	let body = serde_json::json!({ "session_id": "web-1", "question": "北京的白菜多少钱" });

	app.clone().oneshot(chat_request(body.clone())).await.expect("Failed to call /v1/chat.");

	let response = app.oneshot(chat_request(body)).await.expect("Failed to call /v1/chat.");
	let json = json_body(response).await;

	assert_eq!(json["session_id"], "web-1");
	assert_eq!(json["answer"], "第2轮回答");
}

#[tokio::test]
async fn blank_question_is_bad_request() {
	let (app, calls) = test_app(false);
	let response = app
		.oneshot(chat_request(serde_json::json!({ "session_id": "s", "question": "  " })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["error_code"], "VALIDATION");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generation_failure_is_bad_gateway() {
	let (app, _) = test_app(true);
	let response = app
		.oneshot(chat_request(serde_json::json!({ "question": "北京的白菜多少钱" })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "GENERATION");
	assert_eq!(json["message"], "upstream timeout");
}

#[tokio::test]
async fn termination_token_ends_without_generation() {
	let (app, calls) = test_app(false);
	let response = app
		.oneshot(chat_request(serde_json::json!({ "session_id": "s", "question": "退出" })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["terminated"], true);
	assert_eq!(json["answer"], Chat::default().termination_message);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deleting_a_session_twice_reports_not_found() {
	let (app, _) = test_app(false);

	app.clone()
		.oneshot(chat_request(serde_json::json!({ "session_id": "gone", "question": "北京的白菜" })))
		.await
		.expect("Failed to call /v1/chat.");

	let delete = || {
		Request::builder()
			.method("DELETE")
			.uri("/v1/sessions/gone")
			.body(Body::empty())
			.expect("Failed to build request.")
	};
	let first = app.clone().oneshot(delete()).await.expect("Failed to delete session.");
	let second = app.oneshot(delete()).await.expect("Failed to delete session.");

	assert_eq!(first.status(), StatusCode::NO_CONTENT);
	assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn termination_token_releases_the_session() {
	let (app, calls) = test_app(false);

	app.clone()
		.oneshot(chat_request(serde_json::json!({ "session_id": "t", "question": "北京的白菜" })))
		.await
		.expect("Failed to call /v1/chat.");
	app.clone()
		.oneshot(chat_request(serde_json::json!({ "session_id": "t", "question": "exit" })))
		.await
		.expect("Failed to call /v1/chat.");

	let deleted = app
		.clone()
		.oneshot(
			Request::builder()
				.method("DELETE")
				.uri("/v1/sessions/t")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to delete session.");

	assert_eq!(deleted.status(), StatusCode::NOT_FOUND);

	let response = app
		.oneshot(chat_request(serde_json::json!({ "session_id": "t", "question": "北京的白菜" })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(json_body(response).await["answer"], "第1轮回答");
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}
