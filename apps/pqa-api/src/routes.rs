use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pqa_domain::RetrievedDocument;
use pqa_service::{ChatOutcome, ErrorKind, ErrorResult};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
	/// Omitted on the first turn; the response carries a fresh handle.
	#[serde(default)]
	pub session_id: Option<String>,
	pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
	pub session_id: String,
	pub answer: String,
	pub sources: Vec<RetrievedDocument>,
	pub retrieved_count: usize,
	pub used_filtered_path: bool,
	pub terminated: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub vectors: u64,
	pub model: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ErrorResult> for ApiError {
	fn from(err: ErrorResult) -> Self {
		let status = match err.kind {
			ErrorKind::Validation => StatusCode::BAD_REQUEST,
			ErrorKind::Retrieval | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
			ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self::new(status, err.kind.as_str(), err.message)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/chat", post(chat))
		.route("/v1/sessions/{session_id}", delete(end_session))
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
	let vectors = state.service.collaborators.index.count().await.map_err(|err| {
		ApiError::new(StatusCode::BAD_GATEWAY, ErrorKind::Retrieval.as_str(), format!("{err:#}"))
	})?;

	Ok(Json(HealthResponse { status: "ok", vectors, model: state.model.clone() }))
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let session_id = payload.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
	let response = match state.service.chat(&session_id, &payload.question).await {
		ChatOutcome::Answer(result) => ChatResponse {
			session_id,
			answer: result.answer,
			sources: result.sources,
			retrieved_count: result.retrieved_count,
			used_filtered_path: result.used_filtered_path,
			terminated: false,
		},
		ChatOutcome::Terminated(result) => {
			state.service.end_session(&session_id);

			ChatResponse {
				session_id,
				answer: result.message,
				sources: Vec::new(),
				retrieved_count: 0,
				used_filtered_path: false,
				terminated: true,
			}
		},
		ChatOutcome::Failed(err) => return Err(err.into()),
	};

	Ok(Json(response))
}

async fn end_session(
	State(state): State<AppState>,
	Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	if state.service.end_session(&session_id) {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ApiError::new(
			StatusCode::NOT_FOUND,
			"NOT_FOUND",
			format!("Unknown session {session_id}."),
		))
	}
}
