//! HTTP surface: question generation and pool reset.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::TriviaError;
use crate::fetch::QuestionFetcher;
use crate::types::{resolve_category, QuestionRecord};

/// Questions served when the caller does not say how many.
pub const DEFAULT_NUM_QUESTIONS: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<QuestionFetcher>,
    /// Largest `num_questions` accepted.
    pub max_questions: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/questions", post(questions))
        .route("/api/question", post(questions))
        .route("/api/clear_cache", post(clear_cache))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionsRequest {
    pub category: Option<String>,
    pub num_questions: Option<i64>,
}

/// Error body `{"error": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TriviaError> for ApiError {
    fn from(err: TriviaError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn questions(
    State(state): State<AppState>,
    body: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<Vec<QuestionRecord>>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "malformed question request");
        ApiError::bad_request(rejection.body_text())
    })?;

    let count = match request.num_questions {
        None => DEFAULT_NUM_QUESTIONS,
        Some(n) if n >= 1 && (n as u64) <= state.max_questions as u64 => n as usize,
        Some(n) => {
            return Err(ApiError::bad_request(format!(
                "num_questions must be between 1 and {}, got {}",
                state.max_questions, n
            )));
        }
    };
    let category = resolve_category(request.category.as_deref());

    match state.fetcher.fetch_questions(category, count).await {
        Ok(output) => {
            tracing::debug!(category, diagnostics = ?output.diagnostics, "request served");
            Ok(Json(output.questions))
        }
        Err(e) => {
            tracing::error!(category, error = %e, "question request failed");
            Err(e.into())
        }
    }
}

async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = state.fetcher.pool() {
        pool.reset();
    }
    Json(json!({ "message": "Question cache cleared" }))
}
