//! HTTP endpoint handlers. These are thin wrappers that forward user intents
//! to the session orchestrator; mutating endpoints reply with the fresh
//! session snapshot so the client can re-render from one source of truth.

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::{AppState, ChatOutcome, EngineError};

fn status_for(e: &EngineError) -> StatusCode {
  match e {
    EngineError::EmptyMessage | EngineError::InvalidCustomProblem => {
      StatusCode::UNPROCESSABLE_ENTITY
    }
    EngineError::ChatBusy | EngineError::GenerationBusy => StatusCode::CONFLICT,
    EngineError::GuidanceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    EngineError::Guidance(_) => StatusCode::BAD_GATEWAY,
  }
}

impl IntoResponse for EngineError {
  fn into_response(self) -> Response {
    let status = status_for(&self);
    (status, Json(ErrorOut { detail: self.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(to_out(&state.snapshot().await))
}

#[instrument(level = "info", skip(state, body), fields(code_len = body.code.len()))]
pub async fn http_post_code(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CodeIn>,
) -> impl IntoResponse {
  state.edit_code(body.code).await;
  Json(to_out(&state.snapshot().await))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_message(
  State(state): State<Arc<AppState>>,
  Json(body): Json<MessageIn>,
) -> Result<Json<SessionOut>, EngineError> {
  let outcome = state.submit_message(&body.text).await?;
  if matches!(outcome, ChatOutcome::Superseded) {
    info!(target: "session", "HTTP chat reply superseded by a problem swap");
  }
  Ok(Json(to_out(&state.snapshot().await)))
}

#[instrument(level = "info", skip(state, body), fields(difficulty = ?body.difficulty, category = ?body.category))]
pub async fn http_post_new_problem(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewProblemIn>,
) -> Result<Json<SessionOut>, EngineError> {
  let problem = state
    .request_new_problem(body.difficulty.as_deref(), body.category.as_deref())
    .await?;
  info!(target: "session", title = %problem.title, "HTTP new problem served");
  Ok(Json(to_out(&state.snapshot().await)))
}

#[instrument(level = "info", skip(state, body), fields(title_len = body.title.len()))]
pub async fn http_post_custom_problem(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CustomProblemIn>,
) -> Result<Json<SessionOut>, EngineError> {
  state.submit_custom_problem(&body.title, &body.description).await?;
  Ok(Json(to_out(&state.snapshot().await)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_run(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let report = state.run_code().await;
  info!(target: "session", status = ?report.status, "HTTP run simulated");
  Json(RunOut { report })
}
