//! HTTP endpoint handlers. These are thin wrappers over the shared state;
//! everything session-scoped runs over the WebSocket instead.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::protocol::{plan_view, HealthOut, PlanOut, ProgressOut, ThemeOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_plan(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let progress = state.progress.read().await;
  let completed = progress.completed();
  Json(PlanOut {
    weeks: plan_view(completed),
    completed_count: completed.len(),
    total: crate::plan::learning_plan().len(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let progress = state.progress.read().await;
  let mut completed: Vec<u32> = progress.completed().iter().copied().collect();
  completed.sort_unstable();
  Json(ProgressOut { completed })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_theme(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let prefs = state.prefs.read().await;
  Json(ThemeOut { theme: prefs.theme() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_toggle_theme(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let theme = state.prefs.write().await.toggle();
  info!(target: "versicle_backend", ?theme, "Theme toggled");
  Json(ThemeOut { theme })
}
