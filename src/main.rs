//! Versicle · Verse Memorization Trainer Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional Gemini integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   GEMINI_API_KEY    : enables provider integration if present
//!   GEMINI_BASE_URL   : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL      : default "gemini-2.5-flash"
//!   AGENT_CONFIG_PATH : path to TOML config (prompts + optional verse bank)
//!   PROGRESS_PATH     : completed-day store (default ./data/progress.json)
//!   THEME_PATH        : theme preference store (default ./data/theme.json)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod verify;
mod config;
mod seeds;
mod plan;
mod store;
mod state;
mod session;
mod protocol;
mod gemini;
mod routes;

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (stores, verse bank, provider client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "versicle_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
