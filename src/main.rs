//! Coach · Socratic Coding-Practice Backend
//!
//! - Axum HTTP + WebSocket API around one in-memory tutoring session
//! - Optional remote guidance service integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 8000)
//!   GUIDANCE_BASE_URL  : enables the remote tutor if present
//!   GUIDANCE_API_KEY   : optional bearer token for the guidance service
//!   COACH_CONFIG_PATH  : path to TOML config (reply pools + startup problem)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod intent;
mod simulator;
mod guidance;
mod state;
mod protocol;
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

  // Build shared application state (session, guidance client, reply pools).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 8000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "coach_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
