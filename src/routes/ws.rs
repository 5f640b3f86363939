//! WebSocket upgrade + message loop. Each client message is parsed as JSON
//! and forwarded to the session orchestrator. We reply with a single JSON
//! message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::state::{AppState, ChatOutcome};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "coach_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "coach_backend", session = %state.session_id, "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "coach_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "coach_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "coach_backend", "WebSocket disconnected");
}

async fn session_out(state: &AppState) -> ServerWsMessage {
  ServerWsMessage::Session { session: to_out(&state.snapshot().await) }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::GetState => session_out(state).await,

    ClientWsMessage::EditCode { code } => {
      state.edit_code(code).await;
      session_out(state).await
    }

    ClientWsMessage::SubmitMessage { text } => match state.submit_message(&text).await {
      Ok(ChatOutcome::Replied(message)) => ServerWsMessage::Reply { message },
      // The problem changed mid-flight; hand back the current state so the
      // client re-syncs instead of rendering a stale reply.
      Ok(ChatOutcome::Superseded) => session_out(state).await,
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::NewProblem { difficulty, category } => {
      match state
        .request_new_problem(difficulty.as_deref(), category.as_deref())
        .await
      {
        Ok(problem) => {
          info!(target: "session", title = %problem.title, "WS new problem served");
          session_out(state).await
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::CustomProblem { title, description } => {
      match state.submit_custom_problem(&title, &description).await {
        Ok(_) => session_out(state).await,
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::RunCode => {
      let report = state.run_code().await;
      ServerWsMessage::RunResult { report }
    }
  }
}
