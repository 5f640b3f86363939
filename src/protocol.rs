//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Problem, RunReport};
use crate::state::Session;

/// Intents the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetState,
    EditCode {
        code: String,
    },
    SubmitMessage {
        text: String,
    },
    NewProblem {
        #[serde(default)]
        difficulty: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
    CustomProblem {
        title: String,
        description: String,
    },
    RunCode,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionOut },
    Reply { message: ChatMessage },
    RunResult { report: RunReport },
    Error { message: String },
}

/// Read-only session snapshot handed to the presentation layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub problem: Problem,
    pub code: String,
    pub transcript: Vec<ChatMessage>,
    pub is_generating_problem: bool,
    pub is_awaiting_reply: bool,
    pub last_run: Option<RunReport>,
}

/// Convert the internal session to the public snapshot DTO.
pub fn to_out(s: &Session) -> SessionOut {
    SessionOut {
        problem: s.problem.clone(),
        code: s.code.clone(),
        transcript: s.transcript.clone(),
        is_generating_problem: s.generating_problem,
        is_awaiting_reply: s.awaiting_reply,
        last_run: s.last_run.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct CodeIn {
    pub code: String,
}

#[derive(Deserialize)]
pub struct MessageIn {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NewProblemIn {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CustomProblemIn {
    pub title: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct RunOut {
    pub report: RunReport,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

/// Wire error shape, shared with the guidance service protocol.
#[derive(Serialize)]
pub struct ErrorOut {
    pub detail: String,
}
