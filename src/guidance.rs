//! Client for the external guidance service.
//!
//! The service owns the actual tutoring model; we only ship it the transcript
//! plus problem/code context and parse its reply. Calls are instrumented and
//! log latencies and short previews, never full payloads or the API key.
//!
//! Chat failures never bubble up as hard errors: the transcript must advance
//! by exactly one assistant turn per user turn, so a failed call synthesizes
//! a diagnostic reply instead. Problem generation is the opposite: guessing
//! a problem locally is worse than reporting the outage, so those errors
//! surface to the caller.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::domain::{ChatMessage, Difficulty, Example, Problem, ProblemSource};
use crate::seeds::CUSTOM_STARTER_CODE;
use crate::util::trunc_for_log;

/// Failures talking to the guidance service.
#[derive(Debug, Error)]
pub enum GuidanceError {
  #[error("guidance service unreachable: {0}")]
  Network(String),
  #[error("guidance service returned HTTP {status}: {detail}")]
  Http { status: StatusCode, detail: String },
  #[error("guidance service reply was malformed: {0}")]
  Malformed(String),
}

#[derive(Clone)]
pub struct GuidanceClient {
  client: reqwest::Client,
  pub base_url: String,
  api_key: Option<String>,
}

/// Problem summary sent with every chat request.
#[derive(Serialize)]
struct ProblemContext<'a> {
  title: &'a str,
  description: &'a str,
  difficulty: Difficulty,
  category: &'a str,
  examples: &'a [Example],
}

impl<'a> ProblemContext<'a> {
  fn from_problem(p: &'a Problem) -> Self {
    Self {
      title: &p.title,
      description: &p.description,
      difficulty: p.difficulty,
      category: &p.category,
      examples: &p.examples,
    }
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  messages: &'a [ChatMessage],
  problem: ProblemContext<'a>,
  code: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
  response: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  difficulty: Option<&'a str>,
  category: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReply {
  title: String,
  description: String,
  difficulty: String,
  category: String,
  estimated_time: String,
  #[serde(default)]
  examples: Vec<Example>,
  #[serde(default)]
  starter_code: String,
}

/// A freshly generated problem plus the starter code that ships with it.
#[derive(Clone, Debug)]
pub struct GeneratedProblem {
  pub problem: Problem,
  pub starter_code: String,
}

impl TryFrom<GenerateReply> for GeneratedProblem {
  type Error = GuidanceError;

  fn try_from(reply: GenerateReply) -> Result<Self, GuidanceError> {
    if reply.title.trim().is_empty() {
      return Err(GuidanceError::Malformed("generated problem has no title".into()));
    }
    // `Custom` is reserved for user-authored problems, so it is rejected
    // here along with anything else `parse` does not recognize.
    let difficulty = Difficulty::parse(&reply.difficulty).ok_or_else(|| {
      GuidanceError::Malformed(format!("unrecognized difficulty '{}'", reply.difficulty))
    })?;
    // Only custom problems may ship without examples.
    if reply.examples.is_empty() {
      return Err(GuidanceError::Malformed("generated problem has no examples".into()));
    }
    let starter_code = if reply.starter_code.trim().is_empty() {
      CUSTOM_STARTER_CODE.to_string()
    } else {
      reply.starter_code
    };
    Ok(GeneratedProblem {
      problem: Problem {
        title: reply.title,
        description: reply.description,
        difficulty,
        category: reply.category,
        estimated_time: reply.estimated_time,
        examples: reply.examples,
        source: ProblemSource::Generated,
      },
      starter_code,
    })
  }
}

impl GuidanceClient {
  /// Construct the client if GUIDANCE_BASE_URL is set; otherwise return None
  /// and the session falls back to the offline reply pools.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("GUIDANCE_BASE_URL").ok()?;
    let api_key = std::env::var("GUIDANCE_API_KEY").ok();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key,
    })
  }

  async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GuidanceError>
  where
    B: Serialize,
    T: for<'a> Deserialize<'a>,
  {
    let url = format!("{}{}", self.base_url, path);
    let mut req = self
      .client
      .post(&url)
      .header(USER_AGENT, "coach-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    if let Some(key) = &self.api_key {
      req = req.header(AUTHORIZATION, format!("Bearer {}", key));
    }

    let res = req
      .json(body)
      .send()
      .await
      .map_err(|e| GuidanceError::Network(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let detail = extract_service_detail(&body).unwrap_or(body);
      return Err(GuidanceError::Http { status, detail });
    }

    res
      .json::<T>()
      .await
      .map_err(|e| GuidanceError::Malformed(e.to_string()))
  }

  /// Ask the tutor for the next reply. Always yields an assistant message:
  /// failures degrade to a synthesized reply carrying the failure detail.
  #[instrument(level = "info", skip_all, fields(messages = messages.len(), code_len = code.len()))]
  pub async fn request_guidance(
    &self,
    messages: &[ChatMessage],
    problem: &Problem,
    code: &str,
  ) -> ChatMessage {
    let req = ChatRequest {
      messages,
      problem: ProblemContext::from_problem(problem),
      code,
    };

    let start = std::time::Instant::now();
    match self.post_json::<_, ChatReply>("/api/chat", &req).await {
      Ok(reply) => {
        info!(
          target: "tutor",
          elapsed = ?start.elapsed(),
          preview = %trunc_for_log(&reply.response, 60),
          "Guidance reply received"
        );
        ChatMessage::assistant(reply.response)
      }
      Err(e) => {
        error!(target: "tutor", elapsed = ?start.elapsed(), error = %e, "Guidance request failed; synthesizing reply");
        ChatMessage::assistant(format!(
          "I'm having trouble reaching the guidance service at {}. Error: {}",
          self.base_url, e
        ))
      }
    }
  }

  /// Generate a fresh problem for the given filters (None = server chooses).
  #[instrument(level = "info", skip(self), fields(difficulty = ?difficulty, category = ?category))]
  pub async fn generate_problem(
    &self,
    difficulty: Option<&str>,
    category: Option<&str>,
  ) -> Result<GeneratedProblem, GuidanceError> {
    let req = GenerateRequest { difficulty, category };

    let start = std::time::Instant::now();
    let reply: GenerateReply = match self.post_json("/api/generate-problem", &req).await {
      Ok(r) => r,
      Err(e) => {
        error!(target: "tutor", elapsed = ?start.elapsed(), error = %e, "Problem generation failed");
        return Err(e);
      }
    };

    info!(
      target: "tutor",
      elapsed = ?start.elapsed(),
      title = %reply.title,
      difficulty = %reply.difficulty,
      "Problem generated"
    );
    reply.try_into()
  }
}

/// Try to extract a clean `detail` message from a service error body.
fn extract_service_detail(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    detail: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.detail),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn reply(difficulty: &str, starter: &str) -> GenerateReply {
    GenerateReply {
      title: "Reverse a String".into(),
      description: "Reverse the input string.".into(),
      difficulty: difficulty.into(),
      category: "Strings".into(),
      estimated_time: "10 min".into(),
      examples: vec![Example { input: "\"abc\"".into(), output: "\"cba\"".into() }],
      starter_code: starter.into(),
    }
  }

  #[test]
  fn generated_reply_converts_with_case_insensitive_difficulty() {
    let g = GeneratedProblem::try_from(reply("medium", "def f():\n    pass\n")).expect("problem");
    assert_eq!(g.problem.difficulty, Difficulty::Medium);
    assert_eq!(g.problem.source, ProblemSource::Generated);
  }

  #[test]
  fn blank_starter_code_falls_back_to_custom_template() {
    let g = GeneratedProblem::try_from(reply("Easy", "  ")).expect("problem");
    assert_eq!(g.starter_code, CUSTOM_STARTER_CODE);
  }

  #[test]
  fn unknown_or_custom_difficulty_is_malformed() {
    assert!(GeneratedProblem::try_from(reply("Expert", "x")).is_err());
    assert!(GeneratedProblem::try_from(reply("Custom", "x")).is_err());
  }

  #[test]
  fn generated_problem_without_examples_is_malformed() {
    let mut r = reply("Hard", "x");
    r.examples.clear();
    assert!(GeneratedProblem::try_from(r).is_err());
  }

  #[test]
  fn missing_title_is_malformed() {
    let mut r = reply("Easy", "x");
    r.title = "  ".into();
    assert!(GeneratedProblem::try_from(r).is_err());
  }

  #[test]
  fn service_detail_is_extracted_when_present() {
    assert_eq!(
      extract_service_detail(r#"{"detail":"OpenAI API key not configured"}"#).as_deref(),
      Some("OpenAI API key not configured")
    );
    assert_eq!(extract_service_detail("<html>bad gateway</html>"), None);
  }
}
