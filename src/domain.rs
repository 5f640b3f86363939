//! Domain models used by the backend: problems, transcript messages, and
//! simulated run reports.

use serde::{Deserialize, Serialize};

/// Difficulty label shown next to the problem title.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  /// Reserved for user-authored problems.
  Custom,
}

impl Difficulty {
  /// Parse a difficulty label case-insensitively. `Custom` is deliberately
  /// excluded: only `submit_custom_problem` may produce custom problems.
  pub fn parse(label: &str) -> Option<Self> {
    match label.trim().to_ascii_lowercase().as_str() {
      "easy" => Some(Difficulty::Easy),
      "medium" => Some(Difficulty::Medium),
      "hard" => Some(Difficulty::Hard),
      _ => None,
    }
  }
}

/// Where did the active problem come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSource {
  Builtin,   // compiled-in default
  Config,    // startup override from TOML config
  Generated, // produced by the guidance service
  Custom,    // user-authored
}

/// One worked example attached to a problem statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Example {
  pub input: String,
  pub output: String,
}

/// The active problem. Replaced wholesale on every change; never
/// field-mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub category: String,
  pub estimated_time: String,
  pub examples: Vec<Example>,
  pub source: ProblemSource,
}

impl Problem {
  /// Output literal of the first example. The run simulator pretends the
  /// user's code printed this value.
  pub fn sample_output(&self) -> Option<&str> {
    self.examples.first().map(|ex| ex.output.as_str())
  }
}

/// Transcript roles. Only the user and the tutor write to the transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

/// One transcript entry. Immutable once appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: Role::User, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: Role::Assistant, content: content.into() }
  }
}

/// Outcome classes of a simulated run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
  Empty,
  Produced,
  NoReturn,
}

/// What the simulator reports back for the current code draft.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
  pub status: RunStatus,
  pub message: String,
  pub hint: String,
}
