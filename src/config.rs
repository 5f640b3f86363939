//! Loading coach configuration (offline reply pools + optional startup
//! problem) from TOML.
//!
//! See `CoachConfig` for the expected schema. Everything is optional; the
//! built-in defaults keep the backend useful with no config at all.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{Difficulty, Example, Problem, ProblemSource};
use crate::intent::ReplyPools;
use crate::seeds::DEFAULT_STARTER_CODE;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CoachConfig {
  #[serde(default)]
  pub replies: ReplyPools,
  #[serde(default)]
  pub problem: Option<ProblemCfg>,
}

/// Startup problem override accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemCfg {
  pub title: String,
  pub description: String,
  #[serde(default)] pub difficulty: Option<String>,
  #[serde(default)] pub category: Option<String>,
  #[serde(default)] pub estimated_time: Option<String>,
  #[serde(default)] pub examples: Vec<ExampleCfg>,
  #[serde(default)] pub starter_code: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExampleCfg {
  pub input: String,
  pub output: String,
}

impl ProblemCfg {
  /// Build the startup problem and its starter code, falling back per field.
  pub fn into_problem(self) -> (Problem, String) {
    let difficulty = match &self.difficulty {
      Some(label) => Difficulty::parse(label).unwrap_or_else(|| {
        warn!(target: "coach_backend", %label, "Unrecognized difficulty in config; using Easy");
        Difficulty::Easy
      }),
      None => Difficulty::Easy,
    };
    if self.examples.is_empty() {
      warn!(target: "coach_backend", title = %self.title, "Config problem has no examples");
    }
    let starter = self
      .starter_code
      .unwrap_or_else(|| DEFAULT_STARTER_CODE.to_string());
    let problem = Problem {
      title: self.title,
      description: self.description,
      difficulty,
      category: self.category.unwrap_or_else(|| "General".into()),
      estimated_time: self.estimated_time.unwrap_or_else(|| "15 min".into()),
      examples: self
        .examples
        .into_iter()
        .map(|e| Example { input: e.input, output: e.output })
        .collect(),
      source: ProblemSource::Config,
    };
    (problem, starter)
  }
}

/// Attempt to load `CoachConfig` from COACH_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults.
pub fn load_coach_config_from_env() -> Option<CoachConfig> {
  let path = std::env::var("COACH_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<CoachConfig>(&s) {
      Ok(cfg) => {
        info!(target: "coach_backend", %path, "Loaded coach config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "coach_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "coach_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_parses_pools_and_problem_override() {
    let toml_src = r#"
      [replies]
      hint = ["What have you tried so far?"]

      [problem]
      title = "FizzBuzz"
      description = "Print fizz, buzz, or fizzbuzz for 1..=n."
      difficulty = "easy"
      category = "Loops"

      [[problem.examples]]
      input = "n = 3"
      output = "1 2 fizz"
    "#;
    let cfg: CoachConfig = toml::from_str(toml_src).expect("config");
    assert_eq!(cfg.replies.hint.len(), 1);
    // Unspecified pools come from the defaults, not empty vectors.
    assert!(!cfg.replies.start.is_empty());

    let (problem, starter) = cfg.problem.expect("problem").into_problem();
    assert_eq!(problem.title, "FizzBuzz");
    assert_eq!(problem.difficulty, Difficulty::Easy);
    assert_eq!(problem.source, ProblemSource::Config);
    assert_eq!(problem.examples.len(), 1);
    assert_eq!(starter, DEFAULT_STARTER_CODE);
  }

  #[test]
  fn unknown_config_difficulty_degrades_to_easy() {
    let cfg = ProblemCfg {
      title: "T".into(),
      description: "D".into(),
      difficulty: Some("impossible".into()),
      category: None,
      estimated_time: None,
      examples: vec![],
      starter_code: Some("# go\n".into()),
    };
    let (problem, starter) = cfg.into_problem();
    assert_eq!(problem.difficulty, Difficulty::Easy);
    assert_eq!(problem.category, "General");
    assert_eq!(starter, "# go\n");
  }

  #[test]
  fn empty_toml_is_a_valid_config() {
    let cfg: CoachConfig = toml::from_str("").expect("config");
    assert!(cfg.problem.is_none());
    assert!(!cfg.replies.general.is_empty());
  }
}
