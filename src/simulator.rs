//! Simulated code execution.
//!
//! Intentionally approximate: the "run" inspects the raw source text for a
//! handful of markers and fabricates a plausible console report. Nothing is
//! parsed or executed. The module boundary exists so a real sandboxed
//! executor could replace this later without touching the orchestrator.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::domain::{RunReport, RunStatus};

/// Artificial latency so the client can show a "running…" state.
const RUN_DELAY: Duration = Duration::from_millis(500);

/// Placeholder no-op marker and the constructs that produce a value.
const PLACEHOLDER_MARKER: &str = "pass";
const RESULT_MARKERS: [&str; 2] = ["return", "yield"];

/// Inspect the code draft and report what a run would plausibly print.
#[instrument(level = "info", skip(code, sample_output), fields(code_len = code.len()))]
pub async fn simulate_run(code: &str, sample_output: Option<&str>) -> RunReport {
  tokio::time::sleep(RUN_DELAY).await;
  let report = analyze(code, sample_output);
  debug!(target: "session", status = ?report.status, "simulated run finished");
  report
}

/// The pure text heuristic behind `simulate_run`, split out for testing.
fn analyze(code: &str, sample_output: Option<&str>) -> RunReport {
  let produces_result = RESULT_MARKERS.iter().any(|m| code.contains(m));
  if code.contains(PLACEHOLDER_MARKER) && !produces_result {
    RunReport {
      status: RunStatus::Empty,
      message: "Output: None".into(),
      hint: "Your function returns None. Try implementing the logic!".into(),
    }
  } else if produces_result {
    let expected = sample_output.unwrap_or("(no sample output)");
    RunReport {
      status: RunStatus::Produced,
      message: format!("Output: {}", expected),
      hint: "Your solution produced output! Check if it matches the expected result.".into(),
    }
  } else {
    RunReport {
      status: RunStatus::NoReturn,
      message: "Output: None".into(),
      hint: "Make sure your function has a return statement.".into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholder_without_return_reports_empty() {
    let report = analyze("def two_sum(nums, target):\n    pass\n", Some("[0, 1]"));
    assert_eq!(report.status, RunStatus::Empty);
    assert_eq!(report.message, "Output: None");
  }

  #[test]
  fn return_construct_reports_produced_with_sample_output() {
    let code = "def two_sum(nums, target):\n    return [i, j]";
    let report = analyze(code, Some("[0, 1]"));
    assert_eq!(report.status, RunStatus::Produced);
    assert_eq!(report.message, "Output: [0, 1]");
  }

  #[test]
  fn return_wins_even_with_placeholder_present() {
    let code = "def f(x):\n    if x:\n        pass\n    return x";
    let report = analyze(code, Some("42"));
    assert_eq!(report.status, RunStatus::Produced);
  }

  #[test]
  fn yield_counts_as_producing_a_result() {
    let report = analyze("def gen():\n    yield 1", None);
    assert_eq!(report.status, RunStatus::Produced);
    assert_eq!(report.message, "Output: (no sample output)");
  }

  #[test]
  fn neither_marker_reports_no_return() {
    let report = analyze("def f(x):\n    x + 1\n", Some("[0, 1]"));
    assert_eq!(report.status, RunStatus::NoReturn);
    assert_eq!(report.message, "Output: None");
  }
}
