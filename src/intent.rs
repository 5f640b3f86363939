//! Keyword-driven intent classification and the offline reply pools.
//!
//! The classifier is plain substring containment over an ordered rule list.
//! Order is part of the contract: an utterance like "can you check if I
//! should start here" matches both the start and approach keyword sets, and
//! the earlier rule wins. Do not turn the list into a map.

use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::warn;

/// The classifier's output bucket, driving offline reply selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
  Start,
  Hint,
  Approach,
  General,
}

/// Priority-ordered keyword rules. First rule with any contained keyword
/// wins; no match falls through to `General`.
const INTENT_RULES: &[(&[&str], Intent)] = &[
  (&["start", "begin", "where"], Intent::Start),
  (&["hint", "stuck", "help"], Intent::Hint),
  (&["approach", "check", "correct", "right"], Intent::Approach),
];

/// Map a free-text utterance to a guidance intent.
pub fn classify(utterance: &str) -> Intent {
  let lower = utterance.to_lowercase();
  for (keywords, intent) in INTENT_RULES {
    if keywords.iter().any(|k| lower.contains(k)) {
      return *intent;
    }
  }
  Intent::General
}

/// Used only if a pool somehow ends up empty at pick time.
const LAST_RESORT_REPLY: &str = "Keep going. What would you try next?";

/// Canned Socratic replies per intent, used when no guidance service is
/// configured. Pools are overridable from TOML config; `sanitize` refills
/// any pool the config left empty so `pick` can always produce a reply.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReplyPools {
  pub start: Vec<String>,
  pub hint: Vec<String>,
  pub approach: Vec<String>,
  pub general: Vec<String>,
}

impl Default for ReplyPools {
  fn default() -> Self {
    let s = |v: &[&str]| -> Vec<String> { v.iter().map(|x| x.to_string()).collect() };
    Self {
      start: s(&[
        "What is the problem really asking you to find? Try restating it in your own words.",
        "Before writing any code, how would you solve the first example by hand?",
        "What inputs do you get, and what must you produce? Which step connects the two?",
      ]),
      hint: s(&[
        "Think about what you need to look up while scanning the input. Is there a structure that makes that lookup fast?",
        "You already computed something useful on earlier elements. Could you remember it instead of recomputing?",
        "Where exactly does your current idea stop working? Walk up to that point slowly.",
      ]),
      approach: s(&[
        "Trace your approach on the first example, line by line. Does every step do what you expect?",
        "What is the time complexity of what you have now? Do you see a way to cut it down?",
        "Which edge case worries you most about this approach? What would it take to handle it?",
      ]),
      general: s(&[
        "Good question. How does it connect to what the problem statement is asking for?",
        "What do you think happens there? Reason it out loud and check it against an example.",
        "Let's go back to the problem statement. Which part feels unclear right now?",
      ]),
    }
  }
}

impl ReplyPools {
  /// Draw one reply uniformly at random from the intent's pool. No memory:
  /// immediate repeats are allowed.
  pub fn pick(&self, intent: Intent) -> String {
    let pool = match intent {
      Intent::Start => &self.start,
      Intent::Hint => &self.hint,
      Intent::Approach => &self.approach,
      Intent::General => &self.general,
    };
    pool
      .choose(&mut rand::thread_rng())
      .cloned()
      .unwrap_or_else(|| LAST_RESORT_REPLY.to_string())
  }

  /// Refill any empty pool from the built-in defaults. Every pool must hold
  /// at least one entry for the non-empty-reply guarantee to hold.
  pub fn sanitize(&mut self) {
    let defaults = ReplyPools::default();
    if self.start.is_empty() {
      warn!(target: "coach_backend", pool = "start", "Empty reply pool in config; using defaults");
      self.start = defaults.start;
    }
    if self.hint.is_empty() {
      warn!(target: "coach_backend", pool = "hint", "Empty reply pool in config; using defaults");
      self.hint = defaults.hint;
    }
    if self.approach.is_empty() {
      warn!(target: "coach_backend", pool = "approach", "Empty reply pool in config; using defaults");
      self.approach = defaults.approach;
    }
    if self.general.is_empty() {
      warn!(target: "coach_backend", pool = "general", "Empty reply pool in config; using defaults");
      self.general = defaults.general;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quick_prompt_utterances_classify_as_expected() {
    assert_eq!(classify("Where should I start?"), Intent::Start);
    assert_eq!(classify("Can you give me a hint?"), Intent::Hint);
    assert_eq!(classify("is my approach correct?"), Intent::Approach);
    assert_eq!(classify("what about negative numbers"), Intent::General);
  }

  #[test]
  fn start_outranks_approach_on_mixed_utterances() {
    assert_eq!(classify("can you check if I should start here"), Intent::Start);
    assert_eq!(classify("Begin by checking my approach?"), Intent::Start);
  }

  #[test]
  fn hint_outranks_approach() {
    assert_eq!(classify("I'm stuck, is this right?"), Intent::Hint);
  }

  #[test]
  fn matching_is_case_insensitive() {
    assert_eq!(classify("WHERE do I even BEGIN"), Intent::Start);
    assert_eq!(classify("HELP"), Intent::Hint);
  }

  #[test]
  fn unmatched_utterances_fall_through_to_general() {
    assert_eq!(classify(""), Intent::General);
    assert_eq!(classify("tell me about big-O notation"), Intent::General);
  }

  #[test]
  fn every_pool_yields_a_non_empty_reply() {
    let pools = ReplyPools::default();
    for intent in [Intent::Start, Intent::Hint, Intent::Approach, Intent::General] {
      for _ in 0..20 {
        assert!(!pools.pick(intent).is_empty());
      }
    }
  }

  #[test]
  fn sanitize_refills_emptied_pools() {
    let mut pools = ReplyPools::default();
    pools.hint.clear();
    pools.general.clear();
    pools.sanitize();
    assert!(!pools.hint.is_empty());
    assert!(!pools.general.is_empty());
  }
}
