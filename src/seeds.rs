//! Built-in default content: the startup problem and starter code templates.

use crate::domain::{Difficulty, Example, Problem, ProblemSource};

/// Starter code installed alongside the built-in default problem.
pub const DEFAULT_STARTER_CODE: &str = "def two_sum(nums, target):
    # Your solution here
    pass

# Test your solution
nums = [2, 7, 11, 15]
target = 9
print(two_sum(nums, target))
";

/// Starter code installed whenever a user-authored problem is submitted, and
/// when a generated problem arrives without one.
pub const CUSTOM_STARTER_CODE: &str = "# Your solution here

";

/// The problem every session starts on unless config overrides it.
pub fn default_problem() -> Problem {
  Problem {
    title: "Two Sum".into(),
    description: "Given an array of integers nums and an integer target, \
                  return indices of the two numbers such that they add up to \
                  target. You may assume that each input would have exactly \
                  one solution, and you may not use the same element twice."
      .into(),
    difficulty: Difficulty::Easy,
    category: "Arrays".into(),
    estimated_time: "15 min".into(),
    examples: vec![Example {
      input: "nums = [2,7,11,15], target = 9".into(),
      output: "[0, 1]".into(),
    }],
    source: ProblemSource::Builtin,
  }
}
