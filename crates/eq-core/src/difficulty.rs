//! Adaptive difficulty controller.
//!
//! Maps rolling accuracy to a difficulty tier. Wrong answers and timeouts
//! always drop the player to `easy`; correct answers climb only as far as
//! the running accuracy allows.

use serde::{Deserialize, Serialize};

use crate::question::Difficulty;

/// How a scored attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The selected option was correct.
    Correct,
    /// The selected option was wrong.
    Incorrect,
    /// The countdown ran out.
    TimedOut,
}

impl AnswerOutcome {
    /// Whether this outcome counts as a correct answer.
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Difficulty for the given running totals.
///
/// Returns `current` unchanged when nothing has been answered yet.
pub fn next_difficulty(correct: u32, total: u32, current: Difficulty) -> Difficulty {
    if total == 0 {
        return current;
    }
    let accuracy = f64::from(correct) / f64::from(total);
    if accuracy >= 0.8 {
        Difficulty::Hard
    } else if accuracy >= 0.5 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

/// Difficulty after a scored attempt. `correct` and `total` already include
/// the attempt.
pub fn after_outcome(
    outcome: AnswerOutcome,
    correct: u32,
    total: u32,
    current: Difficulty,
) -> Difficulty {
    match outcome {
        AnswerOutcome::Correct => next_difficulty(correct, total, current),
        AnswerOutcome::Incorrect | AnswerOutcome::TimedOut => Difficulty::Easy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_answers_keeps_current() {
        assert_eq!(next_difficulty(0, 0, Difficulty::Medium), Difficulty::Medium);
        assert_eq!(next_difficulty(0, 0, Difficulty::Hard), Difficulty::Hard);
    }

    #[test]
    fn thresholds() {
        assert_eq!(next_difficulty(8, 10, Difficulty::Easy), Difficulty::Hard);
        assert_eq!(next_difficulty(79, 100, Difficulty::Easy), Difficulty::Medium);
        assert_eq!(next_difficulty(5, 10, Difficulty::Hard), Difficulty::Medium);
        assert_eq!(next_difficulty(49, 100, Difficulty::Hard), Difficulty::Easy);
        assert_eq!(next_difficulty(0, 3, Difficulty::Medium), Difficulty::Easy);
    }

    #[test]
    fn perfect_first_answer_is_hard() {
        assert_eq!(
            after_outcome(AnswerOutcome::Correct, 1, 1, Difficulty::Medium),
            Difficulty::Hard
        );
    }

    #[test]
    fn wrong_answer_forces_easy_despite_high_accuracy() {
        // 9/10 would be hard, the wrong answer that follows still drops to easy
        assert_eq!(next_difficulty(9, 10, Difficulty::Medium), Difficulty::Hard);
        assert_eq!(
            after_outcome(AnswerOutcome::Incorrect, 9, 11, Difficulty::Hard),
            Difficulty::Easy
        );
    }

    #[test]
    fn timeout_forces_easy() {
        assert_eq!(
            after_outcome(AnswerOutcome::TimedOut, 4, 4, Difficulty::Hard),
            Difficulty::Easy
        );
    }

    #[test]
    fn outcome_correctness() {
        assert!(AnswerOutcome::Correct.is_correct());
        assert!(!AnswerOutcome::Incorrect.is_correct());
        assert!(!AnswerOutcome::TimedOut.is_correct());
    }
}
