//! Player stats.
//!
//! `PlayerStats` keeps its fields private so the level invariant
//! (`level == xp / xp_per_level + 1`) and the hp bounds cannot be broken
//! from outside. `StatsSnapshot` is the plain, serializable copy that gets
//! mirrored into a multiplayer room.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::GameRules;

/// One player's progression stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    hp: u32,
    xp: u32,
    level: u32,
    score: u32,
    correct_answers: u32,
    total_questions: u32,
    #[serde(skip)]
    max_hp: u32,
    #[serde(skip)]
    xp_per_level: u32,
}

impl PlayerStats {
    /// Fresh stats for the given rules: full hp, level 1, everything else zero.
    pub fn new(rules: &GameRules) -> Self {
        let max_hp = rules.max_hp.max(1);
        Self {
            hp: max_hp,
            xp: 0,
            level: 1,
            score: 0,
            correct_answers: 0,
            total_questions: 0,
            max_hp,
            xp_per_level: rules.xp_per_level.max(1),
        }
    }

    /// Current hp, always within `[0, max_hp]`.
    pub fn hp(&self) -> u32 {
        self.hp
    }

    /// Upper hp bound.
    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Accumulated xp.
    pub fn xp(&self) -> u32 {
        self.xp
    }

    /// Level derived from xp.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Accumulated score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of correctly answered questions.
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Number of scored questions (correct, wrong, or timed out).
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Add xp and recompute the level. Negative amounts are ignored.
    /// Returns true if the amount was applied.
    pub fn add_xp(&mut self, amount: i64) -> bool {
        if amount < 0 {
            return false;
        }
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        self.xp = self.xp.saturating_add(amount);
        self.level = self.xp / self.xp_per_level + 1;
        true
    }

    /// Count a scored question.
    pub fn record_answer(&mut self, correct: bool) {
        self.total_questions = self.total_questions.saturating_add(1);
        if correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
    }

    /// Lose hp, stopping at zero. Returns the new hp.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    /// Restore hp, stopping at `max_hp`. Returns the new hp.
    pub fn heal(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp
    }

    /// Add to the score.
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Restore the defaults, keeping the configured bounds.
    pub fn reset(&mut self) {
        *self = Self {
            hp: self.max_hp,
            xp: 0,
            level: 1,
            score: 0,
            correct_answers: 0,
            total_questions: 0,
            max_hp: self.max_hp,
            xp_per_level: self.xp_per_level,
        };
    }

    /// True once hp has dropped to zero.
    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Fraction of scored questions answered correctly (0.0 when none).
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.total_questions)
    }

    /// Accuracy as a rounded whole percentage.
    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy() * 100.0).round() as u32
    }

    /// Copy of the replicated subset.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hp: self.hp,
            xp: self.xp,
            level: self.level,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
        }
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(&GameRules::default())
    }
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HP {}/{} | Lv {} | XP {} | Score {} | {}/{} correct",
            self.hp,
            self.max_hp,
            self.level,
            self.xp,
            self.score,
            self.correct_answers,
            self.total_questions
        )
    }
}

/// The stats fields that are mirrored into a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Hit points.
    pub hp: u32,
    /// Experience points.
    pub xp: u32,
    /// Level.
    pub level: u32,
    /// Score.
    pub score: u32,
    /// Correct answers.
    pub correct_answers: u32,
    /// Scored questions.
    pub total_questions: u32,
}
