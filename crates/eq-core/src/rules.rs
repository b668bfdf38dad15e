//! Tunable game rules.
//!
//! Every field has a default, so a partial JSON document is enough to
//! override a single value.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::question::Difficulty;

/// XP granted for a correct answer at each difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpRewards {
    /// Reward on `easy`.
    pub easy: u32,
    /// Reward on `medium`.
    pub medium: u32,
    /// Reward on `hard`.
    pub hard: u32,
}

impl Default for XpRewards {
    fn default() -> Self {
        Self {
            easy: 10,
            medium: 20,
            hard: 30,
        }
    }
}

/// Numeric rules of a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Upper bound of the hp track.
    pub max_hp: u32,
    /// XP needed per level.
    pub xp_per_level: u32,
    /// XP granted per difficulty tier on a correct answer.
    pub xp_rewards: XpRewards,
    /// Score granted on a correct answer.
    pub score_per_correct: u32,
    /// Hp restored on a correct answer.
    pub heal_amount: u32,
    /// Hp lost on a wrong answer.
    pub damage_wrong: u32,
    /// Hp lost when the countdown runs out.
    pub damage_timeout: u32,
    /// Countdown length in seconds.
    pub question_secs: u32,
    /// How long a resolved attempt stays on screen, in milliseconds.
    pub result_display_ms: u64,
    /// Upper bound on a question provider request, in milliseconds.
    pub provider_timeout_ms: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_hp: 100,
            xp_per_level: 100,
            xp_rewards: XpRewards::default(),
            score_per_correct: 100,
            heal_amount: 10,
            damage_wrong: 10,
            damage_timeout: 15,
            question_secs: 30,
            result_display_ms: 2500,
            provider_timeout_ms: 10_000,
        }
    }
}

impl GameRules {
    /// Parse rules from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let rules: Self = serde_json::from_str(json)?;
        let (secs, per_level, hp) = (rules.question_secs, rules.xp_per_level, rules.max_hp);
        Ok(rules
            .with_question_secs(secs)
            .with_xp_per_level(per_level)
            .with_max_hp(hp))
    }

    /// XP reward for a correct answer at `difficulty`.
    pub fn xp_reward(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.xp_rewards.easy,
            Difficulty::Medium => self.xp_rewards.medium,
            Difficulty::Hard => self.xp_rewards.hard,
        }
    }

    /// Result display delay.
    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }

    /// Provider request timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Set the countdown length in seconds (at least one).
    pub fn with_question_secs(mut self, secs: u32) -> Self {
        self.question_secs = secs.max(1);
        self
    }

    /// Set the result display delay in milliseconds.
    pub fn with_result_display_ms(mut self, ms: u64) -> Self {
        self.result_display_ms = ms;
        self
    }

    /// Set the provider request timeout in milliseconds.
    pub fn with_provider_timeout_ms(mut self, ms: u64) -> Self {
        self.provider_timeout_ms = ms;
        self
    }

    /// Set the XP needed per level (at least one).
    pub fn with_xp_per_level(mut self, xp: u32) -> Self {
        self.xp_per_level = xp.max(1);
        self
    }

    /// Set the hp cap (at least one).
    pub fn with_max_hp(mut self, hp: u32) -> Self {
        self.max_hp = hp.max(1);
        self
    }

    /// Set the damage taken on wrong answers and timeouts.
    pub fn with_damage(mut self, wrong: u32, timeout: u32) -> Self {
        self.damage_wrong = wrong;
        self.damage_timeout = timeout;
        self
    }
}
