//! The in-flight question attempt.

use std::fmt;

use eq_core::{AnswerOutcome, Difficulty, Entity, Question};
use serde::Serialize;

/// Identifies one attempt within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptState {
    /// Waiting for the question provider.
    Loading,
    /// The question is shown and the countdown is running.
    Active,
    /// The player picked an option.
    Answered,
    /// The countdown ran out.
    TimedOut,
}

impl AttemptState {
    /// Whether the attempt has been scored.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Answered | Self::TimedOut)
    }
}

/// How a resolved attempt turned out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    /// Correct, incorrect, or timed out.
    pub outcome: AnswerOutcome,
    /// Message shown to the player.
    pub feedback: String,
    /// The correct option's text.
    pub correct_option: String,
    /// Explanation from the question.
    pub explanation: String,
    /// Xp granted.
    pub xp_gained: u32,
    /// Hp after the attempt.
    pub hp: u32,
    /// Difficulty for the next question.
    pub difficulty: Difficulty,
}

/// The one question attempt a session may have open.
#[derive(Debug, Clone)]
pub struct QuestionAttempt {
    id: AttemptId,
    entity: Entity,
    question: Option<Question>,
    remaining_secs: u32,
    state: AttemptState,
    result: Option<AttemptResult>,
}

impl QuestionAttempt {
    pub(crate) fn new(id: AttemptId, entity: Entity) -> Self {
        Self {
            id,
            entity,
            question: None,
            remaining_secs: 0,
            state: AttemptState::Loading,
            result: None,
        }
    }

    pub(crate) fn activate(&mut self, question: Question, secs: u32) {
        self.question = Some(question);
        self.remaining_secs = secs;
        self.state = AttemptState::Active;
    }

    pub(crate) fn tick(&mut self, remaining: u32) {
        self.remaining_secs = remaining;
    }

    pub(crate) fn resolve(&mut self, state: AttemptState, result: AttemptResult) {
        if state == AttemptState::TimedOut {
            self.remaining_secs = 0;
        }
        self.state = state;
        self.result = Some(result);
    }

    /// Attempt id.
    pub fn id(&self) -> AttemptId {
        self.id
    }

    /// The entity the question is about.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// The question, once loaded.
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Seconds left on the countdown.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Lifecycle state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// The result, once resolved.
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }
}
