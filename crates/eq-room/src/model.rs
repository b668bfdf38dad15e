//! Replicated room and player records.
//!
//! Field names are camelCase on the wire so every client of the shared
//! store reads the same records.

use chrono::{DateTime, Utc};
use eq_core::{Question, StatsSnapshot};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    /// Players are gathering.
    #[default]
    Waiting,
    /// The host has started the game.
    Playing,
}

/// Shared room state. Written only by the host, apart from creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room code.
    pub code: String,
    /// Id of the hosting player.
    pub host: String,
    /// Lifecycle phase.
    #[serde(default)]
    pub state: RoomPhase,
    /// Question broadcast by the host.
    pub current_question: Option<Question>,
    /// Player whose turn it is.
    pub active_player: Option<String>,
    /// Broadcast counter, incremented with every question.
    #[serde(default)]
    pub round: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When the host started the game.
    pub started_at: Option<DateTime<Utc>>,
}

impl Room {
    /// A fresh waiting room.
    pub fn new(code: impl Into<String>, host: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            host: host.into(),
            state: RoomPhase::Waiting,
            current_question: None,
            active_player: None,
            round: 0,
            created_at: now,
            started_at: None,
        }
    }
}

/// One participant's replicated record. Written only by that participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
    /// Player id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Hit points.
    #[serde(default)]
    pub hp: u32,
    /// Experience points.
    #[serde(default)]
    pub xp: u32,
    /// Level.
    #[serde(default)]
    pub level: u32,
    /// Score.
    #[serde(default)]
    pub score: u32,
    /// Correct answers.
    #[serde(default)]
    pub correct_answers: u32,
    /// Scored questions.
    #[serde(default)]
    pub total_questions: u32,
    /// Whether the player is ready to play.
    #[serde(default)]
    pub is_ready: bool,
    /// Join time.
    #[serde(default)]
    pub joined_at: DateTime<Utc>,
    /// Last stats update.
    pub last_updated: Option<DateTime<Utc>>,
}

impl RoomPlayer {
    /// A ready player record seeded from local stats.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stats: StatsSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hp: stats.hp,
            xp: stats.xp,
            level: stats.level,
            score: stats.score,
            correct_answers: stats.correct_answers,
            total_questions: stats.total_questions,
            is_ready: true,
            joined_at: now,
            last_updated: None,
        }
    }

    /// The stats part of the record.
    pub fn stats(&self) -> StatsSnapshot {
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

/// Partial update of a player's own stats. Unset fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    /// New hit points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<u32>,
    /// New experience points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u32>,
    /// New level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// New score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// New correct answer count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u32>,
    /// New scored question count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
}

impl StatsUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<StatsSnapshot> for StatsUpdate {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            hp: Some(s.hp),
            xp: Some(s.xp),
            level: Some(s.level),
            score: Some(s.score),
            correct_answers: Some(s.correct_answers),
            total_questions: Some(s.total_questions),
        }
    }
}

/// A player's answer to one broadcast round. Written at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// Answering player.
    pub player_id: String,
    /// The submitted answer.
    pub answer: String,
    /// Whether it was correct.
    pub is_correct: bool,
    /// Round the answer belongs to.
    pub round: u32,
    /// Submission time.
    pub answered_at: DateTime<Utc>,
}
