//! Core types for EduQuest: player stats, world entities, chapters, and questions.
//!
//! This crate holds the data model shared by the session engine and the
//! room synchronization layer. It performs no I/O; everything here can be
//! constructed programmatically or deserialized from JSON.

/// Chapter context, game modes, and syllabus references.
pub mod chapter;
/// The adaptive difficulty controller.
pub mod difficulty;
/// Interactable world entities and chapter rosters.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Question payloads, difficulty tiers, and provider requests.
pub mod question;
/// Tunable game rules (rewards, damage, timers).
pub mod rules;
/// Player stats and the replicated stats snapshot.
pub mod stats;

/// Re-export chapter types.
pub use chapter::{Chapter, ChapterContext, GameMode, Syllabus};
/// Re-export the difficulty controller.
pub use difficulty::{AnswerOutcome, after_outcome, next_difficulty};
/// Re-export entity types.
pub use entity::{ChapterRoster, Entity, EntityId, EntityKind};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export question types.
pub use question::{Difficulty, Question, QuestionRequest};
/// Re-export the game rules.
pub use rules::GameRules;
/// Re-export stats types.
pub use stats::{PlayerStats, StatsSnapshot};
