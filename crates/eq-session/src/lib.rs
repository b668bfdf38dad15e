//! Game sessions for EduQuest.
//!
//! This crate drives one player's game: the progress ledger, the question
//! attempt state machine with its countdown, chapter completion, and the
//! collaborator traits for questions, result persistence and weak-topic
//! analysis. Multiplayer sessions mirror their stats into an
//! [`eq_room::RoomClient`]; the local ledger stays authoritative.

/// The in-flight question attempt.
pub mod attempt;
/// The offline question bank.
pub mod bank;
/// Chapter completion and result summaries.
pub mod chapter;
/// Error types for sessions and collaborators.
pub mod error;
/// The progress ledger.
pub mod ledger;
/// Collaborator traits.
pub mod provider;
/// The game session.
pub mod session;
/// Attempt timers.
pub mod timer;

/// Re-export attempt types.
pub use attempt::{AttemptId, AttemptResult, AttemptState, QuestionAttempt};
/// Re-export the question bank.
pub use bank::QuestionBank;
/// Re-export chapter types.
pub use chapter::{ChapterCompletion, ChapterEvaluator, ChapterSummary, letter_grade};
/// Re-export error types.
pub use error::{ProviderError, ProviderResult, SessionError, SessionResult};
/// Re-export the ledger.
pub use ledger::ProgressLedger;
/// Re-export collaborator traits and the built-in adapters.
pub use provider::{LogSink, NoAnalysis, QuestionProvider, ResultSink, WeakTopicAnalyzer};
/// Re-export session types.
pub use session::{GameSession, IgnoreReason, Interaction, SessionEvent, SessionSummary};
/// Re-export timer events.
pub use timer::TimerEvent;
