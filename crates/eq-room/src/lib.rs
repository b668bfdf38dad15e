//! Multiplayer room synchronization for EduQuest.
//!
//! A room is a shared record plus one record per participant, kept in a
//! replicated store that every client can read and write. The store is
//! reached only through the four primitives of [`RoomStore`]: read,
//! merge-write, subscribe, and register-on-disconnect cleanup. Field
//! ownership is partitioned: each client writes only its own
//! [`RoomPlayer`], and only the host writes the shared [`Room`] fields.

/// The room client: lifecycle, broadcasts, answers, and leaderboard.
pub mod client;
/// Short human-shareable room codes.
pub mod code;
/// Error types for store and room operations.
pub mod error;
/// In-memory replicated store with presence semantics.
pub mod memory;
/// Replicated room and player records.
pub mod model;
/// The replicated store abstraction.
pub mod store;

/// Re-export the room client.
pub use client::{AnswerScoring, RoomClient, RoomWatch};
/// Re-export error types.
pub use error::{RoomError, RoomResult, StoreError, StoreResult};
/// Re-export the in-memory store.
pub use memory::{MemoryConnection, MemoryStore};
/// Re-export record types.
pub use model::{AnswerRecord, Room, RoomPhase, RoomPlayer, StatsUpdate};
/// Re-export store types.
pub use store::{RoomStore, StorePath, Subscription};
