//! Error types for the room layer.

use thiserror::Error;

/// Result type for store primitives.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for room operations.
pub type RoomResult<T> = Result<T, RoomError>;

/// Failures of the replicated store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection to the store has been closed.
    #[error("store connection closed")]
    Disconnected,

    /// The store refused the operation.
    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

/// Failures of room operations.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored record could not be encoded or decoded.
    #[error("room record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The room disappeared between two operations.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// The caller's player record is missing from the room.
    #[error("player {0} is not in the room")]
    PlayerNotFound(String),

    /// The client already left the room.
    #[error("already left room {0}")]
    Left(String),

    /// The room code is not usable as a store key.
    #[error("invalid room code: {0:?}")]
    InvalidCode(String),
}
