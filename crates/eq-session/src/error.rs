//! Error types for the session layer.

use eq_core::CoreError;
use eq_room::RoomError;
use thiserror::Error;

/// Result type for collaborator calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failures of an external collaborator (question provider, result sink,
/// weak-topic analyzer).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be delivered.
    #[error("transport error: {0}")]
    Transport(String),

    /// The collaborator answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The response decoded but is not usable.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] CoreError),

    /// The collaborator did not answer in time.
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

/// Failures surfaced by a game session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A collaborator call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
