//! HTTP adapters for EduQuest.
//!
//! Implements the session collaborator traits against the question
//! service's JSON API: question generation, chapter completion storage and
//! weak-topic analysis. Every failure maps onto
//! [`eq_session::ProviderError`]; the session decides how to degrade.

/// Collaborator implementations.
pub mod adapters;
/// JSON-over-HTTP transport.
pub mod api;
/// Connection settings.
pub mod config;

/// Re-export the adapters.
pub use adapters::{HttpQuestionProvider, HttpResultSink, HttpWeakTopicAnalyzer};
/// Re-export the transport.
pub use api::ApiClient;
/// Re-export the settings.
pub use config::{DEFAULT_BASE_URL, HttpConfig};
