//! External collaborators of a game session.
//!
//! Every collaborator is untrusted and may be slow. The session bounds
//! question requests with a timeout, never waits on result persistence,
//! and keeps going with defaults whenever a call fails.

use async_trait::async_trait;
use eq_core::{Question, QuestionRequest};

use crate::chapter::ChapterCompletion;
use crate::error::ProviderResult;

/// Source of questions.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Produce a question for an entity interaction.
    async fn generate(&self, request: &QuestionRequest) -> ProviderResult<Question>;
}

/// Destination of chapter completion records.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist a completed chapter.
    async fn save_completion(&self, completion: &ChapterCompletion) -> ProviderResult<()>;
}

/// Turns wrong answers into weak-topic labels.
#[async_trait]
pub trait WeakTopicAnalyzer: Send + Sync {
    /// Weak topics suggested by the given wrong answers.
    async fn analyze(
        &self,
        subject: &str,
        grade: &str,
        wrong_answers: &[String],
    ) -> ProviderResult<Vec<String>>;
}

/// A result sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn save_completion(&self, completion: &ChapterCompletion) -> ProviderResult<()> {
        tracing::info!(
            user = %completion.user_id,
            chapter = %completion.chapter_title,
            score = completion.score,
            accuracy = completion.accuracy,
            time_taken = completion.time_taken,
            "chapter completed"
        );
        Ok(())
    }
}

/// An analyzer that never finds weak topics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalysis;

#[async_trait]
impl WeakTopicAnalyzer for NoAnalysis {
    async fn analyze(&self, _: &str, _: &str, _: &[String]) -> ProviderResult<Vec<String>> {
        Ok(Vec::new())
    }
}
