//! Collaborator implementations backed by the question service API.

use async_trait::async_trait;
use eq_core::{Question, QuestionRequest};
use eq_session::{
    ChapterCompletion, ProviderResult, QuestionProvider, ResultSink, WeakTopicAnalyzer,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;

/// Question generation endpoint.
pub const GENERATE_QUESTION: &str = "/api/generate-question";
/// Chapter completion endpoint.
pub const COMPLETE_CHAPTER: &str = "/api/complete-chapter";
/// Weak-topic analysis endpoint.
pub const ANALYZE_SESSION: &str = "/api/analyze-session";

/// Asks the service to generate each question.
#[derive(Debug, Clone)]
pub struct HttpQuestionProvider {
    api: ApiClient,
}

impl HttpQuestionProvider {
    /// A provider talking through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuestionProvider for HttpQuestionProvider {
    async fn generate(&self, request: &QuestionRequest) -> ProviderResult<Question> {
        let question: Question = self.api.post(GENERATE_QUESTION, request).await?;
        question.validate()?;
        Ok(question)
    }
}

/// Stores chapter completions with the service.
#[derive(Debug, Clone)]
pub struct HttpResultSink {
    api: ApiClient,
}

impl HttpResultSink {
    /// A sink talking through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    success: bool,
}

#[async_trait]
impl ResultSink for HttpResultSink {
    async fn save_completion(&self, completion: &ChapterCompletion) -> ProviderResult<()> {
        let reply: CompletionReply = self.api.post(COMPLETE_CHAPTER, completion).await?;
        if !reply.success {
            tracing::warn!(chapter = %completion.chapter_title, "service did not confirm completion");
        }
        Ok(())
    }
}

/// Asks the service which topics the wrong answers point to.
#[derive(Debug, Clone)]
pub struct HttpWeakTopicAnalyzer {
    api: ApiClient,
}

impl HttpWeakTopicAnalyzer {
    /// An analyzer talking through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    subject: &'a str,
    grade: &'a str,
    wrong_answers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AnalyzeReply {
    #[serde(default)]
    weak_topics: Vec<String>,
}

#[async_trait]
impl WeakTopicAnalyzer for HttpWeakTopicAnalyzer {
    async fn analyze(
        &self,
        subject: &str,
        grade: &str,
        wrong_answers: &[String],
    ) -> ProviderResult<Vec<String>> {
        let body = AnalyzeRequest {
            subject,
            grade,
            wrong_answers,
        };
        let reply: AnalyzeReply = self.api.post(ANALYZE_SESSION, &body).await?;
        Ok(reply.weak_topics)
    }
}
