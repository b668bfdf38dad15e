/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while validating core data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A question payload failed validation.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
