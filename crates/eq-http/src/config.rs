//! Connection settings for the question service.

use std::time::Duration;

/// Where the question service listens when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Base URL and request timeout shared by every HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Service root, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpConfig {
    /// Settings for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of an API path such as `/api/generate-question`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn endpoints_join_with_one_slash() {
        let a = HttpConfig::new("http://quiz.local/");
        let b = HttpConfig::new("http://quiz.local");
        assert_eq!(a.endpoint("/api/analyze-session"), "http://quiz.local/api/analyze-session");
        assert_eq!(b.endpoint("api/analyze-session"), a.endpoint("/api/analyze-session"));
    }
}
