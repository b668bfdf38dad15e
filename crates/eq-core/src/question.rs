//! Questions, difficulty tiers, and the request sent to a question provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Number of options every question must offer.
pub const OPTION_COUNT: usize = 4;

/// Difficulty tier driving reward magnitude and question complexity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Lowest tier.
    Easy,
    /// Starting tier.
    #[default]
    Medium,
    /// Highest tier.
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// A multiple-choice question as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The prompt shown to the player.
    pub question: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_index: usize,
    /// Explanation shown after the attempt resolves.
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// The fixed question served when the provider fails.
    pub fn fallback() -> Self {
        Self {
            question: "What is 5 + 3?".to_string(),
            options: vec!["6".into(), "7".into(), "8".into(), "9".into()],
            correct_index: 2,
            explanation: "5 + 3 = 8".to_string(),
        }
    }

    /// Check the payload shape. Providers are untrusted, so every payload
    /// passes through here before it reaches the player.
    pub fn validate(&self) -> CoreResult<()> {
        if self.question.trim().is_empty() {
            return Err(CoreError::InvalidQuestion("empty question text".into()));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(CoreError::InvalidQuestion(format!(
                "expected {OPTION_COUNT} options, got {}",
                self.options.len()
            )));
        }
        if self.correct_index >= self.options.len() {
            return Err(CoreError::InvalidQuestion(format!(
                "correct_index {} out of range",
                self.correct_index
            )));
        }
        Ok(())
    }

    /// Whether `index` selects the correct option.
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    /// Text of the correct option.
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Context sent to the question provider for one entity interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// School subject.
    pub subject: String,
    /// Grade level.
    pub grade: String,
    /// Current difficulty tier.
    pub difficulty: Difficulty,
    /// Entity kind: `enemy`, `resource`, or `npc`.
    pub interaction_type: String,
    /// Stable entity id.
    pub entity_id: String,
    /// Display name of the entity.
    pub entity_name: String,
    /// Topics the player has struggled with.
    pub weak_topics: Vec<String>,
    /// Syllabus the chapter belongs to, if any.
    pub syllabus_id: Option<String>,
    /// Chapter number, if any.
    pub chapter_id: Option<u32>,
    /// Chapter text the question should draw from.
    pub chapter_content: Option<String>,
    /// Entities already served a question this chapter run.
    pub attempted_entities: Vec<String>,
    /// Requesting player.
    pub user_id: String,
}
