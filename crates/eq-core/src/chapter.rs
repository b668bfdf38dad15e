//! Chapter context and syllabus references.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a session is being played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Free play without a syllabus.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Chapters drawn from an uploaded syllabus.
    #[serde(rename = "syllabus")]
    Syllabus,
    /// Single player.
    #[serde(rename = "solo")]
    Solo,
    /// Shared room, cooperative.
    #[serde(rename = "co-op")]
    CoOp,
    /// Shared room, ranked by score.
    #[serde(rename = "competitive")]
    Competitive,
}

impl GameMode {
    /// Whether this mode plays in a shared room.
    pub fn is_multiplayer(&self) -> bool {
        matches!(self, Self::CoOp | Self::Competitive)
    }

    /// Parse a mode from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "syllabus" => Some(Self::Syllabus),
            "solo" => Some(Self::Solo),
            "co-op" | "coop" => Some(Self::CoOp),
            "competitive" => Some(Self::Competitive),
            _ => None,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Syllabus => "syllabus",
            Self::Solo => "solo",
            Self::CoOp => "co-op",
            Self::Competitive => "competitive",
        };
        f.write_str(s)
    }
}

/// One chapter of a syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter number.
    pub id: u32,
    /// Chapter title.
    pub title: String,
    /// Extracted chapter text.
    #[serde(default)]
    pub content: String,
}

/// An uploaded syllabus split into chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    /// Syllabus id assigned by the upload service.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Chapters in order.
    pub chapters: Vec<Chapter>,
}

impl Syllabus {
    /// Number of chapters.
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    /// Look up a chapter by number.
    pub fn chapter(&self, id: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }
}

/// What the player is currently studying. Local to each player, never
/// replicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContext {
    /// Syllabus the chapter belongs to.
    pub syllabus_id: Option<String>,
    /// Chapter number.
    pub chapter_id: Option<u32>,
    /// Chapter title.
    pub chapter_title: String,
    /// Chapter text used to ground questions.
    pub chapter_content: String,
    /// School subject.
    pub subject: String,
    /// Grade level.
    pub grade: String,
    /// Play mode.
    pub mode: GameMode,
}

impl ChapterContext {
    /// Free-play context for a subject and grade.
    pub fn free_play(subject: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            grade: grade.into(),
            ..Self::default()
        }
    }

    /// Context for the given chapter of a syllabus.
    pub fn from_syllabus(
        syllabus: &Syllabus,
        chapter: &Chapter,
        subject: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            syllabus_id: Some(syllabus.id.clone()),
            chapter_id: Some(chapter.id),
            chapter_title: chapter.title.clone(),
            chapter_content: chapter.content.clone(),
            subject: subject.into(),
            grade: grade.into(),
            mode: GameMode::Syllabus,
        }
    }

    /// Set the play mode.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Prefix used to scope entity ids to this chapter.
    pub fn prefix(&self) -> String {
        self.chapter_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "default".to_string())
    }

    /// Title shown in results; falls back to `Chapter N`.
    pub fn display_title(&self) -> String {
        if !self.chapter_title.is_empty() {
            return self.chapter_title.clone();
        }
        match self.chapter_id {
            Some(id) => format!("Chapter {id}"),
            None => format!("{} Practice", self.subject),
        }
    }

    /// Whether this context plays in a shared room.
    pub fn is_multiplayer(&self) -> bool {
        self.mode.is_multiplayer()
    }

    /// Whether `syllabus` has a chapter after this one.
    pub fn has_next_in(&self, syllabus: &Syllabus) -> bool {
        self.next_in(syllabus).is_some()
    }

    /// Context for the chapter after this one, keeping subject, grade, and
    /// mode. `None` when the syllabus has no later chapter.
    pub fn next_in(&self, syllabus: &Syllabus) -> Option<Self> {
        let next = self.chapter_id.unwrap_or(0) + 1;
        let chapter = syllabus.chapter(next)?;
        Some(Self {
            syllabus_id: Some(syllabus.id.clone()),
            chapter_id: Some(next),
            chapter_title: if chapter.title.is_empty() {
                format!("Chapter {next}")
            } else {
                chapter.title.clone()
            },
            chapter_content: chapter.content.clone(),
            subject: self.subject.clone(),
            grade: self.grade.clone(),
            mode: self.mode,
        })
    }
}
