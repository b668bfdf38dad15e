//! Chapter completion.
//!
//! A chapter is complete once a question was shown for every required
//! entity, regardless of how the questions were answered. The evaluator
//! fires at most once per chapter run.

use chrono::{DateTime, Utc};
use eq_core::{ChapterContext, EntityId, GameMode, Syllabus};
use serde::{Deserialize, Serialize};

use crate::ledger::ProgressLedger;

/// Record handed to the result sink when a chapter completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterCompletion {
    /// Player id.
    pub user_id: String,
    /// Syllabus, if the chapter came from one.
    pub syllabus_id: Option<String>,
    /// Chapter number, if any.
    pub chapter_id: Option<u32>,
    /// Chapter title.
    pub chapter_title: String,
    /// Score at completion.
    pub score: u32,
    /// Scored questions.
    pub total_questions: u32,
    /// Correct answers.
    pub correct_answers: u32,
    /// Rounded accuracy percentage.
    pub accuracy: u32,
    /// Seconds since the chapter started.
    pub time_taken: u64,
    /// Play mode.
    pub mode: GameMode,
    /// Subject.
    pub subject: String,
    /// Grade level.
    pub grade: String,
}

/// Watches the ledger for the moment every required entity is attempted.
#[derive(Debug, Clone)]
pub struct ChapterEvaluator {
    user_id: String,
    required: Vec<EntityId>,
    started_at: DateTime<Utc>,
    fired: bool,
}

impl ChapterEvaluator {
    /// An evaluator for one chapter run.
    pub fn new(user_id: impl Into<String>, required: Vec<EntityId>, started_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            required,
            started_at,
            fired: false,
        }
    }

    /// Ids that must be attempted.
    pub fn required(&self) -> &[EntityId] {
        &self.required
    }

    /// When the chapter run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether completion has already been reported.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Required ids attempted so far.
    pub fn progress(&self, ledger: &ProgressLedger) -> usize {
        self.required
            .iter()
            .filter(|id| ledger.is_attempted(id))
            .count()
    }

    /// The completion record, on the first call where every required id is
    /// attempted. `None` before that and on every later call.
    pub fn check(&mut self, ledger: &ProgressLedger, now: DateTime<Utc>) -> Option<ChapterCompletion> {
        if self.fired || self.progress(ledger) < self.required.len() {
            return None;
        }
        self.fired = true;

        let stats = ledger.stats();
        let chapter = ledger.chapter();
        let time_taken = u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0);
        tracing::info!(
            chapter = %chapter.display_title(),
            accuracy = stats.accuracy_percent(),
            time_taken,
            "chapter complete"
        );
        Some(ChapterCompletion {
            user_id: self.user_id.clone(),
            syllabus_id: chapter.syllabus_id.clone(),
            chapter_id: chapter.chapter_id,
            chapter_title: chapter.display_title(),
            score: stats.score(),
            total_questions: stats.total_questions(),
            correct_answers: stats.correct_answers(),
            accuracy: stats.accuracy_percent(),
            time_taken,
            mode: chapter.mode,
            subject: chapter.subject.clone(),
            grade: chapter.grade.clone(),
        })
    }
}

/// Letter grade for a rounded accuracy percentage.
pub fn letter_grade(accuracy: u32) -> &'static str {
    match accuracy {
        90.. => "A+",
        80..=89 => "A",
        70..=79 => "B",
        60..=69 => "C",
        50..=59 => "D",
        _ => "F",
    }
}

/// What the player sees when a chapter completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterSummary {
    /// The persisted record.
    pub completion: ChapterCompletion,
    /// Letter grade for the accuracy.
    pub grade: &'static str,
    /// The next chapter, when playing a syllabus that has one.
    pub next_chapter: Option<ChapterContext>,
}

impl ChapterSummary {
    /// Build the summary for a completion.
    pub fn new(completion: ChapterCompletion, current: &ChapterContext, syllabus: Option<&Syllabus>) -> Self {
        let next_chapter = match (completion.mode, syllabus) {
            (GameMode::Syllabus, Some(s)) => current.next_in(s),
            _ => None,
        };
        Self {
            grade: letter_grade(completion.accuracy),
            completion,
            next_chapter,
        }
    }

    /// Whether a later chapter is available.
    pub fn has_more_chapters(&self) -> bool {
        self.next_chapter.is_some()
    }

    /// Plain-text result card.
    pub fn render(&self) -> String {
        let c = &self.completion;
        let syllabus_mode = c.mode == GameMode::Syllabus;
        let (heading, title) = if syllabus_mode {
            ("Chapter Complete!", c.chapter_title.as_str())
        } else {
            ("Level Complete!", "Default Mode")
        };
        let mut lines = vec![
            heading.to_string(),
            format!("{} - {title}", c.subject),
            format!("Grade: {}", self.grade),
            format!("Score: {}", c.score),
            format!("Correct: {}/{}", c.correct_answers, c.total_questions),
            format!("Accuracy: {}%", c.accuracy),
            format!("Time: {}", format_secs(c.time_taken)),
        ];
        if let Some(next) = self.next_chapter.as_ref().and_then(|n| n.chapter_id) {
            lines.push(format!("Continue to Chapter {next} →"));
        }
        lines.join("\n")
    }
}

fn format_secs(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
