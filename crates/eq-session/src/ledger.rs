//! Progress ledger.
//!
//! The ledger owns one player's stats, the per-chapter entity sets, and
//! the chapter/syllabus the player is on. All operations are total: bad
//! inputs are clamped or ignored, never reported as errors.

use eq_core::{ChapterContext, EntityId, GameRules, PlayerStats, Syllabus};

/// One player's exclusively owned progression state.
#[derive(Debug, Clone)]
pub struct ProgressLedger {
    stats: PlayerStats,
    attempted: Vec<EntityId>,
    completed: Vec<EntityId>,
    chapter: ChapterContext,
    syllabus: Option<Syllabus>,
}

impl ProgressLedger {
    /// A fresh ledger for the given rules and chapter.
    pub fn new(rules: &GameRules, chapter: ChapterContext) -> Self {
        Self {
            stats: PlayerStats::new(rules),
            attempted: Vec::new(),
            completed: Vec::new(),
            chapter,
            syllabus: None,
        }
    }

    /// Current stats.
    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Add xp. Negative amounts are ignored.
    pub fn add_xp(&mut self, amount: i64) {
        if !self.stats.add_xp(amount) {
            tracing::debug!(amount, "ignoring negative xp");
        }
    }

    /// Count a scored question.
    pub fn record_answer(&mut self, correct: bool) {
        self.stats.record_answer(correct);
    }

    /// Lose hp, clamped at zero. Returns the new hp.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.stats.take_damage(amount)
    }

    /// Restore hp, clamped at the maximum. Returns the new hp.
    pub fn heal(&mut self, amount: u32) -> u32 {
        self.stats.heal(amount)
    }

    /// Add to the score.
    pub fn add_score(&mut self, points: u32) {
        self.stats.add_score(points);
    }

    /// Record that a question was shown for `id`. Returns true if the id
    /// was new.
    pub fn mark_attempted(&mut self, id: &EntityId) -> bool {
        if self.attempted.contains(id) {
            return false;
        }
        self.attempted.push(id.clone());
        true
    }

    /// Record that `id` was answered correctly. Returns true if the id was
    /// new. An id that was never attempted is attempted as well.
    pub fn mark_completed(&mut self, id: &EntityId) -> bool {
        if self.completed.contains(id) {
            return false;
        }
        if self.mark_attempted(id) {
            tracing::warn!(entity = %id, "completed an entity that was never attempted");
        }
        self.completed.push(id.clone());
        true
    }

    /// Whether a question was already shown for `id`.
    pub fn is_attempted(&self, id: &EntityId) -> bool {
        self.attempted.contains(id)
    }

    /// Whether `id` was answered correctly.
    pub fn is_completed(&self, id: &EntityId) -> bool {
        self.completed.contains(id)
    }

    /// Attempted ids in the order they were attempted.
    pub fn attempted(&self) -> &[EntityId] {
        &self.attempted
    }

    /// Completed ids in the order they were completed.
    pub fn completed(&self) -> &[EntityId] {
        &self.completed
    }

    /// The current chapter.
    pub fn chapter(&self) -> &ChapterContext {
        &self.chapter
    }

    /// Replace the current chapter.
    pub fn set_chapter(&mut self, chapter: ChapterContext) {
        self.chapter = chapter;
    }

    /// The syllabus being played, if any.
    pub fn syllabus(&self) -> Option<&Syllabus> {
        self.syllabus.as_ref()
    }

    /// Track a syllabus.
    pub fn set_syllabus(&mut self, syllabus: Option<Syllabus>) {
        self.syllabus = syllabus;
    }

    /// Full exit: default stats, empty sets, no chapter, no syllabus.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.attempted.clear();
        self.completed.clear();
        self.chapter = ChapterContext::default();
        self.syllabus = None;
    }

    /// Default stats and empty sets, keeping chapter and syllabus.
    pub fn reset_for_next_chapter(&mut self) {
        self.stats.reset();
        self.attempted.clear();
        self.completed.clear();
    }
}
