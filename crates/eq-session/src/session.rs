//! Game session.
//!
//! `GameSession` is the explicit context of one player's game: it owns the
//! progress ledger, current difficulty, wrong-answer log, weak topics, the
//! one in-flight question attempt and its timers, the chapter evaluator,
//! the collaborator handles and an optional room membership.
//!
//! An attempt moves `loading → active → (answered | timed-out)` and is then
//! closed, either by the result display delay or by [`GameSession::close`].
//! Timer events are delivered through [`GameSession::next_event`]; events
//! that belong to an attempt that has already moved on are dropped.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use eq_core::{
    AnswerOutcome, ChapterContext, ChapterRoster, Difficulty, Entity, EntityKind, GameRules,
    Question, QuestionRequest, Syllabus, after_outcome,
};
use eq_room::{RoomClient, RoomStore};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::attempt::{AttemptId, AttemptResult, AttemptState, QuestionAttempt};
use crate::chapter::{ChapterEvaluator, ChapterSummary};
use crate::error::{ProviderError, SessionResult};
use crate::ledger::ProgressLedger;
use crate::provider::{LogSink, NoAnalysis, QuestionProvider, ResultSink, WeakTopicAnalyzer};
use crate::timer::{TimerEvent, TimerTask};

/// Why an interaction did not start an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A question was already shown for this entity.
    AlreadyAttempted,
    /// Another attempt is still open.
    AttemptOpen,
    /// The player has no hp left.
    GameOver,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAttempted => write!(f, "already attempted"),
            Self::AttemptOpen => write!(f, "another question is open"),
            Self::GameOver => write!(f, "game over"),
        }
    }
}

/// Result of [`GameSession::interact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// A question is now active.
    Started {
        /// The new attempt.
        attempt: AttemptId,
        /// The question shown.
        question: Question,
    },
    /// Nothing happened.
    Ignored(IgnoreReason),
}

/// A timer-driven change reported by [`GameSession::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One second of the countdown elapsed.
    Tick {
        /// Seconds left.
        remaining: u32,
    },
    /// The countdown ran out and the attempt was scored as a miss.
    TimedOut(AttemptResult),
    /// The result display ended and the attempt closed. Carries the
    /// chapter summary if this attempt completed the chapter.
    AttemptClosed {
        /// Chapter result, once per chapter.
        chapter: Option<Box<ChapterSummary>>,
    },
}

/// Totals reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Scored questions across all chapters.
    pub questions_answered: u32,
    /// Correct answers across all chapters.
    pub correct_answers: u32,
    /// Xp earned across all chapters.
    pub xp_earned: u32,
    /// Rounded accuracy percentage.
    pub accuracy: u32,
    /// Chapters completed.
    pub chapters_completed: u32,
    /// Starting difficulty followed by the difficulty after each attempt.
    pub difficulty_progression: Vec<Difficulty>,
}

/// One player's game.
pub struct GameSession {
    rules: GameRules,
    user_id: String,
    ledger: ProgressLedger,
    roster: ChapterRoster,
    difficulty: Difficulty,
    difficulty_history: Vec<Difficulty>,
    wrong_answers: Vec<String>,
    weak_topics: Vec<String>,
    attempt: Option<QuestionAttempt>,
    next_attempt: u64,
    countdown: Option<TimerTask>,
    display: Option<TimerTask>,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    evaluator: ChapterEvaluator,
    pending_summary: Option<ChapterSummary>,
    summary_delivered: bool,
    provider: Arc<dyn QuestionProvider>,
    sink: Arc<dyn ResultSink>,
    analyzer: Arc<dyn WeakTopicAnalyzer>,
    room: Option<RoomClient>,
    persistence: Vec<JoinHandle<()>>,
    totals: Totals,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    answered: u32,
    correct: u32,
    xp: u32,
    chapters: u32,
}

impl GameSession {
    /// A new session on `chapter`, asking `provider` for questions. Results
    /// are only logged and weak topics are never analyzed until other
    /// collaborators are set.
    pub fn new(
        rules: GameRules,
        chapter: ChapterContext,
        user_id: impl Into<String>,
        provider: Arc<dyn QuestionProvider>,
    ) -> Self {
        let user_id = user_id.into();
        let roster = ChapterRoster::for_subject(&chapter.subject);
        let evaluator = ChapterEvaluator::new(
            user_id.clone(),
            roster.required_ids(&chapter.prefix()),
            Utc::now(),
        );
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let difficulty = Difficulty::default();
        Self {
            ledger: ProgressLedger::new(&rules, chapter),
            rules,
            user_id,
            roster,
            difficulty,
            difficulty_history: vec![difficulty],
            wrong_answers: Vec::new(),
            weak_topics: Vec::new(),
            attempt: None,
            next_attempt: 0,
            countdown: None,
            display: None,
            timer_tx,
            timer_rx,
            evaluator,
            pending_summary: None,
            summary_delivered: false,
            provider,
            sink: Arc::new(LogSink),
            analyzer: Arc::new(NoAnalysis),
            room: None,
            persistence: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Send chapter completions to `sink`.
    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use `analyzer` for weak-topic refreshes.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn WeakTopicAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Track the syllabus the chapter belongs to.
    pub fn with_syllabus(mut self, syllabus: Syllabus) -> Self {
        self.ledger.set_syllabus(Some(syllabus));
        self
    }

    /// Join (or create) the room `code` and mirror stats into it.
    pub async fn join_room(
        &mut self,
        store: Arc<dyn RoomStore>,
        code: &str,
        name: &str,
    ) -> SessionResult<&RoomClient> {
        let client =
            RoomClient::create_or_join(store, code, &self.user_id, name, self.ledger.stats().snapshot())
                .await?;
        let client: &RoomClient = self.room.insert(client);
        Ok(client)
    }

    /// The rules in effect.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// The player id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The progress ledger.
    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    /// The world being played.
    pub fn roster(&self) -> &ChapterRoster {
        &self.roster
    }

    /// Difficulty of the next question.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Questions answered wrong, oldest first.
    pub fn wrong_answers(&self) -> &[String] {
        &self.wrong_answers
    }

    /// Weak topics sent with question requests.
    pub fn weak_topics(&self) -> &[String] {
        &self.weak_topics
    }

    /// The open attempt, if any.
    pub fn attempt(&self) -> Option<&QuestionAttempt> {
        self.attempt.as_ref()
    }

    /// The room membership, if any.
    pub fn room(&self) -> Option<&RoomClient> {
        self.room.as_ref()
    }

    /// The chapter evaluator.
    pub fn evaluator(&self) -> &ChapterEvaluator {
        &self.evaluator
    }

    /// The result of the current chapter, once complete.
    pub fn chapter_summary(&self) -> Option<&ChapterSummary> {
        self.pending_summary.as_ref()
    }

    /// True once hp has dropped to zero.
    pub fn is_game_over(&self) -> bool {
        self.ledger.stats().is_defeated()
    }

    /// Interactable entities of the current chapter.
    pub fn entities(&self) -> Vec<Entity> {
        self.roster.entities(&self.ledger.chapter().prefix())
    }

    /// The entity for an interaction on a named object.
    pub fn resolve_entity(&self, kind: EntityKind, name: &str) -> Entity {
        self.roster.resolve(&self.ledger.chapter().prefix(), kind, name)
    }

    /// Start an attempt for `entity`: fetch a question, mark the entity
    /// attempted, and start the countdown.
    pub async fn interact(&mut self, entity: Entity) -> Interaction {
        let ignored = if self.is_game_over() {
            Some(IgnoreReason::GameOver)
        } else if self.attempt.is_some() {
            Some(IgnoreReason::AttemptOpen)
        } else if self.ledger.is_attempted(&entity.id) {
            Some(IgnoreReason::AlreadyAttempted)
        } else {
            None
        };
        if let Some(reason) = ignored {
            tracing::debug!(entity = %entity.id, %reason, "interaction ignored");
            return Interaction::Ignored(reason);
        }

        self.next_attempt += 1;
        let id = AttemptId(self.next_attempt);
        let request = self.question_request(&entity);
        self.attempt = Some(QuestionAttempt::new(id, entity));

        let question = self.fetch_question(&request).await;

        let Some(attempt) = self.attempt.as_mut().filter(|a| a.id() == id) else {
            return Interaction::Ignored(IgnoreReason::AttemptOpen);
        };
        self.ledger.mark_attempted(&attempt.entity().id);
        let secs = self.rules.question_secs;
        attempt.activate(question.clone(), secs);
        self.countdown = Some(TimerTask::countdown(id, secs, self.timer_tx.clone()));
        tracing::debug!(attempt = %id, difficulty = %self.difficulty, "attempt active");
        Interaction::Started {
            attempt: id,
            question,
        }
    }

    /// Answer the active question with option `index`. Ignored (returns
    /// `None`) unless an attempt is active.
    pub async fn answer(&mut self, index: usize) -> Option<AttemptResult> {
        let question = match &self.attempt {
            Some(a) if a.state() == AttemptState::Active => a.question()?.clone(),
            _ => {
                tracing::debug!(index, "answer ignored: no active question");
                return None;
            }
        };
        let outcome = if question.is_correct(index) {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        };
        let chosen = question.options.get(index).cloned().unwrap_or_default();
        Some(self.resolve(outcome, &question, &chosen).await)
    }

    /// Close the open attempt now, whatever its state. Returns the chapter
    /// summary if the chapter is complete and was not reported before.
    pub fn close(&mut self) -> Option<ChapterSummary> {
        self.attempt.as_ref()?;
        self.close_attempt()
    }

    /// Wait for the next timer event and apply it. Events for attempts that
    /// have moved on are skipped. Waits indefinitely while no timer runs.
    ///
    /// Not cancel safe: dropping the future while it applies a timeout can
    /// skip the room mirror for that attempt.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let event = self.timer_rx.recv().await?;
            if let Some(applied) = self.apply_timer(event).await {
                return Some(applied);
            }
        }
    }

    /// Ask the analyzer for weak topics based on the wrong-answer log. On
    /// failure the previous topics are kept.
    pub async fn refresh_weak_topics(&mut self) -> &[String] {
        if self.wrong_answers.is_empty() {
            return &self.weak_topics;
        }
        let chapter = self.ledger.chapter();
        match self
            .analyzer
            .analyze(&chapter.subject, &chapter.grade, &self.wrong_answers)
            .await
        {
            Ok(topics) => {
                tracing::debug!(?topics, "weak topics refreshed");
                self.weak_topics = topics;
            }
            Err(e) => tracing::warn!(error = %e, "weak topic analysis failed"),
        }
        &self.weak_topics
    }

    /// Move on to `next`: fresh stats and entity sets, syllabus kept. An
    /// open attempt is closed first, so a chapter it completed is still
    /// saved.
    pub async fn advance_chapter(&mut self, next: ChapterContext) {
        self.close_attempt();
        self.pending_summary = None;
        self.summary_delivered = false;
        self.ledger.reset_for_next_chapter();
        self.ledger.set_chapter(next);
        self.restart_evaluator();
        tracing::info!(chapter = %self.ledger.chapter().display_title(), "advanced chapter");
        self.mirror_stats().await;
    }

    /// Wait for outstanding result uploads.
    pub async fn flush(&mut self) {
        for handle in self.persistence.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "result upload task failed");
            }
        }
    }

    /// End the session: close the open attempt, leave the room, wait for
    /// result uploads, and reset all progress. Returns the session totals.
    pub async fn exit(&mut self) -> SessionSummary {
        self.close_attempt();
        if let Some(room) = self.room.take() {
            if let Err(e) = room.leave().await {
                tracing::warn!(room = room.code(), error = %e, "failed to leave room");
            }
        }
        self.flush().await;

        let t = self.totals;
        let accuracy = if t.answered == 0 {
            0
        } else {
            (f64::from(t.correct) / f64::from(t.answered) * 100.0).round() as u32
        };
        let summary = SessionSummary {
            questions_answered: t.answered,
            correct_answers: t.correct,
            xp_earned: t.xp,
            accuracy,
            chapters_completed: t.chapters,
            difficulty_progression: std::mem::take(&mut self.difficulty_history),
        };

        self.ledger.reset_stats();
        self.pending_summary = None;
        self.summary_delivered = false;
        self.wrong_answers.clear();
        self.weak_topics.clear();
        self.totals = Totals::default();
        self.difficulty = Difficulty::default();
        self.difficulty_history = vec![self.difficulty];
        self.restart_evaluator();
        summary
    }

    fn question_request(&self, entity: &Entity) -> QuestionRequest {
        let chapter = self.ledger.chapter();
        QuestionRequest {
            subject: chapter.subject.clone(),
            grade: chapter.grade.clone(),
            difficulty: self.difficulty,
            interaction_type: entity.kind.to_string(),
            entity_id: entity.id.to_string(),
            entity_name: entity.name.clone(),
            weak_topics: self.weak_topics.clone(),
            syllabus_id: chapter.syllabus_id.clone(),
            chapter_id: chapter.chapter_id,
            chapter_content: (!chapter.chapter_content.is_empty())
                .then(|| chapter.chapter_content.clone()),
            attempted_entities: self.ledger.attempted().iter().map(|id| id.to_string()).collect(),
            user_id: self.user_id.clone(),
        }
    }

    async fn fetch_question(&self, request: &QuestionRequest) -> Question {
        let limit = self.rules.provider_timeout();
        let result = match tokio::time::timeout(limit, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.rules.provider_timeout_ms)),
        };
        let checked = result.and_then(|q| {
            q.validate()?;
            Ok(q)
        });
        match checked {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(entity = %request.entity_id, error = %e, "using fallback question");
                Question::fallback()
            }
        }
    }

    async fn resolve(&mut self, outcome: AnswerOutcome, question: &Question, chosen: &str) -> AttemptResult {
        self.countdown = None;
        let rules = &self.rules;
        let mut xp_gained = 0;
        match outcome {
            AnswerOutcome::Correct => {
                xp_gained = rules.xp_reward(self.difficulty);
                self.ledger.add_xp(i64::from(xp_gained));
                self.ledger.record_answer(true);
                self.ledger.add_score(rules.score_per_correct);
                self.ledger.heal(rules.heal_amount);
                if let Some(a) = &self.attempt {
                    let id = a.entity().id.clone();
                    self.ledger.mark_completed(&id);
                }
            }
            AnswerOutcome::Incorrect | AnswerOutcome::TimedOut => {
                let damage = if outcome == AnswerOutcome::TimedOut {
                    rules.damage_timeout
                } else {
                    rules.damage_wrong
                };
                self.ledger.record_answer(false);
                self.wrong_answers.push(question.question.clone());
                self.ledger.take_damage(damage);
            }
        }

        let stats = self.ledger.stats();
        self.difficulty = after_outcome(
            outcome,
            stats.correct_answers(),
            stats.total_questions(),
            self.difficulty,
        );
        self.difficulty_history.push(self.difficulty);

        self.totals.answered += 1;
        self.totals.xp += xp_gained;
        if outcome.is_correct() {
            self.totals.correct += 1;
        }

        let feedback = match outcome {
            AnswerOutcome::Correct => format!("Correct! +{xp_gained} XP"),
            AnswerOutcome::Incorrect => {
                format!("Wrong! The answer was {}", question.correct_option())
            }
            AnswerOutcome::TimedOut => "Time's up!".to_string(),
        };
        let result = AttemptResult {
            outcome,
            feedback,
            correct_option: question.correct_option().to_string(),
            explanation: question.explanation.clone(),
            xp_gained,
            hp: stats.hp(),
            difficulty: self.difficulty,
        };

        let state = if outcome == AnswerOutcome::TimedOut {
            AttemptState::TimedOut
        } else {
            AttemptState::Answered
        };
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.resolve(state, result.clone());
            self.display = Some(TimerTask::display(
                attempt.id(),
                self.rules.result_display(),
                self.timer_tx.clone(),
            ));
            tracing::debug!(attempt = %attempt.id(), ?outcome, "attempt resolved");
        }

        self.check_chapter();
        self.mirror_stats().await;
        self.mirror_broadcast_answer(question, chosen, outcome.is_correct())
            .await;
        result
    }

    async fn apply_timer(&mut self, event: TimerEvent) -> Option<SessionEvent> {
        let Some(attempt) = self.attempt.as_mut().filter(|a| a.id() == event.attempt()) else {
            tracing::debug!(?event, "stale timer event");
            return None;
        };
        match event {
            TimerEvent::Tick { remaining, .. } if attempt.state() == AttemptState::Active => {
                attempt.tick(remaining);
                Some(SessionEvent::Tick { remaining })
            }
            TimerEvent::Expired { .. } if attempt.state() == AttemptState::Active => {
                let question = attempt.question()?.clone();
                let result = self.resolve(AnswerOutcome::TimedOut, &question, "").await;
                Some(SessionEvent::TimedOut(result))
            }
            TimerEvent::DisplayDone { .. } if attempt.state().is_resolved() => {
                let chapter = self.close_attempt().map(Box::new);
                Some(SessionEvent::AttemptClosed { chapter })
            }
            _ => {
                tracing::debug!(?event, "timer event does not apply");
                None
            }
        }
    }

    fn close_attempt(&mut self) -> Option<ChapterSummary> {
        self.stop_timers();
        if let Some(attempt) = self.attempt.take() {
            tracing::debug!(attempt = %attempt.id(), state = ?attempt.state(), "attempt closed");
        }
        self.check_chapter();
        if self.summary_delivered {
            return None;
        }
        let summary = self.pending_summary.clone()?;
        self.summary_delivered = true;
        Some(summary)
    }

    fn stop_timers(&mut self) {
        self.countdown = None;
        self.display = None;
    }

    fn restart_evaluator(&mut self) {
        let prefix = self.ledger.chapter().prefix();
        self.evaluator = ChapterEvaluator::new(
            self.user_id.clone(),
            self.roster.required_ids(&prefix),
            Utc::now(),
        );
    }

    fn check_chapter(&mut self) {
        let Some(completion) = self.evaluator.check(&self.ledger, Utc::now()) else {
            return;
        };
        self.totals.chapters += 1;
        let sink = Arc::clone(&self.sink);
        let record = completion.clone();
        self.persistence.push(tokio::spawn(async move {
            if let Err(e) = sink.save_completion(&record).await {
                tracing::warn!(chapter = %record.chapter_title, error = %e, "failed to save chapter completion");
            }
        }));
        self.pending_summary = Some(ChapterSummary::new(
            completion,
            self.ledger.chapter(),
            self.ledger.syllabus(),
        ));
    }

    async fn mirror_stats(&self) {
        let Some(room) = self.room.as_ref().filter(|r| !r.has_left()) else {
            return;
        };
        if let Err(e) = room.sync_stats(self.ledger.stats().snapshot()).await {
            tracing::warn!(room = room.code(), error = %e, "failed to mirror stats");
        }
    }

    async fn mirror_broadcast_answer(&self, question: &Question, chosen: &str, correct: bool) {
        let Some(room) = self.room.as_ref().filter(|r| !r.has_left()) else {
            return;
        };
        let broadcast = match room.room().await {
            Ok(Some(r)) => r.current_question.as_ref() == Some(question),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(room = room.code(), error = %e, "failed to read room");
                false
            }
        };
        if !broadcast {
            return;
        }
        if let Err(e) = room.record_answer(chosen, correct).await {
            tracing::warn!(room = room.code(), error = %e, "failed to record answer");
        }
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("user_id", &self.user_id)
            .field("ledger", &self.ledger)
            .field("difficulty", &self.difficulty)
            .field("attempt", &self.attempt)
            .field("room", &self.room)
            .finish_non_exhaustive()
    }
}
