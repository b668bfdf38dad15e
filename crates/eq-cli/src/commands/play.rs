use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use eq_core::{AnswerOutcome, ChapterContext, GameRules, Question, Syllabus};
use eq_http::{ApiClient, HttpConfig, HttpQuestionProvider, HttpResultSink, HttpWeakTopicAnalyzer};
use eq_session::{
    AttemptResult, ChapterSummary, GameSession, Interaction, QuestionBank, SessionEvent,
    SessionSummary,
};
use tokio::sync::mpsc;

pub struct PlayOptions {
    pub subject: String,
    pub grade: String,
    /// Question service URL; `None` plays offline.
    pub server: Option<String>,
    pub syllabus: Option<PathBuf>,
    pub chapter: u32,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run(opts: PlayOptions) -> Result<(), String> {
    let rules = super::load_rules(opts.config.as_deref())?;
    let syllabus = opts.syllabus.as_deref().map(load_syllabus).transpose()?;
    let chapter = match &syllabus {
        Some(s) => {
            let ch = s
                .chapter(opts.chapter)
                .ok_or_else(|| format!("syllabus '{}' has no chapter {}", s.id, opts.chapter))?;
            ChapterContext::from_syllabus(s, ch, opts.subject.as_str(), opts.grade.as_str())
        }
        None => ChapterContext::free_play(opts.subject.as_str(), opts.grade.as_str()),
    };

    let mut session = build_session(rules, chapter, &opts)?;
    if let Some(s) = syllabus {
        session = session.with_syllabus(s);
    }

    super::runtime()?.block_on(game_loop(session))
}

fn load_syllabus(path: &Path) -> Result<Syllabus, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid syllabus in {}: {e}", path.display()))
}

fn build_session(
    rules: GameRules,
    chapter: ChapterContext,
    opts: &PlayOptions,
) -> Result<GameSession, String> {
    let user_id = uuid::Uuid::new_v4().to_string();
    let session = match &opts.server {
        Some(url) => {
            let config = HttpConfig::new(url.as_str()).with_timeout(rules.provider_timeout());
            let api = ApiClient::new(config).map_err(|e| format!("cannot reach {url}: {e}"))?;
            GameSession::new(
                rules,
                chapter,
                user_id,
                Arc::new(HttpQuestionProvider::new(api.clone())),
            )
            .with_result_sink(Arc::new(HttpResultSink::new(api.clone())))
            .with_analyzer(Arc::new(HttpWeakTopicAnalyzer::new(api)))
        }
        None => {
            let bank = opts.seed.map_or_else(QuestionBank::new, QuestionBank::with_seed);
            GameSession::new(rules, chapter, user_id, Arc::new(bank))
        }
    };
    Ok(session)
}

/// Forward stdin lines from a blocking reader thread.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn game_loop(mut session: GameSession) -> Result<(), String> {
    print_banner(&session);
    let mut lines = stdin_lines();
    prompt()?;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break }; // EOF
                if let Flow::Quit = handle_line(&mut session, line.trim()).await {
                    break;
                }
                prompt()?;
            }
            Some(event) = session.next_event() => show_event(&session, event),
        }
    }

    let summary = session.exit().await;
    print_session_summary(&summary);
    Ok(())
}

fn prompt() -> Result<(), String> {
    print!("> ");
    io::stdout().flush().map_err(|e| e.to_string())
}

async fn handle_line(session: &mut GameSession, input: &str) -> Flow {
    let mut words = input.split_whitespace();
    let Some(cmd) = words.next() else {
        return Flow::Continue;
    };

    match cmd.to_ascii_lowercase().as_str() {
        "quit" | "q" | "exit" => return Flow::Quit,
        "help" | "h" | "?" => print_help(),
        "look" | "l" => print_entities(session),
        "stats" | "s" => print_stats(session),
        "go" | "g" => match words.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) => interact(session, n).await,
            None => println!("{}\n", "usage: go <number>  (see 'look')".yellow()),
        },
        "topics" => {
            let topics = session.refresh_weak_topics().await;
            if topics.is_empty() {
                println!("  No weak topics identified yet.\n");
            } else {
                println!("  Weak topics: {}\n", topics.join(", "));
            }
        }
        "next" => advance(session).await,
        other => match answer_index(other) {
            Some(index) => match session.answer(index).await {
                Some(result) => print_result(session, &result),
                None => println!("{}\n", "No question is waiting for an answer.".yellow()),
            },
            None => println!("{}\n", format!("unknown command '{other}', try 'help'").yellow()),
        },
    }
    Flow::Continue
}

/// Option index for an answer letter `a` to `d`.
fn answer_index(input: &str) -> Option<usize> {
    let mut chars = input.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    "abcd".find(letter)
}

async fn interact(session: &mut GameSession, number: usize) {
    let entities = session.entities();
    let Some(entity) = number.checked_sub(1).and_then(|i| entities.get(i)).cloned() else {
        println!("{}\n", format!("there is no entity {number}").yellow());
        return;
    };

    // A shown result can be skipped by moving on.
    if session.attempt().is_some_and(|a| a.state().is_resolved()) {
        if let Some(summary) = session.close() {
            print_chapter_summary(&summary);
        }
    }

    let name = entity.name.clone();
    let action = entity.kind.action();
    match session.interact(entity).await {
        Interaction::Started { question, .. } => {
            print_question(&name, action, &question, session.rules().question_secs);
        }
        Interaction::Ignored(reason) => println!("{}\n", format!("{name}: {reason}").yellow()),
    }
}

async fn advance(session: &mut GameSession) {
    if session.attempt().is_some() {
        if let Some(summary) = session.close() {
            print_chapter_summary(&summary);
        }
    }
    let Some(next) = session
        .chapter_summary()
        .and_then(|s| s.next_chapter.clone())
    else {
        println!("{}\n", "No next chapter to continue to.".yellow());
        return;
    };
    session.advance_chapter(next).await;
    print_banner(session);
}

fn show_event(session: &GameSession, event: SessionEvent) {
    match event {
        SessionEvent::Tick { remaining } => {
            if remaining == 10 || remaining == 5 {
                println!("\n  {}", format!("{remaining}s left").dimmed());
            }
        }
        SessionEvent::TimedOut(result) => {
            println!();
            print_result(session, &result);
        }
        SessionEvent::AttemptClosed { chapter } => {
            if let Some(summary) = chapter {
                println!();
                print_chapter_summary(&summary);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_banner(session: &GameSession) {
    let chapter = session.ledger().chapter();
    println!(
        "  {} {} {}",
        "EduQuest".bold(),
        session.roster().world_name,
        format!("({}, grade {})", chapter.subject, chapter.grade).dimmed()
    );
    println!("  {}", chapter.display_title());
    println!("  Type 'look' to see who is around, 'help' for commands.\n");
}

fn print_help() {
    println!("  look        list the entities of this chapter");
    println!("  go <n>      interact with entity n");
    println!("  a b c d     answer the open question");
    println!("  stats       show hp, xp, level and score");
    println!("  topics      ask which topics need practice");
    println!("  next        continue to the next chapter");
    println!("  quit        end the session\n");
}

fn print_entities(session: &GameSession) {
    let ledger = session.ledger();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Name", "Kind", "Status"]);
    for (i, entity) in session.entities().iter().enumerate() {
        let status = if ledger.is_completed(&entity.id) {
            "defeated"
        } else if ledger.is_attempted(&entity.id) {
            "attempted"
        } else {
            "—"
        };
        table.add_row(vec![
            (i + 1).to_string(),
            entity.name.clone(),
            entity.kind.action().to_string(),
            status.to_string(),
        ]);
    }
    println!("{table}");
    let eval = session.evaluator();
    println!(
        "  {}/{} attempted\n",
        eval.progress(ledger),
        eval.required().len()
    );
}

fn print_stats(session: &GameSession) {
    let stats = session.ledger().stats();
    println!(
        "  HP {}/{}  XP {}  Level {}  Score {}",
        stats.hp(),
        stats.max_hp(),
        stats.xp(),
        stats.level(),
        stats.score()
    );
    println!(
        "  Correct {}/{}  Difficulty {}\n",
        stats.correct_answers(),
        stats.total_questions(),
        session.difficulty()
    );
}

fn print_question(name: &str, action: &str, question: &Question, secs: u32) {
    println!("  {} {}", format!("{action}:").bold(), name);
    println!("  {}", question.question);
    for (letter, option) in ('a'..='d').zip(&question.options) {
        println!("    {letter}) {option}");
    }
    println!("  {}\n", format!("{secs}s to answer").dimmed());
}

fn print_result(session: &GameSession, result: &AttemptResult) {
    let feedback = match result.outcome {
        AnswerOutcome::Correct => result.feedback.green().bold(),
        AnswerOutcome::Incorrect | AnswerOutcome::TimedOut => result.feedback.red().bold(),
    };
    println!("  {feedback}");
    if !result.explanation.is_empty() {
        println!("  {}", result.explanation.dimmed());
    }
    println!("  HP {}  Next difficulty: {}\n", result.hp, result.difficulty);
    if session.is_game_over() {
        println!("  {}\n", "Game over! You have no HP left.".red().bold());
    }
}

fn print_chapter_summary(summary: &ChapterSummary) {
    for line in summary.render().lines() {
        println!("  {line}");
    }
    if summary.has_more_chapters() {
        println!("  {}", "Type 'next' to continue.".dimmed());
    }
    println!();
}

fn print_session_summary(summary: &SessionSummary) {
    println!("\n  {}", "Session Summary".bold().underline());
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Questions", "Correct", "Accuracy", "XP earned", "Chapters"]);
    table.add_row(vec![
        summary.questions_answered.to_string(),
        summary.correct_answers.to_string(),
        format!("{}%", summary.accuracy),
        summary.xp_earned.to_string(),
        summary.chapters_completed.to_string(),
    ]);
    println!("{table}");
    let path: Vec<String> = summary
        .difficulty_progression
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("  Difficulty: {}", path.join(" → "));
}
