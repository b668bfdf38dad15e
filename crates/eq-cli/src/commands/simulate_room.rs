use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use eq_core::{Difficulty, GameRules, QuestionRequest, StatsSnapshot};
use eq_room::{AnswerScoring, MemoryConnection, MemoryStore, RoomClient, RoomPlayer, code};
use eq_session::QuestionBank;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_PLAYERS: usize = 8;

/// A scripted participant.
struct Bot {
    conn: Arc<MemoryConnection>,
    client: RoomClient,
    /// Chance of answering correctly.
    skill: f64,
}

pub fn run(
    players: usize,
    rounds: u32,
    seed: u64,
    subject: &str,
    config: Option<&Path>,
) -> Result<(), String> {
    if players == 0 || players > MAX_PLAYERS {
        return Err(format!("players must be between 1 and {MAX_PLAYERS}"));
    }
    let rules = config.map(|p| super::load_rules(Some(p))).transpose()?;
    super::runtime()?.block_on(simulate(players, rounds, seed, subject, rules))
}

/// Room scoring derived from game rules, at medium difficulty.
fn scoring_from(rules: &GameRules) -> AnswerScoring {
    AnswerScoring {
        score_per_correct: rules.score_per_correct,
        xp_per_correct: rules.xp_reward(Difficulty::Medium),
        damage_wrong: rules.damage_wrong,
        xp_per_level: rules.xp_per_level,
    }
}

async fn simulate(
    players: usize,
    rounds: u32,
    seed: u64,
    subject: &str,
    rules: Option<GameRules>,
) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let bank = QuestionBank::with_seed(seed);
    let store = MemoryStore::new();
    let room_code = code::generate(&mut rng);
    let scoring = rules.as_ref().map(scoring_from).unwrap_or_default();
    let fresh = StatsSnapshot {
        hp: rules.as_ref().map_or(100, |r| r.max_hp),
        level: 1,
        ..StatsSnapshot::default()
    };

    let mut bots = Vec::with_capacity(players);
    for n in 1..=players {
        let conn = Arc::new(store.connect());
        let id = format!("player-{n}");
        let name = format!("Player {n}");
        let client = RoomClient::create_or_join(conn.clone(), &room_code, &id, &name, fresh)
            .await
            .map_err(|e| format!("{id} could not join: {e}"))?
            .with_scoring(scoring);
        bots.push(Bot {
            conn,
            client,
            skill: rng.random_range(0.35..0.95),
        });
    }
    let host = &bots[0].client;

    println!(
        "  {} room {} {}",
        "Simulation".bold(),
        room_code,
        format!("({players} players, {rounds} rounds, seed={seed})").dimmed()
    );
    println!("  Host: {}\n", host.player_name());

    let mut watch = host.watch_players().await.map_err(|e| e.to_string())?;
    let watcher = tokio::spawn(async move {
        let mut updates = 0usize;
        while watch.next().await.is_some() {
            updates += 1;
        }
        updates
    });

    host.start_game().await.map_err(|e| e.to_string())?;
    for round in 1..=rounds {
        let request = QuestionRequest {
            subject: subject.to_string(),
            grade: "5".into(),
            difficulty: Difficulty::Medium,
            interaction_type: "enemy".into(),
            entity_id: format!("sim-enemy-{round}"),
            entity_name: "Room Boss".into(),
            weak_topics: vec![],
            syllabus_id: None,
            chapter_id: None,
            chapter_content: None,
            attempted_entities: vec![],
            user_id: host.player_id().to_string(),
        };
        let question = bank.pick(&request);
        host.set_question(Some(&question))
            .await
            .map_err(|e| e.to_string())?;
        println!("  {} {}", format!("Round {round}:").bold(), question.question);

        for bot in &bots {
            host.set_active_player_turn(bot.client.player_id())
                .await
                .map_err(|e| e.to_string())?;
            let correct = rng.random_bool(bot.skill);
            let choice = if correct {
                question.correct_index
            } else {
                (question.correct_index + rng.random_range(1..question.options.len()))
                    % question.options.len()
            };
            let answer = question.options.get(choice).map(String::as_str).unwrap_or_default();
            let player = bot
                .client
                .answer_question(answer, correct)
                .await
                .map_err(|e| e.to_string())?;
            let mark = if correct { "✓".green() } else { "✗".red() };
            println!("    {mark} {:<10} {answer}", player.name);
        }
    }
    host.set_question(None).await.map_err(|e| e.to_string())?;
    println!();

    let board = host.leaderboard().await.map_err(|e| e.to_string())?;
    print_leaderboard(&board);

    // The last player drops off without leaving; presence cleanup removes them.
    if bots.len() > 1 {
        let last = bots.pop().ok_or("no players")?;
        let name = last.client.player_name().to_string();
        last.conn.disconnect();
        let remaining = bots[0].client.players().await.map_err(|e| e.to_string())?;
        println!(
            "  {} disconnected, {} player{} left in the room",
            name,
            remaining.len(),
            if remaining.len() == 1 { "" } else { "s" }
        );
    }
    for bot in &bots {
        bot.client.leave().await.map_err(|e| e.to_string())?;
    }
    drop(bots);

    let updates = watcher.await.map_err(|e| e.to_string())?;
    println!("  {updates} player list updates observed by the host");
    Ok(())
}

fn print_leaderboard(board: &[RoomPlayer]) {
    println!("  {}", "Leaderboard".bold().underline());
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Rank", "Player", "Score", "Correct", "XP", "Level", "HP"]);
    for (rank, p) in board.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            p.name.clone(),
            p.score.to_string(),
            format!("{}/{}", p.correct_answers, p.total_questions),
            p.xp.to_string(),
            p.level.to_string(),
            p.hp.to_string(),
        ]);
    }
    println!("{table}");
}
