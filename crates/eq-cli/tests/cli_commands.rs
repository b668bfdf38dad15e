//! Integration tests for the eq-cli binary commands.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn eq() -> Command {
    let mut cmd = Command::cargo_bin("eq").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Offline play with a fixed question bank seed.
fn play() -> Command {
    let mut cmd = eq();
    cmd.args(["play", "--offline", "--seed", "7"]);
    cmd
}

/// Write a rules file into a temp directory.
fn rules_file(json: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, json).unwrap();
    (dir, path)
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_commands() {
    eq().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("simulate-room"))
        .stdout(predicate::str::contains("config"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_prints_defaults() {
    eq().arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults"))
        .stdout(predicate::str::contains("\"max_hp\": 100"))
        .stdout(predicate::str::contains("\"question_secs\": 30"))
        .stdout(predicate::str::contains("http://localhost:5000"));
}

#[test]
fn config_reads_rules_file() {
    let (_dir, path) = rules_file(r#"{ "max_hp": 50, "question_secs": 20 }"#);
    eq().args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_hp\": 50"))
        .stdout(predicate::str::contains("\"question_secs\": 20"))
        .stdout(predicate::str::contains("\"damage_timeout\": 15"));
}

#[test]
fn config_rejects_invalid_json() {
    let (_dir, path) = rules_file("{ max_hp: }");
    eq().args(["config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid rules"));
}

#[test]
fn config_reports_missing_file() {
    eq().args(["config", "--config", "/nonexistent/rules.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_shows_world_and_summary() {
    play()
        .write_stdin("look\nstats\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Crystal Peaks"))
        .stdout(predicate::str::contains("Subtraction Slime"))
        .stdout(predicate::str::contains("0/7 attempted"))
        .stdout(predicate::str::contains("HP 100/100"))
        .stdout(predicate::str::contains("Session Summary"));
}

#[test]
fn play_uses_subject_world() {
    play()
        .args(["--subject", "Science"])
        .write_stdin("look\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Neon Lab Zone"))
        .stdout(predicate::str::contains("Battery Bot"));
}

#[test]
fn play_asks_and_scores_a_question() {
    play()
        .write_stdin("go 1\na\nlook\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fight Enemy: Subtraction Slime"))
        .stdout(predicate::str::contains("a) "))
        .stdout(predicate::str::contains("Correct!").or(predicate::str::contains("Wrong!")))
        .stdout(predicate::str::contains("1/7 attempted"));
}

#[test]
fn play_refuses_repeat_interaction() {
    play()
        .write_stdin("go 2\nb\ngo 2\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Division Dragon: already attempted"));
}

#[test]
fn play_reports_bad_input() {
    play()
        .write_stdin("dance\ngo 9\ngo\nc\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown command 'dance'"))
        .stdout(predicate::str::contains("there is no entity 9"))
        .stdout(predicate::str::contains("usage: go <number>"))
        .stdout(predicate::str::contains("No question is waiting"));
}

#[test]
fn play_falls_back_when_service_is_down() {
    let (_dir, path) = rules_file(r#"{ "provider_timeout_ms": 500 }"#);
    eq().args(["play", "--server", "http://127.0.0.1:9", "--config"])
        .arg(&path)
        .write_stdin("go 1\nc\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("What is 5 + 3?"))
        .stdout(predicate::str::contains("Correct! +20 XP"));
}

#[test]
fn play_follows_a_syllabus() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("syllabus.json");
    fs::write(
        &path,
        r#"{
  "id": "syl-42",
  "title": "Grade 5 Math",
  "chapters": [
    { "id": 1, "title": "Place Value", "content": "Ones, tens, hundreds" },
    { "id": 2, "title": "Fractions" }
  ]
}"#,
    )
    .unwrap();

    play()
        .arg("--syllabus")
        .arg(&path)
        .args(["--chapter", "2"])
        .write_stdin("next\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions"))
        .stdout(predicate::str::contains("No next chapter"));

    play()
        .arg("--syllabus")
        .arg(&path)
        .args(["--chapter", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no chapter 5"));
}

// ---------------------------------------------------------------------------
// simulate-room
// ---------------------------------------------------------------------------

#[test]
fn simulate_room_prints_leaderboard() {
    eq().args(["simulate-room", "--players", "3", "--rounds", "2", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Round 1:"))
        .stdout(predicate::str::contains("Round 2:"))
        .stdout(predicate::str::contains("Leaderboard"))
        .stdout(predicate::str::contains("Player 3"))
        .stdout(predicate::str::contains("Player 3 disconnected, 2 players left"));
}

#[test]
fn simulate_room_is_deterministic() {
    let run = || {
        eq().args(["simulate-room", "--players", "2", "--rounds", "3", "--seed", "11"])
            .output()
            .unwrap()
    };
    let a = String::from_utf8(run().stdout).unwrap();
    let b = String::from_utf8(run().stdout).unwrap();
    // Everything up to the leaderboard; the watcher's update count may vary.
    let board = |s: &str| s.split("disconnected").next().unwrap_or_default().to_string();
    assert!(board(&a).contains("Leaderboard"));
    assert_eq!(board(&a), board(&b));
}

#[test]
fn simulate_room_scores_with_rules_file() {
    let (_dir, path) =
        rules_file(r#"{ "max_hp": 40, "damage_wrong": 40, "score_per_correct": 7 }"#);
    let out = eq()
        .args(["simulate-room", "--players", "1", "--rounds", "4", "--seed", "3", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();

    let row = stdout
        .lines()
        .find(|l| l.trim_start().starts_with(['|', '│']) && l.contains("Player 1"))
        .unwrap();
    let cells: Vec<&str> = row
        .split(['|', '│'])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    // Rank, Player, Score, Correct, XP, Level, HP
    let score: u32 = cells[2].parse().unwrap();
    let (correct, total) = cells[3].split_once('/').unwrap();
    let correct: u32 = correct.parse().unwrap();
    let total: u32 = total.parse().unwrap();
    let hp: u32 = cells[6].parse().unwrap();

    assert_eq!(total, 4);
    assert_eq!(score, 7 * correct);
    assert_eq!(hp, if correct == total { 40 } else { 0 });
}

#[test]
fn simulate_room_validates_player_count() {
    eq().args(["simulate-room", "--players", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("players must be between 1 and 8"));
}
