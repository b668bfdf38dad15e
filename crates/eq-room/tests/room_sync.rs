//! Integration tests for room synchronisation.

use std::sync::Arc;

use async_trait::async_trait;
use eq_core::{Question, StatsSnapshot};
use eq_room::{
    MemoryConnection, MemoryStore, RoomClient, RoomError, RoomPhase, RoomStore, StatsUpdate,
    StoreError, StorePath, StoreResult, Subscription,
};
use serde_json::{Value, json};

fn fresh_stats() -> StatsSnapshot {
    StatsSnapshot {
        hp: 100,
        level: 1,
        ..StatsSnapshot::default()
    }
}

/// Open a connection and join `code` as `id`.
async fn join(store: &MemoryStore, code: &str, id: &str) -> (Arc<MemoryConnection>, RoomClient) {
    let conn = Arc::new(store.connect());
    let client = RoomClient::create_or_join(conn.clone(), code, id, id, fresh_stats())
        .await
        .unwrap();
    (conn, client)
}

/// A connection that hands back object keys in lexical order, the way
/// hosted realtime databases do.
struct SortedKeys(MemoryConnection);

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        other => other,
    }
}

#[async_trait]
impl RoomStore for SortedKeys {
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        Ok(self.0.read(path).await?.map(sort_keys))
    }

    async fn merge(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        self.0.merge(path, value).await
    }

    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        self.0.subscribe(path).await
    }

    async fn on_disconnect_remove(&self, path: &StorePath) -> StoreResult<()> {
        self.0.on_disconnect_remove(path).await
    }

    async fn cancel_on_disconnect(&self, path: &StorePath) -> StoreResult<()> {
        self.0.cancel_on_disconnect(path).await
    }
}

// -- Lifecycle ----------------------------------------------------------------

#[tokio::test]
async fn first_joiner_becomes_host() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM01", "alice").await;
    let (_b, bob) = join(&store, "ROOM01", "bob").await;

    assert!(alice.joined_as_host());
    assert!(!bob.joined_as_host());

    let room = bob.room().await.unwrap().unwrap();
    assert_eq!(room.host, "alice");
    assert_eq!(room.state, RoomPhase::Waiting);

    let players = alice.players().await.unwrap();
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["alice", "bob"]);
    assert!(players.iter().all(|p| p.is_ready && p.hp == 100));
}

#[tokio::test]
async fn codes_are_normalized_and_validated() {
    let store = MemoryStore::new();
    let conn = Arc::new(store.connect());
    let client = RoomClient::create_or_join(conn.clone(), " ab12cd ", "u1", "Ana", fresh_stats())
        .await
        .unwrap();
    assert_eq!(client.code(), "AB12CD");

    let err = RoomClient::create_or_join(conn, "bad/code", "u1", "Ana", fresh_stats())
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::InvalidCode(_)));
}

#[tokio::test]
async fn disconnect_removes_player_record() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM02", "alice").await;
    let (bob_conn, _bob) = join(&store, "ROOM02", "bob").await;
    assert_eq!(alice.players().await.unwrap().len(), 2);

    bob_conn.disconnect();

    let players = alice.players().await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].id, "alice");
    assert!(alice.room().await.unwrap().is_some());
}

#[tokio::test]
async fn leave_removes_record_and_blocks_writes() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM03", "alice").await;
    let (bob_conn, bob) = join(&store, "ROOM03", "bob").await;

    bob.leave().await.unwrap();
    bob.leave().await.unwrap();
    assert!(bob.has_left());
    assert_eq!(alice.players().await.unwrap().len(), 1);

    let err = bob.sync_stats(fresh_stats()).await.unwrap_err();
    assert!(matches!(err, RoomError::Left(_)));

    bob_conn.disconnect();
    assert_eq!(alice.players().await.unwrap().len(), 1);
}

// -- Host-owned fields --------------------------------------------------------

#[tokio::test]
async fn host_only_operations_ignore_other_players() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM04", "alice").await;
    let (_b, bob) = join(&store, "ROOM04", "bob").await;

    assert!(!bob.start_game().await.unwrap());
    assert!(!bob.set_question(Some(&Question::fallback())).await.unwrap());
    assert!(!bob.set_active_player_turn("bob").await.unwrap());
    let room = alice.room().await.unwrap().unwrap();
    assert_eq!(room.state, RoomPhase::Waiting);
    assert_eq!(room.round, 0);
    assert!(room.active_player.is_none());

    assert!(alice.start_game().await.unwrap());
    assert!(alice.set_active_player_turn("bob").await.unwrap());
    let room = bob.room().await.unwrap().unwrap();
    assert_eq!(room.state, RoomPhase::Playing);
    assert!(room.started_at.is_some());
    assert_eq!(room.active_player.as_deref(), Some("bob"));
}

#[tokio::test]
async fn broadcasting_questions_advances_rounds() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM05", "alice").await;
    let (_b, bob) = join(&store, "ROOM05", "bob").await;

    alice.set_question(Some(&Question::fallback())).await.unwrap();
    let room = bob.room().await.unwrap().unwrap();
    assert_eq!(room.round, 1);
    assert_eq!(room.current_question, Some(Question::fallback()));

    alice.set_question(None).await.unwrap();
    let room = bob.room().await.unwrap().unwrap();
    assert_eq!(room.round, 1);
    assert!(room.current_question.is_none());
}

// -- Answers and scoring ------------------------------------------------------

#[tokio::test]
async fn answers_are_scored_and_recorded_once_per_round() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM06", "alice").await;
    let (_b, bob) = join(&store, "ROOM06", "bob").await;
    alice.set_question(Some(&Question::fallback())).await.unwrap();

    let me = bob.answer_question("8", true).await.unwrap();
    assert_eq!(me.score, 100);
    assert_eq!(me.xp, 15);
    assert_eq!(me.correct_answers, 1);
    assert_eq!(me.total_questions, 1);

    assert!(!bob.record_answer("7", false).await.unwrap());
    let answers = alice.answers(1).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer, "8");
    assert!(answers[0].is_correct);

    alice.set_question(Some(&Question::fallback())).await.unwrap();
    let me = bob.answer_question("6", false).await.unwrap();
    assert_eq!(me.hp, 80);
    assert_eq!(me.total_questions, 2);
    assert_eq!(alice.answers(2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn leaderboard_sorts_by_score_keeping_join_order_for_ties() {
    let store = MemoryStore::new();
    let (_a, a) = join(&store, "ROOM07", "A").await;
    let (_b, b) = join(&store, "ROOM07", "B").await;
    let (_c, c) = join(&store, "ROOM07", "C").await;

    for (client, score) in [(&a, 100), (&b, 300), (&c, 300)] {
        client
            .update_player_stats(&StatsUpdate {
                score: Some(score),
                ..StatsUpdate::default()
            })
            .await
            .unwrap();
    }

    let board = a.leaderboard().await.unwrap();
    let ids: Vec<&str> = board.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["B", "C", "A"]);
    assert!(board[0].last_updated.is_some());
}

#[tokio::test]
async fn join_order_survives_lexically_sorted_keys() {
    let store = MemoryStore::new();
    let mut clients = Vec::new();
    for id in ["Z", "M", "A"] {
        let conn: Arc<dyn RoomStore> = Arc::new(SortedKeys(store.connect()));
        let client = RoomClient::create_or_join(conn, "ROOM10", id, id, fresh_stats())
            .await
            .unwrap();
        clients.push(client);
    }
    clients[2]
        .update_player_stats(&StatsUpdate {
            score: Some(100),
            ..StatsUpdate::default()
        })
        .await
        .unwrap();

    let host = &clients[0];
    let players = host.players().await.unwrap();
    let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["Z", "M", "A"]);

    let board = host.leaderboard().await.unwrap();
    let ids: Vec<&str> = board.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["A", "Z", "M"]);
}

#[tokio::test]
async fn malformed_room_is_not_overwritten() {
    let store = MemoryStore::new();
    let conn = Arc::new(store.connect());
    let path = StorePath::parse("rooms/ROOM11");
    conn.merge(&path, json!({ "host": 5, "round": "two" }))
        .await
        .unwrap();

    let err = RoomClient::create_or_join(conn.clone(), "ROOM11", "mallory", "M", fresh_stats())
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Codec(_)), "{err}");

    let stored = conn.read(&path).await.unwrap().unwrap();
    assert_eq!(stored, json!({ "host": 5, "round": "two" }));
}

#[tokio::test]
async fn partial_update_leaves_other_fields() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM08", "alice").await;
    alice
        .update_player_stats(&StatsUpdate {
            hp: Some(55),
            ..StatsUpdate::default()
        })
        .await
        .unwrap();
    let me = &alice.players().await.unwrap()[0];
    assert_eq!(me.hp, 55);
    assert_eq!(me.name, "alice");
    assert_eq!(me.level, 1);
}

#[tokio::test]
async fn rejected_writes_surface_as_store_errors() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM09", "alice").await;
    store.set_rejecting(true);
    let err = alice.sync_stats(fresh_stats()).await.unwrap_err();
    assert!(matches!(err, RoomError::Store(StoreError::Rejected(_))));
}

// -- Subscriptions ------------------------------------------------------------

#[tokio::test]
async fn watchers_see_joins_and_release_on_drop() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM10", "alice").await;

    let mut watch = alice.watch_players().await.unwrap();
    assert_eq!(watch.next().await.unwrap().len(), 1);

    let (_b, _bob) = join(&store, "ROOM10", "bob").await;
    let players = watch.next().await.unwrap();
    assert_eq!(players.len(), 2);

    assert_eq!(store.listener_count(), 1);
    drop(watch);
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn room_watch_follows_host_broadcasts() {
    let store = MemoryStore::new();
    let (_a, alice) = join(&store, "ROOM11", "alice").await;
    let (_b, bob) = join(&store, "ROOM11", "bob").await;

    let mut watch = bob.watch_room().await.unwrap();
    let first = watch.next().await.unwrap().unwrap();
    assert_eq!(first.round, 0);

    alice.start_game().await.unwrap();
    let room = watch.next().await.unwrap().unwrap();
    assert_eq!(room.state, RoomPhase::Playing);
}
