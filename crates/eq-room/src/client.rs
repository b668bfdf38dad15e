//! Room client.
//!
//! A [`RoomClient`] is one player's membership in one room. Joining
//! registers presence cleanup before anything else is written, so a
//! connection that dies mid-join never leaves a ghost record behind.
//! Host-only operations re-check the room's `host` field on every call and
//! are silently ignored for everybody else.

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use eq_core::{Question, StatsSnapshot};
use serde_json::{Value, json};

use crate::code;
use crate::error::{RoomError, RoomResult};
use crate::model::{AnswerRecord, Room, RoomPhase, RoomPlayer, StatsUpdate};
use crate::store::{RoomStore, StorePath, Subscription};

/// Stat changes applied by [`RoomClient::answer_question`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerScoring {
    /// Score added for a correct answer.
    pub score_per_correct: u32,
    /// Xp added for a correct answer.
    pub xp_per_correct: u32,
    /// Hp lost for a wrong answer.
    pub damage_wrong: u32,
    /// Xp needed per level, used to recompute the level.
    pub xp_per_level: u32,
}

impl Default for AnswerScoring {
    fn default() -> Self {
        Self {
            score_per_correct: 100,
            xp_per_correct: 15,
            damage_wrong: 20,
            xp_per_level: 100,
        }
    }
}

/// A typed live view of part of a room.
pub struct RoomWatch<T> {
    sub: Subscription,
    decode: fn(Option<Value>) -> T,
}

impl<T> RoomWatch<T> {
    /// Next decoded snapshot; the first call yields the current one.
    /// `None` once the store connection is gone.
    pub async fn next(&mut self) -> Option<T> {
        let value = self.sub.next().await?;
        Some((self.decode)(value))
    }
}

impl<T> std::fmt::Debug for RoomWatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomWatch").field("sub", &self.sub).finish()
    }
}

/// One player's membership in a room.
pub struct RoomClient {
    store: Arc<dyn RoomStore>,
    code: String,
    player_id: String,
    player_name: String,
    joined_as_host: bool,
    scoring: AnswerScoring,
    left: AtomicBool,
}

impl std::fmt::Debug for RoomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomClient")
            .field("code", &self.code)
            .field("player_id", &self.player_id)
            .field("joined_as_host", &self.joined_as_host)
            .field("left", &self.left.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl RoomClient {
    /// Join the room `code`, creating it with the caller as host if it
    /// does not exist yet. The caller's player record is seeded from
    /// `stats` and marked ready.
    ///
    /// When two players create the same room at once the last host write
    /// wins; the room is re-read after creation so the client reports the
    /// host that actually stuck.
    pub async fn create_or_join(
        store: Arc<dyn RoomStore>,
        room_code: &str,
        player_id: &str,
        player_name: &str,
        stats: StatsSnapshot,
    ) -> RoomResult<Self> {
        let room_code =
            code::normalize(room_code).ok_or_else(|| RoomError::InvalidCode(room_code.into()))?;
        let room_path = room_path(&room_code);
        let player_path = room_path.child("players").child(player_id);

        store.on_disconnect_remove(&player_path).await?;

        let existing = parse_room(store.read(&room_path).await?)?;
        if existing.is_none() {
            let room = Room::new(&room_code, player_id, Utc::now());
            store.merge(&room_path, serde_json::to_value(&room)?).await?;
            tracing::info!(room = %room_code, host = %player_id, "created room");
        }
        let room = parse_room(store.read(&room_path).await?)?
            .ok_or_else(|| RoomError::RoomNotFound(room_code.clone()))?;

        let player = RoomPlayer::new(player_id, player_name, stats, Utc::now());
        store
            .merge(&player_path, serde_json::to_value(&player)?)
            .await?;

        let joined_as_host = room.host == player_id;
        tracing::info!(
            room = %room_code,
            player = %player_id,
            host = joined_as_host,
            "joined room"
        );
        Ok(Self {
            store,
            code: room_code,
            player_id: player_id.to_string(),
            player_name: player_name.to_string(),
            joined_as_host,
            scoring: AnswerScoring::default(),
            left: AtomicBool::new(false),
        })
    }

    /// Override the scoring used by [`RoomClient::answer_question`].
    pub fn with_scoring(mut self, scoring: AnswerScoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// The room code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The caller's player id.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// The caller's display name.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Whether the caller was host when joining.
    pub fn joined_as_host(&self) -> bool {
        self.joined_as_host
    }

    /// Whether [`RoomClient::leave`] has been called.
    pub fn has_left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }

    /// Current room state. `None` if the room no longer exists; a record
    /// that does not decode is a [`RoomError::Codec`].
    pub async fn room(&self) -> RoomResult<Option<Room>> {
        parse_room(self.store.read(&self.room_path()).await?)
    }

    /// Current participants in the order they first joined.
    pub async fn players(&self) -> RoomResult<Vec<RoomPlayer>> {
        let value = self.store.read(&self.players_path()).await?;
        Ok(decode_players(value))
    }

    /// Participants by descending score. Ties keep join order.
    pub async fn leaderboard(&self) -> RoomResult<Vec<RoomPlayer>> {
        let mut players = self.players().await?;
        players.sort_by_key(|p| (Reverse(p.score), p.joined_at));
        Ok(players)
    }

    /// Merge-update the caller's own stats.
    pub async fn update_player_stats(&self, update: &StatsUpdate) -> RoomResult<()> {
        self.ensure_member()?;
        if update.is_empty() {
            return Ok(());
        }
        let mut value = serde_json::to_value(update)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("lastUpdated".into(), serde_json::to_value(Utc::now())?);
        }
        self.store.merge(&self.player_path(), value).await?;
        Ok(())
    }

    /// Mirror a full stats snapshot into the caller's record.
    pub async fn sync_stats(&self, stats: StatsSnapshot) -> RoomResult<()> {
        self.update_player_stats(&StatsUpdate::from(stats)).await
    }

    /// Move the room to the playing phase. Host only; returns false and
    /// writes nothing when the caller is not the host.
    pub async fn start_game(&self) -> RoomResult<bool> {
        if !self.is_host_now("start_game").await? {
            return Ok(false);
        }
        let started = serde_json::to_value(Utc::now())?;
        self.store
            .merge(
                &self.room_path(),
                json!({ "state": RoomPhase::Playing, "startedAt": started }),
            )
            .await?;
        tracing::info!(room = %self.code, "game started");
        Ok(true)
    }

    /// Broadcast a question to every participant, or clear it with `None`.
    /// Broadcasting increments the round. Host only.
    pub async fn set_question(&self, question: Option<&Question>) -> RoomResult<bool> {
        let Some(room) = self.host_room("set_question").await? else {
            return Ok(false);
        };
        let update = match question {
            Some(q) => json!({
                "currentQuestion": serde_json::to_value(q)?,
                "round": room.round + 1,
            }),
            None => json!({ "currentQuestion": Value::Null }),
        };
        self.store.merge(&self.room_path(), update).await?;
        Ok(true)
    }

    /// Hand the turn to `player_id`. Host only.
    pub async fn set_active_player_turn(&self, player_id: &str) -> RoomResult<bool> {
        if !self.is_host_now("set_active_player_turn").await? {
            return Ok(false);
        }
        self.store
            .merge(&self.room_path(), json!({ "activePlayer": player_id }))
            .await?;
        Ok(true)
    }

    /// Score the caller's answer to the current round: a correct answer adds
    /// score and xp, a wrong one costs hp. Either way the scored question
    /// count goes up and the answer is recorded once for the round.
    ///
    /// This is a read-modify-write of the caller's own record and is not
    /// atomic against a concurrent write by the same player.
    pub async fn answer_question(&self, answer: &str, is_correct: bool) -> RoomResult<RoomPlayer> {
        self.ensure_member()?;
        let path = self.player_path();
        let mut player: RoomPlayer = match self.store.read(&path).await? {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(RoomError::PlayerNotFound(self.player_id.clone())),
        };

        let s = self.scoring;
        player.total_questions += 1;
        if is_correct {
            player.score = player.score.saturating_add(s.score_per_correct);
            player.xp = player.xp.saturating_add(s.xp_per_correct);
            player.level = player.xp / s.xp_per_level.max(1) + 1;
            player.correct_answers += 1;
        } else {
            player.hp = player.hp.saturating_sub(s.damage_wrong);
        }
        player.last_updated = Some(Utc::now());

        let update = StatsUpdate::from(player.stats());
        let mut value = serde_json::to_value(update)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("lastUpdated".into(), serde_json::to_value(player.last_updated)?);
        }
        self.store.merge(&path, value).await?;
        self.record_answer(answer, is_correct).await?;
        Ok(player)
    }

    /// Record the caller's answer for the current round without touching
    /// stats. Returns false if an answer was already recorded this round.
    pub async fn record_answer(&self, answer: &str, is_correct: bool) -> RoomResult<bool> {
        self.ensure_member()?;
        let round = self.room().await?.map(|r| r.round).unwrap_or(0);
        let path = self
            .room_path()
            .child("answers")
            .child(round)
            .child(&self.player_id);
        if self.store.read(&path).await?.is_some() {
            tracing::debug!(room = %self.code, round, "answer already recorded");
            return Ok(false);
        }
        let record = AnswerRecord {
            player_id: self.player_id.clone(),
            answer: answer.to_string(),
            is_correct,
            round,
            answered_at: Utc::now(),
        };
        self.store
            .merge(&path, serde_json::to_value(&record)?)
            .await?;
        Ok(true)
    }

    /// All answers recorded for `round`, in submission order.
    pub async fn answers(&self, round: u32) -> RoomResult<Vec<AnswerRecord>> {
        let path = self.room_path().child("answers").child(round);
        let Some(Value::Object(entries)) = self.store.read(&path).await? else {
            return Ok(Vec::new());
        };
        Ok(entries
            .into_iter()
            .filter_map(|(_, v)| serde_json::from_value(v).ok())
            .collect())
    }

    /// Remove the caller's record and cancel its disconnect cleanup.
    /// Later writes through this client fail with [`RoomError::Left`].
    pub async fn leave(&self) -> RoomResult<()> {
        if self.left.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut removal = serde_json::Map::new();
        removal.insert(self.player_id.clone(), Value::Null);
        self.store
            .merge(&self.players_path(), Value::Object(removal))
            .await?;
        self.store.cancel_on_disconnect(&self.player_path()).await?;
        tracing::info!(room = %self.code, player = %self.player_id, "left room");
        Ok(())
    }

    /// Live view of the room state.
    pub async fn watch_room(&self) -> RoomResult<RoomWatch<Option<Room>>> {
        let sub = self.store.subscribe(&self.room_path()).await?;
        Ok(RoomWatch {
            sub,
            decode: decode_room,
        })
    }

    /// Live view of the participant list.
    pub async fn watch_players(&self) -> RoomResult<RoomWatch<Vec<RoomPlayer>>> {
        let sub = self.store.subscribe(&self.players_path()).await?;
        Ok(RoomWatch {
            sub,
            decode: decode_players,
        })
    }

    fn room_path(&self) -> StorePath {
        room_path(&self.code)
    }

    fn players_path(&self) -> StorePath {
        self.room_path().child("players")
    }

    fn player_path(&self) -> StorePath {
        self.players_path().child(&self.player_id)
    }

    fn ensure_member(&self) -> RoomResult<()> {
        if self.has_left() {
            Err(RoomError::Left(self.code.clone()))
        } else {
            Ok(())
        }
    }

    async fn host_room(&self, op: &str) -> RoomResult<Option<Room>> {
        self.ensure_member()?;
        let room = self
            .room()
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(self.code.clone()))?;
        if room.host == self.player_id {
            Ok(Some(room))
        } else {
            tracing::debug!(room = %self.code, player = %self.player_id, op, "ignoring host-only operation");
            Ok(None)
        }
    }

    async fn is_host_now(&self, op: &str) -> RoomResult<bool> {
        Ok(self.host_room(op).await?.is_some())
    }
}

fn room_path(code: &str) -> StorePath {
    StorePath::root().child("rooms").child(code)
}

fn parse_room(value: Option<Value>) -> RoomResult<Option<Room>> {
    Ok(value.map(serde_json::from_value).transpose()?)
}

fn decode_room(value: Option<Value>) -> Option<Room> {
    parse_room(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "malformed room record");
        None
    })
}

fn decode_players(value: Option<Value>) -> Vec<RoomPlayer> {
    let Some(Value::Object(entries)) = value else {
        return Vec::new();
    };
    let mut players: Vec<RoomPlayer> = entries
        .into_iter()
        .filter_map(|(id, v)| match serde_json::from_value(v) {
            Ok(player) => Some(player),
            Err(e) => {
                tracing::warn!(player = %id, error = %e, "skipping malformed player record");
                None
            }
        })
        .collect();
    // Child key order is up to the store.
    players.sort_by_key(|p| p.joined_at);
    players
}
