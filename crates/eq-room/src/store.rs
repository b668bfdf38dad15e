//! The replicated store abstraction.
//!
//! Everything the room layer needs from a backend is expressed through
//! [`RoomStore`]. Values are JSON trees addressed by slash-separated paths.
//! Concurrent writers to different fields interleave freely; there is no
//! transactional guarantee across paths.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::StoreResult;

/// A slash-separated location in the store, e.g. `rooms/AB12CD/players/u1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorePath(Vec<String>);

impl StorePath {
    /// The root of the store.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a path, ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &StorePath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Whether a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Live view of the value at a path.
///
/// The first call to [`Subscription::next`] yields the current snapshot;
/// later calls wait for the next change. Dropping the subscription
/// unsubscribes.
pub struct Subscription {
    rx: watch::Receiver<Option<Value>>,
    primed: bool,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a watch receiver. `on_drop` runs once when the subscription is
    /// dropped and is where a backend releases its listener.
    pub fn new(
        rx: watch::Receiver<Option<Value>>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            primed: false,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// Next snapshot. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Make the next call to [`Subscription::next`] yield the current
    /// snapshot again.
    pub fn restart(&mut self) {
        self.primed = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.on_drop.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("primed", &self.primed)
            .finish_non_exhaustive()
    }
}

/// A replicated hierarchical store with presence support.
///
/// One value of this trait represents one client connection: disconnect
/// cleanups registered through it run when that connection ends.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Read the value at `path`. `None` if nothing is stored there.
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>>;

    /// Merge-write at `path`. An object value sets each of its keys as a
    /// child of `path`, leaving other children alone; any other value
    /// replaces the node. `null` removes.
    async fn merge(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Subscribe to the value at `path`.
    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription>;

    /// Remove `path` when this connection ends.
    async fn on_disconnect_remove(&self, path: &StorePath) -> StoreResult<()>;

    /// Cancel a cleanup registered with [`RoomStore::on_disconnect_remove`].
    async fn cancel_on_disconnect(&self, path: &StorePath) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_and_display() {
        let p = StorePath::parse("/rooms//AB12CD/players/");
        assert_eq!(p.segments().len(), 3);
        assert_eq!(p.to_string(), "rooms/AB12CD/players");
        assert_eq!(p.child("u1").to_string(), "rooms/AB12CD/players/u1");
        assert!(StorePath::parse("").is_root());
    }

    #[test]
    fn containment() {
        let room = StorePath::parse("rooms/X");
        let player = room.child("players").child("u1");
        assert!(room.contains(&player));
        assert!(!player.contains(&room));
        assert!(player.overlaps(&room));
        assert!(!StorePath::parse("rooms/Y").overlaps(&room));
        assert!(StorePath::root().contains(&room));
    }

    #[tokio::test]
    async fn subscription_yields_current_then_changes() {
        let (tx, rx) = watch::channel(Some(json!(1)));
        let mut sub = Subscription::new(rx, || {});
        assert_eq!(sub.next().await, Some(Some(json!(1))));
        tx.send_replace(Some(json!(2)));
        assert_eq!(sub.next().await, Some(Some(json!(2))));
        sub.restart();
        assert_eq!(sub.next().await, Some(Some(json!(2))));
        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn drop_releases_listener() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let (_tx, rx) = watch::channel(None);
        let sub = Subscription::new(rx, move || flag.store(true, Ordering::SeqCst));
        drop(sub);
        assert!(released.load(Ordering::SeqCst));
    }
}
