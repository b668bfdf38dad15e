//! In-memory replicated store.
//!
//! [`MemoryStore`] holds one JSON tree shared by every connection made
//! from it. Each [`MemoryConnection`] is a separate client: it carries its
//! own disconnect cleanups and subscriptions, which are released when the
//! connection is closed or dropped. Object keys keep insertion order, so
//! children iterate in the order they were first written.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::{StoreError, StoreResult};
use crate::store::{RoomStore, StorePath, Subscription};

#[derive(Debug)]
struct Listener {
    id: u64,
    connection: u64,
    path: StorePath,
    tx: watch::Sender<Option<Value>>,
}

#[derive(Debug)]
struct Shared {
    root: Value,
    listeners: Vec<Listener>,
    next_listener: u64,
    next_connection: u64,
    rejecting: bool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
            listeners: Vec::new(),
            next_listener: 0,
            next_connection: 0,
            rejecting: false,
        }
    }
}

impl Shared {
    fn read(&self, path: &StorePath) -> Option<Value> {
        lookup(&self.root, path.segments()).cloned()
    }

    fn merge(&mut self, path: &StorePath, value: Value) {
        match value {
            Value::Object(fields) if !fields.is_empty() => {
                for (key, child) in fields {
                    self.put(&path.child(key), child);
                }
            }
            Value::Object(_) => {}
            other => self.put(path, other),
        }
        self.notify(path);
    }

    fn put(&mut self, path: &StorePath, value: Value) {
        match prune(value) {
            Some(value) => insert(&mut self.root, path.segments(), value),
            None => remove(&mut self.root, path.segments()),
        }
    }

    fn remove(&mut self, path: &StorePath) {
        remove(&mut self.root, path.segments());
        self.notify(path);
    }

    fn notify(&mut self, written: &StorePath) {
        let Self {
            root, listeners, ..
        } = self;
        let root = &*root;
        listeners.retain(|listener| {
            if listener.path.overlaps(written) {
                let snapshot = lookup(root, listener.path.segments()).cloned();
                listener.tx.send_if_modified(|current| {
                    if *current == snapshot {
                        false
                    } else {
                        *current = snapshot;
                        true
                    }
                });
            }
            !listener.tx.is_closed()
        });
    }
}

/// A shared in-memory store. Cloning yields another handle to the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new client connection.
    pub fn connect(&self) -> MemoryConnection {
        let id = {
            let mut shared = self.lock();
            shared.next_connection += 1;
            shared.next_connection
        };
        MemoryConnection {
            id,
            store: self.clone(),
            state: Mutex::new(ConnectionState {
                open: true,
                cleanup: Vec::new(),
            }),
        }
    }

    /// Value at `path`, bypassing any connection.
    pub fn snapshot(&self, path: &str) -> Option<Value> {
        self.lock().read(&StorePath::parse(path))
    }

    /// Make every write fail until switched off again.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.lock().rejecting = rejecting;
    }

    /// Number of live subscriptions across all connections.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct ConnectionState {
    open: bool,
    cleanup: Vec<StorePath>,
}

/// One client's connection to a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    id: u64,
    store: MemoryStore,
    state: Mutex<ConnectionState>,
}

impl MemoryConnection {
    /// Connection id, unique within its store.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the connection is still open.
    pub fn is_connected(&self) -> bool {
        self.state().open
    }

    /// Close the connection: run registered cleanups and end this
    /// connection's subscriptions. Idempotent.
    pub fn disconnect(&self) {
        let cleanup = {
            let mut state = self.state();
            if !state.open {
                return;
            }
            state.open = false;
            std::mem::take(&mut state.cleanup)
        };
        let mut shared = self.store.lock();
        for path in &cleanup {
            tracing::debug!(connection = self.id, %path, "disconnect cleanup");
            shared.remove(path);
        }
        shared.listeners.retain(|l| l.connection != self.id);
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[async_trait]
impl RoomStore for MemoryConnection {
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        self.ensure_open()?;
        Ok(self.store.lock().read(path))
    }

    async fn merge(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        self.ensure_open()?;
        let mut shared = self.store.lock();
        if shared.rejecting {
            return Err(StoreError::Rejected(format!("write to {path} refused")));
        }
        shared.merge(path, value);
        Ok(())
    }

    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        self.ensure_open()?;
        let mut shared = self.store.lock();
        let (tx, rx) = watch::channel(shared.read(path));
        shared.next_listener += 1;
        let id = shared.next_listener;
        shared.listeners.push(Listener {
            id,
            connection: self.id,
            path: path.clone(),
            tx,
        });
        let weak: Weak<Mutex<Shared>> = Arc::downgrade(&self.store.shared);
        Ok(Subscription::new(rx, move || {
            if let Some(shared) = weak.upgrade() {
                let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
                shared.listeners.retain(|l| l.id != id);
            }
        }))
    }

    async fn on_disconnect_remove(&self, path: &StorePath) -> StoreResult<()> {
        let mut state = self.state();
        if !state.open {
            return Err(StoreError::Disconnected);
        }
        if !state.cleanup.contains(path) {
            state.cleanup.push(path.clone());
        }
        Ok(())
    }

    async fn cancel_on_disconnect(&self, path: &StorePath) -> StoreResult<()> {
        let mut state = self.state();
        if !state.open {
            return Err(StoreError::Disconnected);
        }
        state.cleanup.retain(|p| p != path);
        Ok(())
    }
}

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = node;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if is_empty(current) { None } else { Some(current) }
}

fn insert(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        insert(child, rest, value);
    }
}

fn remove(node: &mut Value, segments: &[String]) {
    let Some((head, rest)) = segments.split_first() else {
        *node = Value::Object(Map::new());
        return;
    };
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.shift_remove(head);
    } else if let Some(child) = map.get_mut(head) {
        remove(child, rest);
        if is_empty(child) {
            map.shift_remove(head);
        }
    }
}

/// Drop nulls and empty objects. `None` if nothing is left.
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        other => Some(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s)
    }

    #[tokio::test]
    async fn merge_sets_children_and_keeps_siblings() {
        let store = MemoryStore::new();
        let conn = store.connect();
        conn.merge(&path("rooms/A"), json!({"host": "u1", "round": 0}))
            .await
            .unwrap();
        conn.merge(&path("rooms/A"), json!({"round": 1})).await.unwrap();
        assert_eq!(
            conn.read(&path("rooms/A")).await.unwrap(),
            Some(json!({"host": "u1", "round": 1}))
        );
    }

    #[tokio::test]
    async fn null_removes_and_prunes_empty_parents() {
        let store = MemoryStore::new();
        let conn = store.connect();
        conn.merge(&path("rooms/A/players/u1"), json!({"name": "Ana"}))
            .await
            .unwrap();
        conn.merge(&path("rooms/A/players"), json!({"u1": null}))
            .await
            .unwrap();
        assert_eq!(store.snapshot("rooms/A/players"), None);
        assert_eq!(store.snapshot("rooms"), None);
    }

    #[tokio::test]
    async fn children_keep_first_write_order() {
        let store = MemoryStore::new();
        let conn = store.connect();
        for id in ["b", "c", "a"] {
            conn.merge(&path("p").child(id), json!({"n": id})).await.unwrap();
        }
        conn.merge(&path("p/b"), json!({"n": "b2"})).await.unwrap();
        conn.merge(&path("p"), json!({"c": null})).await.unwrap();
        let keys: Vec<String> = store
            .snapshot("p")
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[tokio::test]
    async fn disconnect_runs_cleanup_once() {
        let store = MemoryStore::new();
        let conn = store.connect();
        conn.merge(&path("rooms/A/players/u1"), json!({"name": "Ana"}))
            .await
            .unwrap();
        conn.merge(&path("rooms/A/host"), json!("u1")).await.unwrap();
        conn.on_disconnect_remove(&path("rooms/A/players/u1"))
            .await
            .unwrap();
        conn.disconnect();
        conn.disconnect();
        assert_eq!(store.snapshot("rooms/A/players/u1"), None);
        assert_eq!(store.snapshot("rooms/A/host"), Some(json!("u1")));
        assert!(matches!(
            conn.read(&path("rooms/A")).await,
            Err(StoreError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn drop_disconnects() {
        let store = MemoryStore::new();
        {
            let conn = store.connect();
            conn.merge(&path("presence/u2"), json!(true)).await.unwrap();
            conn.on_disconnect_remove(&path("presence/u2")).await.unwrap();
        }
        assert_eq!(store.snapshot("presence/u2"), None);
    }

    #[tokio::test]
    async fn cancelled_cleanup_does_not_run() {
        let store = MemoryStore::new();
        let conn = store.connect();
        conn.merge(&path("presence/u3"), json!(true)).await.unwrap();
        conn.on_disconnect_remove(&path("presence/u3")).await.unwrap();
        conn.cancel_on_disconnect(&path("presence/u3")).await.unwrap();
        drop(conn);
        assert_eq!(store.snapshot("presence/u3"), Some(json!(true)));
    }

    #[tokio::test]
    async fn subscription_sees_overlapping_writes_only() {
        let store = MemoryStore::new();
        let writer = store.connect();
        let reader = store.connect();
        let mut sub = reader.subscribe(&path("rooms/A/players")).await.unwrap();
        assert_eq!(sub.next().await, Some(None));

        writer.merge(&path("rooms/B/host"), json!("x")).await.unwrap();
        writer
            .merge(&path("rooms/A/players/u1"), json!({"score": 1}))
            .await
            .unwrap();
        assert_eq!(
            sub.next().await,
            Some(Some(json!({"u1": {"score": 1}})))
        );
        assert_eq!(store.listener_count(), 1);
        drop(sub);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn subscriptions_end_with_their_connection() {
        let store = MemoryStore::new();
        let conn = store.connect();
        let mut sub = conn.subscribe(&path("x")).await.unwrap();
        sub.next().await;
        conn.disconnect();
        assert_eq!(sub.next().await, None);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn rejecting_store_fails_writes() {
        let store = MemoryStore::new();
        let conn = store.connect();
        store.set_rejecting(true);
        assert!(matches!(
            conn.merge(&path("a"), json!(1)).await,
            Err(StoreError::Rejected(_))
        ));
        store.set_rejecting(false);
        conn.merge(&path("a"), json!(1)).await.unwrap();
        assert_eq!(store.snapshot("a"), Some(json!(1)));
    }
}
