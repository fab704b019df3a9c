//! In-memory document store for fast, deterministic testing.
//!
//! Collections are plain vectors kept in insertion order. Live queries are
//! backed by unbounded channels: every write to a watched collection pushes a
//! fresh full snapshot to each matching watcher. A watcher whose stream has
//! been dropped counts as disposed.
//!
//! Failure injection and delivery control:
//! - [`InMemoryDocumentStore::fail_fetch`]: make reads of one collection fail
//! - [`InMemoryDocumentStore::fail_next_add`]: make the next write fail
//! - [`InMemoryDocumentStore::fail_next_watch`]: make the next live query fail to open
//! - [`InMemoryDocumentStore::push_watch_error`]: break every live query on a collection
//! - [`InMemoryDocumentStore::pause_notifications`]: hold snapshot delivery until resumed

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use brewstand_core::document_store::{
    Document, DocumentId, DocumentStore, DocumentStoreError, FieldFilter, SnapshotStream,
    StoreFuture,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use uuid::Uuid;

type Delivery = Result<Vec<Document>, DocumentStoreError>;

struct Watcher {
    collection: String,
    filter: FieldFilter,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Watcher {
    fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    watchers: Vec<Watcher>,
    fetch_failures: HashMap<String, DocumentStoreError>,
    next_add_failure: Option<DocumentStoreError>,
    next_watch_failure: Option<DocumentStoreError>,
    paused: bool,
    fetches: usize,
    writes: usize,
    watches: usize,
}

impl Inner {
    fn snapshot(&self, collection: &str, filter: &FieldFilter) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn insert(&mut self, collection: &str, id: DocumentId, fields: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, fields));
        self.notify(Some(collection));
    }

    /// Push current snapshots to live watchers (all collections when `None`)
    fn notify(&mut self, collection: Option<&str>) {
        self.watchers.retain(Watcher::is_live);
        if self.paused {
            return;
        }
        for watcher in &self.watchers {
            if collection.is_some_and(|c| c != watcher.collection) {
                continue;
            }
            let snapshot = self.snapshot(&watcher.collection, &watcher.filter);
            let _ = watcher.tx.send(Ok(snapshot));
        }
    }
}

/// In-memory document store.
///
/// Cloning shares the underlying data, so a test can keep a handle for
/// seeding and inspection while the client under test owns another.
///
/// # Example
///
/// ```
/// use brewstand_testing::InMemoryDocumentStore;
/// use brewstand_core::document_store::DocumentStore;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// store.seed("syrups", [json!({ "name": "Vanilla", "color": "#f3e5ab" })]);
///
/// let syrups = store.fetch_all("syrups").await?;
/// assert_eq!(syrups.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Append documents with generated ids, returning the ids in order.
    ///
    /// Seeding does not count as a client write.
    pub fn seed(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Value>,
    ) -> Vec<DocumentId> {
        let mut inner = self.lock();
        documents
            .into_iter()
            .map(|fields| {
                let id = generate_id();
                inner.insert(collection, id.clone(), fields);
                id
            })
            .collect()
    }

    /// Append one document under a caller-chosen id
    pub fn insert_with_id(&self, collection: &str, id: impl Into<DocumentId>, fields: Value) {
        self.lock().insert(collection, id.into(), fields);
    }

    /// Every document of a collection, in insertion order
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every read of `collection` fail with `error`
    pub fn fail_fetch(&self, collection: &str, error: DocumentStoreError) {
        self.lock()
            .fetch_failures
            .insert(collection.to_string(), error);
    }

    /// Make the next [`DocumentStore::add`] fail with `error`
    pub fn fail_next_add(&self, error: DocumentStoreError) {
        self.lock().next_add_failure = Some(error);
    }

    /// Make the next [`DocumentStore::watch`] fail with `error`
    pub fn fail_next_watch(&self, error: DocumentStoreError) {
        self.lock().next_watch_failure = Some(error);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fetch_failures.clear();
        inner.next_add_failure = None;
        inner.next_watch_failure = None;
    }

    /// Deliver `error` to every live query on `collection`
    pub fn push_watch_error(&self, collection: &str, error: &DocumentStoreError) {
        let mut inner = self.lock();
        inner.watchers.retain(Watcher::is_live);
        for watcher in inner.watchers.iter().filter(|w| w.collection == collection) {
            let _ = watcher.tx.send(Err(error.clone()));
        }
    }

    /// Stop delivering snapshots until [`Self::resume_notifications`]
    pub fn pause_notifications(&self) {
        self.lock().paused = true;
    }

    /// Resume delivery and push a current snapshot to every live query
    pub fn resume_notifications(&self) {
        let mut inner = self.lock();
        inner.paused = false;
        inner.notify(None);
    }

    /// Number of live queries on `collection` whose stream is still held
    #[must_use]
    pub fn active_watchers(&self, collection: &str) -> usize {
        let mut inner = self.lock();
        inner.watchers.retain(Watcher::is_live);
        inner
            .watchers
            .iter()
            .filter(|w| w.collection == collection)
            .count()
    }

    /// Filters of the live queries on `collection`
    #[must_use]
    pub fn active_filters(&self, collection: &str) -> Vec<FieldFilter> {
        let mut inner = self.lock();
        inner.watchers.retain(Watcher::is_live);
        inner
            .watchers
            .iter()
            .filter(|w| w.collection == collection)
            .map(|w| w.filter.clone())
            .collect()
    }

    /// Number of `fetch_all` calls so far
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    /// Number of `add` calls so far (including failed ones)
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Number of `watch` calls so far (including failed ones)
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.lock().watches
    }

    /// Total backend calls of any kind
    #[must_use]
    pub fn call_count(&self) -> usize {
        let inner = self.lock();
        inner.fetches + inner.writes + inner.watches
    }
}

fn generate_id() -> DocumentId {
    DocumentId::new(Uuid::new_v4().simple().to_string())
}

impl DocumentStore for InMemoryDocumentStore {
    fn fetch_all<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.fetches += 1;
            if let Some(error) = inner.fetch_failures.get(collection) {
                return Err(error.clone());
            }
            Ok(inner.collections.get(collection).cloned().unwrap_or_default())
        })
    }

    fn add<'a>(&'a self, collection: &'a str, fields: Value) -> StoreFuture<'a, DocumentId> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.writes += 1;
            if let Some(error) = inner.next_add_failure.take() {
                return Err(error);
            }
            let id = generate_id();
            inner.insert(collection, id.clone(), fields);
            Ok(id)
        })
    }

    fn watch<'a>(
        &'a self,
        collection: &'a str,
        filter: FieldFilter,
    ) -> StoreFuture<'a, SnapshotStream> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.watches += 1;
            if let Some(error) = inner.next_watch_failure.take() {
                return Err(error);
            }

            let (tx, mut rx) = mpsc::unbounded_channel();
            if !inner.paused {
                let _ = tx.send(Ok(inner.snapshot(collection, &filter)));
            }
            inner.watchers.push(Watcher {
                collection: collection.to_string(),
                filter,
                tx,
            });

            let stream = async_stream::stream! {
                while let Some(delivery) = rx.recv().await {
                    yield delivery;
                }
            };
            Ok(Box::pin(stream) as SnapshotStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_returns_seeded_documents_in_order() {
        let store = InMemoryDocumentStore::new();
        let ids = store.seed("bases", [json!({ "name": "Espresso" }), json!({ "name": "Tea" })]);

        let docs = store.fetch_all("bases").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, ids[0]);
        assert_eq!(docs[1].field("name"), Some(&json!("Tea")));
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_injection() {
        let store = InMemoryDocumentStore::new();
        store.fail_fetch("syrups", DocumentStoreError::ConnectionFailed("offline".into()));

        assert!(store.fetch_all("syrups").await.is_err());
        assert!(store.fetch_all("bases").await.is_ok());

        store.clear_failures();
        assert!(store.fetch_all("syrups").await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_delivers_filtered_full_snapshots() {
        let store = InMemoryDocumentStore::new();
        store.seed("beverages", [json!({ "name": "Mine", "userId": "a" })]);

        let mut live = store
            .watch("beverages", FieldFilter::equals("userId", "a"))
            .await
            .unwrap();
        let first = live.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store.add("beverages", json!({ "name": "Theirs", "userId": "b" })).await.unwrap();
        let second = live.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);

        store.add("beverages", json!({ "name": "Also mine", "userId": "a" })).await.unwrap();
        let third = live.next().await.unwrap().unwrap();
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn test_dropping_stream_disposes_watcher() {
        let store = InMemoryDocumentStore::new();
        let live = store
            .watch("beverages", FieldFilter::equals("userId", "a"))
            .await
            .unwrap();
        assert_eq!(store.active_watchers("beverages"), 1);

        drop(live);
        assert_eq!(store.active_watchers("beverages"), 0);
    }

    #[tokio::test]
    async fn test_paused_notifications_are_flushed_on_resume() {
        let store = InMemoryDocumentStore::new();
        store.pause_notifications();
        let mut live = store
            .watch("beverages", FieldFilter::equals("userId", "a"))
            .await
            .unwrap();

        store.add("beverages", json!({ "name": "Held", "userId": "a" })).await.unwrap();
        assert!(futures::poll!(live.next()).is_pending());

        store.resume_notifications();
        let snapshot = live.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_next_add_failure_is_consumed() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_add(DocumentStoreError::PermissionDenied("read-only".into()));

        assert!(store.add("beverages", json!({})).await.is_err());
        assert!(store.add("beverages", json!({})).await.is_ok());
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.documents("beverages").len(), 1);
    }
}
