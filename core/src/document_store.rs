//! Document store trait and related types.
//!
//! This module defines the backend seam: a document-oriented database that
//! offers collection-scoped reads, appends and live queries over schema-less
//! records.
//!
//! # Design
//!
//! The `DocumentStore` trait is deliberately minimal. It provides exactly what
//! the client needs:
//!
//! - Full scan of a collection
//! - Append a new document (the backend assigns the id)
//! - Live query over a collection filtered by field equality, delivered as
//!   full-replace snapshots
//!
//! Documents are schema-on-read: fields are kept as [`serde_json::Value`] and
//! decoded by whoever consumes them.
//!
//! # Implementations
//!
//! - `InMemoryDocumentStore` (in `brewstand-testing` crate): Fast, deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use brewstand_core::document_store::{DocumentStore, DocumentStoreError, FieldFilter};
//! use futures::StreamExt;
//!
//! async fn example(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
//!     let bases = store.fetch_all("bases").await?;
//!     println!("{} bases", bases.len());
//!
//!     let mut live = store.watch("beverages", FieldFilter::equals("userId", "uid-1")).await?;
//!     while let Some(snapshot) = live.next().await {
//!         println!("{} beverages", snapshot?.len());
//!     }
//!     Ok(())
//! }
//! ```

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    /// The backend could not be reached
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A collection read failed
    #[error("Read failed for collection '{collection}': {reason}")]
    ReadFailed {
        /// The collection being read
        collection: String,
        /// The reason for failure
        reason: String,
    },

    /// A document write was rejected or failed
    #[error("Write failed for collection '{collection}': {reason}")]
    WriteFailed {
        /// The collection being written
        collection: String,
        /// The reason for failure
        reason: String,
    },

    /// Opening or continuing a live query failed
    #[error("Live query failed for collection '{collection}': {reason}")]
    SubscriptionFailed {
        /// The watched collection
        collection: String,
        /// The reason for failure
        reason: String,
    },

    /// The caller is not allowed to perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Backend-assigned document identifier.
///
/// # Examples
///
/// ```
/// use brewstand_core::document_store::DocumentId;
///
/// let id = DocumentId::new("abc123");
/// assert_eq!(id.as_str(), "abc123");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new `DocumentId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A document as delivered by the backend: its id plus untyped fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Backend-assigned id
    pub id: DocumentId,
    /// Document body (normally a JSON object)
    pub fields: Value,
}

impl Document {
    /// Create a document from an id and its fields
    #[must_use]
    pub fn new(id: impl Into<DocumentId>, fields: Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a top-level field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Exact-equality filter on a top-level field.
///
/// # Examples
///
/// ```
/// use brewstand_core::document_store::FieldFilter;
/// use serde_json::json;
///
/// let filter = FieldFilter::equals("userId", "uid-1");
/// assert!(filter.matches(&json!({ "userId": "uid-1" })));
/// assert!(!filter.matches(&json!({ "userId": "uid-2" })));
/// assert!(!filter.matches(&json!({ "name": "latte" })));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    /// Field name
    pub field: String,
    /// Value the field must equal
    pub value: Value,
}

impl FieldFilter {
    /// Build a `field == value` filter
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a document body satisfies this filter
    #[must_use]
    pub fn matches(&self, fields: &Value) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.field, self.value)
    }
}

/// Live query results.
///
/// Each item is the complete current result set (full-replace snapshot).
/// Dropping the stream disposes the backend listener.
pub type SnapshotStream =
    Pin<Box<dyn Stream<Item = Result<Vec<Document>, DocumentStoreError>> + Send>>;

/// Boxed future returned by [`DocumentStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DocumentStoreError>> + Send + 'a>>;

/// Document store abstraction.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be captured by effects
/// running on the async runtime.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// to enable trait object usage (`Arc<dyn DocumentStore>`). Reducers create
/// effects that capture the store.
pub trait DocumentStore: Send + Sync {
    /// Read every document of a collection, in backend order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::ReadFailed`] or
    /// [`DocumentStoreError::ConnectionFailed`] if the read fails.
    fn fetch_all<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Vec<Document>>;

    /// Append a document to a collection and return its new id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::WriteFailed`] or
    /// [`DocumentStoreError::PermissionDenied`] if the write fails.
    fn add<'a>(&'a self, collection: &'a str, fields: Value) -> StoreFuture<'a, DocumentId>;

    /// Open a live query over `collection` restricted by `filter`.
    ///
    /// The returned stream yields the current result set once the listener is
    /// attached and again after every change. Delivery timing is decided by
    /// the backend.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::SubscriptionFailed`] if the listener
    /// cannot be attached. Errors after attachment are delivered as stream items.
    fn watch<'a>(&'a self, collection: &'a str, filter: FieldFilter) -> StoreFuture<'a, SnapshotStream>;
}
