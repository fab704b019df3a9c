//! # Brewstand Testing
//!
//! Testing utilities and helpers for Brewstand.
//!
//! This crate provides:
//! - [`InMemoryDocumentStore`]: a deterministic document backend with live queries
//!   and failure injection
//! - [`InMemoryIdentityProvider`]: a scriptable stand-in for the auth collaborator
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use brewstand_testing::InMemoryDocumentStore;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_catalog_load() {
//!     let documents = InMemoryDocumentStore::new();
//!     documents.seed("bases", [json!({ "name": "Espresso", "color": "#3b2f2f" })]);
//!
//!     let client = BrewClient::new(Arc::new(documents.clone()), BrewConfig::default());
//!     client.load_ingredients().await?;
//!     assert_eq!(client.state(|s| s.bases.len()).await, 1);
//! }
//! ```

/// In-memory document store
pub mod document_store;

/// In-memory identity provider
pub mod identity;

/// Fluent reducer testing
pub mod reducer_test;

// Re-export commonly used items
pub use document_store::InMemoryDocumentStore;
pub use identity::InMemoryIdentityProvider;
pub use reducer_test::{ReducerTest, assertions};
