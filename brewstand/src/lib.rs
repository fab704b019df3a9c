//! # Brewstand
//!
//! Reactive client state for composing beverages from ingredient catalogs
//! and keeping a signed-in user's beverages in sync with a document backend.
//!
//! - Catalogs (`bases`, `creamers`, `syrups`) are loaded in full and seed the
//!   draft selections.
//! - The signed-in identity drives one live subscription to the user's
//!   `beverages`; every snapshot replaces the local list.
//! - A valid draft is written as a new beverage, which then arrives through
//!   the subscription.
//!
//! # Quick Start
//!
//! ```no_run
//! use brewstand::{BrewClient, BrewConfig};
//! use brewstand_core::identity::SessionUser;
//! use brewstand_testing::InMemoryDocumentStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), brewstand::BrewError> {
//! let documents = InMemoryDocumentStore::new();
//! documents.seed("bases", [json!({ "name": "Espresso", "color": "#3b2f2f" })]);
//!
//! let client = BrewClient::new(Arc::new(documents), BrewConfig::default());
//! client.load_ingredients().await?;
//! client.set_user(Some(SessionUser::new("uid-1"))).await?;
//!
//! let beverages = client.state(|s| s.beverages.len()).await;
//! println!("{beverages} beverages");
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod reducer;
pub mod session;
pub mod subscription;
pub mod types;

// Re-export commonly used types
pub use client::BrewClient;
pub use config::{BrewConfig, FailurePolicy};
pub use error::BrewError;
pub use reducer::{BrewEnvironment, BrewReducer};
pub use subscription::BEVERAGE_SUBSCRIPTION;
pub use types::{
    BeverageRecord, BrewAction, BrewState, ComposeStatus, ComposeStatusKind, Ingredient,
    RequestId, Temperature,
};
