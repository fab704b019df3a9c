//! Shared fixtures for the Brewstand integration tests.

#![allow(dead_code)] // Each test binary uses a different subset
#![allow(clippy::expect_used)] // Test code can use expect

use brewstand::{BrewClient, BrewConfig, BrewState, Temperature};
use brewstand_core::identity::SessionUser;
use brewstand_testing::InMemoryDocumentStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn espresso() -> Value {
    json!({ "name": "Espresso", "color": "#3b2f2f" })
}

pub fn cold_brew() -> Value {
    json!({ "name": "Cold Brew", "color": "#1e1410" })
}

pub fn oat_milk() -> Value {
    json!({ "name": "Oat Milk", "color": "#f5f0e1" })
}

pub fn caramel() -> Value {
    json!({ "name": "Caramel", "color": "#c68e17" })
}

pub fn vanilla() -> Value {
    json!({ "name": "Vanilla", "color": "#f3e5ab" })
}

/// A backend with two bases, one creamer and two syrups
pub fn seeded_store() -> InMemoryDocumentStore {
    let documents = InMemoryDocumentStore::new();
    documents.seed("bases", [espresso(), cold_brew()]);
    documents.seed("creamers", [oat_milk()]);
    documents.seed("syrups", [caramel(), vanilla()]);
    documents
}

pub fn client(documents: &InMemoryDocumentStore) -> BrewClient {
    client_with(documents, BrewConfig::default())
}

pub fn client_with(documents: &InMemoryDocumentStore, config: BrewConfig) -> BrewClient {
    BrewClient::new(Arc::new(documents.clone()), config)
}

/// A stored beverage document owned by `uid`
pub fn beverage_doc(name: &str, uid: &str) -> Value {
    json!({
        "name": name,
        "base": espresso(),
        "creamer": oat_milk(),
        "syrup": caramel(),
        "temp": Temperature::Hot,
        "userId": uid,
    })
}

pub fn user(uid: &str) -> SessionUser {
    SessionUser::new(uid)
}

/// Wait until the client state satisfies `predicate`
pub async fn eventually<F>(client: &BrewClient, predicate: F)
where
    F: FnMut(&BrewState) -> bool,
{
    let mut updates = client.subscribe_state();
    let _ = tokio::time::timeout(WAIT, updates.wait_for(predicate))
        .await
        .expect("state never matched")
        .expect("client dropped its state");
}

/// Poll `condition` until it holds
pub async fn eventually_true<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

/// Give spawned tasks a chance to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
