//! Integration tests for ingredient catalog loading

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

mod common;

use brewstand::{BrewConfig, BrewError, FailurePolicy};
use brewstand_core::document_store::DocumentStoreError;
use brewstand_testing::InMemoryDocumentStore;
use common::{caramel, client, client_with, espresso, oat_milk, seeded_store};

fn offline() -> DocumentStoreError {
    DocumentStoreError::ReadFailed {
        collection: "creamers".to_string(),
        reason: "offline".to_string(),
    }
}

#[tokio::test]
async fn test_load_defaults_selections_to_first_entries() {
    let documents = seeded_store();
    let client = client(&documents);

    client.load_ingredients().await.unwrap();

    let state = client.snapshot().await;
    assert_eq!(state.bases.len(), 2);
    assert_eq!(state.creamers.len(), 1);
    assert_eq!(state.syrups.len(), 2);
    assert_eq!(state.current_base.as_ref(), state.bases.first());
    assert_eq!(state.current_creamer.as_ref(), state.creamers.first());
    assert_eq!(state.current_syrup.as_ref(), state.syrups.first());
    assert_eq!(state.current_base.map(|b| b.name), Some("Espresso".to_string()));
    assert_eq!(documents.fetch_count(), 3);
}

#[tokio::test]
async fn test_ingredients_carry_backend_ids() {
    let documents = InMemoryDocumentStore::new();
    documents.insert_with_id("bases", "espresso", espresso());
    let client = client(&documents);

    client.load_ingredients().await.unwrap();

    let base = client.state(|s| s.current_base.clone()).await.unwrap();
    assert_eq!(base.id.map(|id| id.to_string()), Some("espresso".to_string()));
}

#[tokio::test]
async fn test_empty_catalog_leaves_selection_unset() {
    let documents = InMemoryDocumentStore::new();
    documents.seed("bases", [espresso()]);
    documents.seed("syrups", [caramel()]);
    let client = client(&documents);

    client.load_ingredients().await.unwrap();

    let state = client.snapshot().await;
    assert!(state.creamers.is_empty());
    assert!(state.current_creamer.is_none());
    assert!(state.current_base.is_some());
    assert!(state.current_syrup.is_some());
}

#[tokio::test]
async fn test_reload_replaces_catalogs_and_resets_selections() {
    let documents = seeded_store();
    let client = client(&documents);
    client.load_ingredients().await.unwrap();

    let syrups = client.state(|s| s.syrups.clone()).await;
    client.select_syrup(syrups.last().cloned()).await.unwrap();
    documents.seed("creamers", [oat_milk()]);

    client.load_ingredients().await.unwrap();

    let state = client.snapshot().await;
    assert_eq!(state.creamers.len(), 2);
    assert_eq!(state.current_syrup.as_ref(), state.syrups.first());
    assert_eq!(documents.fetch_count(), 6);
}

#[tokio::test]
async fn test_surface_policy_reports_failure_and_keeps_catalogs() {
    let documents = seeded_store();
    let client = client(&documents);
    client.load_ingredients().await.unwrap();

    documents.fail_fetch("creamers", offline());
    let result = client.load_ingredients().await;

    assert_eq!(result, Err(BrewError::CatalogLoad(offline())));
    let state = client.snapshot().await;
    assert_eq!(state.bases.len(), 2);
    assert!(state.current_creamer.is_some());
    assert!(state.catalog_error.unwrap().contains("offline"));
}

#[tokio::test]
async fn test_successful_reload_clears_catalog_error() {
    let documents = seeded_store();
    let client = client(&documents);

    documents.fail_fetch("creamers", offline());
    assert!(client.load_ingredients().await.is_err());
    assert!(client.state(|s| s.catalog_error.is_some()).await);

    documents.clear_failures();
    client.load_ingredients().await.unwrap();

    let state = client.snapshot().await;
    assert_eq!(state.catalog_error, None);
    assert_eq!(state.creamers.len(), 1);
}

#[tokio::test]
async fn test_quiet_policy_empties_catalogs() {
    let documents = seeded_store();
    let config = BrewConfig::default().with_catalog_failure(FailurePolicy::Quiet);
    let client = client_with(&documents, config);
    client.load_ingredients().await.unwrap();

    documents.fail_fetch("creamers", offline());
    client.load_ingredients().await.unwrap();

    let state = client.snapshot().await;
    assert!(state.bases.is_empty());
    assert!(state.creamers.is_empty());
    assert!(state.syrups.is_empty());
    assert!(state.current_base.is_none());
    assert!(state.catalog_error.is_none());
}
