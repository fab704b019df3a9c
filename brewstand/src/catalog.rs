//! Ingredient catalog loading.
//!
//! The three catalogs are fetched concurrently and in full on every load.
//! A load only lands if it is still the latest one started.

use crate::config::FailurePolicy;
use crate::reducer::BrewEnvironment;
use crate::types::{BASES, BrewAction, BrewState, CREAMERS, Ingredient, RequestId, SYRUPS};
use brewstand_core::document_store::{DocumentStore, DocumentStoreError};
use brewstand_core::effect::Effect;
use brewstand_core::{SmallVec, async_effect, smallvec};
use std::sync::Arc;

/// Start a catalog load and remember it as the latest one
pub fn load(
    state: &mut BrewState,
    request: RequestId,
    env: &BrewEnvironment,
) -> SmallVec<[Effect<BrewAction>; 4]> {
    tracing::debug!(%request, "Loading ingredient catalogs");
    state.catalog_request = Some(request);

    let documents = Arc::clone(&env.documents);
    smallvec![async_effect! {
        let fetched = tokio::try_join!(
            fetch_catalog(documents.as_ref(), BASES),
            fetch_catalog(documents.as_ref(), CREAMERS),
            fetch_catalog(documents.as_ref(), SYRUPS),
        );
        Some(match fetched {
            Ok((bases, creamers, syrups)) => BrewAction::IngredientsLoaded {
                request,
                bases,
                creamers,
                syrups,
            },
            Err(error) => BrewAction::IngredientsLoadFailed { request, error },
        })
    }]
}

/// Fetch one catalog, skipping documents without the ingredient shape
async fn fetch_catalog(
    documents: &dyn DocumentStore,
    collection: &str,
) -> Result<Vec<Ingredient>, DocumentStoreError> {
    let fetched = documents.fetch_all(collection).await?;
    Ok(fetched
        .iter()
        .filter_map(|document| match Ingredient::from_document(document) {
            Ok(ingredient) => Some(ingredient),
            Err(error) => {
                tracing::warn!(collection, id = %document.id, %error, "Skipping malformed ingredient");
                None
            },
        })
        .collect())
}

/// Replace the catalogs and reset each selection to its catalog's first entry
pub fn apply_loaded(
    state: &mut BrewState,
    request: RequestId,
    bases: Vec<Ingredient>,
    creamers: Vec<Ingredient>,
    syrups: Vec<Ingredient>,
) {
    if state.catalog_request != Some(request) {
        tracing::debug!(%request, "Discarding stale catalog load");
        return;
    }

    tracing::info!(
        bases = bases.len(),
        creamers = creamers.len(),
        syrups = syrups.len(),
        "Ingredient catalogs loaded"
    );

    state.catalog_error = None;
    state.current_base = bases.first().cloned();
    state.current_creamer = creamers.first().cloned();
    state.current_syrup = syrups.first().cloned();
    state.bases = bases;
    state.creamers = creamers;
    state.syrups = syrups;
}

/// Handle a failed load according to `policy`
pub fn apply_failure(
    state: &mut BrewState,
    request: RequestId,
    error: &DocumentStoreError,
    policy: FailurePolicy,
) {
    if state.catalog_request != Some(request) {
        tracing::debug!(%request, %error, "Ignoring failure of stale catalog load");
        return;
    }

    match policy {
        FailurePolicy::Surface => {
            tracing::error!(%error, "Failed to load ingredient catalogs");
            state.catalog_error = Some(format!("Failed to load ingredients: {error}"));
        },
        FailurePolicy::Quiet => {
            tracing::warn!(%error, "Failed to load ingredient catalogs, continuing with empty catalogs");
            state.bases.clear();
            state.creamers.clear();
            state.syrups.clear();
            state.current_base = None;
            state.current_creamer = None;
            state.current_syrup = None;
        },
    }
}
