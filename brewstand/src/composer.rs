//! Validating the draft and persisting it as a beverage.
//!
//! Checks run in order and the first failure wins: signed-in user, non-blank
//! name, then all three ingredients. A valid draft clears the name before
//! the write starts. The written record is not added to `beverages`; it
//! shows up with the next subscription snapshot.

use crate::reducer::BrewEnvironment;
use crate::types::{BEVERAGES, BeverageRecord, BrewAction, BrewState, ComposeStatus, RequestId};
use brewstand_core::document_store::DocumentStore;
use brewstand_core::effect::Effect;
use brewstand_core::{SmallVec, async_effect, smallvec};
use std::sync::Arc;

/// Validate the draft and, if complete, write it to the backend
pub fn make_beverage(
    state: &mut BrewState,
    request: RequestId,
    env: &BrewEnvironment,
) -> SmallVec<[Effect<BrewAction>; 4]> {
    let record = match draft(state) {
        Ok(record) => record,
        Err(status) => {
            tracing::debug!(%request, kind = ?status.kind, "Rejected beverage draft");
            return smallvec![answer(request, status)];
        },
    };

    state.current_beverage_name.clear();

    let documents = Arc::clone(&env.documents);
    smallvec![async_effect! {
        let status = persist(documents.as_ref(), &record).await;
        Some(BrewAction::BeverageComposed { request, status })
    }]
}

/// Assemble a record from the draft, or say why it cannot be made
///
/// # Errors
///
/// Returns the [`ComposeStatus`] of the first check that fails.
pub fn draft(state: &BrewState) -> Result<BeverageRecord, ComposeStatus> {
    let Some(user) = &state.user else {
        return Err(ComposeStatus::no_user());
    };

    if state.current_beverage_name.trim().is_empty() {
        return Err(ComposeStatus::incomplete());
    }

    let (Some(base), Some(creamer), Some(syrup)) =
        (&state.current_base, &state.current_creamer, &state.current_syrup)
    else {
        return Err(ComposeStatus::incomplete());
    };

    Ok(BeverageRecord {
        id: None,
        name: state.current_beverage_name.clone(),
        base: base.clone(),
        creamer: creamer.clone(),
        syrup: syrup.clone(),
        temp: state.current_temp,
        user_id: Some(user.uid.clone()),
    })
}

async fn persist(documents: &dyn DocumentStore, record: &BeverageRecord) -> ComposeStatus {
    let fields = match record.to_fields() {
        Ok(fields) => fields,
        Err(error) => {
            tracing::error!(%error, "Failed to encode beverage");
            return ComposeStatus::write_failed();
        },
    };

    match documents.add(BEVERAGES, fields).await {
        Ok(id) => {
            tracing::info!(%id, name = %record.name, "Beverage made");
            metrics::counter!("brewstand.beverages.created").increment(1);
            ComposeStatus::created(&record.name, id)
        },
        Err(error) => {
            tracing::warn!(%error, name = %record.name, "Failed to write beverage");
            ComposeStatus::write_failed()
        },
    }
}

fn answer(request: RequestId, status: ComposeStatus) -> Effect<BrewAction> {
    async_effect! {
        Some(BrewAction::BeverageComposed { request, status })
    }
}
