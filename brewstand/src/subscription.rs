//! The live beverage subscription.
//!
//! At most one subscription runs at a time. It lives in the store's
//! cancellation registry under [`BEVERAGE_SUBSCRIPTION`], so starting a new
//! one aborts the old task, and aborting the task drops the backend stream,
//! which disposes the listener.
//!
//! Every subscription is tagged with the generation it was opened in.
//! Snapshots from any other generation are discarded, so nothing delivered
//! by a torn-down subscription reaches the state.

use crate::config::FailurePolicy;
use crate::reducer::BrewEnvironment;
use crate::types::{BEVERAGES, BeverageRecord, BrewAction, BrewState, USER_ID_FIELD};
use brewstand_core::document_store::{Document, DocumentStoreError, FieldFilter};
use brewstand_core::effect::{Effect, EffectId};
use brewstand_core::identity::UserId;
use brewstand_core::stream_effect;
use futures::StreamExt;
use std::sync::Arc;

/// Registry id of the live beverage subscription
pub const BEVERAGE_SUBSCRIPTION: EffectId = EffectId::new("beverage-subscription");

/// Tear down the live subscription, if any
#[must_use]
pub const fn teardown() -> Effect<BrewAction> {
    Effect::Cancel(BEVERAGE_SUBSCRIPTION)
}

/// Open a subscription to `uid`'s beverages, tagged with `generation`
///
/// The stream ends after the first backend error, reporting it as
/// [`BrewAction::SubscriptionFailed`].
#[must_use]
pub fn open(uid: UserId, generation: u64, env: &BrewEnvironment) -> Effect<BrewAction> {
    let documents = Arc::clone(&env.documents);

    let actions = async_stream::stream! {
        let filter = FieldFilter::equals(USER_ID_FIELD, uid.as_str());
        match documents.watch(BEVERAGES, filter).await {
            Ok(mut snapshots) => {
                tracing::debug!(%uid, generation, "Beverage subscription opened");
                metrics::counter!("brewstand.subscriptions.opened").increment(1);

                while let Some(delivery) = snapshots.next().await {
                    match delivery {
                        Ok(delivered) => {
                            yield BrewAction::BeveragesSnapshot {
                                generation,
                                beverages: decode(&delivered),
                            };
                        },
                        Err(error) => {
                            yield BrewAction::SubscriptionFailed { generation, error };
                            break;
                        },
                    }
                }
            },
            Err(error) => {
                yield BrewAction::SubscriptionFailed { generation, error };
            },
        }
    };

    stream_effect!(actions).cancellable(BEVERAGE_SUBSCRIPTION)
}

/// Map snapshot documents to records, skipping any that fail to decode
fn decode(documents: &[Document]) -> Vec<BeverageRecord> {
    documents
        .iter()
        .filter_map(|document| match BeverageRecord::from_document(document) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(id = %document.id, %error, "Skipping malformed beverage");
                None
            },
        })
        .collect()
}

/// Replace `beverages` with a snapshot from the current subscription
pub fn apply_snapshot(state: &mut BrewState, generation: u64, beverages: Vec<BeverageRecord>) {
    if generation != state.subscription_generation || state.user.is_none() {
        tracing::trace!(generation, "Discarding snapshot from closed subscription");
        return;
    }

    tracing::debug!(generation, count = beverages.len(), "Beverages snapshot");
    state.subscription_error = None;
    state.beverages = beverages;
}

/// Handle the end of the current subscription according to `policy`
pub fn apply_failure(
    state: &mut BrewState,
    generation: u64,
    error: &DocumentStoreError,
    policy: FailurePolicy,
) {
    if generation != state.subscription_generation {
        tracing::trace!(generation, %error, "Ignoring failure of closed subscription");
        return;
    }

    match policy {
        FailurePolicy::Surface => {
            tracing::error!(generation, %error, "Beverage subscription failed");
            state.subscription_error = Some(format!("Beverage subscription failed: {error}"));
        },
        FailurePolicy::Quiet => {
            tracing::warn!(generation, %error, "Beverage subscription failed, clearing beverages");
            state.beverages.clear();
        },
    }
}
