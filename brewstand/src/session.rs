//! Binding the signed-in identity to the beverage subscription.
//!
//! | from | to | effects |
//! |---|---|---|
//! | signed out | signed in (uid) | open subscription |
//! | signed in | signed in (same uid) | tear down, reopen |
//! | signed in | signed in (other uid) | tear down, clear beverages, open |
//! | signed in | signed out | tear down, clear beverages |
//!
//! The teardown always comes first, so the runtime never holds two
//! subscriptions at once.

use crate::client::BrewClient;
use crate::reducer::BrewEnvironment;
use crate::subscription;
use crate::types::{BrewAction, BrewState};
use brewstand_core::effect::Effect;
use brewstand_core::identity::{IdentityProvider, SessionUser};
use brewstand_core::{SmallVec, smallvec};
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Switch the session to `user`
pub fn set_user(
    state: &mut BrewState,
    user: Option<SessionUser>,
    env: &BrewEnvironment,
) -> SmallVec<[Effect<BrewAction>; 4]> {
    state.subscription_generation += 1;
    let generation = state.subscription_generation;
    state.subscription_error = None;

    let previous = state.user.take();
    let same_user = matches!((&previous, &user), (Some(old), Some(new)) if old.uid == new.uid);
    if !same_user {
        state.beverages.clear();
        state.current_beverage = None;
    }

    let mut effects: SmallVec<[Effect<BrewAction>; 4]> = smallvec![subscription::teardown()];

    match user {
        Some(user) => {
            tracing::info!(uid = %user.uid, generation, "User signed in");
            effects.push(subscription::open(user.uid.clone(), generation, env));
            state.user = Some(user);
        },
        None => {
            if let Some(previous) = previous {
                tracing::info!(uid = %previous.uid, "User signed out");
            }
        },
    }

    effects
}

/// Forward every identity published by `provider` to `client`
///
/// Runs until the provider's stream ends or the client shuts down.
pub fn bind(client: BrewClient, provider: Arc<dyn IdentityProvider>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = provider.changes();
        while let Some(identity) = changes.next().await {
            match client.set_user(identity).await {
                Ok(()) => {},
                Err(error) if error.is_shutdown() => {
                    tracing::debug!("Client shut down, detaching identity binding");
                    break;
                },
                Err(error) => {
                    tracing::warn!(%error, "Failed to apply identity change");
                },
            }
        }
        tracing::debug!("Identity binding ended");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::BrewReducer;
    use crate::subscription::BEVERAGE_SUBSCRIPTION;
    use crate::types::{BeverageRecord, Ingredient, Temperature};
    use brewstand_testing::{InMemoryDocumentStore, ReducerTest, assertions};

    fn environment() -> BrewEnvironment {
        BrewEnvironment::new(Arc::new(InMemoryDocumentStore::new()))
    }

    fn record(uid: &str) -> BeverageRecord {
        BeverageRecord {
            id: None,
            name: "Latte".to_string(),
            base: Ingredient::new("Espresso", "#3b2f2f"),
            creamer: Ingredient::new("Oat Milk", "#f5f0e1"),
            syrup: Ingredient::new("Caramel", "#c68e17"),
            temp: Temperature::Hot,
            user_id: Some(uid.into()),
        }
    }

    fn signed_in(uid: &str) -> BrewState {
        BrewState {
            user: Some(SessionUser::new(uid)),
            subscription_generation: 1,
            beverages: vec![record(uid)],
            current_beverage: Some(record(uid)),
            ..BrewState::default()
        }
    }

    #[test]
    fn test_sign_in_opens_subscription() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(BrewState::new())
            .when_action(BrewAction::SetUser {
                user: Some(SessionUser::new("uid-1")),
            })
            .then_state(|state| {
                assert_eq!(state.uid().map(ToString::to_string), Some("uid-1".to_string()));
                assert_eq!(state.subscription_generation, 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_cancels_first(effects, BEVERAGE_SUBSCRIPTION);
                assertions::assert_starts_cancellable(effects, BEVERAGE_SUBSCRIPTION);
            })
            .run();
    }

    #[test]
    fn test_sign_out_clears_and_tears_down() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(signed_in("uid-1"))
            .when_action(BrewAction::SetUser { user: None })
            .then_state(|state| {
                assert!(state.user.is_none());
                assert!(state.beverages.is_empty());
                assert!(state.current_beverage.is_none());
                assert_eq!(state.subscription_generation, 2);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_cancels_first(effects, BEVERAGE_SUBSCRIPTION);
                assertions::assert_starts_no_cancellable(effects, BEVERAGE_SUBSCRIPTION);
            })
            .run();
    }

    #[test]
    fn test_switching_user_clears_previous_beverages() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(signed_in("uid-a"))
            .when_action(BrewAction::SetUser {
                user: Some(SessionUser::new("uid-b")),
            })
            .then_state(|state| {
                assert_eq!(state.uid().map(ToString::to_string), Some("uid-b".to_string()));
                assert!(state.beverages.is_empty());
                assert!(state.current_beverage.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_cancels_first(effects, BEVERAGE_SUBSCRIPTION);
                assertions::assert_starts_cancellable(effects, BEVERAGE_SUBSCRIPTION);
            })
            .run();
    }

    #[test]
    fn test_same_user_reopens_and_keeps_beverages() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(signed_in("uid-1"))
            .when_action(BrewAction::SetUser {
                user: Some(SessionUser::new("uid-1")),
            })
            .then_state(|state| {
                assert_eq!(state.beverages.len(), 1);
                assert_eq!(state.subscription_generation, 2);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_cancels_first(effects, BEVERAGE_SUBSCRIPTION);
            })
            .run();
    }

    #[test]
    fn test_user_change_drops_previous_subscription_error() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(BrewState {
                subscription_error: Some("Beverage subscription failed: down".to_string()),
                ..signed_in("uid-1")
            })
            .when_action(BrewAction::SetUser { user: None })
            .then_state(|state| assert_eq!(state.subscription_error, None))
            .run();
    }

    #[test]
    fn test_snapshot_of_previous_session_is_ignored_after_switch() {
        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(signed_in("uid-a"))
            .when_action(BrewAction::SetUser {
                user: Some(SessionUser::new("uid-b")),
            })
            .when_action(BrewAction::BeveragesSnapshot {
                generation: 1,
                beverages: vec![record("uid-a")],
            })
            .then_state(|state| assert!(state.beverages.is_empty()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
