//! The Brewstand reducer.
//!
//! Routes each [`BrewAction`] to the component that owns it. Draft edits are
//! plain field writes handled here.

use crate::config::BrewConfig;
use crate::types::{BrewAction, BrewState};
use crate::{catalog, composer, session, subscription};
use brewstand_core::document_store::DocumentStore;
use brewstand_core::effect::Effect;
use brewstand_core::reducer::Reducer;
use brewstand_core::SmallVec;
use std::sync::Arc;

/// Environment dependencies for [`BrewReducer`]
#[derive(Clone)]
pub struct BrewEnvironment {
    /// Backend holding catalogs and beverages
    pub documents: Arc<dyn DocumentStore>,
    /// Failure policies and timeouts
    pub config: BrewConfig,
}

impl BrewEnvironment {
    /// Creates an environment with the default configuration
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(documents, BrewConfig::default())
    }

    /// Creates an environment with `config`
    #[must_use]
    pub fn with_config(documents: Arc<dyn DocumentStore>, config: BrewConfig) -> Self {
        Self { documents, config }
    }
}

impl std::fmt::Debug for BrewEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrewEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reducer for the client state
#[derive(Clone, Debug, Default)]
pub struct BrewReducer;

impl BrewReducer {
    /// Creates a new `BrewReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for BrewReducer {
    type State = BrewState;
    type Action = BrewAction;
    type Environment = BrewEnvironment;

    fn reduce(
        &self,
        state: &mut BrewState,
        action: BrewAction,
        env: &BrewEnvironment,
    ) -> SmallVec<[Effect<BrewAction>; 4]> {
        match action {
            BrewAction::LoadIngredients { request } => catalog::load(state, request, env),
            BrewAction::IngredientsLoaded {
                request,
                bases,
                creamers,
                syrups,
            } => {
                catalog::apply_loaded(state, request, bases, creamers, syrups);
                SmallVec::new()
            },
            BrewAction::IngredientsLoadFailed { request, error } => {
                catalog::apply_failure(state, request, &error, env.config.catalog_failure);
                SmallVec::new()
            },

            BrewAction::SetUser { user } => session::set_user(state, user, env),

            BrewAction::BeveragesSnapshot {
                generation,
                beverages,
            } => {
                subscription::apply_snapshot(state, generation, beverages);
                SmallVec::new()
            },
            BrewAction::SubscriptionFailed { generation, error } => {
                subscription::apply_failure(
                    state,
                    generation,
                    &error,
                    env.config.subscription_failure,
                );
                SmallVec::new()
            },

            BrewAction::SelectBase { base } => {
                state.current_base = base;
                SmallVec::new()
            },
            BrewAction::SelectCreamer { creamer } => {
                state.current_creamer = creamer;
                SmallVec::new()
            },
            BrewAction::SelectSyrup { syrup } => {
                state.current_syrup = syrup;
                SmallVec::new()
            },
            BrewAction::SelectTemp { temp } => {
                state.current_temp = temp;
                SmallVec::new()
            },
            BrewAction::SetBeverageName { name } => {
                state.current_beverage_name = name;
                SmallVec::new()
            },
            BrewAction::ShowBeverage { record } => {
                state.show_beverage(record);
                SmallVec::new()
            },

            BrewAction::MakeBeverage { request } => composer::make_beverage(state, request, env),
            // Answers the caller; the record itself arrives by subscription
            BrewAction::BeverageComposed { .. } => SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ingredient, Temperature};
    use brewstand_testing::{InMemoryDocumentStore, ReducerTest, assertions};

    fn environment() -> BrewEnvironment {
        BrewEnvironment::new(Arc::new(InMemoryDocumentStore::new()))
    }

    #[test]
    fn test_draft_edits_are_plain_writes() {
        let mocha = Ingredient::new("Mocha", "#4b3621");

        ReducerTest::new(BrewReducer::new())
            .with_env(environment())
            .given_state(BrewState::new())
            .when_action(BrewAction::SelectSyrup {
                syrup: Some(mocha.clone()),
            })
            .when_action(BrewAction::SelectTemp {
                temp: Temperature::Cold,
            })
            .when_action(BrewAction::SetBeverageName {
                name: "Iced Mocha".to_string(),
            })
            .then_state(move |state| {
                assert_eq!(state.current_syrup, Some(mocha));
                assert_eq!(state.current_temp, Temperature::Cold);
                assert_eq!(state.current_beverage_name, "Iced Mocha");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_initial_state_defaults() {
        let state = BrewState::new();

        assert_eq!(state.current_temp, Temperature::Hot);
        assert_eq!(state.temps(), &Temperature::ALL);
        assert!(state.current_beverage_name.is_empty());
        assert!(!state.is_signed_in());
    }
}
