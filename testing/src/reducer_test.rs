//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use brewstand_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use brewstand_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(BrewReducer::new())
///     .with_env(test_environment())
///     .given_state(BrewState::default())
///     .when_action(BrewAction::SetBeverageName { name: "Mocha".into() })
///     .then_state(|state| {
///         assert_eq!(state.current_beverage_name, "Mocha");
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    ///
    /// Several actions are reduced in order; effect assertions see the
    /// effects of the last one.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use brewstand_core::effect::{Effect, EffectId};

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect is not `Effect::None`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}: {:?}",
            expected,
            effects.len(),
            effects
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but found {effects:?}"
        );
    }

    /// Assert that the first effect cancels `id`
    ///
    /// # Panics
    ///
    /// Panics if the first effect is anything else.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels_first<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            matches!(effects.first(), Some(Effect::Cancel(cancelled)) if *cancelled == id),
            "Expected Cancel({id}) as first effect, but found {effects:?}"
        );
    }

    /// Assert that some effect starts a cancellable effect under `id`
    ///
    /// # Panics
    ///
    /// Panics if no such effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_starts_cancellable<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: started, .. } if *started == id)),
            "Expected a Cancellable({id}) effect, but found {effects:?}"
        );
    }

    /// Assert that no effect starts a cancellable effect under `id`
    ///
    /// # Panics
    ///
    /// Panics if such an effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_starts_no_cancellable<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: started, .. } if *started == id)),
            "Expected no Cancellable({id}) effect, but found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewstand_core::effect::EffectId;
    use brewstand_core::{SmallVec, smallvec};

    const FEED: EffectId = EffectId::new("feed");

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Watch,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Watch => smallvec![
                    Effect::Cancel(FEED),
                    Effect::Stream(Box::pin(futures::stream::empty())).cancellable(FEED),
                ],
            }
        }
    }

    #[test]
    fn test_reducer_test_basic() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(state.count, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_multiple_actions_accumulate_state() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(state.count, 2))
            .run();
    }

    #[test]
    fn test_cancellation_assertions() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Watch)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_cancels_first(effects, FEED);
                assertions::assert_starts_cancellable(effects, FEED);
            })
            .run();
    }
}
