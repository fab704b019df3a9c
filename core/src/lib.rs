//! # Brewstand Core
//!
//! Core traits and types for the Brewstand client state container.
//!
//! This crate provides the fundamental abstractions the rest of the workspace
//! is built on:
//!
//! - **State**: The observable client state (catalogs, drafts, beverages, user)
//! - **Action**: All possible inputs to a reducer (user intents and backend results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected backend seams ([`document_store::DocumentStore`],
//!   [`identity::IdentityProvider`])
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use brewstand_core::*;
//!
//! impl Reducer for BrewReducer {
//!     type State = BrewState;
//!     type Action = BrewAction;
//!     type Environment = BrewEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BrewState,
//!         action: BrewAction,
//!         env: &BrewEnvironment,
//!     ) -> SmallVec<[Effect<BrewAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Document store abstraction (collections of schema-less documents)
pub mod document_store;

/// Identity provider abstraction (the external auth collaborator)
pub mod identity;

/// Declarative macros for building effects
mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for BrewReducer {
    ///     type State = BrewState;
    ///     type Action = BrewAction;
    ///     type Environment = BrewEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut BrewState,
    ///         action: BrewAction,
    ///         env: &BrewEnvironment,
    ///     ) -> SmallVec<[Effect<BrewAction>; 4]> {
    ///         match action {
    ///             BrewAction::ShowBeverage { record } => {
    ///                 state.show(record);
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Effects are executed by the runtime in the order they are returned.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and can be made cancellable.
pub mod effect {
    use futures::Stream;
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;

    /// Identifier for a cancellable effect
    ///
    /// At most one effect runs per identifier: registering a new cancellable
    /// effect under an occupied id cancels the previous one first.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an effect id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// The name this id was created with
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Long-running source of actions
        ///
        /// Every item is fed back into the reducer in order. The effect completes
        /// when the stream ends.
        Stream(Pin<Box<dyn Stream<Item = Action> + Send>>),

        /// Run `effect` so it can later be cancelled through `id`
        Cancellable {
            /// Cancellation identifier
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Cancel the running effect registered under this id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Stream(_) => write!(f, "Effect::Stream(<stream>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap this effect so it can be cancelled through `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Self {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Whether this effect is a no-op
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}
