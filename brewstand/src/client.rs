//! The client facade.

use crate::config::{BrewConfig, FailurePolicy};
use crate::error::BrewError;
use crate::reducer::{BrewEnvironment, BrewReducer};
use crate::session;
use crate::subscription::BEVERAGE_SUBSCRIPTION;
use crate::types::{
    BeverageRecord, BrewAction, BrewState, ComposeStatus, Ingredient, RequestId, Temperature,
};
use brewstand_core::document_store::DocumentStore;
use brewstand_core::identity::{IdentityProvider, SessionUser};
use brewstand_runtime::{Store, StoreError};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running Brewstand client
///
/// Cheap to clone; every clone drives the same state.
///
/// # Example
///
/// ```no_run
/// use brewstand::{BrewClient, BrewConfig};
/// use brewstand_core::identity::SessionUser;
/// use brewstand_testing::InMemoryDocumentStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), brewstand::BrewError> {
/// let client = BrewClient::new(Arc::new(InMemoryDocumentStore::new()), BrewConfig::default());
///
/// client.load_ingredients().await?;
/// client.set_user(Some(SessionUser::new("uid-1"))).await?;
/// client.set_beverage_name("Flat White").await?;
///
/// let status = client.make_beverage().await?;
/// println!("{status}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrewClient {
    store: Store<BrewState, BrewAction, BrewEnvironment, BrewReducer>,
}

impl BrewClient {
    /// Creates a client backed by `documents`
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, config: BrewConfig) -> Self {
        let capacity = config.broadcast_capacity;
        let environment = BrewEnvironment::with_config(documents, config);
        Self {
            store: Store::with_broadcast_capacity(
                BrewState::new(),
                BrewReducer::new(),
                environment,
                capacity,
            ),
        }
    }

    fn config(&self) -> &BrewConfig {
        &self.store.environment().config
    }

    /// Fetch all three catalogs and reset the draft selections
    ///
    /// # Errors
    ///
    /// - [`BrewError::CatalogLoad`] if a fetch failed under
    ///   [`FailurePolicy::Surface`]
    /// - [`BrewError::Timeout`] if the catalogs did not arrive in time
    #[tracing::instrument(skip(self))]
    pub async fn load_ingredients(&self) -> Result<(), BrewError> {
        let request = RequestId::new();
        let answer = self
            .request(
                BrewAction::LoadIngredients { request },
                move |action| {
                    matches!(
                        action,
                        BrewAction::IngredientsLoaded { request: r, .. }
                            | BrewAction::IngredientsLoadFailed { request: r, .. }
                            if *r == request
                    )
                },
                "ingredient catalogs",
            )
            .await?;

        match answer {
            BrewAction::IngredientsLoadFailed { error, .. }
                if self.config().catalog_failure == FailurePolicy::Surface =>
            {
                Err(BrewError::CatalogLoad(error))
            },
            _ => Ok(()),
        }
    }

    /// Switch the signed-in user, `None` to sign out
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    #[tracing::instrument(skip(self, user), fields(uid = ?user.as_ref().map(|u| u.uid.to_string())))]
    pub async fn set_user(&self, user: Option<SessionUser>) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SetUser { user }).await
    }

    /// Validate the draft and persist it as a new beverage
    ///
    /// Validation problems and write failures are reported in the returned
    /// [`ComposeStatus`], not as errors.
    ///
    /// # Errors
    ///
    /// - [`BrewError::Timeout`] if the write was not answered in time
    /// - [`BrewError::Store`] if the client is shutting down
    #[tracing::instrument(skip(self))]
    pub async fn make_beverage(&self) -> Result<ComposeStatus, BrewError> {
        let request = RequestId::new();
        let answer = self
            .request(
                BrewAction::MakeBeverage { request },
                move |action| {
                    matches!(action, BrewAction::BeverageComposed { request: r, .. } if *r == request)
                },
                "beverage write",
            )
            .await?;

        match answer {
            BrewAction::BeverageComposed { status, .. } => Ok(status),
            _ => Err(BrewError::Store(StoreError::ChannelClosed)),
        }
    }

    /// Display `record` and copy its options into the draft
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn show_beverage(&self, record: BeverageRecord) -> Result<(), BrewError> {
        self.dispatch(BrewAction::ShowBeverage { record }).await
    }

    /// Choose the draft base
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn select_base(&self, base: Option<Ingredient>) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SelectBase { base }).await
    }

    /// Choose the draft creamer
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn select_creamer(&self, creamer: Option<Ingredient>) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SelectCreamer { creamer }).await
    }

    /// Choose the draft syrup
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn select_syrup(&self, syrup: Option<Ingredient>) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SelectSyrup { syrup }).await
    }

    /// Choose the draft temperature
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn select_temp(&self, temp: Temperature) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SelectTemp { temp }).await
    }

    /// Edit the draft name
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if the client is shutting down.
    pub async fn set_beverage_name(&self, name: impl Into<String>) -> Result<(), BrewError> {
        self.dispatch(BrewAction::SetBeverageName { name: name.into() })
            .await
    }

    /// Read the current state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BrewState) -> T,
    {
        self.store.state(f).await
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BrewState {
        self.store.state(Clone::clone).await
    }

    /// Watch the state; notified after every action
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<BrewState> {
        self.store.subscribe_state()
    }

    /// Follow `provider`'s identity changes until it ends or the client shuts down
    ///
    /// Abort the returned handle to detach.
    #[must_use]
    pub fn bind_identity(&self, provider: Arc<dyn IdentityProvider>) -> JoinHandle<()> {
        session::bind(self.clone(), provider)
    }

    /// Whether the live beverage subscription is running
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.store.is_effect_active(BEVERAGE_SUBSCRIPTION)
    }

    /// Stop the subscription and wait for in-flight work
    ///
    /// # Errors
    ///
    /// Returns [`BrewError::Store`] if effects were still running after
    /// the configured shutdown timeout.
    pub async fn shutdown(&self) -> Result<(), BrewError> {
        self.store
            .shutdown(self.config().shutdown_timeout)
            .await
            .map_err(BrewError::from)
    }

    async fn dispatch(&self, action: BrewAction) -> Result<(), BrewError> {
        self.store.send(action).await?;
        Ok(())
    }

    async fn request<F>(
        &self,
        action: BrewAction,
        answered: F,
        awaiting: &'static str,
    ) -> Result<BrewAction, BrewError>
    where
        F: Fn(&BrewAction) -> bool,
    {
        self.store
            .send_and_wait_for(action, answered, self.config().request_timeout)
            .await
            .map_err(|error| match error {
                StoreError::Timeout => BrewError::Timeout(awaiting),
                other => BrewError::from(other),
            })
    }
}

impl std::fmt::Debug for BrewClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrewClient")
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}
