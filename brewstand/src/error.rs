//! Error types for the client facade.

use brewstand_core::document_store::DocumentStoreError;
use brewstand_runtime::StoreError;
use thiserror::Error;

/// Errors returned by [`crate::BrewClient`]
///
/// Validation problems are not errors: [`crate::BrewClient::make_beverage`]
/// reports them as a [`crate::ComposeStatus`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrewError {
    /// A catalog could not be fetched
    #[error("Failed to load ingredients: {0}")]
    CatalogLoad(#[source] DocumentStoreError),

    /// The answer did not arrive within the request timeout
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// The store rejected the action or shut down uncleanly
    #[error(transparent)]
    Store(StoreError),
}

impl BrewError {
    /// Whether the store has stopped accepting actions
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Store(StoreError::ShutdownInProgress))
    }
}

impl From<StoreError> for BrewError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Timeout => Self::Timeout("the store"),
            other => Self::Store(other),
        }
    }
}
