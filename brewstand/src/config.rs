//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a backend read fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the previous data, record the error in the state and report the failure
    #[default]
    Surface,
    /// Clear the affected data and log a warning
    Quiet,
}

/// Configuration for [`crate::BrewClient`]
///
/// # Example
///
/// ```
/// use brewstand::{BrewConfig, FailurePolicy};
/// use std::time::Duration;
///
/// let config = BrewConfig::default()
///     .with_catalog_failure(FailurePolicy::Quiet)
///     .with_request_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.catalog_failure, FailurePolicy::Quiet);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewConfig {
    /// Policy for failed catalog loads
    pub catalog_failure: FailurePolicy,
    /// Policy for a failed beverage subscription
    pub subscription_failure: FailurePolicy,
    /// How long request operations wait for their answer
    pub request_timeout: Duration,
    /// How long shutdown waits for running effects
    pub shutdown_timeout: Duration,
    /// Capacity of the store's action broadcast
    pub broadcast_capacity: usize,
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self {
            catalog_failure: FailurePolicy::Surface,
            subscription_failure: FailurePolicy::Surface,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
            broadcast_capacity: brewstand_runtime::DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl BrewConfig {
    /// Set the catalog failure policy
    #[must_use]
    pub const fn with_catalog_failure(mut self, policy: FailurePolicy) -> Self {
        self.catalog_failure = policy;
        self
    }

    /// Set the subscription failure policy
    #[must_use]
    pub const fn with_subscription_failure(mut self, policy: FailurePolicy) -> Self {
        self.subscription_failure = policy;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}
