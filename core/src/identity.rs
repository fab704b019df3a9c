//! Identity provider abstraction.
//!
//! The authenticated identity is owned by an external auth collaborator. The
//! client only observes it: it needs a stable unique identifier for the
//! signed-in user and a notification whenever the identity changes.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// Stable unique identifier of an authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new `UserId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The signed-in user as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Stable unique identifier
    pub uid: UserId,
    /// Optional human-readable name, informational only
    pub display_name: Option<String>,
}

impl SessionUser {
    /// Create a user with no display name
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Attach a display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Identity transitions: `Some(user)` when signed in, `None` when signed out.
pub type IdentityStream = Pin<Box<dyn Stream<Item = Option<SessionUser>> + Send>>;

/// External authentication collaborator.
///
/// # Examples
///
/// ```ignore
/// let mut changes = provider.changes();
/// while let Some(identity) = changes.next().await {
///     client.set_user(identity).await?;
/// }
/// ```
pub trait IdentityProvider: Send + Sync {
    /// The identity right now
    fn current(&self) -> Option<SessionUser>;

    /// Stream of identity changes.
    ///
    /// Yields the current identity first, then every subsequent transition.
    fn changes(&self) -> IdentityStream;
}
