//! Scriptable identity provider.

use brewstand_core::identity::{IdentityProvider, IdentityStream, SessionUser};
use std::sync::Arc;
use tokio::sync::watch;

/// Identity provider driven directly by the test.
///
/// Like a real auth SDK, [`IdentityProvider::changes`] yields the current
/// identity first, then every later transition. Rapid transitions may be
/// coalesced into the latest one.
///
/// # Example
///
/// ```
/// use brewstand_testing::InMemoryIdentityProvider;
/// use brewstand_core::identity::{IdentityProvider, SessionUser};
///
/// let auth = InMemoryIdentityProvider::new();
/// assert!(auth.current().is_none());
///
/// auth.sign_in(SessionUser::new("uid-1"));
/// assert_eq!(auth.current().map(|u| u.uid.to_string()), Some("uid-1".to_string()));
/// ```
#[derive(Clone)]
pub struct InMemoryIdentityProvider {
    identity: Arc<watch::Sender<Option<SessionUser>>>,
}

impl InMemoryIdentityProvider {
    /// Create a provider with nobody signed in
    #[must_use]
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            identity: Arc::new(identity),
        }
    }

    /// Create a provider with `user` already signed in
    #[must_use]
    pub fn signed_in(user: SessionUser) -> Self {
        let provider = Self::new();
        provider.sign_in(user);
        provider
    }

    /// Sign `user` in, replacing whoever was signed in
    pub fn sign_in(&self, user: SessionUser) {
        self.identity.send_replace(Some(user));
    }

    /// Sign the current user out
    pub fn sign_out(&self) {
        self.identity.send_replace(None);
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn current(&self) -> Option<SessionUser> {
        self.identity.borrow().clone()
    }

    fn changes(&self) -> IdentityStream {
        let mut rx = self.identity.subscribe();
        Box::pin(async_stream::stream! {
            let initial = rx.borrow_and_update().clone();
            yield initial;
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                yield next;
            }
        })
    }
}
