//! In-memory session store.

use async_trait::async_trait;
use dashmap::DashMap;
use saml_idp_sdk::{SessionId, SessionStore, SessionStoreError};

/// [`SessionStore`] kept in process memory, for development and tests.
///
/// Entries never expire. Pending requests of abandoned external flows stay
/// until the owner of the session lifecycle calls
/// [`InMemorySessionStore::invalidate`]. Production deployments plug in a
/// store with session expiry.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: DashMap<(SessionId, String), serde_json::Value>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes everything stored for `session`.
    pub fn invalidate(&self, session: &SessionId) {
        self.entries.retain(|(s, _), _| s != session);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, SessionStoreError> {
        Ok(self
            .entries
            .get(&(session.clone(), key.to_owned()))
            .map(|v| v.value().clone()))
    }

    async fn set(
        &self,
        session: &SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SessionStoreError> {
        self.entries.insert((session.clone(), key.to_owned()), value);
        Ok(())
    }

    async fn remove(&self, session: &SessionId, key: &str) -> Result<(), SessionStoreError> {
        self.entries.remove(&(session.clone(), key.to_owned()));
        Ok(())
    }
}
