use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;

/// Slot holding the anti-CSRF `state` of the pending handshake.
pub const STATE_KEY: &str = "ib.workbench.oidc.state";
/// Slot holding the PKCE `code_verifier` of the pending handshake.
pub const VERIFIER_KEY: &str = "ib.workbench.oidc.verifier";

/// Key-value persistence that survives the round-trip through the identity provider.
///
/// In a browser this is `sessionStorage`: scoped to one tab, so two tabs logging in at
/// once never overwrite each other's verifier. Implementations must make a successful
/// [`set`](HandshakeStore::set) visible to the next page load before returning.
pub trait HandshakeStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Delete `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
}

/// In-process tab storage. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandshakeStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryHandshakeStore {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no slot holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl HandshakeStore for MemoryHandshakeStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.slots.lock().remove(key);
    }
}
