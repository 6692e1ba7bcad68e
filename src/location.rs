use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

/// Query parameters the provider appends to the redirect URI.
const CALLBACK_PARAMS: [&str; 3] = ["code", "state", "session_state"];

/// The page address bar.
///
/// `replace_url` mirrors `history.replaceState`: it rewrites what a reload would load
/// without navigating.
pub trait Location: Send + Sync {
    /// URL of the page as currently loaded.
    fn current_url(&self) -> Url;

    /// Rewrite the visible URL in place.
    fn replace_url(&self, url: &Url);
}

/// `code` and `state` from an authorization-code redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallbackParams {
    pub(crate) code: String,
    pub(crate) state: String,
}

impl CallbackParams {
    /// Returns `None` unless both parameters are present and non-empty.
    pub(crate) fn from_url(url: &Url) -> Option<Self> {
        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" if code.is_none() => code = Some(value.into_owned()),
                "state" if state.is_none() => state = Some(value.into_owned()),
                _ => {}
            }
        }
        match (code, state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
                Some(Self { code, state })
            }
            _ => None,
        }
    }
}

/// Removes the callback parameters, keeping every other pair in order.
#[must_use]
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// Address bar held in memory. Clones share the same URL.
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    url: Arc<Mutex<Url>>,
}

impl MemoryLocation {
    /// Address bar showing `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url: Arc::new(Mutex::new(url)),
        }
    }

    /// Simulate the provider redirecting the browser to `url`.
    pub fn navigate(&self, url: Url) {
        *self.url.lock() = url;
    }
}

impl Location for MemoryLocation {
    fn current_url(&self) -> Url {
        self.url.lock().clone()
    }

    fn replace_url(&self, url: &Url) {
        *self.url.lock() = url.clone();
    }
}
