use std::sync::Arc;

use url::Url;

use crate::config::AuthConfig;
use crate::error::Error;
use crate::location::{CallbackParams, Location, strip_callback_params};
use crate::oauth::TokenClient;
use crate::pkce::{self, Hasher, OsRandom, RandomSource, Sha256Hasher};
use crate::session::{AccessToken, Role, Session};
use crate::storage::{HandshakeStore, STATE_KEY, VERIFIER_KEY};

/// Display name when the provider omits `preferred_username`.
const FALLBACK_USER_NAME: &str = "keycloak.user";
const DEMO_TOKEN_PREFIX: &str = "mock-token-";

/// Owns the console session of one browser tab and drives the OIDC
/// Authorization Code + PKCE handshake.
///
/// Created once at the application root and handed to whatever renders the console.
/// The pending handshake lives in the [`HandshakeStore`], not in this struct: the tab
/// navigates to the provider and comes back as a fresh page load, so a new manager
/// built over the same store and [`Location`] picks up where the old one left off.
///
/// ```rust,ignore
/// let mut auth = AuthSessionManager::new(session_storage, address_bar);
///
/// // Fresh load: complete a pending handshake if the provider just redirected back.
/// if let Err(e) = auth.handle_oidc_callback(&config).await {
///     show_login_error(e);
/// }
///
/// match auth.session() {
///     Some(session) => render_console(session),
///     None => {
///         let url = auth.build_pkce_login_url(&config, None)?;
///         navigate_to(url);
///     }
/// }
/// ```
pub struct AuthSessionManager {
    session: Option<Session>,
    store: Arc<dyn HandshakeStore>,
    location: Arc<dyn Location>,
    random: Arc<dyn RandomSource>,
    hasher: Arc<dyn Hasher>,
    token_client: TokenClient,
}

impl AuthSessionManager {
    /// Create a logged-out manager using OS randomness and SHA-256.
    #[must_use]
    pub fn new(
        store: impl HandshakeStore + 'static,
        location: impl Location + 'static,
    ) -> Self {
        Self {
            session: None,
            store: Arc::new(store),
            location: Arc::new(location),
            random: Arc::new(OsRandom),
            hasher: Arc::new(Sha256Hasher),
            token_client: TokenClient::new(),
        }
    }

    /// Replace the random source used for state, verifier and demo tokens.
    #[must_use]
    pub fn with_random_source(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Arc::new(random);
        self
    }

    /// Replace the SHA-256 implementation used for the code challenge.
    #[must_use]
    pub fn with_hasher(mut self, hasher: impl Hasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Use a custom HTTP client for the token exchange.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.token_client = self.token_client.with_http_client(client);
        self
    }

    /// Current session, or `None` when logged out.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Demo login without an identity provider. Replaces any existing session.
    pub fn login(&mut self, role: Role) -> &Session {
        let token = format!(
            "{DEMO_TOKEN_PREFIX}{}",
            pkce::generate_token_suffix(self.random.as_ref())
        );
        tracing::info!(role = %role, "Demo login");
        self.session
            .insert(Session::new(format!("demo.{role}"), role, AccessToken::from(token)))
    }

    /// Drop the session. The provider is not contacted; see [`Self::build_logout_url`].
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(user = %session.user_name, "Logged out");
        }
    }

    /// Prepare the provider authorization URL and persist the handshake secrets.
    ///
    /// A fresh verifier is generated on every call; `state` is generated unless supplied.
    /// The caller navigates to the returned URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the supplied `state` is empty: the provider would echo it
    ///   back as `state=`, which is not recognised as a callback.
    /// - [`Error::Storage`] if the secrets could not be persisted. No URL is produced in
    ///   that case, since the callback could never be verified.
    pub fn build_pkce_login_url(
        &self,
        config: &AuthConfig,
        state: Option<&str>,
    ) -> Result<Url, Error> {
        let state = match state {
            Some("") => return Err(Error::Config("state must not be empty".into())),
            Some(s) => s.to_string(),
            None => pkce::generate_state(self.random.as_ref()),
        };
        let code_verifier = pkce::generate_code_verifier(self.random.as_ref());
        let code_challenge = pkce::generate_code_challenge(self.hasher.as_ref(), &code_verifier);

        self.store.set(STATE_KEY, &state)?;
        if let Err(e) = self.store.set(VERIFIER_KEY, &code_verifier) {
            self.store.remove(STATE_KEY);
            return Err(e);
        }

        let mut url = config.authorization_endpoint();
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid profile")
            .append_pair("redirect_uri", config.redirect_uri.as_str())
            .append_pair("state", &state)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", &code_challenge);

        tracing::debug!(realm = %config.realm, client_id = %config.client_id, "Prepared PKCE login URL");
        Ok(url)
    }

    /// Complete a pending handshake if the current URL is a provider callback.
    ///
    /// Returns `Ok(None)` without side effects when the URL carries no `code`/`state`.
    /// On success the session is replaced, the callback parameters are removed from the
    /// address bar and the persisted secrets are deleted.
    ///
    /// On failure the session is left untouched, and the callback parameters and secrets
    /// are cleared all the same so a reload lands on the logged-out view.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCallbackState`] if the persisted state or verifier is missing or
    ///   the state does not match. Checked before any network call.
    /// - [`Error::TokenExchangeFailed`] if the token endpoint fails or is unreachable.
    pub async fn handle_oidc_callback(
        &mut self,
        config: &AuthConfig,
    ) -> Result<Option<&Session>, Error> {
        let current = self.location.current_url();
        let Some(params) = CallbackParams::from_url(&current) else {
            tracing::debug!("No OIDC callback in URL");
            return Ok(None);
        };

        let result = self.complete_handshake(config, &params).await;
        self.location.replace_url(&strip_callback_params(&current));
        self.store.remove(STATE_KEY);
        self.store.remove(VERIFIER_KEY);

        let session = result?;
        tracing::info!(user = %session.user_name, "OIDC login successful");
        let session: &Session = self.session.insert(session);
        Ok(Some(session))
    }

    async fn complete_handshake(
        &self,
        config: &AuthConfig,
        params: &CallbackParams,
    ) -> Result<Session, Error> {
        let expected_state = self.store.get(STATE_KEY);
        let code_verifier = self.store.get(VERIFIER_KEY);
        let code_verifier = match (expected_state, code_verifier) {
            (Some(expected), Some(verifier)) if expected == params.state => verifier,
            (expected, verifier) => {
                tracing::warn!(
                    has_state = expected.is_some(),
                    has_verifier = verifier.is_some(),
                    "OAuth state mismatch"
                );
                return Err(Error::InvalidCallbackState);
            }
        };

        let token = self
            .token_client
            .exchange_code(config, &params.code, &code_verifier)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Token exchange failed"))?;

        let access_token = token
            .access_token
            .ok_or_else(|| Error::exchange("no access_token"))?;
        let user_name = token
            .preferred_username
            .unwrap_or_else(|| FALLBACK_USER_NAME.to_string());

        Ok(Session::new(user_name, Role::Operator, AccessToken::from(access_token)))
    }

    /// Provider logout URL. Pure; the caller navigates.
    #[must_use]
    pub fn build_logout_url(config: &AuthConfig) -> Url {
        let mut url = config.end_session_endpoint();
        url.query_pairs_mut()
            .append_pair(
                "post_logout_redirect_uri",
                config.post_logout_redirect_uri.as_str(),
            )
            .append_pair("client_id", &config.client_id);
        url
    }

    /// [`Self::logout`] followed by [`Self::build_logout_url`].
    pub fn logout_url(&mut self, config: &AuthConfig) -> Url {
        self.logout();
        Self::build_logout_url(config)
    }
}
