use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_AUTHORITY: &str = "http://localhost:8080";
const DEFAULT_REALM: &str = "master";
const DEFAULT_CLIENT_ID: &str = "integration-broker-workbench";
const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider settings for the operator console.
///
/// Required fields are constructor parameters, so a built config is always complete.
/// Endpoints follow the Keycloak layout:
/// `{authority}/realms/{realm}/protocol/openid-connect/{auth,token,logout}`.
///
/// ```rust,ignore
/// use workbench_auth::AuthConfig;
///
/// let config = AuthConfig::new(
///     "https://sso.example.com".parse()?,
///     "broker",
///     "integration-broker-workbench",
///     "https://console.example.com/".parse()?,
///     "https://console.example.com/".parse()?,
/// )?
/// .with_exchange_timeout(std::time::Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthConfig {
    pub(crate) authority: Url,
    pub(crate) realm: String,
    pub(crate) client_id: String,
    pub(crate) redirect_uri: Url,
    pub(crate) post_logout_redirect_uri: Url,
    pub(crate) exchange_timeout: Duration,
}

impl AuthConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the authority is not an `http`/`https` URL, or the
    /// realm or client id is empty.
    pub fn new(
        authority: Url,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: Url,
        post_logout_redirect_uri: Url,
    ) -> Result<Self, Error> {
        if authority.cannot_be_a_base() || !matches!(authority.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "authority must be an http(s) URL, got {authority}"
            )));
        }
        let realm = realm.into();
        if realm.is_empty() {
            return Err(Error::Config("realm must not be empty".into()));
        }
        let client_id = client_id.into();
        if client_id.is_empty() {
            return Err(Error::Config("client id must not be empty".into()));
        }

        Ok(Self {
            authority,
            realm,
            client_id,
            redirect_uri,
            post_logout_redirect_uri,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `WORKBENCH_OIDC_REDIRECT_URI`: console URL the provider redirects back to
    ///
    /// # Optional env vars
    /// - `WORKBENCH_OIDC_AUTHORITY`: provider base URL (default `http://localhost:8080`)
    /// - `WORKBENCH_OIDC_REALM`: realm (default `master`)
    /// - `WORKBENCH_OIDC_CLIENT_ID`: public client id (default `integration-broker-workbench`)
    /// - `WORKBENCH_OIDC_LOGOUT_REDIRECT_URI`: post-logout target (default: the redirect URI)
    /// - `WORKBENCH_OIDC_EXCHANGE_TIMEOUT_SECS`: token exchange timeout (default `10`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the redirect URI is missing, any value fails to parse, or
    /// the resulting configuration is rejected by [`AuthConfig::new`].
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let authority = parse_url(
            "WORKBENCH_OIDC_AUTHORITY",
            &lookup("WORKBENCH_OIDC_AUTHORITY").unwrap_or_else(|| DEFAULT_AUTHORITY.into()),
        )?;
        let realm = lookup("WORKBENCH_OIDC_REALM").unwrap_or_else(|| DEFAULT_REALM.into());
        let client_id =
            lookup("WORKBENCH_OIDC_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.into());

        let redirect_uri = lookup("WORKBENCH_OIDC_REDIRECT_URI")
            .ok_or_else(|| Error::Config("WORKBENCH_OIDC_REDIRECT_URI is required".into()))
            .and_then(|s| parse_url("WORKBENCH_OIDC_REDIRECT_URI", &s))?;
        let post_logout_redirect_uri = match lookup("WORKBENCH_OIDC_LOGOUT_REDIRECT_URI") {
            Some(s) => parse_url("WORKBENCH_OIDC_LOGOUT_REDIRECT_URI", &s)?,
            None => redirect_uri.clone(),
        };

        let mut config =
            Self::new(authority, realm, client_id, redirect_uri, post_logout_redirect_uri)?;

        if let Some(secs) = lookup("WORKBENCH_OIDC_EXCHANGE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Error::Config(format!("WORKBENCH_OIDC_EXCHANGE_TIMEOUT_SECS: {e}"))
            })?;
            config = config.with_exchange_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Upper bound for the token exchange round-trip. Expiry surfaces as
    /// [`Error::TokenExchangeFailed`].
    #[must_use]
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Identity provider base URL.
    #[must_use]
    pub fn authority(&self) -> &Url {
        &self.authority
    }

    /// Realm (tenant) name.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Public `OAuth2` client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Where the provider redirects after login.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Where the provider redirects after logout.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> &Url {
        &self.post_logout_redirect_uri
    }

    /// Token exchange timeout.
    #[must_use]
    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    /// Browser redirect target for the authorization request.
    #[must_use]
    pub fn authorization_endpoint(&self) -> Url {
        self.endpoint("auth")
    }

    /// Form-encoded code-for-token exchange endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> Url {
        self.endpoint("token")
    }

    /// Browser redirect target for logout.
    #[must_use]
    pub fn end_session_endpoint(&self) -> Url {
        self.endpoint("logout")
    }

    fn endpoint(&self, action: &str) -> Url {
        let mut url = self.authority.clone();
        url.set_query(None);
        url.set_fragment(None);
        // `new` only accepts http(s) authorities, which always have a path.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "realms",
                self.realm.as_str(),
                "protocol",
                "openid-connect",
                action,
            ]);
        }
        url
    }
}

fn parse_url(var: &str, value: &str) -> Result<Url, Error> {
    value
        .parse()
        .map_err(|e| Error::Config(format!("{var}: {e}")))
}
