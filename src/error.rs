#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Callback `state` is missing, does not match, or the persisted verifier is gone.
    #[error("Invalid OIDC callback state")]
    InvalidCallbackState,
    /// Token endpoint rejected the code, answered without a token, or was unreachable.
    #[error("Token exchange failed{}: {detail}", http_status(.status))]
    TokenExchangeFailed { status: Option<u16>, detail: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Handshake storage error: {0}")]
    Storage(String),
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    pub(crate) fn exchange(detail: impl Into<String>) -> Self {
        Self::TokenExchangeFailed {
            status: None,
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::TokenExchangeFailed {
            status: e.status().map(|s| s.as_u16()),
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_exchange_message_includes_status() {
        let err = Error::TokenExchangeFailed {
            status: Some(400),
            detail: "invalid_grant".into(),
        };
        assert_eq!(err.to_string(), "Token exchange failed (HTTP 400): invalid_grant");
    }

    #[test]
    fn token_exchange_message_without_status() {
        let err = Error::exchange("no access_token");
        assert_eq!(err.to_string(), "Token exchange failed: no access_token");
    }
}
