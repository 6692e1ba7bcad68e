use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Console authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("admin")]
    Admin,
    #[default]
    #[display("operator")]
    Operator,
    #[display("auditor")]
    Auditor,
    #[display("support")]
    Support,
}

impl Role {
    /// Every role, in the order the console lists them.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Operator, Role::Auditor, Role::Support];
}

/// A role name that is not one of [`Role::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Bearer token issued by the identity provider (or synthesized for demo logins).
///
/// Opaque to this crate. `Debug` is redacted so sessions can be logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Who is logged in to the console.
///
/// Absence of a `Session` means logged out; `authenticated` is always `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Session {
    pub authenticated: bool,
    pub user_name: String,
    pub role: Role,
    pub access_token: AccessToken,
}

impl Session {
    pub(crate) fn new(user_name: impl Into<String>, role: Role, access_token: AccessToken) -> Self {
        Self {
            authenticated: true,
            user_name: user_name.into(),
            role,
            access_token,
        }
    }

    /// `Authorization` header value for broker REST calls.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.as_str())
    }
}
