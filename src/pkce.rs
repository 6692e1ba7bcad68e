use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Source of cryptographically secure random bytes.
///
/// Injected into [`AuthSessionManager`](crate::AuthSessionManager) so tests can pin
/// the generated verifier, state and demo tokens.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// SHA-256 digest capability used to derive the S256 code challenge.
pub trait Hasher: Send + Sync {
    /// SHA-256 digest of `input`.
    fn sha256(&self, input: &[u8]) -> [u8; 32];
}

/// Thread-local CSPRNG seeded from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        rand::rng().fill_bytes(dest);
    }
}

/// [`Hasher`] backed by the `sha2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn sha256(&self, input: &[u8]) -> [u8; 32] {
        Sha256::digest(input).into()
    }
}

/// Generates a code verifier for PKCE.
///
/// Returns a 64-character URL-safe string (48 random bytes, RFC 7636 compliant, 43-128 chars).
#[must_use]
pub fn generate_code_verifier(random: &dyn RandomSource) -> String {
    let mut bytes = [0u8; 48];
    random.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
#[must_use]
pub fn generate_code_challenge(hasher: &dyn Hasher, verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(hasher.sha256(verifier.as_bytes()))
}

/// Generates an anti-CSRF state parameter: 32 lowercase hex characters.
#[must_use]
pub fn generate_state(random: &dyn RandomSource) -> String {
    random_hex(random)
}

/// Random suffix for demo access tokens (`mock-token-<suffix>`).
#[must_use]
pub fn generate_token_suffix(random: &dyn RandomSource) -> String {
    random_hex(random)
}

fn random_hex(random: &dyn RandomSource) -> String {
    let mut bytes = [0u8; 16];
    random.fill_bytes(&mut bytes);
    hex::encode(bytes)
}


#[cfg(test)]
mod tests {
    use super::testing::{CountingRandom, EchoHasher};
    use super::*;

    #[test]
    fn code_verifier_length() {
        let verifier = generate_code_verifier(&OsRandom);
        assert_eq!(verifier.len(), 64);
    }

    #[test]
    fn code_verifier_unreserved_alphabet() {
        let verifier = generate_code_verifier(&OsRandom);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')),
            "verifier should only use unreserved characters: {}",
            verifier
        );
    }

    #[test]
    fn code_verifier_uniqueness() {
        let v1 = generate_code_verifier(&OsRandom);
        let v2 = generate_code_verifier(&OsRandom);
        assert_ne!(v1, v2, "verifiers should be unique");
    }

    #[test]
    fn code_verifier_from_injected_random() {
        let random = CountingRandom::default();
        assert_eq!(generate_code_verifier(&random), "A".repeat(64));
        // 0x01 repeated: base64 groups of "AQEB"
        assert_eq!(generate_code_verifier(&random), "AQEB".repeat(16));
    }

    #[test]
    fn code_challenge_rfc7636_vector() {
        // RFC 7636 Appendix B
        let challenge =
            generate_code_challenge(&Sha256Hasher, "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn code_challenge_uses_injected_hasher() {
        let challenge = generate_code_challenge(&EchoHasher, "abc");
        let mut expected = [0u8; 32];
        expected[..3].copy_from_slice(b"abc");
        assert_eq!(challenge, URL_SAFE_NO_PAD.encode(expected));
        assert!(!challenge.contains('='));
    }

    #[test]
    fn code_challenge_different_for_different_verifiers() {
        let c1 = generate_code_challenge(&Sha256Hasher, "verifier_1");
        let c2 = generate_code_challenge(&Sha256Hasher, "verifier_2");
        assert_ne!(c1, c2);
    }

    #[test]
    fn state_is_hex() {
        let state = generate_state(&OsRandom);
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn state_uniqueness() {
        let s1 = generate_state(&OsRandom);
        let s2 = generate_state(&OsRandom);
        assert_ne!(s1, s2, "states should be unique");
    }

    #[test]
    fn token_suffix_from_injected_random() {
        let random = CountingRandom::default();
        assert_eq!(generate_token_suffix(&random), "0".repeat(32));
        assert_eq!(generate_token_suffix(&random), "01".repeat(16));
    }
}
