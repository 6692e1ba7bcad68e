#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod location;
pub mod manager;
pub mod oauth;
pub mod pkce;
pub mod session;
pub mod storage;

// Re-exports for convenient access
pub use config::AuthConfig;
pub use error::Error;
pub use location::{Location, MemoryLocation, strip_callback_params};
pub use manager::AuthSessionManager;
pub use oauth::{TokenClient, TokenResponse};
pub use pkce::{
    Hasher, OsRandom, RandomSource, Sha256Hasher, generate_code_challenge, generate_code_verifier,
    generate_state,
};
pub use session::{AccessToken, Role, Session, UnknownRole};
pub use storage::{HandshakeStore, MemoryHandshakeStore, STATE_KEY, VERIFIER_KEY};
