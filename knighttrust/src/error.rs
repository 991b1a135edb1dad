// KnightTrust error types

use thiserror::Error;

/// Top-level error type for the KnightTrust crate.
///
/// Handshake failures are only ever visible to the host as
/// `AuthResult::NoAuthentication`; the variants exist for logging and for
/// the fallible setup paths (`start`, builders, config loading).
#[derive(Debug, Error)]
pub enum KnightTrustError {
    // ── Handshake errors ────────────────────────────────────────────────
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("malformed {tag} message: expected {expected} bytes, got {actual}")]
    MalformedMessage {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown message tag: 0x{0:02x}")]
    UnknownMessageTag(u8),

    #[error("MAC verification failed")]
    MacMismatch,

    #[error("echoed payload does not match the payload sent")]
    PayloadEchoMismatch,

    #[error("handshake timeout")]
    Timeout,

    #[error("no shared key available for remote identity")]
    NoKeyAvailable,

    #[error("unexpected {tag} message in state {state}")]
    UnexpectedMessage {
        state: &'static str,
        tag: &'static str,
    },

    #[error("operation requires the {expected} role")]
    WrongRole { expected: &'static str },

    // ── Setup errors ────────────────────────────────────────────────────
    #[error("identity length {len} outside 1..={max}")]
    IdentityLength { len: usize, max: usize },

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("random number generation failed: {0}")]
    Rng(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, KnightTrustError>;
