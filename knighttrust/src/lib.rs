// KnightTrust: pre-shared-key mutual authentication (KryptoKnight handshake)
//
// Crate root: module declarations and public re-exports.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod identity;

// Re-export key types at crate root for convenience.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, NonceBFraming};
pub use crypto::keys::{KeyResolver, KeyStore, SharedKey};
pub use error::{KnightTrustError, Result};
pub use handshake::builder::EngineBuilder;
pub use handshake::messages::{Message, MessageTag};
pub use handshake::protocol::{AuthResult, Engine, Step};
pub use handshake::state::{HandshakeState, Role};
pub use identity::Identity;

/// Length of a handshake nonce in bytes.
pub const NONCE_LEN: usize = 8;
/// Length of an AES-CMAC tag in bytes.
pub const MAC_LEN: usize = 16;
/// Length of a pre-shared AES-128 key in bytes.
pub const KEY_LEN: usize = 16;
/// Default maximum payload carried in `NONCE_A`.
pub const MAX_PAYLOAD: usize = 64;
/// Longest identity accepted locally or on the wire.
pub const MAX_IDENTITY_LEN: usize = 32;
/// Largest single message on the link (one-byte length framing).
pub const MAX_MESSAGE_LEN: usize = 255;
/// Largest payload that still fits a `NONCE_B` message with payload echo.
pub const PAYLOAD_CEILING: usize = MAX_MESSAGE_LEN - 1 - NONCE_LEN - MAC_LEN;
