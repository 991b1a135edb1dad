// Engine builder: fluent API for wiring an engine to its capabilities.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::crypto::keys::{KeyResolver, SharedKey};
use crate::crypto::mac::{AesCmac, MacProvider};
use crate::crypto::rng::{NonceSource, OsNonceSource};
use crate::error::Result;
use crate::handshake::protocol::{Capabilities, Engine};
use crate::handshake::state::Role;
use crate::identity::Identity;

/// Builder for an [`Engine`].
///
/// Unset capabilities fall back to OS randomness, AES-CMAC and the system
/// clock.
///
/// # Example
/// ```ignore
/// let engine = EngineBuilder::initiator(Identity::try_from("A")?)
///     .shared_key(key)
///     .build()?;
/// ```
pub struct EngineBuilder {
    role: Role,
    local_id: Identity,
    config: EngineConfig,
    shared_key: Option<SharedKey>,
    resolver: Option<Box<dyn KeyResolver>>,
    rng: Option<Box<dyn NonceSource>>,
    mac: Option<Box<dyn MacProvider>>,
    clock: Option<Box<dyn Clock>>,
}

impl EngineBuilder {
    pub fn new(role: Role, local_id: Identity) -> Self {
        Self {
            role,
            local_id,
            config: EngineConfig::default(),
            shared_key: None,
            resolver: None,
            rng: None,
            mac: None,
            clock: None,
        }
    }

    pub fn initiator(local_id: Identity) -> Self {
        Self::new(Role::Initiator, local_id)
    }

    pub fn responder(local_id: Identity) -> Self {
        Self::new(Role::Responder, local_id)
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Static-peer key, used whenever no resolver supplies one.
    pub fn shared_key(mut self, key: SharedKey) -> Self {
        self.shared_key = Some(key);
        self
    }

    /// Per-identity key lookup. On an initiator it picks the key for the
    /// identity passed to `start`; on a discovery responder it answers `ID_B`.
    pub fn key_resolver(mut self, resolver: impl KeyResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn nonce_source(mut self, rng: impl NonceSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn mac(mut self, mac: impl MacProvider + 'static) -> Self {
        self.mac = Some(Box::new(mac));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate the configuration and produce the engine in its initial state.
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        Ok(Engine::from_parts(
            self.role,
            self.local_id,
            self.config,
            self.shared_key,
            self.resolver,
            Capabilities {
                rng: self.rng.unwrap_or_else(|| Box::new(OsNonceSource)),
                mac: self.mac.unwrap_or_else(|| Box::new(AesCmac)),
                clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            },
        ))
    }
}
