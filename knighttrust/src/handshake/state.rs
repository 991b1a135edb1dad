// Handshake state machine.

use bytes::Bytes;

use crate::crypto::keys::SharedKey;
use crate::crypto::rng::Nonce;
use crate::identity::Identity;

/// Which side of the handshake an engine plays. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Starts the handshake and supplies the payload.
    Initiator,
    /// Answers the initiator and receives the payload.
    Responder,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Initiator => "initiator",
            Role::Responder => "responder",
        }
    }
}

/// Remote principal and key found by the identity resolver.
#[derive(Debug, Clone)]
pub struct ResolvedPeer {
    pub identity: Identity,
    pub key: SharedKey,
}

/// Initiator material held between `NONCE_A` and `NONCE_B`.
#[derive(Debug)]
pub struct InitiatorAttempt {
    pub n_a: Nonce,
    pub payload: Bytes,
    /// Identity the responder must prove in `MAC_BA`.
    pub responder: Identity,
    pub key: SharedKey,
}

/// Responder material held between `NONCE_B` and `MAC_CONFIRM`.
#[derive(Debug)]
pub struct ResponderAttempt {
    pub n_a: Nonce,
    pub n_b: Nonce,
    pub payload: Bytes,
    pub key: SharedKey,
    /// Claimed initiator identity, when it arrived in `ID_B`.
    pub peer: Option<Identity>,
}

/// The current state of one engine.
///
/// Each variant owns the material of the attempt in flight, so leaving a
/// state drops (and zeroizes) its nonces and keys.
#[derive(Debug)]
pub enum HandshakeState {
    /// Initiator waiting for the host to call `start`.
    Idle,

    /// Discovery responder waiting for `ID_B`.
    AwaitingRemoteIdentity,

    /// Responder waiting for `NONCE_A`. `peer` is set once `ID_B` resolved a
    /// key; `None` means the engine's static key applies.
    AwaitingNonceA { peer: Option<ResolvedPeer> },

    /// Initiator has sent `NONCE_A`.
    AwaitingNonceB(InitiatorAttempt),

    /// Responder has sent `NONCE_B`.
    AwaitingConfirmation(ResponderAttempt),
}

impl HandshakeState {
    /// Human-readable label for the current state (used in logs and errors).
    pub fn label(&self) -> &'static str {
        match self {
            HandshakeState::Idle => "Idle",
            HandshakeState::AwaitingRemoteIdentity => "AwaitingRemoteIdentity",
            HandshakeState::AwaitingNonceA { .. } => "AwaitingNonceA",
            HandshakeState::AwaitingNonceB(_) => "AwaitingNonceB",
            HandshakeState::AwaitingConfirmation(_) => "AwaitingConfirmation",
        }
    }

    /// The state an engine starts in and returns to after every attempt.
    pub fn initial(role: Role, identity_discovery: bool) -> Self {
        match (role, identity_discovery) {
            (Role::Initiator, _) => HandshakeState::Idle,
            (Role::Responder, true) => HandshakeState::AwaitingRemoteIdentity,
            (Role::Responder, false) => HandshakeState::AwaitingNonceA { peer: None },
        }
    }

    /// True when no attempt is in flight.
    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            HandshakeState::Idle
                | HandshakeState::AwaitingRemoteIdentity
                | HandshakeState::AwaitingNonceA { peer: None }
        )
    }
}
