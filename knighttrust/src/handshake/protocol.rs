// KnightTrust handshake protocol: four-message pre-shared-key mutual authentication.
//
//   Initiator                                   Responder
//     |--- [ID_B] (discovery variant only) ------->|  resolve key
//     |--- NONCE_A: N_A, payload ----------------->|
//     |<-- NONCE_B: MAC_BA, N_B -------------------|
//     |--- MAC_CONFIRM: MAC_AB ------------------->|  deliver payload
//
// Based on P. Janson, G. Tsudik, M. Yung, "Scalability and Flexibility in
// Authentication Services: The KryptoKnight Approach", IEEE Infocom 97.

use std::time::Instant;

use bytes::Bytes;

use crate::clock::Clock;
use crate::config::{EngineConfig, NonceBFraming};
use crate::crypto::keys::{KeyResolver, SharedKey};
use crate::crypto::mac::{tags_match, MacProvider, MacTag};
use crate::crypto::rng::{Nonce, NonceSource};
use crate::error::{KnightTrustError, Result};
use crate::handshake::builder::EngineBuilder;
use crate::handshake::mac_input::{mac_ab, mac_ba};
use crate::handshake::messages::Message;
use crate::handshake::state::{
    HandshakeState, InitiatorAttempt, ResolvedPeer, ResponderAttempt, Role,
};
use crate::identity::Identity;
use crate::NONCE_LEN;

/// Outcome code of a `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    /// Nothing received and nothing in flight.
    Idle,
    /// A handshake is in progress.
    Busy,
    /// The message was rejected and the engine reset. Corruption, a wrong key
    /// and impersonation are deliberately indistinguishable.
    NoAuthentication,
    /// The initiator verified the responder and sent its confirmation.
    AuthenticatedAsInitiator,
    /// The responder verified the initiator; the payload is delivered.
    AuthenticatedAsPeer,
}

/// Everything a single `step` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub result: AuthResult,
    /// Message to hand to the transport, if any.
    pub outbound: Option<Bytes>,
    /// Authenticated payload (responder success only).
    pub delivered: Option<Bytes>,
    /// Identity of the authenticated counterpart, when known.
    pub peer: Option<Identity>,
}

impl Step {
    fn status(result: AuthResult) -> Self {
        Self {
            result,
            outbound: None,
            delivered: None,
            peer: None,
        }
    }

    fn reply(outbound: Bytes) -> Self {
        Self {
            outbound: Some(outbound),
            ..Self::status(AuthResult::Busy)
        }
    }
}

/// Host callback receiving the authenticated payload.
pub type AuthenticatedHandler = Box<dyn FnMut(&[u8]) + Send>;

/// Injected collaborators the engine cannot do without.
pub(crate) struct Capabilities {
    pub rng: Box<dyn NonceSource>,
    pub mac: Box<dyn MacProvider>,
    pub clock: Box<dyn Clock>,
}

/// One principal's protocol engine.
///
/// Poll-driven and not reentrant: `start`, `step` and `reset` take
/// `&mut self`, so concurrent use needs external serialization.
pub struct Engine {
    role: Role,
    local_id: Identity,
    config: EngineConfig,
    shared_key: Option<SharedKey>,
    resolver: Option<Box<dyn KeyResolver>>,
    caps: Capabilities,
    state: HandshakeState,
    /// Time of the last message sent or received in the current attempt.
    last_activity: Option<Instant>,
    on_authenticated: Option<AuthenticatedHandler>,
}

impl Engine {
    pub fn builder(role: Role, local_id: Identity) -> EngineBuilder {
        EngineBuilder::new(role, local_id)
    }

    pub(crate) fn from_parts(
        role: Role,
        local_id: Identity,
        config: EngineConfig,
        shared_key: Option<SharedKey>,
        resolver: Option<Box<dyn KeyResolver>>,
        caps: Capabilities,
    ) -> Self {
        let state = HandshakeState::initial(role, config.identity_discovery);
        Self {
            role,
            local_id,
            config,
            shared_key,
            resolver,
            caps,
            state,
            last_activity: None,
            on_authenticated: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_identity(&self) -> &Identity {
        &self.local_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// True when no attempt is in flight.
    pub fn is_idle(&self) -> bool {
        self.state.is_initial()
    }

    /// Register the callback that receives the payload once the initiator
    /// has been authenticated (responder side).
    pub fn on_authenticated(&mut self, handler: impl FnMut(&[u8]) + Send + 'static) {
        self.on_authenticated = Some(Box::new(handler));
    }

    /// Register the identity resolver consulted for `ID_B` (and by `start`).
    pub fn on_remote_identity_requested(&mut self, resolver: impl KeyResolver + 'static) {
        self.resolver = Some(Box::new(resolver));
    }

    /// Drop any attempt in flight and return to the initial state.
    pub fn reset(&mut self) {
        let initial = HandshakeState::initial(self.role, self.config.identity_discovery);
        if !self.state.is_initial() {
            tracing::debug!(
                role = self.role.label(),
                from = self.state.label(),
                to = initial.label(),
                "handshake reset"
            );
        }
        self.state = initial;
        self.last_activity = None;
    }

    /// Begin a new attempt towards `remote`, authenticating `payload`.
    ///
    /// Returns the messages to transmit, in order: `NONCE_A`, preceded by
    /// `ID_B` in the discovery variant. Any attempt already in flight is
    /// discarded, including when this call fails.
    pub fn start(&mut self, remote: &Identity, payload: &[u8]) -> Result<Vec<Bytes>> {
        if self.role != Role::Initiator {
            return Err(KnightTrustError::WrongRole {
                expected: Role::Initiator.label(),
            });
        }
        self.reset();

        if payload.len() > self.config.max_payload {
            return Err(KnightTrustError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload,
            });
        }

        let key = self.key_for(remote)?;
        let n_a = Nonce::generate(self.caps.rng.as_mut())?;
        let payload = Bytes::copy_from_slice(payload);

        let mut outbound = Vec::with_capacity(2);
        if self.config.identity_discovery {
            outbound.push(
                Message::IdOfB {
                    identity: self.local_id.clone(),
                }
                .encode(),
            );
        }
        outbound.push(
            Message::NonceA {
                nonce: n_a.clone(),
                payload: payload.clone(),
            }
            .encode(),
        );

        tracing::debug!(
            role = self.role.label(),
            remote = %remote,
            key = %key.fingerprint(),
            payload_len = payload.len(),
            "handshake started"
        );
        self.transition(HandshakeState::AwaitingNonceB(InitiatorAttempt {
            n_a,
            payload,
            responder: remote.clone(),
            key,
        }));
        self.touch();
        Ok(outbound)
    }

    /// Advance the engine with zero or one inbound message.
    ///
    /// Call with `None` on timer ticks so stale attempts expire. Failures never
    /// escape: they reset the engine and yield `NoAuthentication`.
    pub fn step(&mut self, inbound: Option<&[u8]>) -> Step {
        if let Err(err) = self.check_timeout() {
            tracing::debug!(
                role = self.role.label(),
                state = self.state.label(),
                error = %err,
                "handshake expired"
            );
            self.reset();
        }

        let Some(bytes) = inbound else {
            return Step::status(if self.is_idle() {
                AuthResult::Idle
            } else {
                AuthResult::Busy
            });
        };

        let state = self.state.label();
        match self.process(bytes) {
            Ok(step) => step,
            Err(err) => {
                tracing::debug!(
                    role = self.role.label(),
                    state,
                    len = bytes.len(),
                    error = %err,
                    "handshake message rejected"
                );
                self.reset();
                Step::status(AuthResult::NoAuthentication)
            }
        }
    }

    fn process(&mut self, bytes: &[u8]) -> Result<Step> {
        let message = Message::decode(bytes, self.config.nonce_b_framing)?;
        self.touch();

        let state = std::mem::replace(&mut self.state, HandshakeState::Idle);
        match (state, message) {
            (HandshakeState::AwaitingRemoteIdentity, Message::IdOfB { identity }) => {
                self.accept_identity(identity)
            }
            (HandshakeState::AwaitingNonceA { peer }, Message::NonceA { nonce, payload }) => {
                self.answer_nonce_a(peer, nonce, payload)
            }
            (
                HandshakeState::AwaitingNonceB(attempt),
                Message::NonceB {
                    mac,
                    nonce,
                    echoed_payload,
                },
            ) => self.confirm_responder(attempt, mac, nonce, echoed_payload),
            (HandshakeState::AwaitingConfirmation(attempt), Message::MacConfirm { mac }) => {
                self.finish(attempt, mac)
            }
            (state, message) => Err(KnightTrustError::UnexpectedMessage {
                state: state.label(),
                tag: message.tag().label(),
            }),
        }
    }

    // ── Responder ────────────────────────────────────────────────────────

    fn accept_identity(&mut self, identity: Identity) -> Result<Step> {
        let key = self
            .resolver
            .as_mut()
            .and_then(|resolver| resolver.resolve(&identity))
            .ok_or(KnightTrustError::NoKeyAvailable)?;

        tracing::debug!(
            role = self.role.label(),
            remote = %identity,
            key = %key.fingerprint(),
            "remote identity resolved"
        );
        self.transition(HandshakeState::AwaitingNonceA {
            peer: Some(ResolvedPeer { identity, key }),
        });
        Ok(Step::status(AuthResult::Busy))
    }

    fn answer_nonce_a(
        &mut self,
        peer: Option<ResolvedPeer>,
        n_a: Nonce,
        payload: Bytes,
    ) -> Result<Step> {
        if payload.len() > self.config.max_payload {
            return Err(KnightTrustError::MalformedMessage {
                tag: "NONCE_A",
                expected: NONCE_LEN + self.config.max_payload,
                actual: NONCE_LEN + payload.len(),
            });
        }

        let (key, peer) = match peer {
            Some(ResolvedPeer { identity, key }) => (key, Some(identity)),
            None => (
                self.shared_key
                    .clone()
                    .ok_or(KnightTrustError::NoKeyAvailable)?,
                None,
            ),
        };

        let n_b = Nonce::generate(self.caps.rng.as_mut())?;
        let proof = mac_ba(
            self.caps.mac.as_ref(),
            &key,
            &n_a,
            &payload,
            &n_b,
            &self.local_id,
        );
        let echoed_payload = match self.config.nonce_b_framing {
            NonceBFraming::Compact => None,
            NonceBFraming::PayloadEcho => Some(payload.clone()),
        };
        let reply = Message::NonceB {
            mac: proof,
            nonce: n_b.clone(),
            echoed_payload,
        }
        .encode();

        self.transition(HandshakeState::AwaitingConfirmation(ResponderAttempt {
            n_a,
            n_b,
            payload,
            key,
            peer,
        }));
        self.touch();
        Ok(Step::reply(reply))
    }

    fn finish(&mut self, attempt: ResponderAttempt, received: MacTag) -> Result<Step> {
        let expected = mac_ab(self.caps.mac.as_ref(), &attempt.key, &attempt.n_a, &attempt.n_b);
        if !tags_match(&expected, &received) {
            return Err(KnightTrustError::MacMismatch);
        }

        tracing::debug!(
            role = self.role.label(),
            payload_len = attempt.payload.len(),
            "initiator authenticated"
        );
        if let Some(handler) = self.on_authenticated.as_mut() {
            handler(&attempt.payload);
        }
        self.reset();
        Ok(Step {
            result: AuthResult::AuthenticatedAsPeer,
            outbound: None,
            delivered: Some(attempt.payload),
            peer: attempt.peer,
        })
    }

    // ── Initiator ────────────────────────────────────────────────────────

    fn confirm_responder(
        &mut self,
        attempt: InitiatorAttempt,
        received: MacTag,
        n_b: Nonce,
        echoed_payload: Option<Bytes>,
    ) -> Result<Step> {
        if let Some(echo) = echoed_payload {
            if echo != attempt.payload {
                return Err(KnightTrustError::PayloadEchoMismatch);
            }
        }

        let expected = mac_ba(
            self.caps.mac.as_ref(),
            &attempt.key,
            &attempt.n_a,
            &attempt.payload,
            &n_b,
            &attempt.responder,
        );
        if !tags_match(&expected, &received) {
            return Err(KnightTrustError::MacMismatch);
        }

        let confirmation = mac_ab(self.caps.mac.as_ref(), &attempt.key, &attempt.n_a, &n_b);
        tracing::debug!(
            role = self.role.label(),
            remote = %attempt.responder,
            "responder authenticated"
        );
        self.reset();
        Ok(Step {
            result: AuthResult::AuthenticatedAsInitiator,
            outbound: Some(Message::MacConfirm { mac: confirmation }.encode()),
            delivered: None,
            peer: Some(attempt.responder),
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Key for the identity passed to `start`: resolver first, static key second.
    fn key_for(&mut self, remote: &Identity) -> Result<SharedKey> {
        let resolved = self
            .resolver
            .as_mut()
            .and_then(|resolver| resolver.resolve(remote));
        resolved
            .or_else(|| self.shared_key.clone())
            .ok_or(KnightTrustError::NoKeyAvailable)
    }

    fn check_timeout(&self) -> Result<()> {
        if self.state.is_initial() {
            return Ok(());
        }
        match self.last_activity {
            Some(last)
                if self.caps.clock.now().saturating_duration_since(last)
                    > self.config.timeout() =>
            {
                Err(KnightTrustError::Timeout)
            }
            _ => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Some(self.caps.clock.now());
    }

    fn transition(&mut self, next: HandshakeState) {
        tracing::debug!(role = self.role.label(), to = next.label(), "handshake transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    /// Deterministic nonce source: byte `seed`, `seed + 1`, ...
    struct Counting(u8);

    impl NonceSource for Counting {
        fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
            for b in dest.iter_mut() {
                *b = self.0;
                self.0 = self.0.wrapping_add(1);
            }
            Ok(())
        }
    }

    fn key() -> SharedKey {
        SharedKey::from_bytes([
            0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08, 0x07,
            0x06, 0x05,
        ])
    }

    fn id(s: &str) -> Identity {
        Identity::try_from(s).unwrap()
    }

    fn pair(clock: &ManualClock) -> (Engine, Engine) {
        let initiator = EngineBuilder::initiator(id("A"))
            .shared_key(key())
            .nonce_source(Counting(0x10))
            .clock(clock.clone())
            .build()
            .unwrap();
        let responder = EngineBuilder::responder(id("B"))
            .shared_key(key())
            .nonce_source(Counting(0x80))
            .clock(clock.clone())
            .build()
            .unwrap();
        (initiator, responder)
    }

    #[test]
    fn full_handshake() {
        let clock = ManualClock::new();
        let (mut a, mut b) = pair(&clock);

        let msg1 = a.start(&id("B"), &[0xFE, 0xDC, 0xBA, 0x98]).unwrap();
        assert_eq!(msg1.len(), 1);
        assert!(matches!(a.state(), HandshakeState::AwaitingNonceB(_)));

        let step2 = b.step(Some(&msg1[0]));
        assert_eq!(step2.result, AuthResult::Busy);
        assert!(matches!(b.state(), HandshakeState::AwaitingConfirmation(_)));

        let step3 = a.step(step2.outbound.as_deref());
        assert_eq!(step3.result, AuthResult::AuthenticatedAsInitiator);
        assert!(a.is_idle());

        let step4 = b.step(step3.outbound.as_deref());
        assert_eq!(step4.result, AuthResult::AuthenticatedAsPeer);
        assert_eq!(step4.delivered.as_deref(), Some(&[0xFE, 0xDC, 0xBA, 0x98][..]));
        assert!(b.is_idle());
    }

    #[test]
    fn start_on_responder_is_rejected() {
        let clock = ManualClock::new();
        let (_, mut b) = pair(&clock);
        assert!(matches!(
            b.start(&id("A"), b"x"),
            Err(KnightTrustError::WrongRole { .. })
        ));
    }

    #[test]
    fn step_without_message_reports_progress() {
        let clock = ManualClock::new();
        let (mut a, _) = pair(&clock);
        assert_eq!(a.step(None).result, AuthResult::Idle);
        a.start(&id("B"), b"x").unwrap();
        assert_eq!(a.step(None).result, AuthResult::Busy);
    }

    #[test]
    fn timeout_resets_silently() {
        let clock = ManualClock::new();
        let (mut a, _) = pair(&clock);
        a.start(&id("B"), b"x").unwrap();

        clock.advance(Duration::from_millis(10_000));
        assert_eq!(a.step(None).result, AuthResult::Busy);

        clock.advance(Duration::from_millis(1));
        assert_eq!(a.step(None).result, AuthResult::Idle);
        assert!(a.is_idle());
    }

    #[test]
    fn unexpected_tag_resets_responder() {
        let clock = ManualClock::new();
        let (mut a, mut b) = pair(&clock);
        let msg1 = a.start(&id("B"), b"x").unwrap();
        b.step(Some(&msg1[0]));

        // A second NONCE_A while awaiting confirmation is out of order.
        let step = b.step(Some(&msg1[0]));
        assert_eq!(step.result, AuthResult::NoAuthentication);
        assert!(b.is_idle());
    }
}
