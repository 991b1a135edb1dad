//! Session driver: the communication loop between a transport and an engine.
//!
//! Each poll takes at most one datagram from the transport, steps the engine
//! with it (or with nothing, so timeouts fire) and transmits whatever the
//! engine produced. `run_until_settled` repeats this on a tokio interval
//! until the attempt in flight reaches an outcome.

use std::time::Duration;

use knighttrust::{AuthResult, Engine, Identity, Role, Step};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::transport::Transport;

/// Configuration for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of the poll timer in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Couples one engine to one transport.
pub struct Session<T> {
    engine: Engine,
    transport: T,
    config: SessionConfig,
    /// Set while the engine reports `Busy`, so expiry can be told apart from
    /// an engine that was never engaged.
    in_flight: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(engine: Engine, transport: T) -> Self {
        Self::with_config(engine, transport, SessionConfig::default())
    }

    pub fn with_config(engine: Engine, transport: T, config: SessionConfig) -> Self {
        Self {
            engine,
            transport,
            config,
            in_flight: false,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable engine access, e.g. to register callbacks.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Engine, T) {
        (self.engine, self.transport)
    }

    /// Start an attempt towards `remote` and transmit the opening messages.
    pub fn begin(&mut self, remote: &Identity, payload: &[u8]) -> Result<()> {
        let opening = self.engine.start(remote, payload)?;
        self.in_flight = true;
        for message in &opening {
            self.transmit(message)?;
        }
        Ok(())
    }

    /// Run one iteration of the communication loop.
    pub fn poll(&mut self) -> Result<Step> {
        let inbound = self.transport.try_receive()?;
        let step = self.engine.step(inbound.as_deref());
        if let Some(outbound) = &step.outbound {
            self.transmit(outbound)?;
        }
        Ok(step)
    }

    /// Poll on the configured interval until the current attempt settles.
    ///
    /// Returns the step carrying the outcome: an authentication result,
    /// `NoAuthentication`, or `Idle` when an attempt in flight expired. An
    /// initiator that has not called [`begin`](Self::begin) returns `Idle`
    /// immediately; a responder waits for the first message.
    pub async fn run_until_settled(&mut self) -> Result<Step> {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let step = self.poll()?;
            match step.result {
                AuthResult::Busy => self.in_flight = true,
                AuthResult::Idle if !self.in_flight => {
                    if self.engine.role() == Role::Initiator {
                        return Ok(step);
                    }
                }
                AuthResult::Idle => {
                    tracing::debug!(role = self.engine.role().label(), "session attempt expired");
                    self.in_flight = false;
                    return Ok(step);
                }
                AuthResult::NoAuthentication
                | AuthResult::AuthenticatedAsInitiator
                | AuthResult::AuthenticatedAsPeer => {
                    tracing::debug!(
                        role = self.engine.role().label(),
                        result = ?step.result,
                        "session attempt settled"
                    );
                    self.in_flight = false;
                    return Ok(step);
                }
            }
        }
    }

    fn transmit(&mut self, message: &[u8]) -> Result<()> {
        if let Err(err) = self.transport.send(message) {
            tracing::warn!(
                role = self.engine.role().label(),
                len = message.len(),
                error = %err,
                "transport send failed; abandoning attempt"
            );
            self.engine.reset();
            self.in_flight = false;
            return Err(err);
        }
        Ok(())
    }
}
