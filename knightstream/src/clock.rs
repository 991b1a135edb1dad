//! Engine clock backed by the tokio timer.
//!
//! Under `tokio::time::pause` the engine's handshake timeout follows the
//! paused clock, so expiry can be tested without real waiting.

use std::time::Instant;

use knighttrust::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
