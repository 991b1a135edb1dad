//! KnightStream -- host-side plumbing for the KnightTrust handshake.
//!
//! Provides:
//! - **Transport**: datagram capability trait the session drives
//! - **MemoryLink**: in-process duplex link with loss and tamper injection
//! - **UdpTransport**: connected non-blocking UDP socket
//! - **Session**: the poll loop that moves messages between a transport and
//!   an engine

pub mod clock;
pub mod error;
pub mod session;
pub mod transport;

// Re-export key public types at crate root.
pub use clock::TokioClock;
pub use error::{KnightStreamError, Result};
pub use session::{Session, SessionConfig};
pub use transport::memory::{FaultHandle, MemoryLink};
pub use transport::udp::UdpTransport;
pub use transport::Transport;
