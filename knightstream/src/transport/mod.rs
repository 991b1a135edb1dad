//! Datagram transports the session driver can poll.

pub mod memory;
pub mod udp;

use bytes::Bytes;

use crate::error::{KnightStreamError, Result};

/// Unreliable, message-oriented link carrying one handshake message per
/// datagram.
///
/// Both calls must return promptly: the session driver polls from a timer
/// and never blocks on the network.
pub trait Transport: Send {
    /// Hand one message to the link.
    fn send(&mut self, datagram: &[u8]) -> Result<()>;

    /// Take the next received message, or `None` when nothing is pending.
    fn try_receive(&mut self) -> Result<Option<Bytes>>;
}

/// Reject datagrams that cannot be framed by the handshake codec.
pub(crate) fn check_datagram_len(len: usize) -> Result<()> {
    if len > knighttrust::MAX_MESSAGE_LEN {
        return Err(KnightStreamError::DatagramTooLarge {
            size: len,
            max: knighttrust::MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}
