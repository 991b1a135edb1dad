use knighttrust::KnightTrustError;
use thiserror::Error;

/// All errors produced by the KnightStream host layer.
#[derive(Debug, Error)]
pub enum KnightStreamError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("link is closed")]
    LinkClosed,

    #[error("datagram too large: {size} bytes exceeds maximum {max}")]
    DatagramTooLarge { size: usize, max: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake error: {0}")]
    Trust(#[from] KnightTrustError),
}

pub type Result<T> = std::result::Result<T, KnightStreamError>;
