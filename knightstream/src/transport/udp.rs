//! Connected UDP transport on a tokio socket.
//!
//! Uses the non-blocking `try_send` / `try_recv` calls so the session driver
//! can poll it from a timer. Readiness is tracked by the tokio reactor, so the
//! socket must be polled from inside a runtime that gets to run between polls.

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::error::{KnightStreamError, Result};
use crate::transport::{check_datagram_len, Transport};

pub struct UdpTransport {
    socket: UdpSocket,
    /// One byte larger than any valid message so oversize is detectable.
    buf: Box<[u8]>,
}

impl UdpTransport {
    /// Bind to `local`. Call [`connect`](Self::connect) before sending.
    pub async fn bind(local: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap an existing socket, connected or not.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0u8; knighttrust::MAX_MESSAGE_LEN + 1].into_boxed_slice(),
        }
    }

    /// Fix the remote peer. Datagrams from other addresses are filtered out
    /// by the OS. Returns once the socket is writable, so the first
    /// `send` does not race the reactor.
    pub async fn connect(&self, peer: SocketAddr) -> Result<()> {
        self.socket.connect(peer).await?;
        self.socket.writable().await?;
        tracing::debug!(local = ?self.socket.local_addr().ok(), %peer, "udp transport connected");
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        check_datagram_len(datagram.len())?;
        match self.socket.try_send(datagram) {
            Ok(sent) if sent == datagram.len() => Ok(()),
            Ok(sent) => Err(KnightStreamError::SendFailed(format!(
                "short write: {sent} of {} bytes",
                datagram.len()
            ))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(
                KnightStreamError::SendFailed("socket not ready for writing".into()),
            ),
            Err(e) => Err(KnightStreamError::SendFailed(e.to_string())),
        }
    }

    fn try_receive(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.socket.try_recv(&mut self.buf) {
                Ok(len) if len > knighttrust::MAX_MESSAGE_LEN => {
                    tracing::debug!(len, "udp transport: oversized datagram discarded");
                }
                Ok(len) => return Ok(Some(Bytes::copy_from_slice(&self.buf[..len]))),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                // ICMP port unreachable from an earlier send; the peer may
                // simply not be up yet.
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
