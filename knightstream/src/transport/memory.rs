//! In-process duplex link.
//!
//! Each direction is a lock-free `SegQueue` of datagrams. Faults are injected
//! on the sending side of a direction: the next N datagrams can be dropped or
//! have one byte flipped, and a random loss rate can be applied to the rest.
//! Dropped and altered datagrams are logged at `DEBUG` level.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use rand::Rng;

use crate::error::{KnightStreamError, Result};
use crate::transport::{check_datagram_len, Transport};

#[derive(Debug, Default)]
struct Faults {
    /// Datagrams still to be dropped unconditionally.
    drop_next: usize,
    /// Pending `(offset, mask)` corruptions, applied one per datagram.
    tamper: Vec<(usize, u8)>,
    /// Probability in `[0, 1]` of losing any other datagram.
    loss_rate: f64,
}

/// One direction of the link.
#[derive(Debug, Default)]
struct Pipe {
    queue: SegQueue<Bytes>,
    faults: Mutex<Faults>,
}

impl Pipe {
    fn push(&self, datagram: &[u8]) {
        let mut faults = self.faults.lock();

        if faults.drop_next > 0 {
            faults.drop_next -= 1;
            tracing::debug!(len = datagram.len(), "memory link: datagram dropped");
            return;
        }
        if faults.loss_rate > 0.0 && rand::rng().random_bool(faults.loss_rate) {
            tracing::debug!(len = datagram.len(), "memory link: datagram lost");
            return;
        }

        let mut data = datagram.to_vec();
        if !faults.tamper.is_empty() {
            let (offset, mask) = faults.tamper.remove(0);
            if let Some(byte) = data.get_mut(offset) {
                *byte ^= mask;
                tracing::debug!(len = data.len(), offset, "memory link: datagram altered");
            }
        }
        drop(faults);

        self.queue.push(Bytes::from(data));
    }
}

/// Handle for injecting faults into one direction of a [`MemoryLink`].
///
/// Cloneable and usable while the link endpoints are owned by sessions.
#[derive(Debug, Clone)]
pub struct FaultHandle {
    pipe: Arc<Pipe>,
}

impl FaultHandle {
    /// Silently discard the next `count` datagrams.
    pub fn drop_next(&self, count: usize) {
        self.pipe.faults.lock().drop_next += count;
    }

    /// XOR `mask` into byte `offset` of the next datagram that is not dropped.
    /// Queued corruptions apply to consecutive datagrams.
    pub fn tamper_next(&self, offset: usize, mask: u8) {
        self.pipe.faults.lock().tamper.push((offset, mask));
    }

    /// Lose each datagram with probability `rate` (clamped to `[0, 1]`).
    pub fn set_loss_rate(&self, rate: f64) {
        self.pipe.faults.lock().loss_rate = rate.clamp(0.0, 1.0);
    }

    /// Number of datagrams waiting to be received.
    pub fn pending(&self) -> usize {
        self.pipe.queue.len()
    }
}

/// One endpoint of an in-memory duplex link.
#[derive(Debug)]
pub struct MemoryLink {
    outbound: Arc<Pipe>,
    inbound: Arc<Pipe>,
    closed: Arc<AtomicBool>,
}

impl MemoryLink {
    /// Create two connected endpoints.
    pub fn pair() -> (MemoryLink, MemoryLink) {
        let a_to_b = Arc::new(Pipe::default());
        let b_to_a = Arc::new(Pipe::default());
        let closed = Arc::new(AtomicBool::new(false));
        (
            MemoryLink {
                outbound: Arc::clone(&a_to_b),
                inbound: Arc::clone(&b_to_a),
                closed: Arc::clone(&closed),
            },
            MemoryLink {
                outbound: b_to_a,
                inbound: a_to_b,
                closed,
            },
        )
    }

    /// Fault injection for datagrams sent from this endpoint.
    pub fn faults(&self) -> FaultHandle {
        FaultHandle {
            pipe: Arc::clone(&self.outbound),
        }
    }

    /// Close both endpoints. Datagrams already queued can still be received.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for MemoryLink {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(KnightStreamError::LinkClosed);
        }
        check_datagram_len(datagram.len())?;
        self.outbound.push(datagram);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Bytes>> {
        match self.inbound.queue.pop() {
            Some(datagram) => Ok(Some(datagram)),
            None if self.is_closed() => Err(KnightStreamError::LinkClosed),
            None => Ok(None),
        }
    }
}
