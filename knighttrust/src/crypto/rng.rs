// Random nonce generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KnightTrustError, Result};
use crate::NONCE_LEN;

/// Fills buffers with unpredictable bytes. May fail.
pub trait NonceSource: Send {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// Operating-system randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| KnightTrustError::Rng(e.to_string()))
    }
}

/// One party's single-use freshness value for one handshake attempt.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from `source`.
    pub fn generate<S: NonceSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut bytes = [0u8; NONCE_LEN];
        source.fill(&mut bytes)?;
        let nonce = Self(bytes);
        bytes.zeroize();
        Ok(nonce)
    }

    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a nonce out of a wire field. `None` unless exactly `NONCE_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; NONCE_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl NonceSource for Failing {
        fn fill(&mut self, _dest: &mut [u8]) -> Result<()> {
            Err(KnightTrustError::Rng("entropy pool empty".into()))
        }
    }

    #[test]
    fn os_source_fills_distinct_buffers() {
        let mut rng = OsNonceSource;
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        rng.fill(&mut a).unwrap();
        rng.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_nonces_differ() {
        let mut rng = OsNonceSource;
        let a = Nonce::generate(&mut rng).unwrap();
        let b = Nonce::generate(&mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generate_propagates_rng_failure() {
        assert!(matches!(
            Nonce::generate(&mut Failing),
            Err(KnightTrustError::Rng(_))
        ));
    }

    #[test]
    fn from_slice_requires_exact_length() {
        assert!(Nonce::from_slice(&[1u8; NONCE_LEN]).is_some());
        assert!(Nonce::from_slice(&[1u8; NONCE_LEN - 1]).is_none());
        assert!(Nonce::from_slice(&[1u8; NONCE_LEN + 1]).is_none());
    }
}
