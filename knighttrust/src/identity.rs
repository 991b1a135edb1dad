// Principal identities: opaque, length-bounded byte strings.

use std::fmt;

use bytes::Bytes;

use crate::error::{KnightTrustError, Result};
use crate::MAX_IDENTITY_LEN;

/// A principal's name as it appears in MAC inputs and `ID_B` messages.
///
/// Always 1..=`MAX_IDENTITY_LEN` bytes long.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity(Bytes);

impl Identity {
    /// Build an identity from raw bytes, checking the length bounds.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > MAX_IDENTITY_LEN {
            return Err(KnightTrustError::IdentityLength {
                len: bytes.len(),
                max: MAX_IDENTITY_LEN,
            });
        }
        Ok(Self(bytes))
    }

    /// Build an identity from a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::new(Bytes::copy_from_slice(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the identity holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&str> for Identity {
    type Error = KnightTrustError;

    fn try_from(value: &str) -> Result<Self> {
        Self::from_slice(value.as_bytes())
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = KnightTrustError;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::from_slice(value)
    }
}

// Printable identities are shown as text, everything else as hex.
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic() || c == ' ') => f.write_str(s),
            _ => f.write_str(&hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(Identity::from_slice(b"").is_err());
        assert!(Identity::from_slice(&[0x41; MAX_IDENTITY_LEN + 1]).is_err());
        assert!(Identity::from_slice(&[0x41; MAX_IDENTITY_LEN]).is_ok());
    }

    #[test]
    fn display_text_or_hex() {
        let text = Identity::try_from("node-7").unwrap();
        assert_eq!(text.to_string(), "node-7");

        let binary = Identity::from_slice(&[0, 1, 2, 0xff]).unwrap();
        assert_eq!(binary.to_string(), "000102ff");
    }
}
