// Message authentication: the MAC capability, AES-128-CMAC and tag comparison.

use aes::Aes128;
use cmac::digest::generic_array::GenericArray;
use cmac::{Cmac, Mac};
use subtle::ConstantTimeEq;

use crate::crypto::keys::SharedKey;
use crate::MAC_LEN;

/// A 128-bit authentication tag.
pub type MacTag = [u8; MAC_LEN];

/// `MAC(key, message) -> tag`.
pub trait MacProvider: Send {
    fn compute(&self, key: &SharedKey, message: &[u8]) -> MacTag;
}

/// AES-128-CMAC (RFC 4493).
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCmac;

impl MacProvider for AesCmac {
    fn compute(&self, key: &SharedKey, message: &[u8]) -> MacTag {
        let mut mac = <Cmac<Aes128> as Mac>::new(GenericArray::from_slice(key.as_bytes()));
        mac.update(message);
        let result = mac.finalize().into_bytes();
        let mut tag = [0u8; MAC_LEN];
        tag.copy_from_slice(&result);
        tag
    }
}

/// Compare a received tag with the locally computed one in constant time.
///
/// A received slice of the wrong length never matches.
pub fn tags_match(expected: &MacTag, received: &[u8]) -> bool {
    expected.as_slice().ct_eq(received).into()
}
