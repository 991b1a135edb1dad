// Canonical MAC inputs.
//
//   MAC_BA = MAC(key, N_A ‖ payload ‖ N_B ‖ ID_responder)
//   MAC_AB = MAC(key, N_A ‖ N_B)
//
// Plain concatenation: no length prefixes, no padding beyond what CMAC does.

use crate::crypto::keys::SharedKey;
use crate::crypto::mac::{MacProvider, MacTag};
use crate::crypto::rng::Nonce;
use crate::identity::Identity;
use crate::NONCE_LEN;

/// Bytes authenticated by the responder's proof.
pub fn mac_ba_input(n_a: &Nonce, payload: &[u8], n_b: &Nonce, responder: &Identity) -> Vec<u8> {
    let mut input = Vec::with_capacity(2 * NONCE_LEN + payload.len() + responder.len());
    input.extend_from_slice(n_a.as_bytes());
    input.extend_from_slice(payload);
    input.extend_from_slice(n_b.as_bytes());
    input.extend_from_slice(responder.as_bytes());
    input
}

/// Bytes authenticated by the initiator's confirmation.
pub fn mac_ab_input(n_a: &Nonce, n_b: &Nonce) -> [u8; 2 * NONCE_LEN] {
    let mut input = [0u8; 2 * NONCE_LEN];
    input[..NONCE_LEN].copy_from_slice(n_a.as_bytes());
    input[NONCE_LEN..].copy_from_slice(n_b.as_bytes());
    input
}

pub fn mac_ba<M: MacProvider + ?Sized>(
    mac: &M,
    key: &SharedKey,
    n_a: &Nonce,
    payload: &[u8],
    n_b: &Nonce,
    responder: &Identity,
) -> MacTag {
    mac.compute(key, &mac_ba_input(n_a, payload, n_b, responder))
}

pub fn mac_ab<M: MacProvider + ?Sized>(
    mac: &M,
    key: &SharedKey,
    n_a: &Nonce,
    n_b: &Nonce,
) -> MacTag {
    mac.compute(key, &mac_ab_input(n_a, n_b))
}
