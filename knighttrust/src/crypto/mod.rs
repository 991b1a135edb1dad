// Crypto module declarations

pub mod keys;
pub mod mac;
pub mod rng;
