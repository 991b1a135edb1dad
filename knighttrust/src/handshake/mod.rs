// Handshake layer: wire messages, state machine and the engine driving them.

pub mod builder;
pub mod mac_input;
pub mod messages;
pub mod protocol;
pub mod state;
