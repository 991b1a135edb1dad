// Engine configuration, loadable from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KnightTrustError, Result};
use crate::{MAX_PAYLOAD, PAYLOAD_CEILING};

/// Body layout of the `NONCE_B` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceBFraming {
    /// `MAC_BA ‖ N_B`
    #[default]
    Compact,
    /// `N_B ‖ payload ‖ MAC_BA`
    PayloadEcho,
}

/// Per-engine protocol settings.
///
/// Both principals must agree on `identity_discovery` and `nonce_b_framing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest payload accepted by `start` and in `NONCE_A`.
    pub max_payload: usize,
    /// Idle time after the last send/receive before a pending handshake is dropped.
    pub timeout_ms: u64,
    /// Prefix each attempt with an `ID_B` message so the responder can look
    /// up the key for the claimed identity.
    pub identity_discovery: bool,
    pub nonce_b_framing: NonceBFraming,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_payload: MAX_PAYLOAD,
            timeout_ms: 10_000,
            identity_discovery: false,
            nonce_b_framing: NonceBFraming::Compact,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_payload > PAYLOAD_CEILING {
            return Err(KnightTrustError::Config(format!(
                "max_payload {} exceeds ceiling {PAYLOAD_CEILING}",
                self.max_payload
            )));
        }
        if self.timeout_ms == 0 {
            return Err(KnightTrustError::Config("timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn parses_all_fields() {
        let config = EngineConfig::from_json(
            r#"{
                "max_payload": 32,
                "timeout_ms": 2500,
                "identity_discovery": true,
                "nonce_b_framing": "payload_echo"
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_payload, 32);
        assert_eq!(config.timeout_ms, 2500);
        assert!(config.identity_discovery);
        assert_eq!(config.nonce_b_framing, NonceBFraming::PayloadEcho);
    }

    #[test]
    fn rejects_payload_above_ceiling() {
        let json = format!(r#"{{"max_payload": {}}}"#, PAYLOAD_CEILING + 1);
        assert!(matches!(
            EngineConfig::from_json(&json),
            Err(KnightTrustError::Config(_))
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(EngineConfig::from_json(r#"{"timeout_ms": 0}"#).is_err());
    }

    #[test]
    fn rejects_unknown_framing() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"nonce_b_framing": "sideways"}"#),
            Err(KnightTrustError::Json(_))
        ));
    }
}
