// Wire-format tests for the handshake messages and engine configuration.

use bytes::Bytes;

use knighttrust::crypto::rng::Nonce;
use knighttrust::{EngineConfig, KnightTrustError, Message, MessageTag, NonceBFraming};

#[test]
fn id_of_b_decodes_identity() {
    let msg = Message::decode(b"\x00sensor-7", NonceBFraming::Compact).unwrap();
    assert_eq!(msg.tag(), MessageTag::IdOfB);
    match msg {
        Message::IdOfB { identity } => assert_eq!(identity.as_bytes(), b"sensor-7"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn nonce_a_at_payload_limit_fits_one_datagram() {
    let msg = Message::NonceA {
        nonce: Nonce::from_bytes([9; 8]),
        payload: Bytes::from(vec![0xAB; knighttrust::PAYLOAD_CEILING]),
    };
    let encoded = msg.encode();
    assert!(encoded.len() <= knighttrust::MAX_MESSAGE_LEN);
    assert_eq!(Message::decode(&encoded, NonceBFraming::Compact).unwrap(), msg);
}

#[test]
fn framing_decides_nonce_b_layout() {
    let compact = Message::NonceB {
        mac: [0x5A; 16],
        nonce: Nonce::from_bytes([0x11; 8]),
        echoed_payload: None,
    }
    .encode();

    // 24-byte body: compact reads MAC first, echo reads an empty payload.
    let as_echo = Message::decode(&compact, NonceBFraming::PayloadEcho).unwrap();
    match as_echo {
        Message::NonceB {
            nonce,
            echoed_payload,
            ..
        } => {
            assert_eq!(nonce.as_bytes(), &[0x5A; 8]);
            assert_eq!(echoed_payload, Some(Bytes::new()));
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut longer = compact.to_vec();
    longer.push(0);
    assert!(Message::decode(&longer, NonceBFraming::Compact).is_err());
    assert!(Message::decode(&longer, NonceBFraming::PayloadEcho).is_ok());
}

#[test]
fn unknown_tag_is_reported() {
    assert!(matches!(
        Message::decode(&[0xFF, 0, 0], NonceBFraming::Compact),
        Err(KnightTrustError::UnknownMessageTag(0xFF))
    ));
}

#[test]
fn config_from_json_fills_defaults() {
    let config = EngineConfig::from_json(r#"{ "identity_discovery": true }"#).unwrap();
    assert!(config.identity_discovery);
    assert_eq!(config.max_payload, knighttrust::MAX_PAYLOAD);
    assert_eq!(config.nonce_b_framing, NonceBFraming::Compact);

    let echo = EngineConfig::from_json(r#"{ "nonce_b_framing": "payload_echo" }"#).unwrap();
    assert_eq!(echo.nonce_b_framing, NonceBFraming::PayloadEcho);
}

#[test]
fn config_rejects_unframeable_payload_limit() {
    let json = format!(r#"{{ "max_payload": {} }}"#, knighttrust::PAYLOAD_CEILING + 1);
    assert!(matches!(
        EngineConfig::from_json(&json),
        Err(KnightTrustError::Config(_))
    ));
    assert!(EngineConfig::from_json(r#"{ "timeout_ms": 0 }"#).is_err());
}
