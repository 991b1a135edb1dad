// Handshake messages exchanged during the KnightTrust four-message protocol.
//
// Wire layout: a one-byte tag followed by a tag-specific body. No length
// prefixes; the transport delivers each message as one datagram.
//
//   ID_B        [0x00][identity: 1..=32B]
//   NONCE_A     [0x01][N_A: 8B][payload: 0..B]
//   NONCE_B     [0x02][MAC_BA: 16B][N_B: 8B]                  (compact)
//               [0x02][N_B: 8B][payload: 0..B][MAC_BA: 16B]   (payload echo)
//   MAC_CONFIRM [0x03][MAC_AB: 16B]

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::NonceBFraming;
use crate::crypto::mac::MacTag;
use crate::crypto::rng::Nonce;
use crate::error::{KnightTrustError, Result};
use crate::identity::Identity;
use crate::{MAC_LEN, MAX_IDENTITY_LEN, MAX_MESSAGE_LEN, NONCE_LEN};

/// Message type discriminant (the protocol tag, not a MAC tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    IdOfB = 0x00,
    NonceA = 0x01,
    NonceB = 0x02,
    MacConfirm = 0x03,
}

impl MessageTag {
    pub fn label(self) -> &'static str {
        match self {
            MessageTag::IdOfB => "ID_B",
            MessageTag::NonceA => "NONCE_A",
            MessageTag::NonceB => "NONCE_B",
            MessageTag::MacConfirm => "MAC_CONFIRM",
        }
    }
}

impl TryFrom<u8> for MessageTag {
    type Error = KnightTrustError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(MessageTag::IdOfB),
            0x01 => Ok(MessageTag::NonceA),
            0x02 => Ok(MessageTag::NonceB),
            0x03 => Ok(MessageTag::MacConfirm),
            other => Err(KnightTrustError::UnknownMessageTag(other)),
        }
    }
}

/// One decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Initiator -> Responder: the identity the responder must find a key for.
    IdOfB { identity: Identity },
    /// Initiator -> Responder: `N_A` and the payload to authenticate.
    NonceA { nonce: Nonce, payload: Bytes },
    /// Responder -> Initiator: `MAC_BA` and `N_B`. `echoed_payload` is set
    /// only with the payload-echo framing.
    NonceB {
        mac: MacTag,
        nonce: Nonce,
        echoed_payload: Option<Bytes>,
    },
    /// Initiator -> Responder: `MAC_AB`.
    MacConfirm { mac: MacTag },
}

impl Message {
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::IdOfB { .. } => MessageTag::IdOfB,
            Message::NonceA { .. } => MessageTag::NonceA,
            Message::NonceB { .. } => MessageTag::NonceB,
            Message::MacConfirm { .. } => MessageTag::MacConfirm,
        }
    }

    /// Encode this message into a fresh buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(self.tag() as u8);
        match self {
            Message::IdOfB { identity } => buf.put_slice(identity.as_bytes()),
            Message::NonceA { nonce, payload } => {
                buf.put_slice(nonce.as_bytes());
                buf.put_slice(payload);
            }
            Message::NonceB {
                mac,
                nonce,
                echoed_payload: None,
            } => {
                buf.put_slice(mac);
                buf.put_slice(nonce.as_bytes());
            }
            Message::NonceB {
                mac,
                nonce,
                echoed_payload: Some(payload),
            } => {
                buf.put_slice(nonce.as_bytes());
                buf.put_slice(payload);
                buf.put_slice(mac);
            }
            Message::MacConfirm { mac } => buf.put_slice(mac),
        }
    }

    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Message::IdOfB { identity } => identity.len(),
            Message::NonceA { payload, .. } => NONCE_LEN + payload.len(),
            Message::NonceB { echoed_payload, .. } => {
                MAC_LEN + NONCE_LEN + echoed_payload.as_ref().map_or(0, Bytes::len)
            }
            Message::MacConfirm { .. } => MAC_LEN,
        }
    }

    /// Decode one message. Lengths are checked before any field is read.
    pub fn decode(data: &[u8], framing: NonceBFraming) -> Result<Self> {
        if data.is_empty() {
            return Err(KnightTrustError::MalformedMessage {
                tag: "empty",
                expected: 1,
                actual: 0,
            });
        }
        if data.len() > MAX_MESSAGE_LEN {
            return Err(KnightTrustError::MalformedMessage {
                tag: "oversized",
                expected: MAX_MESSAGE_LEN,
                actual: data.len(),
            });
        }

        let tag = MessageTag::try_from(data[0])?;
        let body = &data[1..];

        match tag {
            MessageTag::IdOfB => {
                ensure_min(body, 1, tag)?;
                ensure_max(body, MAX_IDENTITY_LEN, tag)?;
                let identity = Identity::from_slice(body)?;
                Ok(Message::IdOfB { identity })
            }
            MessageTag::NonceA => {
                ensure_min(body, NONCE_LEN, tag)?;
                let (nonce, payload) = body.split_at(NONCE_LEN);
                Ok(Message::NonceA {
                    nonce: read_nonce(nonce, tag)?,
                    payload: Bytes::copy_from_slice(payload),
                })
            }
            MessageTag::NonceB => match framing {
                NonceBFraming::Compact => {
                    ensure_exact(body, MAC_LEN + NONCE_LEN, tag)?;
                    let (mac, nonce) = body.split_at(MAC_LEN);
                    Ok(Message::NonceB {
                        mac: read_mac(mac, tag)?,
                        nonce: read_nonce(nonce, tag)?,
                        echoed_payload: None,
                    })
                }
                NonceBFraming::PayloadEcho => {
                    ensure_min(body, NONCE_LEN + MAC_LEN, tag)?;
                    let (nonce, rest) = body.split_at(NONCE_LEN);
                    let (payload, mac) = rest.split_at(rest.len() - MAC_LEN);
                    Ok(Message::NonceB {
                        mac: read_mac(mac, tag)?,
                        nonce: read_nonce(nonce, tag)?,
                        echoed_payload: Some(Bytes::copy_from_slice(payload)),
                    })
                }
            },
            MessageTag::MacConfirm => {
                ensure_exact(body, MAC_LEN, tag)?;
                Ok(Message::MacConfirm {
                    mac: read_mac(body, tag)?,
                })
            }
        }
    }
}

fn malformed(tag: MessageTag, expected: usize, actual: usize) -> KnightTrustError {
    KnightTrustError::MalformedMessage {
        tag: tag.label(),
        expected,
        actual,
    }
}

fn ensure_min(body: &[u8], needed: usize, tag: MessageTag) -> Result<()> {
    if body.len() < needed {
        return Err(malformed(tag, needed, body.len()));
    }
    Ok(())
}

fn ensure_max(body: &[u8], limit: usize, tag: MessageTag) -> Result<()> {
    if body.len() > limit {
        return Err(malformed(tag, limit, body.len()));
    }
    Ok(())
}

fn ensure_exact(body: &[u8], len: usize, tag: MessageTag) -> Result<()> {
    if body.len() != len {
        return Err(malformed(tag, len, body.len()));
    }
    Ok(())
}

fn read_nonce(field: &[u8], tag: MessageTag) -> Result<Nonce> {
    Nonce::from_slice(field).ok_or_else(|| malformed(tag, NONCE_LEN, field.len()))
}

fn read_mac(field: &[u8], tag: MessageTag) -> Result<MacTag> {
    field
        .try_into()
        .map_err(|_| malformed(tag, MAC_LEN, field.len()))
}
