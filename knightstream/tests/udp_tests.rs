//! Handshake over UDP loopback.
//!
//! Runs on real time: the reactor has to deliver readiness between polls.

use std::net::SocketAddr;
use std::time::Duration;

use knighttrust::{AuthResult, EngineBuilder, Identity, SharedKey};
use knightstream::{KnightStreamError, Session, Transport, UdpTransport};

const KEY: [u8; 16] = [0x5C; 16];

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn connected_pair() -> (UdpTransport, UdpTransport) {
    let a = UdpTransport::bind(loopback()).await.unwrap();
    let b = UdpTransport::bind(loopback()).await.unwrap();
    a.connect(b.local_addr().unwrap()).await.unwrap();
    b.connect(a.local_addr().unwrap()).await.unwrap();
    (a, b)
}

#[tokio::test]
async fn handshake_over_loopback() {
    let (link_a, link_b) = connected_pair().await;

    let initiator = EngineBuilder::initiator(Identity::try_from("A").unwrap())
        .shared_key(SharedKey::from_bytes(KEY))
        .build()
        .unwrap();
    let responder = EngineBuilder::responder(Identity::try_from("B").unwrap())
        .shared_key(SharedKey::from_bytes(KEY))
        .build()
        .unwrap();
    let mut a = Session::new(initiator, link_a);
    let mut b = Session::new(responder, link_b);

    a.begin(&Identity::try_from("B").unwrap(), b"over udp").unwrap();
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(a.run_until_settled(), b.run_until_settled())
    })
    .await
    .expect("handshake settles");

    assert_eq!(settled.0.unwrap().result, AuthResult::AuthenticatedAsInitiator);
    let rb = settled.1.unwrap();
    assert_eq!(rb.result, AuthResult::AuthenticatedAsPeer);
    assert_eq!(rb.delivered.as_deref(), Some(&b"over udp"[..]));
}

#[tokio::test]
async fn empty_socket_yields_nothing() {
    let (mut a, _b) = connected_pair().await;
    assert!(a.try_receive().unwrap().is_none());
}

#[tokio::test]
async fn oversized_send_rejected() {
    let (mut a, _b) = connected_pair().await;
    assert!(matches!(
        a.send(&[0u8; 300]),
        Err(KnightStreamError::DatagramTooLarge { size: 300, .. })
    ));
}
