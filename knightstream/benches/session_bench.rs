//! Session round trip over the in-memory link.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use knighttrust::{AuthResult, EngineBuilder, Identity, SharedKey};
use knightstream::{MemoryLink, Session};

fn bench_memory_round_trip(c: &mut Criterion) {
    let key = SharedKey::from_bytes([0x0A; 16]);
    let (link_a, link_b) = MemoryLink::pair();
    let initiator = EngineBuilder::initiator(Identity::try_from("A").unwrap())
        .shared_key(key.clone())
        .build()
        .unwrap();
    let responder = EngineBuilder::responder(Identity::try_from("B").unwrap())
        .shared_key(key)
        .build()
        .unwrap();
    let mut a = Session::new(initiator, link_a);
    let mut b = Session::new(responder, link_b);
    let remote = Identity::try_from("B").unwrap();
    let payload = [0xFE, 0xDC, 0xBA, 0x98];

    c.bench_function("session_round_trip_memory", |bench| {
        bench.iter(|| {
            a.begin(&remote, &payload).unwrap();
            b.poll().unwrap();
            a.poll().unwrap();
            let done = b.poll().unwrap();
            debug_assert_eq!(done.result, AuthResult::AuthenticatedAsPeer);
            black_box(done);
        });
    });
}

criterion_group!(benches, bench_memory_round_trip);
criterion_main!(benches);
