use std::{io, net::IpAddr, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use rand::{rngs::StdRng, SeedableRng};
use tokio_util::sync::CancellationToken;

use bier_gen::{DestinationPool, GenError, Generator, GeneratorConfig, State};
use bier_transport::{mock, FrameSink, TransportError};
use bier_wire::{BierHeader, BSL_256, ETHERTYPE_BIER, HEADER_LEN, NIBBLE_BIER};

use pnet::packet::{
    ethernet::{EtherTypes, EthernetPacket},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    Packet,
};

fn pool(addrs: &[&str]) -> DestinationPool {
    DestinationPool::new(addrs.iter().map(|a| a.parse().unwrap()).collect()).unwrap()
}

/// Destination address of a plain (non-BIER) frame.
fn frame_dest(frame: &[u8]) -> IpAddr {
    let eth = EthernetPacket::new(frame).unwrap();
    match eth.get_ethertype() {
        EtherTypes::Ipv4 => Ipv4Packet::new(eth.payload()).unwrap().get_destination().into(),
        EtherTypes::Ipv6 => Ipv6Packet::new(eth.payload()).unwrap().get_destination().into(),
        other => panic!("unexpected ethertype {other}"),
    }
}

#[tokio::test]
async fn single_destination_pool() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr: IpAddr = "230.40.50.60".parse().unwrap();
    let config = GeneratorConfig::default().interval(Duration::ZERO);
    let (sink, mut rx) = mock::channel();

    let mut generator = Generator::new(config, pool(&["230.40.50.60"]), sink);
    let stats = generator.stats();

    let token = CancellationToken::new();
    let stop = token.clone();
    let handle = tokio::spawn(async move {
        let result = generator.run(stop).await;
        (generator, result)
    });

    for _ in 0..1000 {
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame_dest(&frame), addr);
    }

    token.cancel();
    let (generator, result) = handle.await.unwrap();
    result.unwrap();

    assert_eq!(generator.state(), State::Stopped);
    assert!(stats.frames_tx() >= 1000);
    assert!(stats.bytes_tx() >= 1000 * 42);
}

#[tokio::test]
async fn cancellation_interrupts_sleep() {
    let config = GeneratorConfig::default().interval(Duration::from_secs(60));
    let (sink, mut rx) = mock::channel();

    let mut generator = Generator::new(config, pool(&["239.1.1.1"]), sink);
    let token = CancellationToken::new();
    let stop = token.clone();
    let handle = tokio::spawn(async move { generator.run(stop).await });

    // first frame went out, the loop is now inside its 60s sleep
    rx.recv().await.unwrap();
    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop must stop within one interval")
        .unwrap()
        .unwrap();
}

async fn collect_dests(seed: u64, n: usize) -> Vec<IpAddr> {
    let config = GeneratorConfig::default().interval(Duration::ZERO);
    let (sink, mut rx) = mock::channel();

    let mut generator = Generator::with_rng(
        config,
        pool(&["230.40.50.60", "239.1.1.1", "ff3e::1", "ff05::1234"]),
        sink,
        StdRng::seed_from_u64(seed),
    );

    let token = CancellationToken::new();
    let stop = token.clone();
    let handle = tokio::spawn(async move { generator.run(stop).await });

    let mut dests = Vec::with_capacity(n);
    for _ in 0..n {
        let frame = rx.recv().await.unwrap();
        dests.push(frame_dest(&frame));
    }

    token.cancel();
    handle.await.unwrap().unwrap();

    dests
}

#[tokio::test]
async fn seeded_selection_is_reproducible() {
    let first = collect_dests(7, 64).await;
    let second = collect_dests(7, 64).await;
    assert_eq!(first, second);

    let distinct: std::collections::HashSet<_> = first.into_iter().collect();
    assert_eq!(distinct.len(), 4, "every pool entry should appear");
}

struct FlakySink {
    inner: mock::MockSink,
    failures: usize,
}

#[async_trait]
impl FrameSink for FlakySink {
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(TransportError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        }

        self.inner.send_frame(frame).await
    }
}

#[tokio::test]
async fn transient_send_errors_do_not_stop_the_loop() {
    let (inner, mut rx) = mock::channel();
    let sink = FlakySink { inner, failures: 3 };

    let config = GeneratorConfig::default().interval(Duration::ZERO);
    let mut generator = Generator::new(config, pool(&["239.1.1.1"]), sink);
    let stats = generator.stats();

    let token = CancellationToken::new();
    let stop = token.clone();
    let handle = tokio::spawn(async move { generator.run(stop).await });

    for _ in 0..5 {
        rx.recv().await.unwrap();
    }

    token.cancel();
    handle.await.unwrap().unwrap();

    // the three failed iterations were not retried and not counted
    assert!(stats.frames_tx() >= 5);
}

struct DeadSink;

#[async_trait]
impl FrameSink for DeadSink {
    async fn send_frame(&mut self, _frame: Bytes) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}

#[tokio::test]
async fn fatal_send_error_stops_the_loop() {
    let config = GeneratorConfig::default();
    let mut generator = Generator::new(config, pool(&["239.1.1.1"]), DeadSink);

    let result = generator.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(GenError::Transport(ref e)) if e.is_fatal()));

    assert_eq!(generator.state(), State::Stopped);
    assert_eq!(generator.stats().frames_tx(), 0);
}

#[tokio::test]
async fn precancelled_token_sends_nothing() {
    let (sink, mut rx) = mock::channel();
    let mut generator = Generator::new(GeneratorConfig::default(), pool(&["239.1.1.1"]), sink);
    assert_eq!(generator.state(), State::Idle);

    let token = CancellationToken::new();
    token.cancel();

    generator.run(token).await.unwrap();

    assert_eq!(generator.state(), State::Stopped);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn bier_frames_carry_the_encapsulation() {
    let template = BierHeader {
        bift_id: 0x12345,
        s: true,
        ttl: 64,
        nibble: NIBBLE_BIER,
        bsl: BSL_256,
        bfir_id: 0x42,
        ..Default::default()
    };

    let config = GeneratorConfig::default().interval(Duration::ZERO).bier(template);
    let (sink, mut rx) = mock::channel();

    let mut generator = Generator::new(config, pool(&["230.40.50.60"]), sink);
    let token = CancellationToken::new();
    let stop = token.clone();
    let handle = tokio::spawn(async move { generator.run(stop).await });

    let frame = rx.recv().await.unwrap();
    token.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(&frame[12..14], ETHERTYPE_BIER.to_be_bytes().as_slice());

    let header = BierHeader::decode(&frame[14..14 + HEADER_LEN]).unwrap();
    assert_eq!(header.bift_id, template.bift_id);
    assert_eq!(header.bfir_id, template.bfir_id);
    assert!(header.s);

    let ip = Ipv4Packet::new(&frame[14 + HEADER_LEN..]).unwrap();
    assert_eq!(ip.get_destination(), "230.40.50.60".parse::<std::net::Ipv4Addr>().unwrap());
}
