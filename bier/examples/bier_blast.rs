//! Sends BIER-encapsulated UDP frames on the loopback interface until Ctrl-C.
//!
//! Needs CAP_NET_RAW (or root) for the raw datalink channel.

use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use bier::{
    proto, BierHeader, DatalinkSink, DestinationPool, Generator, GeneratorConfig, BSL_256,
    NIBBLE_BIER,
};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let header = BierHeader {
        bift_id: 0x12345,
        tc: 1,
        s: true,
        ttl: 64,
        nibble: NIBBLE_BIER,
        bsl: BSL_256,
        entropy: 0x0F_FFFF,
        proto: proto::IPV4,
        bfir_id: 0x42,
        ..Default::default()
    };

    let config = GeneratorConfig::default()
        .interval(Duration::from_millis(50))
        .payload(Bytes::from_static(b"Hello via BIER"))
        .bier(header);

    let pool = DestinationPool::new(vec![
        "230.40.50.60".parse().unwrap(),
        "239.1.1.1".parse().unwrap(),
    ])
    .unwrap();

    let sink = DatalinkSink::new("lo").expect("opening a raw channel on lo");
    let mut generator = Generator::new(config, pool, sink);
    let stats = generator.stats();

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("listening for ctrl-c");
        stop.cancel();
    });

    if let Err(e) = generator.run(token).await {
        tracing::error!("generator stopped: {}", e);
    }

    tracing::info!(frames = stats.frames_tx(), bytes = stats.bytes_tx(), "done");
}
