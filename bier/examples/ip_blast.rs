//! Sends plain IP/UDP frames to a random multicast destination every 50 ms,
//! with no BIER encapsulation, until Ctrl-C.

use tokio_util::sync::CancellationToken;

use bier::{DatalinkSink, DestinationPool, Generator, GeneratorConfig};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let pool = DestinationPool::new(
        [
            "230.40.50.60",
            "239.1.1.1",
            "ff3e::1",
            "ff3e::abcd",
            "ff3e::2:2",
            "ff05::1234",
            "ff3e::ffff",
        ]
        .iter()
        .map(|a| a.parse().unwrap())
        .collect(),
    )
    .unwrap();

    let sink = DatalinkSink::new("lo").expect("opening a raw channel on lo");
    let mut generator = Generator::new(GeneratorConfig::default(), pool, sink);

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("listening for ctrl-c");
        stop.cancel();
    });

    if let Err(e) = generator.run(token).await {
        tracing::error!("generator stopped: {}", e);
    }
}
