use std::{fmt, sync::Arc, time::SystemTime};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bier_transport::FrameSink;

use crate::{frame, DestinationPool, GenError, GeneratorConfig, GeneratorStats};

/// Lifecycle of a [`Generator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, [`run`](Generator::run) not yet called.
    Idle,
    /// Inside the send loop.
    Running,
    /// The loop returned, either on cancellation or on a fatal error.
    Stopped,
}

/// The traffic generator loop.
///
/// Every iteration draws one destination from the pool, builds one frame and
/// hands it to the sink, then sleeps for the configured interval. The RNG is
/// injectable so tests can make destination selection deterministic.
pub struct Generator<S: FrameSink, R: Rng = StdRng> {
    config: GeneratorConfig,
    pool: DestinationPool,
    sink: S,
    rng: R,
    stats: Arc<GeneratorStats>,
    state: State,
}

impl<S: FrameSink> Generator<S, StdRng> {
    /// Creates a generator with an entropy-seeded RNG.
    pub fn new(config: GeneratorConfig, pool: DestinationPool, sink: S) -> Self {
        Self::with_rng(config, pool, sink, StdRng::from_entropy())
    }
}

impl<S: FrameSink, R: Rng> Generator<S, R> {
    /// Creates a generator drawing destinations from the given RNG.
    pub fn with_rng(config: GeneratorConfig, pool: DestinationPool, sink: S, rng: R) -> Self {
        Self {
            config,
            pool,
            sink,
            rng,
            stats: Arc::new(GeneratorStats::default()),
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Counters of this generator, shared with the run loop.
    pub fn stats(&self) -> Arc<GeneratorStats> {
        Arc::clone(&self.stats)
    }

    /// Drives the send loop until `shutdown` is cancelled or the sink fails
    /// fatally. Cancellation interrupts the inter-send sleep, so the loop
    /// terminates within one interval.
    ///
    /// Transient transport errors are logged and the loop moves on to the
    /// next iteration; there is no retry of the failed frame.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), GenError> {
        self.state = State::Running;
        let result = self.drive(&shutdown).await;
        self.state = State::Stopped;

        result
    }

    async fn drive(&mut self, shutdown: &CancellationToken) -> Result<(), GenError> {
        loop {
            if shutdown.is_cancelled() {
                return Ok(());
            }

            let dest = self.pool.pick(&mut self.rng);
            let frame = match frame::build_frame(&self.config, dest) {
                Ok(frame) => frame,
                Err(e) => {
                    error!(dest = %dest, err = %e, "invalid frame template, stopping");
                    return Err(e.into());
                }
            };
            let len = frame.len();

            match self.sink.send_frame(frame).await {
                Ok(()) => {
                    self.stats.increment_tx(len);
                    info!(dest = %dest, len, ts = unix_micros(), "frame sent");
                }
                Err(e) if e.is_fatal() => {
                    error!(dest = %dest, err = %e, "fatal transport error, stopping");
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(dest = %dest, err = %e, "send failed, continuing");
                }
            }

            if self.config.interval.is_zero() {
                // keep the runtime cooperative when blasting at full rate
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}

impl<S: FrameSink, R: Rng> fmt::Debug for Generator<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("state", &self.state)
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish()
    }
}

/// Returns the current UNIX timestamp in microseconds.
#[inline]
fn unix_micros() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_micros() as u64
}
