use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for a generator run. These are shared between the generator
/// task and its owner.
#[derive(Debug, Default)]
pub struct GeneratorStats {
    /// Total frames handed to the sink.
    frames_tx: AtomicUsize,
    /// Total bytes handed to the sink.
    bytes_tx: AtomicUsize,
}

impl GeneratorStats {
    #[inline]
    pub(crate) fn increment_tx(&self, bytes: usize) {
        self.frames_tx.fetch_add(1, Ordering::Relaxed);
        self.bytes_tx.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn frames_tx(&self) -> usize {
        self.frames_tx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_tx(&self) -> usize {
        self.bytes_tx.load(Ordering::Relaxed)
    }
}
