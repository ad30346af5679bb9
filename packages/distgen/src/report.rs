use std::fmt;
use std::time::Duration;

use crate::{AccessPattern, BLOCK_SIZE, PrettySize, Tally};

/// The results of one measured benchmark phase.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pattern: AccessPattern,
    iterations: u64,
    per_thread: Box<[Tally]>,
    total: Tally,
    elapsed: Duration,
}

impl Report {
    pub(crate) fn new(
        pattern: AccessPattern,
        iterations: u64,
        per_thread: Box<[Tally]>,
        elapsed: Duration,
    ) -> Self {
        let mut total = Tally::default();
        for tally in &per_thread {
            total += *tally;
        }

        Self {
            pattern,
            iterations,
            per_thread,
            total,
            elapsed,
        }
    }

    /// The access pattern that was measured.
    #[must_use]
    pub fn pattern(&self) -> AccessPattern {
        self.pattern
    }

    /// How many iterations every thread executed.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// The outcome of every worker thread, in worker order.
    #[must_use]
    pub fn per_thread(&self) -> &[Tally] {
        &self.per_thread
    }

    /// The outcomes of all worker threads combined.
    #[must_use]
    pub fn total(&self) -> Tally {
        self.total
    }

    /// Wall-clock time of the measured phase.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Bytes covered by all block accesses of all threads.
    #[must_use]
    pub fn bytes_accessed(&self) -> u64 {
        self.total.accesses().saturating_mul(BLOCK_SIZE as u64)
    }

    /// Achieved bandwidth over all threads, in GiB per second.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "throughput figures do not need more than f64 precision"
    )]
    pub fn gib_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }

        self.bytes_accessed() as f64 / seconds / (1u64 << 30) as f64
    }

    /// Average time of one access as seen by one thread, in nanoseconds.
    ///
    /// With a dependency chain, this approximates the access latency of the memory level
    /// that holds the working set.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "throughput figures do not need more than f64 precision"
    )]
    pub fn nanos_per_access(&self) -> f64 {
        let accesses = self.total.accesses();
        if accesses == 0 {
            return 0.0;
        }

        let threads = self.per_thread.len() as f64;
        self.elapsed.as_secs_f64() * 1e9 * threads / accesses as f64
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} on {} threads, {} iterations",
            self.pattern,
            self.per_thread.len(),
            self.iterations
        )?;
        writeln!(
            f,
            "  {} accesses ({}B) in {:.3} s",
            PrettySize(self.total.accesses()),
            PrettySize(self.bytes_accessed()),
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "  {:.2} GiB/s, {:.2} ns per access and thread",
            self.gib_per_second(),
            self.nanos_per_access()
        )?;
        write!(f, "  (sum: {})", self.total.sum())
    }
}
