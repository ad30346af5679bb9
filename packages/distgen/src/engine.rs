use std::ops::AddAssign;

use derive_more::Display;

use crate::{Buffer, Entry, Workload};

/// Value stored into an entry after a dependency-chain write, so that chain writes do not
/// accumulate from one traversal to the next.
const CHAIN_WRITE_VALUE: f64 = 1.23;

/// How the benchmark walks a buffer.
///
/// Index patterns compute the next position from the current one, so the processor can issue
/// many loads in parallel and the result approximates bandwidth. Chain patterns load the next
/// position from memory, so every access waits for the previous one and the result
/// approximates latency.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the four combinations of chain and write are the complete set"
)]
pub enum AccessPattern {
    /// Read every visited entry, advancing by the layout stride.
    #[default]
    #[display("index read")]
    IndexRead,

    /// Read every visited entry, following the dependency chain.
    #[display("chain read")]
    ChainRead,

    /// Increment every visited entry, advancing by the layout stride.
    #[display("index read-modify-write")]
    IndexWrite,

    /// Increment every visited entry, following the dependency chain.
    #[display("chain read-modify-write")]
    ChainWrite,
}

impl AccessPattern {
    /// Selects the pattern from its two independent properties.
    #[must_use]
    pub fn new(dependency_chain: bool, write: bool) -> Self {
        match (dependency_chain, write) {
            (false, false) => Self::IndexRead,
            (true, false) => Self::ChainRead,
            (false, true) => Self::IndexWrite,
            (true, true) => Self::ChainWrite,
        }
    }

    /// Whether the pattern follows the dependency chain.
    #[must_use]
    pub fn follows_chain(self) -> bool {
        matches!(self, Self::ChainRead | Self::ChainWrite)
    }

    /// Whether the pattern writes to the visited entries.
    #[must_use]
    pub fn writes(self) -> bool {
        matches!(self, Self::IndexWrite | Self::ChainWrite)
    }
}

/// The outcome of running the benchmark loop on one buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tally {
    sum: f64,
    accesses: u64,
}

impl Tally {
    /// Sum of all values read during the run.
    ///
    /// This exists so the compiler cannot discard the loads. It carries no meaning beyond
    /// being deterministic for a given configuration.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of block-level accesses performed.
    #[must_use]
    pub fn accesses(&self) -> u64 {
        self.accesses
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.sum += other.sum;
        self.accesses += other.accesses;
    }
}

impl Workload {
    /// Runs the benchmark loop `iterations` times over a buffer built for this workload.
    ///
    /// Every iteration traverses each distance, largest first, as many times as its iteration
    /// multiplier says. Each traversal starts at entry 0 and visits as many blocks as the
    /// distance spans.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was built for a different layout.
    pub fn run(&self, buffer: &mut Buffer, iterations: u64, pattern: AccessPattern) -> Tally {
        assert_eq!(
            buffer.block_count(),
            self.layout().block_count(),
            "buffer was built for a different layout"
        );

        let stride = self.layout().stride_in_entries();
        let entries = buffer.entries_mut();

        let mut tally = Tally::default();

        for _ in 0..iterations {
            for info in self.distances().infos() {
                let blocks = info.blocks();

                for _ in 0..info.iterations() {
                    tally.accesses += blocks;

                    tally.sum = match pattern {
                        AccessPattern::IndexRead => index_read(entries, blocks, stride, tally.sum),
                        AccessPattern::ChainRead => chain_read(entries, blocks, tally.sum),
                        AccessPattern::IndexWrite => {
                            index_write(entries, blocks, stride, tally.sum)
                        }
                        AccessPattern::ChainWrite => chain_write(entries, blocks, tally.sum),
                    };
                }
            }
        }

        tally
    }
}

#[inline]
fn advance(index: usize, stride: usize, len: usize) -> usize {
    let next = index + stride;
    if next >= len { next - len } else { next }
}

fn index_read(entries: &[Entry], blocks: u64, stride: usize, mut sum: f64) -> f64 {
    let len = entries.len();
    let mut index = 0;

    for _ in 0..blocks {
        sum += entries[index].value;
        index = advance(index, stride, len);
    }

    sum
}

fn chain_read(entries: &[Entry], blocks: u64, mut sum: f64) -> f64 {
    let mut index = 0;

    for _ in 0..blocks {
        let entry = &entries[index];
        sum += entry.value;
        index = entry.next;
    }

    sum
}

fn index_write(entries: &mut [Entry], blocks: u64, stride: usize, mut sum: f64) -> f64 {
    let len = entries.len();
    let mut index = 0;

    for _ in 0..blocks {
        let entry = &mut entries[index];
        entry.value += 1.0;
        sum += entry.value;
        index = advance(index, stride, len);
    }

    sum
}

fn chain_write(entries: &mut [Entry], blocks: u64, mut sum: f64) -> f64 {
    let mut index = 0;

    for _ in 0..blocks {
        let entry = &mut entries[index];
        entry.value += 1.0;
        sum += entry.value;
        entry.value = CHAIN_WRITE_VALUE;
        index = entry.next;
    }

    sum
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, reason = "sums of small integers are exact in f64")]

    use crate::{Distances, StridePolicy};

    use super::*;

    fn workload(sizes: &[u64], stride: StridePolicy) -> Workload {
        let mut distances = Distances::new();
        for &size in sizes {
            distances.add(size);
        }
        Workload::new(distances, stride).unwrap()
    }

    /// Sum of the initial values of the first `blocks` entries of the stride walk.
    fn expected_initial_sum(workload: &Workload, blocks: u64) -> f64 {
        let layout = workload.layout();
        let mut index = 0;
        let mut sum = 0.0;

        for _ in 0..blocks {
            sum += index as f64;
            index = (index + layout.stride_in_entries()) % layout.entry_count();
        }

        sum
    }

    #[test]
    fn pattern_from_flags() {
        assert_eq!(AccessPattern::new(false, false), AccessPattern::IndexRead);
        assert_eq!(AccessPattern::new(true, false), AccessPattern::ChainRead);
        assert_eq!(AccessPattern::new(false, true), AccessPattern::IndexWrite);
        assert_eq!(AccessPattern::new(true, true), AccessPattern::ChainWrite);

        for chain in [false, true] {
            for write in [false, true] {
                let pattern = AccessPattern::new(chain, write);
                assert_eq!(pattern.follows_chain(), chain);
                assert_eq!(pattern.writes(), write);
            }
        }
    }

    #[test]
    fn single_distance_index_read() {
        let workload = workload(&[4096], StridePolicy::Sequential);
        let mut buffer = Buffer::new(workload.layout());

        let tally = workload.run(&mut buffer, 1, AccessPattern::IndexRead);

        assert_eq!(tally.accesses(), 64);
        assert_eq!(tally.sum(), expected_initial_sum(&workload, 64));
    }

    #[test]
    fn reads_agree_between_index_and_chain() {
        for stride in [StridePolicy::Sequential, StridePolicy::PseudoRandom] {
            let workload = workload(&[1 << 16, 4096, 1024], stride);
            let mut buffer = Buffer::new(workload.layout());

            let by_index = workload.run(&mut buffer, 3, AccessPattern::IndexRead);
            let by_chain = workload.run(&mut buffer, 3, AccessPattern::ChainRead);

            assert_eq!(by_index, by_chain);
        }
    }

    #[test]
    fn multipliers_equalize_accesses() {
        let workload = workload(&[65536, 4096], StridePolicy::Sequential);
        let mut buffer = Buffer::new(workload.layout());

        let tally = workload.run(&mut buffer, 2, AccessPattern::IndexRead);

        // Per iteration: 1024 blocks once plus 64 blocks sixteen times.
        assert_eq!(tally.accesses(), 2 * (1024 + 16 * 64));

        let expected = 2.0
            * (expected_initial_sum(&workload, 1024) + 16.0 * expected_initial_sum(&workload, 64));
        assert_eq!(tally.sum(), expected);
    }

    #[test]
    fn zero_iterations_do_nothing() {
        let workload = workload(&[4096], StridePolicy::Sequential);
        let mut buffer = Buffer::new(workload.layout());

        let tally = workload.run(&mut buffer, 0, AccessPattern::ChainWrite);

        assert_eq!(tally, Tally::default());
        assert_eq!(buffer.entries()[0].value(), 0.0);
    }

    #[test]
    fn index_write_increments_visited_entries() {
        let workload = workload(&[4096], StridePolicy::PseudoRandom);
        let mut buffer = Buffer::new(workload.layout());

        let first = workload.run(&mut buffer, 1, AccessPattern::IndexWrite);
        let second = workload.run(&mut buffer, 1, AccessPattern::IndexWrite);

        assert_eq!(first.accesses(), 64);
        assert_eq!(
            first.sum(),
            expected_initial_sum(&workload, 64) + first.accesses() as f64
        );
        assert_eq!(second.sum() - first.sum(), second.accesses() as f64);

        let visited: Vec<_> = buffer.chain().take(64).collect();
        for (index, entry) in buffer.entries().iter().enumerate() {
            let bump = if visited.contains(&index) { 2.0 } else { 0.0 };
            assert_eq!(entry.value(), index as f64 + bump, "entry {index}");
        }
    }

    #[test]
    fn chain_write_resets_visited_entries() {
        let workload = workload(&[4096], StridePolicy::Sequential);
        let mut buffer = Buffer::new(workload.layout());

        let first = workload.run(&mut buffer, 1, AccessPattern::ChainWrite);
        assert_eq!(
            first.sum(),
            expected_initial_sum(&workload, 64) + first.accesses() as f64
        );

        for index in buffer.chain() {
            assert_eq!(buffer.entries()[index].value(), CHAIN_WRITE_VALUE);
        }

        // Every visit now reads the reset value plus one.
        let second = workload.run(&mut buffer, 1, AccessPattern::ChainWrite);
        let expected = (0..64).fold(0.0, |sum, _| sum + (CHAIN_WRITE_VALUE + 1.0));
        assert_eq!(second.sum(), expected);
    }

    #[test]
    fn tallies_add_up() {
        let mut total = Tally::default();
        total += Tally {
            sum: 1.5,
            accesses: 10,
        };
        total += Tally {
            sum: 2.5,
            accesses: 5,
        };

        assert_eq!(total.sum(), 4.0);
        assert_eq!(total.accesses(), 15);
    }

    #[test]
    #[should_panic]
    fn foreign_buffer_rejected() {
        let workload = workload(&[4096], StridePolicy::Sequential);
        let mut buffer = Buffer::new(&crate::Layout::plan(8192, StridePolicy::Sequential));

        _ = workload.run(&mut buffer, 1, AccessPattern::IndexRead);
    }
}
