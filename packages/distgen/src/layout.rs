use derive_more::Display;
use num_integer::Integer;

use crate::{BLOCK_SIZE, ENTRIES_PER_BLOCK};

/// How consecutive accesses advance through the blocks of a buffer.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a stride is either unit or spread over the buffer, there is no third option"
)]
pub enum StridePolicy {
    /// Visit neighboring blocks one after another.
    #[default]
    #[display("sequential")]
    Sequential,

    /// Advance by roughly 7/17 of the buffer on every access, producing an order that looks
    /// random to the hardware prefetcher while remaining fully reproducible.
    #[display("pseudo-random")]
    PseudoRandom,
}

/// Block count and stride of the per-thread buffers.
///
/// The two values are always coprime, so that repeatedly advancing by `block_stride` modulo
/// `block_count` visits every block exactly once before returning to the first block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    block_count: u64,
    block_stride: u64,
}

impl Layout {
    /// Plans the layout for a buffer that can hold `largest_distance` bytes.
    ///
    /// The block count may end up larger than strictly necessary because it is increased until
    /// it is coprime with the stride.
    #[must_use]
    pub fn plan(largest_distance: u64, policy: StridePolicy) -> Self {
        let blocks = largest_distance.div_ceil(BLOCK_SIZE as u64);

        let block_stride = match policy {
            StridePolicy::Sequential => 1,
            // Tiny buffers would otherwise get a zero stride, which never leaves block 0.
            StridePolicy::PseudoRandom => u64::try_from(u128::from(blocks) * 7 / 17)
                .expect("7/17 of a u64 fits in a u64")
                .max(1),
        };

        Self {
            block_count: adjust_block_count(blocks, block_stride),
            block_stride,
        }
    }

    /// Number of cache-line-sized blocks in each buffer.
    #[must_use]
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Number of blocks between two consecutively accessed blocks.
    #[must_use]
    pub fn block_stride(&self) -> u64 {
        self.block_stride
    }

    /// Size of each buffer in bytes.
    #[must_use]
    pub fn buffer_bytes(&self) -> u64 {
        self.block_count.saturating_mul(BLOCK_SIZE as u64)
    }

    /// Number of entries in each buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer does not fit in the address space. Workloads validate this when
    /// they are created.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        to_entries(self.block_count)
    }

    /// Number of entries between two consecutively accessed entries.
    #[must_use]
    pub fn stride_in_entries(&self) -> usize {
        to_entries(self.block_stride)
    }

    /// Whether every buffer described by this layout can be addressed on this platform.
    #[must_use]
    pub(crate) fn fits_in_memory(&self) -> bool {
        usize::try_from(self.block_count)
            .ok()
            .and_then(|blocks| blocks.checked_mul(BLOCK_SIZE))
            .is_some_and(|bytes| isize::try_from(bytes).is_ok())
    }
}

fn to_entries(blocks: u64) -> usize {
    usize::try_from(blocks)
        .ok()
        .and_then(|blocks| blocks.checked_mul(ENTRIES_PER_BLOCK))
        .expect("buffer size was validated to fit in the address space")
}

/// Returns the smallest block count that is not smaller than `block_count` and shares no
/// common divisor with `stride`.
///
/// The search advances one block at a time. This is not the fastest way to find a coprime
/// value but it is what makes the chosen buffer sizes reproducible.
///
/// # Examples
///
/// ```
/// use distgen::adjust_block_count;
///
/// assert_eq!(adjust_block_count(1024, 421), 1024);
/// assert_eq!(adjust_block_count(1024, 2), 1025);
/// assert_eq!(adjust_block_count(30, 6), 31);
/// ```
#[must_use]
pub fn adjust_block_count(block_count: u64, stride: u64) -> u64 {
    let mut adjusted = block_count;

    while adjusted.gcd(&stride) > 1 {
        adjusted += 1;
    }

    adjusted
}
