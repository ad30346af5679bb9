use std::{fmt, slice};

use static_assertions::const_assert_eq;
use tracing::trace;

use crate::{BLOCK_SIZE, ENTRIES_PER_BLOCK, Layout};

/// Marks an entry that is not part of the dependency chain (yet).
const UNSET: usize = usize::MAX;

/// One element of a benchmark buffer: a value to accumulate plus the index of the entry that
/// follows it in the dependency chain.
///
/// The entry is 16 bytes on every platform, so that four entries share one cache line.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C, align(16))]
pub struct Entry {
    pub(crate) value: f64,
    pub(crate) next: usize,
}

const_assert_eq!(size_of::<Entry>(), 16);

impl Entry {
    #[expect(
        clippy::cast_precision_loss,
        reason = "indexes stay far below 2^53 for any buffer that fits in memory"
    )]
    fn new(index: usize) -> Self {
        Self {
            value: index as f64,
            next: UNSET,
        }
    }

    /// The current value of the entry.
    ///
    /// Starts out as the index of the entry and changes only when a benchmark writes to it.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The index of the next entry in the dependency chain, or `None` if this entry is not a
    /// member of the chain.
    #[must_use]
    pub fn next(&self) -> Option<usize> {
        (self.next != UNSET).then_some(self.next)
    }
}

/// One block of a buffer, aligned so that it occupies exactly one cache line.
#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct CacheLine([Entry; ENTRIES_PER_BLOCK]);

const_assert_eq!(size_of::<CacheLine>(), BLOCK_SIZE);
const_assert_eq!(align_of::<CacheLine>(), BLOCK_SIZE);

impl CacheLine {
    fn new(block: usize) -> Self {
        let first = block * ENTRIES_PER_BLOCK;
        Self(std::array::from_fn(|offset| Entry::new(first + offset)))
    }
}

/// Per-thread benchmark memory, laid out as a sequence of cache-line-aligned blocks.
///
/// The same memory is reachable in two ways:
///
/// * By index, advancing by [`Layout::stride_in_entries()`] modulo the entry count.
/// * By following the dependency chain that links the first entry of every block, starting
///   at entry 0. The chain visits the blocks in the same order as the index walk but every
///   step depends on the value loaded by the previous one.
///
/// A buffer is built once by the worker thread that uses it and is never shared with other
/// threads.
pub struct Buffer {
    lines: Box<[CacheLine]>,
    block_count: u64,
}

impl Buffer {
    /// Allocates a buffer for the given layout and builds its dependency chain.
    ///
    /// # Panics
    ///
    /// Panics if the layout does not describe a single full cycle over all blocks. This
    /// indicates a defect in the layout planner, not a problem with the input.
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        let entry_count = layout.entry_count();
        let line_count = entry_count / ENTRIES_PER_BLOCK;

        // Initialized by the calling thread, so the pages end up local to it.
        let lines = (0..line_count).map(CacheLine::new).collect();

        let mut buffer = Self {
            lines,
            block_count: layout.block_count(),
        };

        buffer.link_chain(layout.stride_in_entries());

        trace!(
            blocks = buffer.block_count,
            bytes = layout.buffer_bytes(),
            "buffer initialized"
        );

        buffer
    }

    fn link_chain(&mut self, stride: usize) {
        let block_count = self.block_count;
        let entries = self.entries_mut();
        let entry_count = entries.len();

        let mut index = 0;

        for step in 0..block_count {
            let mut next = index + stride;
            if next >= entry_count {
                next -= entry_count;
            }

            let entry = &mut entries[index];
            assert!(
                entry.next == UNSET,
                "dependency chain revisits entry {index} after {step} steps: stride {stride} does not cycle through all {entry_count} entries"
            );
            entry.next = next;

            index = next;
        }

        assert_eq!(index, 0, "dependency chain must return to its start");
    }

    /// Number of blocks in the buffer.
    #[must_use]
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// All entries of the buffer, in memory order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        // SAFETY: `CacheLine` is a `repr(C)` wrapper around an array of entries and its size
        // equals the size of that array (asserted above), so the lines form one contiguous,
        // properly aligned run of initialized entries.
        unsafe {
            slice::from_raw_parts(
                self.lines.as_ptr().cast::<Entry>(),
                self.lines.len() * ENTRIES_PER_BLOCK,
            )
        }
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        let len = self.lines.len() * ENTRIES_PER_BLOCK;

        // SAFETY: See `entries()`. The exclusive borrow of `self` covers every line.
        unsafe { slice::from_raw_parts_mut(self.lines.as_mut_ptr().cast::<Entry>(), len) }
    }

    /// Follows the dependency chain from entry 0 for one full cycle, yielding the index of
    /// every entry on the way (starting with 0).
    pub fn chain(&self) -> impl Iterator<Item = usize> + '_ {
        let entries = self.entries();
        let mut index = 0;

        (0..self.block_count).map(move |_| {
            let current = index;
            index = entries[current].next;
            current
        })
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("block_count", &self.block_count)
            .field("address", &self.lines.as_ptr())
            .finish_non_exhaustive()
    }
}
