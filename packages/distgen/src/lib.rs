//! Measures memory latency and bandwidth by walking per-thread buffers in controlled,
//! reproducible access patterns at one or more working-set sizes ("distances").
//!
//! Each distance is meant to fit a particular level of the memory hierarchy: a few KiB stay in
//! the L1 cache, a few MiB in the last-level cache, anything larger exercises main memory.
//! Every worker thread owns a buffer sized for the largest distance and traverses each
//! distance repeatedly, smaller distances more often, so that each distance touches about the
//! same number of bytes per iteration.
//!
//! # Operating principles
//!
//! ## Layout
//!
//! Buffers consist of 64-byte blocks, one per cache line. Accesses advance through the blocks
//! with a fixed stride that is coprime with the block count (see [`adjust_block_count()`]),
//! so a walk from block 0 visits every block exactly once before it returns. The stride is
//! either 1 ([`StridePolicy::Sequential`]) or about 7/17 of the buffer
//! ([`StridePolicy::PseudoRandom`]).
//!
//! ## Access patterns
//!
//! The same walk can be performed by computing each position from the previous one, or by
//! following a dependency chain stored in the buffer itself, and each visited block can be
//! either read or incremented. See [`AccessPattern`].
//!
//! ## Threads
//!
//! A [`Benchmark`] owns a pool with one worker thread per configured thread, each optionally
//! pinned to its own processor. Every worker first builds its own buffer, then, once all
//! buffers are ready, runs the measured loop. Workers never share memory.
//!
//! # Example
//!
//! ```
//! use distgen::{Benchmark, Config};
//!
//! let config = Config::builder()
//!     .distances([16 * 1024, 1024 * 1024])
//!     .dependency_chain(true)
//!     .iterations(3)
//!     .pin_threads(false)
//!     .build()
//!     .unwrap();
//!
//! let mut benchmark = Benchmark::new(config).unwrap();
//! benchmark.prepare();
//!
//! let report = benchmark.run();
//! println!("{:.2} ns per access", report.nanos_per_access());
//! ```

mod benchmark;
mod buffer;
mod config;
mod distances;
mod engine;
mod error;
mod layout;
mod pool;
mod report;
mod units;
mod workload;

pub use benchmark::*;
pub use buffer::*;
pub use config::*;
pub use distances::*;
pub use engine::*;
pub use error::*;
pub use layout::*;
pub(crate) use pool::{Placement, WorkerPool};
pub use report::*;
pub use units::*;
pub use workload::*;

/// Size of one block in bytes. Blocks are the unit in which buffers are laid out and
/// accesses are counted, matching the cache line size of common processors.
pub const BLOCK_SIZE: usize = 64;

/// Number of [`Entry`] values in one block.
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / size_of::<Entry>();
