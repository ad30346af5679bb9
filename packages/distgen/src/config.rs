use std::num::NonZero;

use new_zealand::nz;

use crate::{AccessPattern, Distances, Error, MAX_DISTANCES, Result, StridePolicy};

/// The maximum number of worker threads a benchmark run may use.
pub const MAX_THREADS: usize = 64;

/// When no iteration count is configured, enough iterations are run for every thread to
/// perform at least this many block accesses.
pub const DEFAULT_TARGET_ACCESSES: u64 = 50_000_000;

/// Validated options of a benchmark run.
///
/// Use [`Config::builder()`] to create one.
///
/// # Examples
///
/// ```
/// use distgen::{AccessPattern, Config, StridePolicy};
///
/// let config = Config::builder()
///     .threads(2)
///     .distances([32 * 1024, 4 * 1024 * 1024])
///     .stride(StridePolicy::PseudoRandom)
///     .dependency_chain(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.pattern(), AccessPattern::ChainRead);
/// assert_eq!(config.distances().sizes(), &[4 * 1024 * 1024, 32 * 1024]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    thread_count: NonZero<usize>,
    distances: Distances,
    stride: StridePolicy,
    pattern: AccessPattern,
    iterations: Option<u64>,
    pin_threads: bool,
    verbose: bool,
}

impl Config {
    /// Starts configuring a benchmark run.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Number of worker threads.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// The working-set sizes to exercise.
    #[must_use]
    pub fn distances(&self) -> &Distances {
        &self.distances
    }

    /// How accesses advance through the buffer.
    #[must_use]
    pub fn stride(&self) -> StridePolicy {
        self.stride
    }

    /// How each visited entry is accessed.
    #[must_use]
    pub fn pattern(&self) -> AccessPattern {
        self.pattern
    }

    /// The explicitly configured iteration count, if any.
    ///
    /// When `None`, the count is derived from the workload, see
    /// [`DEFAULT_TARGET_ACCESSES`].
    #[must_use]
    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    /// Whether each worker thread is pinned to its own processor.
    #[must_use]
    pub fn pin_threads(&self) -> bool {
        self.pin_threads
    }

    /// Whether the run describes its layout and progress in the log.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Builder for [`Config`].
///
/// Every option has a default except the distances, of which at least one is required.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    threads: usize,
    distances: Vec<u64>,
    stride: StridePolicy,
    dependency_chain: bool,
    write: bool,
    iterations: Option<u64>,
    pin_threads: bool,
    verbose: bool,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            threads: 1,
            distances: Vec::new(),
            stride: StridePolicy::default(),
            dependency_chain: false,
            write: false,
            iterations: None,
            pin_threads: true,
            verbose: false,
        }
    }

    /// Sets the number of worker threads. Defaults to 1.
    #[must_use]
    pub fn threads(mut self, count: usize) -> Self {
        self.threads = count;
        self
    }

    /// Adds one working-set size, in bytes.
    #[must_use]
    pub fn distance(mut self, bytes: u64) -> Self {
        self.distances.push(bytes);
        self
    }

    /// Adds several working-set sizes, in bytes.
    #[must_use]
    pub fn distances(mut self, sizes: impl IntoIterator<Item = u64>) -> Self {
        self.distances.extend(sizes);
        self
    }

    /// Sets how accesses advance through the buffer. Defaults to sequential.
    #[must_use]
    pub fn stride(mut self, stride: StridePolicy) -> Self {
        self.stride = stride;
        self
    }

    /// Whether to follow the dependency chain instead of computing positions.
    #[must_use]
    pub fn dependency_chain(mut self, enabled: bool) -> Self {
        self.dependency_chain = enabled;
        self
    }

    /// Whether to write to every visited entry.
    #[must_use]
    pub fn write(mut self, enabled: bool) -> Self {
        self.write = enabled;
        self
    }

    /// Sets the number of iterations. Zero is allowed and performs no accesses.
    #[must_use]
    pub fn iterations(mut self, count: u64) -> Self {
        self.iterations = Some(count);
        self
    }

    /// Whether to pin each worker to its own processor. Defaults to `true`.
    #[must_use]
    pub fn pin_threads(mut self, enabled: bool) -> Self {
        self.pin_threads = enabled;
        self
    }

    /// Whether to describe the layout and progress of the run in the log.
    #[must_use]
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count is above [`MAX_THREADS`], if no distances were
    /// given, if a distance is zero or if more than [`MAX_DISTANCES`] distinct distances were
    /// given. A thread count of zero is treated as one.
    pub fn build(self) -> Result<Config> {
        if self.threads > MAX_THREADS {
            return Err(Error::TooManyThreads {
                requested: self.threads,
                max: MAX_THREADS,
            });
        }

        // Zero threads means the default of one.
        let thread_count = NonZero::new(self.threads).unwrap_or(nz!(1));

        let mut distances = Distances::new();

        for size in self.distances {
            if size == 0 {
                return Err(Error::ZeroDistance);
            }

            if distances.is_full() && !distances.contains(size) {
                return Err(Error::TooManyDistances { max: MAX_DISTANCES });
            }

            distances.add(size);
        }

        if distances.is_empty() {
            return Err(Error::NoDistances);
        }

        Ok(Config {
            thread_count,
            distances,
            stride: self.stride,
            pattern: AccessPattern::new(self.dependency_chain, self.write),
            iterations: self.iterations,
            pin_threads: self.pin_threads,
            verbose: self.verbose,
        })
    }
}
