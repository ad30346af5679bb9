use std::sync::Arc;
use std::time::Instant;

use many_cpus::ProcessorSet;
use tracing::{debug, info};

use crate::{
    BLOCK_SIZE, Buffer, Config, DEFAULT_TARGET_ACCESSES, Error, Placement, PrettySize, Report,
    Result, WorkerPool, Workload,
};

/// A configured benchmark with its worker threads.
///
/// The run happens in two phases. [`prepare()`](Self::prepare) lets every worker build its
/// own buffer; [`run()`](Self::run) then times the access loop on all workers. The first phase
/// is complete on every worker before the second one starts, so buffer initialization never
/// overlaps with a measurement.
///
/// # Examples
///
/// ```
/// use distgen::{Benchmark, Config};
///
/// let config = Config::builder()
///     .distances([4096, 64 * 1024])
///     .iterations(10)
///     .pin_threads(false)
///     .build()
///     .unwrap();
///
/// let mut benchmark = Benchmark::new(config).unwrap();
/// benchmark.prepare();
///
/// let report = benchmark.run();
/// assert_eq!(report.total().accesses(), 10 * 2 * 1024);
/// println!("{report}");
/// ```
#[derive(Debug)]
pub struct Benchmark {
    config: Config,
    workload: Arc<Workload>,
    iterations: u64,
    pool: WorkerPool,
    prepared: bool,
}

impl Benchmark {
    /// Plans the workload and starts the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffers would not fit in memory or if the threads are to be
    /// pinned but there are fewer processors than threads.
    pub fn new(config: Config) -> Result<Self> {
        let workload = Workload::new(config.distances().clone(), config.stride())?;

        let iterations = config
            .iterations()
            .unwrap_or_else(|| workload.iterations_for(DEFAULT_TARGET_ACCESSES));

        let placement = if config.pin_threads() {
            let processors = ProcessorSet::builder()
                .take(config.thread_count())
                .ok_or(Error::NotEnoughProcessors {
                    requested: config.thread_count().get(),
                })?;

            Placement::Pinned(processors)
        } else {
            Placement::Floating(config.thread_count())
        };

        let benchmark = Self {
            config,
            workload: Arc::new(workload),
            iterations,
            pool: WorkerPool::new(&placement),
            prepared: false,
        };

        if benchmark.config.verbose() {
            benchmark.describe();
        }

        Ok(benchmark)
    }

    /// The workload shared by all workers.
    #[must_use]
    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// The configuration the benchmark was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// How many iterations [`run()`](Self::run) executes on every thread.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Builds a fresh buffer on every worker, replacing any previous one.
    ///
    /// Returns once every worker has finished.
    pub fn prepare(&mut self) {
        let workload = Arc::clone(&self.workload);

        let started = Instant::now();

        self.pool.broadcast(move |worker| {
            worker.replace_buffer(Buffer::new(workload.layout()));
            debug!(worker = worker.index(), "buffer ready");
        });

        self.prepared = true;

        debug!(elapsed = ?started.elapsed(), "all buffers initialized");
    }

    /// Runs the timed access loop on every worker and reports the combined results.
    ///
    /// Prepares the buffers first if [`prepare()`](Self::prepare) has not been called. Calling
    /// this repeatedly reuses the same buffers, so write patterns see the values left behind
    /// by the previous run.
    pub fn run(&mut self) -> Report {
        if !self.prepared {
            self.prepare();
        }

        let workload = Arc::clone(&self.workload);
        let iterations = self.iterations;
        let pattern = self.config.pattern();

        if self.config.verbose() {
            info!(%pattern, iterations, "starting measurement");
        }

        let started = Instant::now();

        let per_thread = self.pool.broadcast(move |worker| {
            let buffer = worker
                .buffer_mut()
                .expect("buffers are prepared before the first measurement");

            workload.run(buffer, iterations, pattern)
        });

        let elapsed = started.elapsed();

        debug!(?elapsed, "measurement finished");

        Report::new(pattern, iterations, per_thread, elapsed)
    }

    fn describe(&self) {
        let distances = self.workload.distances();
        let layout = self.workload.layout();
        let threads = self.pool.thread_count().get() as u64;

        info!("number of distances: {}", distances.len());
        for (index, info) in distances.infos().iter().enumerate() {
            info!(
                "  D{:>2}: size {} ({} traversals per iteration)",
                index + 1,
                info.size(),
                info.iterations()
            );
        }

        // A write access both reads and writes the block.
        let mut accesses = self.workload.accesses_per_iteration();
        if self.config.pattern().writes() {
            accesses = accesses.saturating_mul(2);
        }
        let total_accesses = accesses
            .saturating_mul(threads)
            .saturating_mul(self.iterations);

        info!(
            "buffer size per thread {}B (total {}B), address diff {}",
            PrettySize(layout.buffer_bytes()),
            PrettySize(layout.buffer_bytes().saturating_mul(threads)),
            layout.block_stride() * BLOCK_SIZE as u64
        );
        info!(
            "accesses per iteration and thread: {} (total {} accs = {}B)",
            PrettySize(accesses),
            PrettySize(total_accesses),
            PrettySize(total_accesses.saturating_mul(BLOCK_SIZE as u64))
        );
    }
}
