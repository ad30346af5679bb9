use std::iter;
use std::num::NonZero;
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};

use many_cpus::ProcessorSet;
use tracing::debug;

use crate::Buffer;

/// Where the worker threads of a [`WorkerPool`] run.
#[derive(Clone, Debug)]
pub(crate) enum Placement {
    /// One worker per processor in the set, each pinned to its own processor.
    Pinned(ProcessorSet),

    /// The given number of workers, scheduled freely by the operating system.
    Floating(NonZero<usize>),
}

impl Placement {
    /// The number of worker threads this placement results in.
    #[must_use]
    pub(crate) fn thread_count(&self) -> NonZero<usize> {
        match self {
            Self::Pinned(processors) => NonZero::new(processors.len())
                .expect("guarded by fact that ProcessorSet is never empty"),
            Self::Floating(count) => *count,
        }
    }
}

/// State owned by one worker thread for as long as the pool exists.
///
/// Nothing in here is ever shared with another thread: commands broadcast by the pool run on
/// the worker thread itself and receive exclusive access.
#[derive(Debug)]
pub(crate) struct Worker {
    index: usize,
    buffer: Option<Buffer>,
}

impl Worker {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut Buffer> {
        self.buffer.as_mut()
    }

    pub(crate) fn replace_buffer(&mut self, buffer: Buffer) {
        self.buffer = Some(buffer);
    }
}

/// Fixed set of worker threads, each owning its own benchmark buffer.
///
/// Work is handed to the pool one phase at a time: every worker executes the same task
/// against its own [`Worker`] state and the pool waits for all of them before returning, so
/// one phase never overlaps with the next.
///
/// # Lifecycle
///
/// Dropping the pool waits for all threads to finish their current task and releases their
/// buffers.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,
    thread_count: NonZero<usize>,
}

impl WorkerPool {
    /// Starts the worker threads.
    #[must_use]
    pub(crate) fn new(placement: &Placement) -> Self {
        let thread_count = placement.thread_count();

        let (txs, rxs): (Vec<_>, Vec<_>) = iter::repeat_with(mpsc::channel)
            .take(thread_count.get())
            .unzip();

        let join_handles = match placement {
            Placement::Pinned(processors) => {
                let rxs = Arc::new(Mutex::new(rxs.into_iter().enumerate().collect::<Vec<_>>()));

                processors
                    .spawn_threads({
                        let rxs = Arc::clone(&rxs);
                        move |processor| {
                            let (index, rx) = rxs
                                .lock()
                                .expect("no worker can panic while holding the lock")
                                .pop()
                                .expect("one receiver is created per processor");

                            debug!(
                                worker = index,
                                processor = processor.id(),
                                "worker thread started"
                            );
                            worker_entrypoint(index, &rx);
                        }
                    })
                    .into_vec()
            }
            Placement::Floating(_) => rxs
                .into_iter()
                .enumerate()
                .map(|(index, rx)| {
                    thread::Builder::new()
                        .name(format!("distgen-worker-{index}"))
                        .spawn(move || {
                            debug!(worker = index, "worker thread started");
                            worker_entrypoint(index, &rx);
                        })
                        .expect("failed to spawn worker thread: thread spawning failure is not supported")
                })
                .collect(),
        };

        Self {
            command_txs: txs,
            join_handles,
            thread_count,
        }
    }

    /// Returns the number of threads in the pool.
    #[must_use]
    pub(crate) fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Executes a task on every worker, waiting for all of them to complete and returning
    /// their results in worker order.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "one phase at a time, a shared pool would interleave phases"
    )]
    pub(crate) fn broadcast<F, R>(&mut self, f: F) -> Box<[R]>
    where
        F: FnOnce(&mut Worker) -> R + Clone + Send + 'static,
        R: Send + 'static,
    {
        let (result_txs, result_rxs): (Vec<_>, Vec<_>) = iter::repeat_with(oneshot::channel::<R>)
            .take(self.thread_count.get())
            .unzip();

        for (tx, result_tx) in self.command_txs.iter().zip(result_txs) {
            let f = f.clone();

            tx.send(Command::Execute(Box::new(move |worker: &mut Worker| {
                let result = f(worker);

                result_tx
                    .send(result)
                    .expect("receiver must still exist - the pool waits for every result");
            })))
            .expect("worker thread must still exist - thread pool cannot operate without workers");
        }

        result_rxs
            .into_iter()
            .map(|rx| {
                rx.recv()
                    .expect("worker thread failed to send result - did it panic?")
            })
            .collect()
    }
}

impl Drop for WorkerPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // If the thread is panicking, we are probably in a dirty state and shutting down
            // may make the problem worse by hiding the original panic, so just do nothing.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that panicked has already dropped its receiver.
            _ = tx.send(Command::Shutdown);
        }

        for handle in self.join_handles.drain(..) {
            if handle.join().is_err() {
                debug!("worker thread had panicked");
            }
        }
    }
}

type Task = Box<dyn FnOnce(&mut Worker) + Send>;

enum Command {
    Execute(Task),
    Shutdown,
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that things do not happen when worker function is missing.
fn worker_entrypoint(index: usize, rx: &mpsc::Receiver<Command>) {
    let mut worker = Worker {
        index,
        buffer: None,
    };

    while let Ok(Command::Execute(f)) = rx.recv() {
        f(&mut worker);
    }

    debug!(worker = index, "worker thread exiting");
}
