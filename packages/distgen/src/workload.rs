use crate::{Distances, Error, Layout, Result, StridePolicy};

/// Everything the worker threads need to know about the memory they exercise: the registered
/// distances with their derived metadata, plus the layout of the per-thread buffers.
///
/// A workload is built before any worker starts and is only read afterwards, so all workers
/// share one instance.
///
/// # Examples
///
/// ```
/// use distgen::{AccessPattern, Buffer, Distances, StridePolicy, Workload};
///
/// let mut distances = Distances::new();
/// distances.add(4096);
///
/// let workload = Workload::new(distances, StridePolicy::Sequential).unwrap();
/// let mut buffer = Buffer::new(workload.layout());
///
/// let tally = workload.run(&mut buffer, 1, AccessPattern::IndexRead);
/// assert_eq!(tally.accesses(), 64);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Workload {
    distances: Distances,
    layout: Layout,
}

impl Workload {
    /// Plans the buffer layout for the given distances.
    ///
    /// # Errors
    ///
    /// Returns an error if no distances are registered or if the largest distance does not fit
    /// in the address space.
    pub fn new(distances: Distances, stride: StridePolicy) -> Result<Self> {
        let largest = distances.largest().ok_or(Error::NoDistances)?;
        let layout = Layout::plan(largest, stride);

        if !layout.fits_in_memory() {
            return Err(Error::BufferTooLarge {
                bytes: layout.buffer_bytes(),
            });
        }

        Ok(Self { distances, layout })
    }

    /// The registered distances, largest first.
    #[must_use]
    pub fn distances(&self) -> &Distances {
        &self.distances
    }

    /// The layout shared by all per-thread buffers.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Block accesses that one iteration performs on one thread.
    #[must_use]
    pub fn accesses_per_iteration(&self) -> u64 {
        self.distances.accesses_per_iteration()
    }

    /// The smallest iteration count that makes one thread perform at least `target_accesses`
    /// block accesses. Always at least one.
    #[must_use]
    pub fn iterations_for(&self, target_accesses: u64) -> u64 {
        target_accesses
            .div_ceil(self.accesses_per_iteration().max(1))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distances(sizes: &[u64]) -> Distances {
        let mut distances = Distances::new();
        for &size in sizes {
            distances.add(size);
        }
        distances
    }

    #[test]
    fn layout_follows_largest_distance() {
        let workload = Workload::new(distances(&[4096, 65536]), StridePolicy::Sequential).unwrap();

        assert_eq!(workload.layout().block_count(), 1024);
        assert_eq!(workload.distances().sizes(), &[65536, 4096]);
        assert_eq!(workload.accesses_per_iteration(), 2048);
    }

    #[test]
    fn empty_distances_rejected() {
        let result = Workload::new(Distances::new(), StridePolicy::Sequential);

        assert!(matches!(result, Err(Error::NoDistances)));
    }

    #[test]
    fn unaddressable_buffer_rejected() {
        let result = Workload::new(distances(&[u64::MAX]), StridePolicy::Sequential);

        assert!(matches!(result, Err(Error::BufferTooLarge { .. })));
    }

    #[test]
    fn iterations_for_target() {
        let workload = Workload::new(distances(&[4096]), StridePolicy::Sequential).unwrap();

        assert_eq!(workload.iterations_for(64), 1);
        assert_eq!(workload.iterations_for(65), 2);
        assert_eq!(workload.iterations_for(6400), 100);
        assert_eq!(workload.iterations_for(0), 1);
    }
}
