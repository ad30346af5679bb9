use crate::BLOCK_SIZE;

/// How many distinct distances a [`Distances`] registry can hold.
pub const MAX_DISTANCES: usize = 32;

const BLOCK_BYTES: u64 = BLOCK_SIZE as u64;

/// Metadata derived from one registered distance.
///
/// The values are recomputed whenever the registry changes because the iteration multiplier
/// of every distance depends on the largest registered distance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DistanceInfo {
    size: u64,
    blocks: u64,
    iterations: u64,
}

impl DistanceInfo {
    fn new(size: u64, largest: u64) -> Self {
        Self {
            size,
            blocks: size.div_ceil(BLOCK_BYTES),
            iterations: largest / size,
        }
    }

    /// The working-set size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// How many cache-line-sized blocks one traversal of this distance touches.
    #[must_use]
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// How many times this distance is traversed per iteration.
    ///
    /// Smaller distances are traversed more often, so that every distance touches roughly
    /// the same number of bytes per iteration.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Block accesses contributed by this distance to one iteration.
    #[must_use]
    pub fn accesses_per_iteration(&self) -> u64 {
        self.blocks
            .checked_mul(self.iterations)
            .expect("bounded by the block count of the largest distance, which fits in memory")
    }
}

/// The set of working-set sizes ("distances") that a benchmark run exercises.
///
/// Distances are kept sorted in strictly descending order, so the first distance is always the
/// largest one and determines the size of the per-thread buffers.
///
/// # Examples
///
/// ```
/// use distgen::Distances;
///
/// let mut distances = Distances::new();
/// distances.add(4096);
/// distances.add(1024);
/// distances.add(4096);
/// distances.add(65536);
///
/// assert_eq!(distances.sizes(), &[65536, 4096, 1024]);
/// assert_eq!(distances.iteration_multiplier(4096), Some(16));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Distances {
    sizes: Vec<u64>,
    infos: Vec<DistanceInfo>,
}

impl Distances {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a distance, keeping the registry sorted in descending order.
    ///
    /// Returns `false` if the distance was already registered, in which case nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if the distance is zero or if the registry already holds [`MAX_DISTANCES`]
    /// distances. Callers that handle user input validate both beforehand.
    pub fn add(&mut self, size: u64) -> bool {
        assert!(size > 0, "a distance must be at least one byte");

        // Descending order: anything larger than `size` sorts before it.
        let position = match self.sizes.binary_search_by(|probe| size.cmp(probe)) {
            Ok(_) => return false,
            Err(position) => position,
        };

        assert!(
            self.sizes.len() < MAX_DISTANCES,
            "distance registry is full ({MAX_DISTANCES} distances)"
        );

        self.sizes.insert(position, size);
        self.refresh();

        true
    }

    /// Whether the distance is already registered.
    #[must_use]
    pub fn contains(&self, size: u64) -> bool {
        self.sizes.binary_search_by(|probe| size.cmp(probe)).is_ok()
    }

    /// Whether no more distinct distances can be registered.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.sizes.len() >= MAX_DISTANCES
    }

    /// The registered distances, largest first.
    #[must_use]
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// The derived metadata of every registered distance, largest first.
    #[must_use]
    pub fn infos(&self) -> &[DistanceInfo] {
        &self.infos
    }

    /// The largest registered distance, if any.
    #[must_use]
    pub fn largest(&self) -> Option<u64> {
        self.sizes.first().copied()
    }

    /// The number of registered distances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether no distances are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The number of blocks one traversal of a registered distance touches.
    #[must_use]
    pub fn blocks_for(&self, size: u64) -> Option<u64> {
        self.info(size).map(DistanceInfo::blocks)
    }

    /// How often a registered distance is traversed per iteration.
    #[must_use]
    pub fn iteration_multiplier(&self, size: u64) -> Option<u64> {
        self.info(size).map(DistanceInfo::iterations)
    }

    /// Block accesses performed by one iteration over all registered distances.
    #[must_use]
    pub fn accesses_per_iteration(&self) -> u64 {
        self.infos
            .iter()
            .map(DistanceInfo::accesses_per_iteration)
            .sum()
    }

    fn info(&self, size: u64) -> Option<&DistanceInfo> {
        self.infos.iter().find(|info| info.size == size)
    }

    fn refresh(&mut self) {
        let Some(largest) = self.largest() else {
            self.infos.clear();
            return;
        };

        self.infos = self
            .sizes
            .iter()
            .map(|&size| DistanceInfo::new(size, largest))
            .collect();
    }
}
