use thiserror::Error;

/// Errors that can occur when configuring a benchmark run.
///
/// Only invalid user input is reported through this type. Broken internal invariants (for
/// example a dependency chain that closes early) indicate a defect and panic instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The run was configured without any working-set sizes.
    #[error("no distances configured: at least one working-set size is required")]
    NoDistances,

    /// A working-set size of zero bytes was requested.
    #[error("distance must be at least one byte")]
    ZeroDistance,

    /// More distinct working-set sizes were requested than the registry can hold.
    #[error("too many distances: at most {max} distinct working-set sizes are supported")]
    TooManyDistances {
        /// The capacity of the distance registry.
        max: usize,
    },

    /// More worker threads were requested than are supported.
    #[error("thread count {requested} exceeds the supported maximum of {max}")]
    TooManyThreads {
        /// The number of threads that was requested.
        requested: usize,

        /// The maximum number of worker threads.
        max: usize,
    },

    /// Worker threads were to be pinned but the system offers fewer processors than threads.
    #[error("cannot pin {requested} worker threads: not enough processors are available")]
    NotEnoughProcessors {
        /// The number of threads that was requested.
        requested: usize,
    },

    /// A size string could not be parsed.
    #[error("invalid size '{value}': {problem}")]
    InvalidSize {
        /// The value as provided by the caller.
        value: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The largest distance requires a buffer that cannot be addressed on this platform.
    #[error("a buffer of {bytes} bytes does not fit in the address space")]
    BufferTooLarge {
        /// The number of bytes the buffer would need.
        bytes: u64,
    },
}

/// A specialized `Result` type for distgen operations, returning the crate's [`Error`] type as
/// the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn messages_name_the_offending_values() {
        let error = Error::TooManyThreads {
            requested: 100,
            max: 64,
        };
        assert_eq!(
            error.to_string(),
            "thread count 100 exceeds the supported maximum of 64"
        );

        let error = Error::InvalidSize {
            value: "12X".to_string(),
            problem: "unknown suffix 'X'".to_string(),
        };
        assert_eq!(error.to_string(), "invalid size '12X': unknown suffix 'X'");
    }
}
