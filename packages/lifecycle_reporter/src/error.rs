use thiserror::Error;

use crate::Operation;

/// Errors that can occur when copying or moving the value held by a [`Reporter`][1].
///
/// [1]: crate::Reporter
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source of a copy or move no longer holds a value because it was
    /// previously moved from. No id was allocated and no line was emitted.
    #[error("reporter {id} is invalidated and cannot be the source of {operation}")]
    Invalidated {
        /// The id of the invalidated source reporter.
        id: u64,

        /// The operation that was rejected.
        operation: Operation,
    },
}

/// A specialized `Result` type for reporter operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
