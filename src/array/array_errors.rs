use thiserror::Error;

use crate::{hyperslab::GeometryError, storage::StorageError};

use super::{element::IncompatibleElementTypeError, ArrayShape};

/// An array write error.
///
/// Every variant except [`WriteError::TransferAfterExtend`] is returned before the array is mutated.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The region is invalid or exceeds the maximum shape of the array.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The buffer length does not match the region.
    #[error("got a buffer with {got} bytes, expected {expected}")]
    InvalidBufferSize {
        /// The length of the buffer.
        got: usize,
        /// The expected length of the buffer.
        expected: u64,
    },
    /// The element type does not match the data type of the array.
    #[error(transparent)]
    IncompatibleElementType(#[from] IncompatibleElementTypeError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// The array was extended, but the data transfer failed.
    ///
    /// The array keeps its new shape and the unwritten part of the region reads back as the fill value.
    #[error("array was extended to {extended_to:?} but the data transfer failed: {source}")]
    TransferAfterExtend {
        /// The shape the array was extended to.
        extended_to: ArrayShape,
        /// The storage error of the data transfer.
        #[source]
        source: StorageError,
    },
}

/// An array read error.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The region is invalid.
    #[error(transparent)]
    Geometry(GeometryError),
    /// The region exceeds the current shape of the array.
    #[error("region requires extent {requested} along axis {axis}, exceeding the current extent {extent}")]
    OutOfRange {
        /// The offending axis.
        axis: usize,
        /// The required extent along the axis.
        requested: u64,
        /// The current extent along the axis.
        extent: u64,
    },
    /// The buffer length does not match the region.
    #[error("got a buffer with {got} bytes, expected {expected}")]
    InvalidBufferSize {
        /// The length of the buffer.
        got: usize,
        /// The expected length of the buffer.
        expected: u64,
    },
    /// The element type does not match the data type of the array.
    #[error(transparent)]
    IncompatibleElementType(#[from] IncompatibleElementTypeError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}
