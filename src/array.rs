//! Extensible arrays.
//!
//! An [`ExtensibleArray`] is a chunked N-dimensional dataset whose extent grows on demand, up to a fixed per-axis maximum.
//! Writing a [`Hyperslab`](crate::hyperslab::Hyperslab) beyond the current extent first extends the array (tightly, see [`plan`](crate::hyperslab::plan)) and then transfers the data.
//! Reading never extends an array.
//!
//! Use [`ExtensibleArrayBuilder`] to setup a new array with a custom fill value or initial attributes, [`ExtensibleArray::create`] for the common case, or [`ExtensibleArray::open`] for an existing array.
//!
//! Region buffers are raw bytes in native byte order, laid out as described in [`hyperslab`](crate::hyperslab).
//! The typed methods [`write_elements`](ExtensibleArray::write_elements) and [`read_elements`](ExtensibleArray::read_elements) accept any [`Element`].

mod array_builder;
mod array_errors;
mod array_sync_readable;
mod array_sync_writable;
mod chunk_shape;
pub mod data_type;
mod element;
mod fill_value;

pub use self::{
    array_builder::ExtensibleArrayBuilder,
    array_errors::{ReadError, WriteError},
    chunk_shape::ChunkShape,
    data_type::DataType,
    element::{Element, IncompatibleElementTypeError},
    fill_value::FillValue,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    hyperslab::{self, GeometryError, Hyperslab, HyperslabPlan},
    node::{NodeName, NodePath},
    storage::{ReadableStorageTraits, StorageHandle},
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// The maximum shape of an array. [`None`] denotes an unbounded axis.
pub type ArrayMaxShape = Vec<Option<u64>>;

/// An error indicating that a value is zero.
#[derive(Copy, Clone, Debug, Error)]
#[error("value must be non-zero")]
pub struct NonZeroError;

/// The metadata of a dataset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DatasetMetadata {
    /// The data type.
    pub data_type: DataType,
    /// The current shape (extent).
    pub shape: ArrayShape,
    /// The maximum shape.
    pub max_shape: ArrayMaxShape,
    /// The chunk shape.
    pub chunk_shape: ChunkShape,
    /// The fill value.
    pub fill_value: FillValue,
}

impl DatasetMetadata {
    /// Create new dataset metadata.
    #[must_use]
    pub fn new(
        data_type: DataType,
        shape: ArrayShape,
        max_shape: ArrayMaxShape,
        chunk_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        Self {
            data_type,
            shape,
            max_shape,
            chunk_shape,
            fill_value,
        }
    }

    /// Validate the metadata.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn validate(&self) -> Result<(), String> {
        let rank = self.shape.len();
        if rank == 0 {
            Err("a dataset must have at least one dimension".to_string())
        } else if self.chunk_shape.len() != rank || self.max_shape.len() != rank {
            Err(format!(
                "shape {:?}, maximum shape {:?} and chunk shape {:?} have different dimensionality",
                self.shape,
                self.max_shape,
                self.chunk_shape.to_array_shape()
            ))
        } else if !hyperslab::within_max_shape(&self.shape, &self.max_shape) {
            Err(format!(
                "shape {:?} exceeds maximum shape {:?}",
                self.shape, self.max_shape
            ))
        } else if self.data_type.size() == 0 {
            Err(format!("data type {} has zero size", self.data_type))
        } else if self.fill_value.size() != self.data_type.size() {
            Err(format!(
                "fill value {} is incompatible with data type {}",
                self.fill_value, self.data_type
            ))
        } else {
            Ok(())
        }
    }
}

/// An extensible array.
///
/// The array owns a backend handle to its dataset, which is released by [`close`](ExtensibleArray::close) or on drop.
/// It caches the dataset metadata, so a dataset must have at most one writer at a time.
///
/// Mutating methods are only available if `TStorage` implements [`WritableStorageTraits`](crate::storage::WritableStorageTraits).
#[derive(Debug)]
pub struct ExtensibleArray<TStorage: ?Sized + ReadableStorageTraits> {
    /// The handle of the dataset.
    storage_handle: StorageHandle<TStorage>,
    /// The path of the array.
    path: NodePath,
    /// The metadata of the array.
    metadata: DatasetMetadata,
}

impl<TStorage: ?Sized + ReadableStorageTraits> ExtensibleArray<TStorage> {
    pub(crate) fn new_with_metadata(
        storage_handle: StorageHandle<TStorage>,
        path: NodePath,
        metadata: DatasetMetadata,
    ) -> Self {
        Self {
            storage_handle,
            path,
            metadata,
        }
    }

    /// Get the node path.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the name of the array.
    #[must_use]
    pub fn name(&self) -> NodeName {
        self.path.name()
    }

    /// Get the metadata.
    #[must_use]
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Get the data type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.metadata.data_type
    }

    /// Get the current shape (extent).
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// Get the maximum shape.
    #[must_use]
    pub fn max_shape(&self) -> &[Option<u64>] {
        &self.metadata.max_shape
    }

    /// Get the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.metadata.chunk_shape
    }

    /// Get the number of chunks per axis allocated for the current shape.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        hyperslab::chunk_grid_shape(&self.metadata.shape, &self.metadata.chunk_shape)
    }

    /// Get the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &FillValue {
        &self.metadata.fill_value
    }

    /// Get the rank (dimensionality).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.metadata.shape.len()
    }

    /// Validate `hyperslab` against the array and plan any growth needed to accommodate it.
    ///
    /// # Errors
    /// Returns a [`GeometryError`] if the hyperslab is invalid or exceeds the maximum shape.
    pub fn plan(&self, hyperslab: &Hyperslab) -> Result<HyperslabPlan, GeometryError> {
        hyperslab::plan(
            &self.metadata.shape,
            &self.metadata.max_shape,
            &self.metadata.chunk_shape,
            hyperslab,
        )
    }

    /// Release the backend handle of the array.
    ///
    /// # Errors
    /// Returns a [`StorageError`](crate::storage::StorageError) if the backend fails to release the handle.
    pub fn close(self) -> Result<(), crate::storage::StorageError> {
        self.storage_handle.close()
    }

    fn buffer_size(&self, hyperslab: &Hyperslab) -> Result<u64, GeometryError> {
        hyperslab.buffer_size(self.metadata.data_type.size())
    }
}
