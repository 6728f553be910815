use crate::{array::DatasetMetadata, hyperslab::Hyperslab, node::NodeName};

use super::{ChildNode, Handle, StorageError};

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Open the file-level root group.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn open_root(&self) -> Result<Handle, StorageError>;

    /// Open the group `name` under `location`.
    ///
    /// Returns [`None`] if there is no group with that name.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `location` is invalid or there is an underlying storage error.
    fn open_group(&self, location: Handle, name: &NodeName)
        -> Result<Option<Handle>, StorageError>;

    /// Open the dataset `name` under `location`.
    ///
    /// Returns [`None`] if there is no dataset with that name.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `location` is invalid or there is an underlying storage error.
    fn open_dataset(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError>;

    /// Retrieve the metadata (data type, extent, chunking, fill value) of a dataset.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `dataset` is not an open dataset or there is an underlying storage error.
    fn dataset_metadata(&self, dataset: Handle) -> Result<DatasetMetadata, StorageError>;

    /// Read the elements of `hyperslab` into `bytes`.
    ///
    /// Elements that were never written read back as the dataset fill value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the region is outside the dataset extent, `bytes` has the wrong length, or there is an underlying storage error.
    fn read_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &mut [u8],
    ) -> Result<(), StorageError>;

    /// List the direct children of the group at `location`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `location` is not an open group or there is an underlying storage error.
    fn list_children(&self, location: Handle) -> Result<Vec<ChildNode>, StorageError>;

    /// Retrieve the attribute `name` of a group or dataset.
    ///
    /// Returns [`None`] if the attribute does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `handle` is invalid or there is an underlying storage error.
    fn get_attribute(
        &self,
        handle: Handle,
        name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError>;

    /// Retrieve the attribute names of a group or dataset.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `handle` is invalid or there is an underlying storage error.
    fn attribute_names(&self, handle: Handle) -> Result<Vec<String>, StorageError>;

    /// Release a handle.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `handle` is not open.
    fn close_handle(&self, handle: Handle) -> Result<(), StorageError>;
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Create the group `name` under `location`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if a node named `name` already exists or there is an underlying storage error.
    fn create_group(&self, location: Handle, name: &NodeName) -> Result<Handle, StorageError>;

    /// Create the dataset `name` under `location` with `metadata`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if a node named `name` already exists, the metadata is invalid, or there is an underlying storage error.
    fn create_dataset(
        &self,
        location: Handle,
        name: &NodeName,
        metadata: &DatasetMetadata,
    ) -> Result<Handle, StorageError>;

    /// Extend a dataset to `shape`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `shape` would shrink the dataset, exceeds its maximum shape, or there is an underlying storage error.
    fn extend(&self, dataset: Handle, shape: &[u64]) -> Result<(), StorageError>;

    /// Write `bytes` to the elements of `hyperslab`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the region is outside the dataset extent, `bytes` has the wrong length, or there is an underlying storage error.
    fn write_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &[u8],
    ) -> Result<(), StorageError>;

    /// Set the attribute `name` of a group or dataset.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `handle` is invalid or there is an underlying storage error.
    fn set_attribute(
        &self,
        handle: Handle,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), StorageError>;

    /// Remove the attribute `name` of a group or dataset.
    ///
    /// Returns true if the attribute existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `handle` is invalid or there is an underlying storage error.
    fn remove_attribute(&self, handle: Handle, name: &str) -> Result<bool, StorageError>;

    /// Remove the child `name` of the group at `location`, and everything below it.
    ///
    /// Returns true if the child existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `location` is invalid or there is an underlying storage error.
    fn remove_child(&self, location: Handle, name: &NodeName) -> Result<bool, StorageError>;
}

/// A supertrait of [`ReadableStorageTraits`] and [`WritableStorageTraits`].
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T> ReadableWritableStorageTraits for T where T: ?Sized + ReadableStorageTraits + WritableStorageTraits {}
