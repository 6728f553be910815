//! A null store.

use crate::{
    array::DatasetMetadata,
    hyperslab::Hyperslab,
    node::NodeName,
    storage::{ChildNode, Handle, ReadableStorageTraits, StorageError, WritableStorageTraits},
};

/// A null store.
///
/// Stands in where no persistent backend is available: it has an empty root group, and every mutation fails with [`StorageError::Unsupported`].
#[derive(Debug, Default)]
pub struct NullStore;

impl NullStore {
    /// Create a new null store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn unsupported(operation: &str) -> StorageError {
    StorageError::Unsupported(format!("{operation} is not supported by the null store"))
}

impl ReadableStorageTraits for NullStore {
    fn open_root(&self) -> Result<Handle, StorageError> {
        Ok(Handle::new(0))
    }

    fn open_group(
        &self,
        _location: Handle,
        _name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        Ok(None)
    }

    fn open_dataset(
        &self,
        _location: Handle,
        _name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        Ok(None)
    }

    fn dataset_metadata(&self, _dataset: Handle) -> Result<DatasetMetadata, StorageError> {
        Err(unsupported("dataset_metadata"))
    }

    fn read_region(
        &self,
        _dataset: Handle,
        _hyperslab: &Hyperslab,
        _bytes: &mut [u8],
    ) -> Result<(), StorageError> {
        Err(unsupported("read_region"))
    }

    fn list_children(&self, _location: Handle) -> Result<Vec<ChildNode>, StorageError> {
        Ok(vec![])
    }

    fn get_attribute(
        &self,
        _handle: Handle,
        _name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(None)
    }

    fn attribute_names(&self, _handle: Handle) -> Result<Vec<String>, StorageError> {
        Ok(vec![])
    }

    fn close_handle(&self, _handle: Handle) -> Result<(), StorageError> {
        Ok(())
    }
}

impl WritableStorageTraits for NullStore {
    fn create_group(&self, _location: Handle, _name: &NodeName) -> Result<Handle, StorageError> {
        Err(unsupported("create_group"))
    }

    fn create_dataset(
        &self,
        _location: Handle,
        _name: &NodeName,
        _metadata: &DatasetMetadata,
    ) -> Result<Handle, StorageError> {
        Err(unsupported("create_dataset"))
    }

    fn extend(&self, _dataset: Handle, _shape: &[u64]) -> Result<(), StorageError> {
        Err(unsupported("extend"))
    }

    fn write_region(
        &self,
        _dataset: Handle,
        _hyperslab: &Hyperslab,
        _bytes: &[u8],
    ) -> Result<(), StorageError> {
        Err(unsupported("write_region"))
    }

    fn set_attribute(
        &self,
        _handle: Handle,
        _name: &str,
        _value: &serde_json::Value,
    ) -> Result<(), StorageError> {
        Err(unsupported("set_attribute"))
    }

    fn remove_attribute(&self, _handle: Handle, _name: &str) -> Result<bool, StorageError> {
        Err(unsupported("remove_attribute"))
    }

    fn remove_child(&self, _location: Handle, _name: &NodeName) -> Result<bool, StorageError> {
        Err(unsupported("remove_child"))
    }
}
