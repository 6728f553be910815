//! A storage adapter which prints function calls.

use std::{io::Write, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;

use crate::{
    array::DatasetMetadata,
    hyperslab::Hyperslab,
    node::NodeName,
    storage::{ChildNode, Handle, ReadableStorageTraits, StorageError, WritableStorageTraits},
};

/// The usage log storage adapter. Logs storage method calls.
///
/// It is intended to aid in debugging by revealing storage access patterns, such as when datasets are extended.
///
/// ### Example (log to stdout)
/// ```rust
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use dalarray::storage::store::MemoryStore;
/// # use dalarray::storage::storage_adapter::usage_log::UsageLogStorageAdapter;
/// let store = Arc::new(MemoryStore::new());
/// let log_writer = Arc::new(Mutex::new(
///     // std::io::BufWriter::new(
///     std::io::stdout(),
///     //    )
/// ));
/// let store = Arc::new(UsageLogStorageAdapter::new(store, log_writer, || {
///     "[dalarray] ".to_string()
/// }));
/// ````
///
/// Writing past the end of an array through the above [`UsageLogStorageAdapter`] prints outputs like:
/// ```text
/// [dalarray] open_root() -> Ok(Handle(1))
/// [dalarray] list_children(#1) -> [Station001 (group)]
/// [dalarray] open_group(#1, Station001) -> Ok(Some(Handle(2)))
/// [dalarray] open_dataset(#2, 001002003) -> Ok(Some(Handle(3)))
/// [dalarray] dataset_metadata(#3) -> shape=Ok([1024])
/// [dalarray] extend(#3, [2048]) -> Ok(())
/// [dalarray] write_region(#3, start [1024] block [1024] stride [1] count [1], len=2048) -> Ok(())
/// [dalarray] close_handle(#3) -> Ok(())
/// ```
pub struct UsageLogStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    handle: Arc<Mutex<dyn Write + Send + Sync>>,
    prefix_func: fn() -> String,
}

impl<TStorage: ?Sized> core::fmt::Debug for UsageLogStorageAdapter<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TStorage: ?Sized> UsageLogStorageAdapter<TStorage> {
    /// Create a new usage log storage adapter.
    pub fn new(
        storage: Arc<TStorage>,
        handle: Arc<Mutex<dyn Write + Send + Sync>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            storage,
            handle,
            prefix_func,
        }
    }

    /// Write one line to the log.
    ///
    /// A failure to log never masks the result of the wrapped call.
    fn log(&self, args: std::fmt::Arguments) {
        if let Err(err) = writeln!(self.handle.lock(), "{}{args}", (self.prefix_func)()) {
            log::warn!("failed to write to the usage log: {err}");
        }
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn open_root(&self) -> Result<Handle, StorageError> {
        let result = self.storage.open_root();
        self.log(format_args!("open_root() -> {result:?}"));
        result
    }

    fn open_group(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        let result = self.storage.open_group(location, name);
        self.log(format_args!("open_group({location}, {name}) -> {result:?}"));
        result
    }

    fn open_dataset(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        let result = self.storage.open_dataset(location, name);
        self.log(format_args!("open_dataset({location}, {name}) -> {result:?}"));
        result
    }

    fn dataset_metadata(&self, dataset: Handle) -> Result<DatasetMetadata, StorageError> {
        let result = self.storage.dataset_metadata(dataset);
        self.log(format_args!(
            "dataset_metadata({dataset}) -> shape={:?}",
            result.as_ref().map(|metadata| &metadata.shape)
        ));
        result
    }

    fn read_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &mut [u8],
    ) -> Result<(), StorageError> {
        let result = self.storage.read_region(dataset, hyperslab, bytes);
        self.log(format_args!(
            "read_region({dataset}, {hyperslab}, len={}) -> {result:?}",
            bytes.len()
        ));
        result
    }

    fn list_children(&self, location: Handle) -> Result<Vec<ChildNode>, StorageError> {
        let result = self.storage.list_children(location);
        self.log(format_args!(
            "list_children({location}) -> [{}]",
            result.as_ref().unwrap_or(&vec![]).iter().format(", ")
        ));
        result
    }

    fn get_attribute(
        &self,
        handle: Handle,
        name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        let result = self.storage.get_attribute(handle, name);
        self.log(format_args!("get_attribute({handle}, {name}) -> {result:?}"));
        result
    }

    fn attribute_names(&self, handle: Handle) -> Result<Vec<String>, StorageError> {
        let result = self.storage.attribute_names(handle);
        self.log(format_args!("attribute_names({handle}) -> {result:?}"));
        result
    }

    fn close_handle(&self, handle: Handle) -> Result<(), StorageError> {
        let result = self.storage.close_handle(handle);
        self.log(format_args!("close_handle({handle}) -> {result:?}"));
        result
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn create_group(&self, location: Handle, name: &NodeName) -> Result<Handle, StorageError> {
        let result = self.storage.create_group(location, name);
        self.log(format_args!("create_group({location}, {name}) -> {result:?}"));
        result
    }

    fn create_dataset(
        &self,
        location: Handle,
        name: &NodeName,
        metadata: &DatasetMetadata,
    ) -> Result<Handle, StorageError> {
        let result = self.storage.create_dataset(location, name, metadata);
        self.log(format_args!(
            "create_dataset({location}, {name}, {} {:?}) -> {result:?}",
            metadata.data_type, metadata.shape
        ));
        result
    }

    fn extend(&self, dataset: Handle, shape: &[u64]) -> Result<(), StorageError> {
        let result = self.storage.extend(dataset, shape);
        self.log(format_args!("extend({dataset}, {shape:?}) -> {result:?}"));
        result
    }

    fn write_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let result = self.storage.write_region(dataset, hyperslab, bytes);
        self.log(format_args!(
            "write_region({dataset}, {hyperslab}, len={}) -> {result:?}",
            bytes.len()
        ));
        result
    }

    fn set_attribute(
        &self,
        handle: Handle,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let result = self.storage.set_attribute(handle, name, value);
        self.log(format_args!("set_attribute({handle}, {name}, {value}) -> {result:?}"));
        result
    }

    fn remove_attribute(&self, handle: Handle, name: &str) -> Result<bool, StorageError> {
        let result = self.storage.remove_attribute(handle, name);
        self.log(format_args!("remove_attribute({handle}, {name}) -> {result:?}"));
        result
    }

    fn remove_child(&self, location: Handle, name: &NodeName) -> Result<bool, StorageError> {
        let result = self.storage.remove_child(location, name);
        self.log(format_args!("remove_child({location}, {name}) -> {result:?}"));
        result
    }
}
