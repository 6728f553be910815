//! Storage backends ([stores](store) and [storage adapters](storage_adapter)).
//!
//! The core of this crate depends on a persistent storage backend only through the narrow capability interface defined by [`ReadableStorageTraits`] and [`WritableStorageTraits`].
//! A backend exposes a tree rooted at a file-level location in which each node is either a group or a chunked dataset.
//! Nodes are addressed by opaque [`Handle`]s, and each handle acquired by the core is owned by a [`StorageHandle`] that releases it exactly once.
//!
//! Backends are selected at composition time:
//!  - [`store::MemoryStore`] is a native chunked backend held in memory.
//!  - [`store::NullStore`] is a stub with an empty root that refuses all mutation.
//!  - [`storage_adapter::usage_log::UsageLogStorageAdapter`] wraps another backend and logs every call.
//!
//! A storage that only implements [`ReadableStorageTraits`] yields read-only groups and arrays.

pub mod storage_adapter;
mod storage_handle;
mod storage_sync;
pub mod store;

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

use crate::{
    array::ArrayShape,
    hyperslab::Hyperslab,
    node::{NodeKind, NodeName, NodeNameError, NodePath},
};

pub use self::storage_handle::StorageHandle;
pub use self::storage_sync::{
    ReadableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

/// [`Arc`] wrapped readable storage.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// [`Arc`] wrapped writable storage.
pub type WritableStorage = Arc<dyn WritableStorageTraits>;

/// [`Arc`] wrapped readable and writable storage.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// Node attributes.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// An opaque identifier for an open group or dataset in a backend.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("#{_0}")]
pub struct Handle(u64);

impl Handle {
    /// Create a new handle from a backend identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the backend identifier of the handle.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// A direct child of a group: its name and kind.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
#[display("{name} ({kind})")]
pub struct ChildNode {
    name: NodeName,
    kind: NodeKind,
}

impl ChildNode {
    /// Create a new child node.
    #[must_use]
    pub const fn new(name: NodeName, kind: NodeKind) -> Self {
        Self { name, kind }
    }

    /// Return the name of the child.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Return the kind of the child.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The handle is not open.
    #[error("handle {0} is not open")]
    InvalidHandle(Handle),
    /// An invalid member name.
    #[error(transparent)]
    NodeNameError(#[from] NodeNameError),
    /// The node does not exist.
    #[error("node {0} does not exist")]
    NodeNotFound(NodePath),
    /// A node already exists at the path.
    #[error("node {0} already exists")]
    NodeExists(NodePath),
    /// The node is not of the expected kind.
    #[error("node {0} is not {1}")]
    UnexpectedNodeKind(NodePath, NodeKind),
    /// Invalid dataset metadata.
    #[error("invalid dataset metadata for {0}: {1}")]
    InvalidMetadata(NodePath, String),
    /// An extent that would shrink the dataset or exceed its maximum shape.
    #[error("cannot change the shape of {0} from {1:?} to {2:?}")]
    InvalidExtent(NodePath, ArrayShape, ArrayShape),
    /// A region outside of the dataset shape.
    #[error("region {1} is outside of {0} with shape {2:?}")]
    InvalidRegion(NodePath, Hyperslab, ArrayShape),
    /// A buffer with an unexpected length.
    #[error("got a buffer with {0} bytes, expected {1}")]
    InvalidBufferSize(usize, u64),
    /// The requested method is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}
