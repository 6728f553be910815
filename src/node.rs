//! Hierarchy nodes.
//!
//! A node in a hierarchy is either an [`ExtensibleArray`](crate::array::ExtensibleArray) or a [`GroupNode`](crate::group::GroupNode).
//!
//! A [`Node`] has an associated [`NodePath`], [`NodeMetadata`], and children.
//!
//! The [`Node::hierarchy_tree`] function can be used to create a string representation of the hierarchy below a node.

mod node_name;
mod node_path;

pub use node_name::{NodeName, NodeNameError};
pub use node_path::{NodePath, NodePathError};

use derive_more::Display;
use thiserror::Error;

use crate::{
    array::{DataType, DatasetMetadata},
    group::AttributeError,
    storage::{Handle, ReadableStorageTraits, StorageError},
};

/// The kind of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    /// An array (a chunked dataset).
    #[display("array")]
    Array,
    /// A group.
    #[display("group")]
    Group,
}

/// Node metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeMetadata {
    /// Array metadata.
    Array(DatasetMetadata),
    /// Group metadata.
    Group,
}

impl NodeMetadata {
    /// Return the kind of the node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Array(_) => NodeKind::Array,
            Self::Group => NodeKind::Group,
        }
    }
}

/// A hierarchy node.
#[derive(Debug)]
pub struct Node {
    /// Node path.
    path: NodePath,
    /// Node metadata.
    metadata: NodeMetadata,
    /// Node children.
    ///
    /// Only group nodes can have children.
    children: Vec<Node>,
}

/// A group or array creation error.
#[derive(Debug, Error)]
pub enum CreateError {
    /// A member with the name already exists in the parent group.
    #[error("a member named {0} already exists")]
    NameInUse(NodeName),
    /// Invalid chunking.
    #[error("invalid chunk shape {chunk_shape:?} for an array with shape {shape:?}")]
    InvalidChunking {
        /// The requested chunk shape.
        chunk_shape: Vec<u64>,
        /// The requested initial shape.
        shape: Vec<u64>,
    },
    /// An invalid maximum shape.
    #[error("initial shape {shape:?} is incompatible with maximum shape {max_shape:?}")]
    InvalidMaxShape {
        /// The requested initial shape.
        shape: Vec<u64>,
        /// The requested maximum shape.
        max_shape: Vec<Option<u64>>,
    },
    /// A fill value with the wrong size for the data type.
    #[error("fill value has {got} bytes, expected {expected} for {data_type}")]
    InvalidFillValue {
        /// The data type.
        data_type: DataType,
        /// The size of the fill value.
        got: usize,
        /// The size of the data type.
        expected: usize,
    },
    /// An invalid initial attribute.
    #[error(transparent)]
    AttributeError(#[from] AttributeError),
    /// An invalid node name.
    #[error(transparent)]
    NodeNameError(#[from] NodeNameError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// A group or array open error.
#[derive(Debug, Error)]
pub enum OpenError {
    /// No member with the name exists in the parent group.
    #[error("no member named {0}")]
    NotFound(NodeName),
    /// The member is a group, not an array.
    #[error("{0} is not an array")]
    NotAnArray(NodeName),
    /// The member is an array, not a group.
    #[error("{0} is not a group")]
    NotAGroup(NodeName),
    /// The stored data type differs from the requested one.
    #[error("array has data type {found}, expected {expected}")]
    TypeMismatch {
        /// The requested data type.
        expected: DataType,
        /// The stored data type.
        found: DataType,
    },
    /// An invalid node name.
    #[error(transparent)]
    NodeNameError(#[from] NodeNameError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

impl Node {
    /// Create a new node at `path` with `metadata` and `children`.
    #[must_use]
    pub fn new(path: NodePath, metadata: NodeMetadata, children: Vec<Node>) -> Self {
        Self {
            path,
            metadata,
            children,
        }
    }

    /// Create a new node for the group open at `location` in `storage`, reading the hierarchy below it.
    ///
    /// Handles opened while walking the hierarchy are released before returning.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if there is a failure to list child nodes or read dataset metadata.
    pub fn new_with_storage<TStorage: ?Sized + ReadableStorageTraits>(
        storage: &TStorage,
        location: Handle,
        path: NodePath,
    ) -> Result<Self, StorageError> {
        let mut children = Vec::new();
        for child in storage.list_children(location)? {
            let child_path = path.child(child.name());
            let child_node = match child.kind() {
                NodeKind::Group => {
                    let handle = storage
                        .open_group(location, child.name())?
                        .ok_or_else(|| StorageError::NodeNotFound(child_path.clone()))?;
                    let node = Self::new_with_storage(storage, handle, child_path);
                    storage.close_handle(handle)?;
                    node?
                }
                NodeKind::Array => {
                    let handle = storage
                        .open_dataset(location, child.name())?
                        .ok_or_else(|| StorageError::NodeNotFound(child_path.clone()))?;
                    let metadata = storage.dataset_metadata(handle);
                    storage.close_handle(handle)?;
                    Self::new(child_path, NodeMetadata::Array(metadata?), vec![])
                }
            };
            children.push(child_node);
        }
        Ok(Self::new(path, NodeMetadata::Group, children))
    }

    /// Indicates if a node is the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// Returns the name of the node.
    #[must_use]
    pub fn name(&self) -> NodeName {
        self.path.name()
    }

    /// Returns the path of the node.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Returns the metadata of the node.
    #[must_use]
    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// Returns the children of the node.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Return a tree representation of a hierarchy as a string.
    ///
    /// Arrays are annotated with their shape and data type.
    /// For example:
    /// ```text
    /// /
    ///   Station001
    ///     001002003 [2048] int16
    ///     001002004 [2048] int16
    /// ```
    #[must_use]
    pub fn hierarchy_tree(&self) -> String {
        fn print_metadata(name: &str, string: &mut String, metadata: &NodeMetadata) {
            match metadata {
                NodeMetadata::Array(metadata) => {
                    let s = format!("{} {:?} {}", name, metadata.shape, metadata.data_type);
                    string.push_str(&s);
                }
                NodeMetadata::Group => {
                    string.push_str(name);
                }
            };
            string.push('\n');
        }

        fn update_tree(string: &mut String, children: &[Node], depth: usize) {
            for child in children {
                let name = child.name();
                string.push_str(&" ".repeat(depth * 2));
                print_metadata(name.as_str(), string, &child.metadata);
                update_tree(string, &child.children, depth + 1);
            }
        }

        let mut string = String::default();
        if self.is_root() {
            print_metadata("/", &mut string, &self.metadata);
        } else {
            print_metadata(self.name().as_str(), &mut string, &self.metadata);
        }
        update_tree(&mut string, &self.children, 1);
        string
    }
}
