//! Groups.
//!
//! A [`GroupNode`] is a node of a hierarchy that contains subgroups and [`arrays`](crate::array).
//! Member names are unique across both arrays and subgroups.
//!
//! A group can carry attributes, each a scalar or a small vector.
//! Typed attribute access goes through [`serde`], so one generic [`set_attribute`](GroupNode::set_attribute) serves every value type.
//!
//! [`GroupNode::aggregate_attribute`] reads one attribute from every array member and fails fast on the first member that lacks it or holds an incompatible value.

mod attributes;
mod members;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub(crate) use self::attributes::{
    get_attribute, get_fixed_length_attribute, set_attribute, validate_attribute,
};
pub use self::{attributes::AttributeError, members::Members};

use crate::{
    array::{ArrayMaxShape, ArrayShape, DataType, ExtensibleArray, ExtensibleArrayBuilder},
    node::{CreateError, Node, NodeKind, NodeName, NodePath, OpenError},
    storage::{
        Handle, ReadableStorageTraits, ReadableWritableStorageTraits, StorageError, StorageHandle,
    },
};

/// An attribute aggregation error.
///
/// Aggregation fails on the first inconsistent member.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// A member does not have the attribute.
    #[error("member {member} does not have attribute {attribute}")]
    MissingOnMember {
        /// The offending member.
        member: NodeName,
        /// The attribute name.
        attribute: String,
    },
    /// The attribute of a member has an incompatible type.
    #[error("attribute {attribute} of member {member} has an incompatible type: {source}")]
    TypeMismatch {
        /// The offending member.
        member: NodeName,
        /// The attribute name.
        attribute: String,
        /// The deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// A storage error while accessing a member.
    #[error("failed to access member {member}: {source}")]
    Storage {
        /// The offending member.
        member: NodeName,
        /// The storage error.
        #[source]
        source: StorageError,
    },
    /// A storage error while enumerating members.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// A group.
///
/// The group owns a backend handle, which is released by [`close`](GroupNode::close) or on drop.
/// Groups and arrays opened from a group share its storage.
///
/// Mutating methods are only available if `TStorage` implements [`WritableStorageTraits`](crate::storage::WritableStorageTraits).
#[derive(Debug)]
pub struct GroupNode<TStorage: ?Sized + ReadableStorageTraits> {
    /// The handle of the group.
    storage_handle: StorageHandle<TStorage>,
    /// The path of the group.
    path: NodePath,
}

impl<TStorage: ?Sized + ReadableStorageTraits> GroupNode<TStorage> {
    /// Open the root group of `storage`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to open its root.
    pub fn open_root(storage: Arc<TStorage>) -> Result<Self, StorageError> {
        let handle = storage.open_root()?;
        Ok(Self {
            storage_handle: StorageHandle::new(storage, handle),
            path: NodePath::root(),
        })
    }

    /// Get the storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<TStorage> {
        self.storage_handle.storage()
    }

    /// Get the backend handle of the group.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.storage_handle.handle()
    }

    /// Get the node path.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the name of the group. The root group has an empty name.
    #[must_use]
    pub fn name(&self) -> NodeName {
        self.path.name()
    }

    /// Enumerate the direct members (arrays and subgroups) of the group.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to list the members.
    pub fn members(&self) -> Result<Members, StorageError> {
        Ok(Members::new(self.storage().list_children(self.handle())?))
    }

    /// Return the names of the direct members of the group, in enumeration order.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to list the members.
    pub fn member_names(&self) -> Result<Vec<NodeName>, StorageError> {
        Ok(self.members()?.map(|child| child.name().clone()).collect())
    }

    /// Return the names of the array members of the group, in enumeration order.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to list the members.
    pub fn array_names(&self) -> Result<Vec<NodeName>, StorageError> {
        Ok(self
            .members()?
            .filter(|child| child.kind() == NodeKind::Array)
            .map(|child| child.name().clone())
            .collect())
    }

    /// Returns true if the group has a member (array or subgroup) named `name`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to list the members.
    pub fn contains(&self, name: &NodeName) -> Result<bool, StorageError> {
        Ok(self.members()?.any(|child| child.name() == name))
    }

    /// Open the subgroup `name`.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if there is no member named `name`, the member is an array, or there is an underlying storage error.
    pub fn open_subgroup(&self, name: &str) -> Result<Self, OpenError> {
        let name = NodeName::new(name)?;
        let storage = self.storage();
        let Some(handle) = storage.open_group(self.handle(), &name)? else {
            return Err(if let Some(dataset) = storage.open_dataset(self.handle(), &name)? {
                storage.close_handle(dataset)?;
                OpenError::NotAGroup(name)
            } else {
                OpenError::NotFound(name)
            });
        };
        Ok(Self {
            storage_handle: StorageHandle::new(storage.clone(), handle),
            path: self.path.child(&name),
        })
    }

    /// Open the array `name`.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if there is no member named `name`, the member is a group, or there is an underlying storage error.
    pub fn open_array(&self, name: &str) -> Result<ExtensibleArray<TStorage>, OpenError> {
        ExtensibleArray::open(self, name)
    }

    /// Read the attribute `name` of every array member, in enumeration order.
    ///
    /// # Errors
    /// Returns an [`AggregationError`] for the first member without the attribute or with an incompatible value, or if there is an underlying storage error.
    pub fn aggregate_attribute<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Vec<T>, AggregationError> {
        let members = self.array_names()?;
        self.aggregate_attribute_over(&members, name)
    }

    /// Read the attribute `name` of each of the array `members`, in order.
    ///
    /// # Errors
    /// Returns an [`AggregationError`] for the first member that does not exist, is not an array, lacks the attribute or has an incompatible value.
    pub fn aggregate_attribute_over<T: DeserializeOwned>(
        &self,
        members: &[NodeName],
        name: &str,
    ) -> Result<Vec<T>, AggregationError> {
        let storage = self.storage();
        members
            .iter()
            .map(|member| {
                let storage_error = |source| AggregationError::Storage {
                    member: member.clone(),
                    source,
                };
                let handle = storage
                    .open_dataset(self.handle(), member)
                    .map_err(storage_error)?
                    .ok_or_else(|| {
                        storage_error(StorageError::NodeNotFound(self.path.child(member)))
                    })?;
                let dataset = StorageHandle::new(storage.clone(), handle);
                let value = storage
                    .get_attribute(dataset.handle(), name)
                    .map_err(storage_error)?
                    .ok_or_else(|| AggregationError::MissingOnMember {
                        member: member.clone(),
                        attribute: name.to_string(),
                    })?;
                dataset.close().map_err(storage_error)?;
                serde_json::from_value(value).map_err(|source| AggregationError::TypeMismatch {
                    member: member.clone(),
                    attribute: name.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Read the attribute `name` of the group.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute does not exist, has an incompatible type, or there is an underlying storage error.
    pub fn attribute<T: DeserializeOwned>(&self, name: &str) -> Result<T, AttributeError> {
        get_attribute(&**self.storage(), self.handle(), name)
    }

    /// Return the attribute names of the group.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    pub fn attribute_names(&self) -> Result<Vec<String>, StorageError> {
        self.storage().attribute_names(self.handle())
    }

    /// Return a tree representation of the hierarchy below the group.
    ///
    /// See [`Node::hierarchy_tree`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is a failure to walk the hierarchy.
    pub fn hierarchy_tree(&self) -> Result<String, StorageError> {
        let node = Node::new_with_storage(&**self.storage(), self.handle(), self.path.clone())?;
        Ok(node.hierarchy_tree())
    }

    /// Release the backend handle of the group.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the backend fails to release the handle.
    pub fn close(self) -> Result<(), StorageError> {
        self.storage_handle.close()
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> GroupNode<TStorage> {
    /// Create the subgroup `name`.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if `name` is invalid, a member named `name` already exists, or there is an underlying storage error.
    pub fn create_subgroup(&self, name: &str) -> Result<Self, CreateError> {
        let name = NodeName::new(name)?;
        self.ensure_available(&name)?;
        let storage = self.storage();
        let handle = storage
            .create_group(self.handle(), &name)
            .map_err(|err| name_in_use(err, &name))?;
        Ok(Self {
            storage_handle: StorageHandle::new(storage.clone(), handle),
            path: self.path.child(&name),
        })
    }

    /// Create the array `name` with the default fill value and no attributes.
    ///
    /// Use [`ExtensibleArrayBuilder`] for more options.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if `name` is invalid or already in use, the chunking or maximum shape is invalid, or there is an underlying storage error.
    pub fn create_array(
        &self,
        name: &str,
        data_type: DataType,
        initial_shape: ArrayShape,
        chunk_shape: ArrayShape,
        max_shape: ArrayMaxShape,
    ) -> Result<ExtensibleArray<TStorage>, CreateError> {
        ExtensibleArrayBuilder::new(data_type, initial_shape, chunk_shape)
            .max_shape(max_shape)
            .build(self, name)
    }

    /// Set the attribute `name` of the group to `value`.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if `value` cannot be serialized, is a vector that is too long, or there is an underlying storage error.
    pub fn set_attribute<T: ?Sized + Serialize>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), AttributeError> {
        set_attribute(&**self.storage(), self.handle(), name, value)
    }

    /// Remove the attribute `name` of the group.
    ///
    /// Returns true if the attribute existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    pub fn remove_attribute(&self, name: &str) -> Result<bool, StorageError> {
        self.storage().remove_attribute(self.handle(), name)
    }

    /// Remove the member `name` and everything below it.
    ///
    /// Returns true if the member existed.
    /// Groups and arrays still open below the removed member are detached: their operations fail with [`StorageError::InvalidHandle`].
    ///
    /// # Errors
    /// Returns a [`StorageError`] if `name` is invalid or there is an underlying storage error.
    pub fn remove_member(&self, name: &str) -> Result<bool, StorageError> {
        let name = NodeName::new(name)?;
        self.storage().remove_child(self.handle(), &name)
    }

    pub(crate) fn ensure_available(&self, name: &NodeName) -> Result<(), CreateError> {
        if self.contains(name)? {
            Err(CreateError::NameInUse(name.clone()))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn name_in_use(err: StorageError, name: &NodeName) -> CreateError {
    match err {
        StorageError::NodeExists(_) => CreateError::NameInUse(name.clone()),
        err => CreateError::StorageError(err),
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn group_create_open() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let root = GroupNode::open_root(store)?;
        assert!(root.name().is_root());
        let station = root.create_subgroup("Station001")?;
        assert_eq!(station.path().as_str(), "/Station001");
        assert_eq!(station.name().as_str(), "Station001");
        station.close()?;

        let station = root.open_subgroup("Station001")?;
        assert!(root.member_names()?.contains(&NodeName::new("Station001")?));
        assert!(matches!(
            root.open_subgroup("Station002"),
            Err(OpenError::NotFound(_))
        ));
        assert!(matches!(
            root.create_subgroup("Station001"),
            Err(CreateError::NameInUse(_))
        ));
        assert!(matches!(
            root.create_subgroup("a/b"),
            Err(CreateError::NodeNameError(_))
        ));

        station.create_array("001002003", DataType::Int16, vec![0], vec![16], vec![None])?;
        assert!(matches!(
            station.open_subgroup("001002003"),
            Err(OpenError::NotAGroup(_))
        ));
        assert!(matches!(
            station.open_array("Station001"),
            Err(OpenError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn group_name_unique_across_namespaces() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        root.create_subgroup("x")?;
        assert!(matches!(
            root.create_array("x", DataType::UInt8, vec![1], vec![1], vec![None]),
            Err(CreateError::NameInUse(_))
        ));
        root.create_array("y", DataType::UInt8, vec![1], vec![1], vec![None])?;
        assert!(matches!(
            root.create_subgroup("y"),
            Err(CreateError::NameInUse(_))
        ));
        Ok(())
    }

    #[test]
    fn group_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        root.set_attribute("TRIGGER_TYPE", "Unknown")?;
        root.set_attribute("TRIGGER_OFFSET", &0.5f64)?;
        root.set_attribute("TRIGGERED_ANTENNAS", &[1u32, 2, 3])?;
        assert_eq!(root.attribute::<String>("TRIGGER_TYPE")?, "Unknown");
        assert_eq!(root.attribute::<f64>("TRIGGER_OFFSET")?, 0.5);
        assert_eq!(
            root.attribute::<Vec<u32>>("TRIGGERED_ANTENNAS")?,
            vec![1, 2, 3]
        );
        assert!(matches!(
            root.attribute::<u32>("TRIGGER_TYPE"),
            Err(AttributeError::TypeMismatch { .. })
        ));
        assert_eq!(root.attribute_names()?.len(), 3);
        assert!(root.remove_attribute("TRIGGER_OFFSET")?);
        assert!(!root.remove_attribute("TRIGGER_OFFSET")?);
        assert!(matches!(
            root.attribute::<f64>("TRIGGER_OFFSET"),
            Err(AttributeError::Missing(_))
        ));
        Ok(())
    }

    #[test]
    fn group_attribute_too_long() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let long = vec![0u8; crate::config::global_config().max_attribute_elements() + 1];
        assert!(matches!(
            root.set_attribute("long", &long),
            Err(AttributeError::TooLong { .. })
        ));
        Ok(())
    }

    #[test]
    fn group_empty_member_name() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let station = root.create_subgroup("Station001")?;
        station.create_array("001002003", DataType::Int16, vec![0], vec![16], vec![None])?;

        assert!(matches!(
            station.remove_member(""),
            Err(StorageError::NodeNameError(_))
        ));
        assert!(matches!(
            root.remove_member(""),
            Err(StorageError::NodeNameError(_))
        ));
        assert!(matches!(
            station.create_subgroup(""),
            Err(CreateError::NodeNameError(_))
        ));
        assert!(matches!(
            station.create_array("", DataType::Int16, vec![0], vec![16], vec![None]),
            Err(CreateError::NodeNameError(_))
        ));
        assert!(matches!(
            root.open_subgroup(""),
            Err(OpenError::NodeNameError(_))
        ));
        assert!(matches!(
            ExtensibleArray::open(&station, ""),
            Err(OpenError::NodeNameError(_))
        ));

        assert_eq!(root.member_names()?, vec![NodeName::new("Station001")?]);
        assert_eq!(station.member_names()?, vec![NodeName::new("001002003")?]);
        Ok(())
    }

    #[test]
    fn group_removed_member_detached() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let station = root.create_subgroup("Station001")?;
        assert!(root.remove_member("Station001")?);
        assert!(matches!(
            station.member_names(),
            Err(StorageError::InvalidHandle(_))
        ));
        let _station = root.create_subgroup("Station001")?;
        assert!(matches!(
            station.create_subgroup("x"),
            Err(CreateError::StorageError(StorageError::InvalidHandle(_)))
        ));
        station.close()?;
        Ok(())
    }

    #[test]
    fn group_remove_member() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let station = root.create_subgroup("Station001")?;
        station.create_array("001002003", DataType::Int16, vec![0], vec![16], vec![None])?;
        station.close()?;
        assert!(root.remove_member("Station001")?);
        assert!(!root.remove_member("Station001")?);
        assert!(root.member_names()?.is_empty());
        Ok(())
    }
}
