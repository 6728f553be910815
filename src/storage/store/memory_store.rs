//! An in-memory store.

use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::{Mutex, RwLock};

use crate::{
    array::{ArrayIndices, DatasetMetadata},
    hyperslab::{within_max_shape, Hyperslab},
    node::{NodeKind, NodeName, NodeNameError, NodePath},
    storage::{
        Attributes, ChildNode, Handle, ReadableStorageTraits, StorageError, WritableStorageTraits,
    },
};

/// A node of a [`MemoryStore`].
#[derive(Debug)]
enum MemoryNode {
    Group {
        attributes: Attributes,
    },
    Dataset {
        metadata: DatasetMetadata,
        attributes: Attributes,
        /// Allocated chunks, keyed by chunk grid indices.
        chunks: HashMap<ArrayIndices, Vec<u8>>,
    },
}

impl MemoryNode {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Group { .. } => NodeKind::Group,
            Self::Dataset { .. } => NodeKind::Array,
        }
    }

    fn attributes(&self) -> &Attributes {
        match self {
            Self::Group { attributes } | Self::Dataset { attributes, .. } => attributes,
        }
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            Self::Group { attributes } | Self::Dataset { attributes, .. } => attributes,
        }
    }
}

/// An in-memory store.
///
/// Datasets are chunked: storage is allocated one whole chunk at a time when a chunk is first written.
/// Chunks that were never written read back as the fill value.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<NodePath, MemoryNode>>,
    /// Open handles, [`None`] once the node of the handle was removed.
    handles: Mutex<HashMap<Handle, Option<NodePath>>>,
    next_handle: AtomicU64,
}

impl MemoryStore {
    /// Create a new memory store with an empty root group.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            NodePath::root(),
            MemoryNode::Group {
                attributes: Attributes::default(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            handles: Mutex::default(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Return the number of open handles.
    #[must_use]
    pub fn num_open_handles(&self) -> usize {
        self.handles.lock().len()
    }

    /// Return the number of chunks allocated for the dataset at `path`, or [`None`] if there is no dataset at `path`.
    #[must_use]
    pub fn num_allocated_chunks(&self, path: &NodePath) -> Option<usize> {
        match self.nodes.read().get(path) {
            Some(MemoryNode::Dataset { chunks, .. }) => Some(chunks.len()),
            _ => None,
        }
    }

    fn new_handle(&self, path: NodePath) -> Handle {
        let handle = Handle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.handles.lock().insert(handle, Some(path));
        handle
    }

    fn path(&self, handle: Handle) -> Result<NodePath, StorageError> {
        self.handles
            .lock()
            .get(&handle)
            .cloned()
            .flatten()
            .ok_or(StorageError::InvalidHandle(handle))
    }

    /// Resolve the path of the child `name` of the group at `location`.
    fn child_path(
        &self,
        nodes: &BTreeMap<NodePath, MemoryNode>,
        location: Handle,
        name: &NodeName,
    ) -> Result<NodePath, StorageError> {
        if name.is_root() {
            return Err(NodeNameError::new(name.as_str()).into());
        }
        let path = self.path(location)?;
        match nodes.get(&path) {
            Some(MemoryNode::Group { .. }) => Ok(path.child(name)),
            Some(MemoryNode::Dataset { .. }) => {
                Err(StorageError::UnexpectedNodeKind(path, NodeKind::Group))
            }
            None => Err(StorageError::NodeNotFound(path)),
        }
    }

    fn open_child(
        &self,
        location: Handle,
        name: &NodeName,
        kind: NodeKind,
    ) -> Result<Option<Handle>, StorageError> {
        let nodes = self.nodes.read();
        let path = self.child_path(&nodes, location, name)?;
        match nodes.get(&path) {
            Some(node) if node.kind() == kind => Ok(Some(self.new_handle(path))),
            _ => Ok(None),
        }
    }

    fn create_child(
        &self,
        location: Handle,
        name: &NodeName,
        node: MemoryNode,
    ) -> Result<Handle, StorageError> {
        let mut nodes = self.nodes.write();
        let path = self.child_path(&nodes, location, name)?;
        if nodes.contains_key(&path) {
            return Err(StorageError::NodeExists(path));
        }
        nodes.insert(path.clone(), node);
        Ok(self.new_handle(path))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_usize(value: u64) -> Result<usize, StorageError> {
    usize::try_from(value)
        .map_err(|_| StorageError::Other(format!("{value} exceeds the address space")))
}

/// Visit the runs of `hyperslab` split at chunk boundaries, in buffer order.
///
/// `f` is called with the chunk grid indices, the element offset within the chunk, the element offset within the buffer, and the number of elements.
fn for_each_chunk_run(
    hyperslab: &Hyperslab,
    metadata: &DatasetMetadata,
    mut f: impl FnMut(&[u64], usize, usize, usize) -> Result<(), StorageError>,
) -> Result<(), StorageError> {
    let chunk_shape = metadata.chunk_shape.to_array_shape();
    let last = chunk_shape.len() - 1;
    let mut buffer_offset = 0;
    for (mut indices, run_length) in hyperslab.iter_contiguous_runs() {
        let mut remaining = run_length;
        while remaining > 0 {
            let chunk_indices: Vec<u64> = std::iter::zip(&indices, &chunk_shape)
                .map(|(index, chunk)| index / chunk)
                .collect();
            let mut chunk_offset = 0;
            for (index, chunk) in std::iter::zip(&indices, &chunk_shape) {
                chunk_offset = chunk_offset * chunk + index % chunk;
            }
            let length = std::cmp::min(
                remaining,
                chunk_shape[last] - indices[last] % chunk_shape[last],
            );
            let length_usize = to_usize(length)?;
            f(
                &chunk_indices,
                to_usize(chunk_offset)?,
                buffer_offset,
                length_usize,
            )?;
            buffer_offset += length_usize;
            remaining -= length;
            indices[last] += length;
        }
    }
    Ok(())
}

fn validate_region(
    path: &NodePath,
    metadata: &DatasetMetadata,
    hyperslab: &Hyperslab,
    buffer_len: usize,
) -> Result<(), StorageError> {
    if !hyperslab.inbounds(&metadata.shape) {
        return Err(StorageError::InvalidRegion(
            path.clone(),
            hyperslab.clone(),
            metadata.shape.clone(),
        ));
    }
    let expected = hyperslab
        .buffer_size(metadata.data_type.size())
        .map_err(|_| {
            StorageError::InvalidRegion(path.clone(), hyperslab.clone(), metadata.shape.clone())
        })?;
    if buffer_len as u64 != expected {
        return Err(StorageError::InvalidBufferSize(buffer_len, expected));
    }
    Ok(())
}

impl ReadableStorageTraits for MemoryStore {
    fn open_root(&self) -> Result<Handle, StorageError> {
        Ok(self.new_handle(NodePath::root()))
    }

    fn open_group(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        self.open_child(location, name, NodeKind::Group)
    }

    fn open_dataset(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        self.open_child(location, name, NodeKind::Array)
    }

    fn dataset_metadata(&self, dataset: Handle) -> Result<DatasetMetadata, StorageError> {
        let path = self.path(dataset)?;
        match self.nodes.read().get(&path) {
            Some(MemoryNode::Dataset { metadata, .. }) => Ok(metadata.clone()),
            Some(MemoryNode::Group { .. }) => {
                Err(StorageError::UnexpectedNodeKind(path, NodeKind::Array))
            }
            None => Err(StorageError::NodeNotFound(path)),
        }
    }

    fn read_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &mut [u8],
    ) -> Result<(), StorageError> {
        let path = self.path(dataset)?;
        let nodes = self.nodes.read();
        let Some(MemoryNode::Dataset {
            metadata, chunks, ..
        }) = nodes.get(&path)
        else {
            return Err(StorageError::NodeNotFound(path));
        };
        validate_region(&path, metadata, hyperslab, bytes.len())?;

        let element_size = metadata.data_type.size();
        let fill_value = metadata.fill_value.as_ne_bytes();
        for_each_chunk_run(
            hyperslab,
            metadata,
            |chunk_indices, chunk_offset, buffer_offset, length| {
                let output =
                    &mut bytes[buffer_offset * element_size..(buffer_offset + length) * element_size];
                if let Some(chunk) = chunks.get(chunk_indices) {
                    output.copy_from_slice(
                        &chunk[chunk_offset * element_size..(chunk_offset + length) * element_size],
                    );
                } else {
                    for element in output.chunks_exact_mut(element_size) {
                        element.copy_from_slice(fill_value);
                    }
                }
                Ok(())
            },
        )
    }

    fn list_children(&self, location: Handle) -> Result<Vec<ChildNode>, StorageError> {
        let path = self.path(location)?;
        let nodes = self.nodes.read();
        match nodes.get(&path) {
            Some(MemoryNode::Group { .. }) => {}
            Some(MemoryNode::Dataset { .. }) => {
                return Err(StorageError::UnexpectedNodeKind(path, NodeKind::Group))
            }
            None => return Err(StorageError::NodeNotFound(path)),
        }
        Ok(nodes
            .iter()
            .filter(|(child_path, _)| child_path.parent().as_ref() == Some(&path))
            .map(|(child_path, node)| ChildNode::new(child_path.name(), node.kind()))
            .collect())
    }

    fn get_attribute(
        &self,
        handle: Handle,
        name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        let path = self.path(handle)?;
        let nodes = self.nodes.read();
        let node = nodes.get(&path).ok_or(StorageError::NodeNotFound(path))?;
        Ok(node.attributes().get(name).cloned())
    }

    fn attribute_names(&self, handle: Handle) -> Result<Vec<String>, StorageError> {
        let path = self.path(handle)?;
        let nodes = self.nodes.read();
        let node = nodes.get(&path).ok_or(StorageError::NodeNotFound(path))?;
        Ok(node.attributes().keys().cloned().collect())
    }

    fn close_handle(&self, handle: Handle) -> Result<(), StorageError> {
        self.handles
            .lock()
            .remove(&handle)
            .map(|_| ())
            .ok_or(StorageError::InvalidHandle(handle))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn create_group(&self, location: Handle, name: &NodeName) -> Result<Handle, StorageError> {
        self.create_child(
            location,
            name,
            MemoryNode::Group {
                attributes: Attributes::default(),
            },
        )
    }

    fn create_dataset(
        &self,
        location: Handle,
        name: &NodeName,
        metadata: &DatasetMetadata,
    ) -> Result<Handle, StorageError> {
        let path = self.child_path(&self.nodes.read(), location, name)?;
        metadata
            .validate()
            .map_err(|err| StorageError::InvalidMetadata(path, err))?;
        self.create_child(
            location,
            name,
            MemoryNode::Dataset {
                metadata: metadata.clone(),
                attributes: Attributes::default(),
                chunks: HashMap::default(),
            },
        )
    }

    fn extend(&self, dataset: Handle, shape: &[u64]) -> Result<(), StorageError> {
        let path = self.path(dataset)?;
        let mut nodes = self.nodes.write();
        let Some(MemoryNode::Dataset { metadata, .. }) = nodes.get_mut(&path) else {
            return Err(StorageError::NodeNotFound(path));
        };
        let grows = shape.len() == metadata.shape.len()
            && std::iter::zip(shape, &metadata.shape).all(|(new, current)| new >= current);
        if grows && within_max_shape(shape, &metadata.max_shape) {
            metadata.shape = shape.to_vec();
            Ok(())
        } else {
            Err(StorageError::InvalidExtent(
                path,
                metadata.shape.clone(),
                shape.to_vec(),
            ))
        }
    }

    fn write_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let path = self.path(dataset)?;
        let mut nodes = self.nodes.write();
        let Some(MemoryNode::Dataset {
            metadata, chunks, ..
        }) = nodes.get_mut(&path)
        else {
            return Err(StorageError::NodeNotFound(path));
        };
        validate_region(&path, metadata, hyperslab, bytes.len())?;

        let element_size = metadata.data_type.size();
        let chunk_elements = to_usize(metadata.chunk_shape.num_elements_u64())?;
        let fill_value = metadata.fill_value.as_ne_bytes();
        for_each_chunk_run(
            hyperslab,
            metadata,
            |chunk_indices, chunk_offset, buffer_offset, length| {
                let chunk = chunks
                    .entry(chunk_indices.to_vec())
                    .or_insert_with(|| fill_value.repeat(chunk_elements));
                chunk[chunk_offset * element_size..(chunk_offset + length) * element_size]
                    .copy_from_slice(
                        &bytes[buffer_offset * element_size
                            ..(buffer_offset + length) * element_size],
                    );
                Ok(())
            },
        )
    }

    fn set_attribute(
        &self,
        handle: Handle,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let path = self.path(handle)?;
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(&path)
            .ok_or(StorageError::NodeNotFound(path))?;
        node.attributes_mut().insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove_attribute(&self, handle: Handle, name: &str) -> Result<bool, StorageError> {
        let path = self.path(handle)?;
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(&path)
            .ok_or(StorageError::NodeNotFound(path))?;
        Ok(node.attributes_mut().remove(name).is_some())
    }

    fn remove_child(&self, location: Handle, name: &NodeName) -> Result<bool, StorageError> {
        let mut nodes = self.nodes.write();
        let path = self.child_path(&nodes, location, name)?;
        if !nodes.contains_key(&path) {
            return Ok(false);
        }
        nodes.retain(|node_path, _| !node_path.has_ancestor(&path));
        // handles below the removed node stay open but no longer resolve
        for handle_path in self.handles.lock().values_mut() {
            if handle_path
                .as_ref()
                .is_some_and(|handle_path| handle_path.has_ancestor(&path))
            {
                *handle_path = None;
            }
        }
        Ok(true)
    }
}
