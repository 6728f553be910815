use crate::{
    group::{name_in_use, validate_attribute, GroupNode},
    hyperslab::within_max_shape,
    node::{CreateError, NodeName},
    storage::{Attributes, ReadableWritableStorageTraits, StorageHandle},
};

use super::{
    ArrayMaxShape, ArrayShape, ChunkShape, DataType, DatasetMetadata, ExtensibleArray, FillValue,
};

/// An [`ExtensibleArray`] builder.
///
/// The array builder is initialised from a data type, initial shape, and chunk shape.
///  - Every axis is unbounded by default.
///  - The default fill value has all bytes zero.
///  - Attributes are empty.
///
/// Use the methods in the array builder to change the configuration away from these defaults, and then create the array in a group with [`ExtensibleArrayBuilder::build`].
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use dalarray::array::{DataType, ExtensibleArrayBuilder, FillValue};
/// # let store = Arc::new(dalarray::storage::store::MemoryStore::new());
/// # let group = dalarray::group::GroupNode::open_root(store)?;
/// let array = ExtensibleArrayBuilder::new(
///     DataType::Float32,
///     vec![0, 2048], // initial shape
///     vec![100, 2048], // chunk shape (elements must be non-zero)
/// )
/// .max_shape(vec![None, Some(2048)])
/// .fill_value(FillValue::from(f32::NAN))
/// .build(&group, "beam")?;
/// assert_eq!(array.shape(), &[0, 2048]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExtensibleArrayBuilder {
    /// Data type.
    pub data_type: DataType,
    /// Initial shape.
    pub shape: ArrayShape,
    /// Chunk shape.
    pub chunk_shape: ArrayShape,
    /// Maximum shape. Unbounded if [`None`].
    pub max_shape: Option<ArrayMaxShape>,
    /// Fill value. All bytes zero if [`None`].
    pub fill_value: Option<FillValue>,
    /// Attributes.
    pub attributes: Attributes,
}

impl ExtensibleArrayBuilder {
    /// Create a new array builder for an array with `data_type`, `shape`, and `chunk_shape`.
    #[must_use]
    pub fn new(data_type: DataType, shape: ArrayShape, chunk_shape: ArrayShape) -> Self {
        Self {
            data_type,
            shape,
            chunk_shape,
            max_shape: None,
            fill_value: None,
            attributes: Attributes::default(),
        }
    }

    /// Set the initial shape.
    pub fn shape(&mut self, shape: ArrayShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the data type.
    pub fn data_type(&mut self, data_type: DataType) -> &mut Self {
        self.data_type = data_type;
        self
    }

    /// Set the chunk shape.
    pub fn chunk_shape(&mut self, chunk_shape: ArrayShape) -> &mut Self {
        self.chunk_shape = chunk_shape;
        self
    }

    /// Set the maximum shape. [`None`] elements denote unbounded axes.
    pub fn max_shape(&mut self, max_shape: ArrayMaxShape) -> &mut Self {
        self.max_shape = Some(max_shape);
        self
    }

    /// Set the fill value.
    pub fn fill_value(&mut self, fill_value: FillValue) -> &mut Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the initial attributes.
    pub fn attributes(&mut self, attributes: Attributes) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Return the dataset metadata the builder would create.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if the chunk shape, maximum shape, or fill value is invalid.
    pub fn metadata(&self) -> Result<DatasetMetadata, CreateError> {
        let rank = self.shape.len();
        let invalid_chunking = || CreateError::InvalidChunking {
            chunk_shape: self.chunk_shape.clone(),
            shape: self.shape.clone(),
        };
        if rank == 0 || self.chunk_shape.len() != rank {
            return Err(invalid_chunking());
        }
        let chunk_shape =
            ChunkShape::try_from(self.chunk_shape.as_slice()).map_err(|_| invalid_chunking())?;

        let max_shape = self.max_shape.clone().unwrap_or_else(|| vec![None; rank]);
        if !within_max_shape(&self.shape, &max_shape) {
            return Err(CreateError::InvalidMaxShape {
                shape: self.shape.clone(),
                max_shape,
            });
        }

        let fill_value = self
            .fill_value
            .clone()
            .unwrap_or_else(|| FillValue::new_default(&self.data_type));
        if fill_value.size() != self.data_type.size() || fill_value.size() == 0 {
            return Err(CreateError::InvalidFillValue {
                data_type: self.data_type,
                got: fill_value.size(),
                expected: self.data_type.size(),
            });
        }

        Ok(DatasetMetadata::new(
            self.data_type,
            self.shape.clone(),
            max_shape,
            chunk_shape,
            fill_value,
        ))
    }

    /// Create the array `name` in `parent`.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if `name` is invalid or already in use in `parent`, the metadata or an initial attribute is invalid, or there is an underlying storage error.
    ///
    /// If setting an initial attribute fails, the array is removed again.
    pub fn build<TStorage: ?Sized + ReadableWritableStorageTraits>(
        &self,
        parent: &GroupNode<TStorage>,
        name: &str,
    ) -> Result<ExtensibleArray<TStorage>, CreateError> {
        let name = NodeName::new(name)?;
        let metadata = self.metadata()?;
        for (key, value) in &self.attributes {
            validate_attribute(key, value)?;
        }
        parent.ensure_available(&name)?;

        let storage = parent.storage();
        let handle = storage
            .create_dataset(parent.handle(), &name, &metadata)
            .map_err(|err| name_in_use(err, &name))?;
        let storage_handle = StorageHandle::new(storage.clone(), handle);
        let path = parent.path().child(&name);
        if let Err(err) = self
            .attributes
            .iter()
            .try_for_each(|(key, value)| storage.set_attribute(handle, key, value))
        {
            // an array is only created with all of its attributes
            if let Err(remove_err) = storage.remove_child(parent.handle(), &name) {
                log::warn!("failed to remove partially created array {path}: {remove_err}");
            }
            return Err(err.into());
        }

        log::debug!(
            "created array {path} with shape {:?}, maximum shape {:?} and chunk shape {:?}",
            metadata.shape,
            metadata.max_shape,
            self.chunk_shape
        );
        Ok(ExtensibleArray::new_with_metadata(
            storage_handle,
            path,
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_builder_metadata() {
        let metadata = ExtensibleArrayBuilder::new(DataType::Int16, vec![0], vec![1024])
            .metadata()
            .unwrap();
        assert_eq!(metadata.max_shape, vec![None]);
        assert_eq!(metadata.fill_value, FillValue::from(0i16));
    }

    #[test]
    fn array_builder_invalid() {
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::Int16, vec![], vec![]).metadata(),
            Err(CreateError::InvalidChunking { .. })
        ));
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::Int16, vec![10, 10], vec![10, 0]).metadata(),
            Err(CreateError::InvalidChunking { .. })
        ));
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::Int16, vec![10, 10], vec![10]).metadata(),
            Err(CreateError::InvalidChunking { .. })
        ));
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::Int16, vec![10], vec![10])
                .max_shape(vec![Some(5)])
                .metadata(),
            Err(CreateError::InvalidMaxShape { .. })
        ));
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::Int16, vec![10], vec![10])
                .fill_value(FillValue::from(0u8))
                .metadata(),
            Err(CreateError::InvalidFillValue { .. })
        ));
        assert!(matches!(
            ExtensibleArrayBuilder::new(DataType::FixedString(0), vec![10], vec![10]).metadata(),
            Err(CreateError::InvalidFillValue { .. })
        ));
    }
}
