use serde::de::DeserializeOwned;

use crate::{
    group::{get_attribute, AttributeError, GroupNode},
    hyperslab::{GeometryError, Hyperslab},
    node::{NodeName, OpenError},
    storage::{ReadableStorageTraits, StorageError, StorageHandle},
};

use super::{DataType, Element, ExtensibleArray, ReadError};

impl<TStorage: ?Sized + ReadableStorageTraits> ExtensibleArray<TStorage> {
    /// Open the existing array `name` in `parent`.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if there is no member named `name`, the member is a group, or there is an underlying storage error.
    pub fn open(parent: &GroupNode<TStorage>, name: &str) -> Result<Self, OpenError> {
        let name = NodeName::new(name)?;
        let storage = parent.storage();
        let Some(handle) = storage.open_dataset(parent.handle(), &name)? else {
            return Err(if let Some(group) = storage.open_group(parent.handle(), &name)? {
                storage.close_handle(group)?;
                OpenError::NotAnArray(name)
            } else {
                OpenError::NotFound(name)
            });
        };
        let storage_handle = StorageHandle::new(storage.clone(), handle);
        let metadata = storage.dataset_metadata(handle)?;
        Ok(Self::new_with_metadata(
            storage_handle,
            parent.path().child(&name),
            metadata,
        ))
    }

    /// Open the existing array `name` in `parent`, requiring that it has `data_type`.
    ///
    /// # Errors
    /// Returns [`OpenError::TypeMismatch`] if the array has a different data type, or any error of [`open`](ExtensibleArray::open).
    pub fn open_with_data_type(
        parent: &GroupNode<TStorage>,
        name: &str,
        data_type: DataType,
    ) -> Result<Self, OpenError> {
        let array = Self::open(parent, name)?;
        if array.data_type() == &data_type {
            Ok(array)
        } else {
            Err(OpenError::TypeMismatch {
                expected: data_type,
                found: *array.data_type(),
            })
        }
    }

    /// Read the elements of `hyperslab` into `bytes`.
    ///
    /// Elements that were never written read back as the fill value.
    /// The array is never extended by a read.
    ///
    /// # Errors
    /// Returns a [`ReadError`] if
    ///  - the hyperslab is invalid,
    ///  - the hyperslab exceeds the current shape of the array,
    ///  - the length of `bytes` does not match the hyperslab, or
    ///  - there is an underlying storage error.
    pub fn read(&self, hyperslab: &Hyperslab, bytes: &mut [u8]) -> Result<(), ReadError> {
        self.validate_read(hyperslab)?;
        self.read_validated(hyperslab, bytes)
    }

    /// Read the elements of `hyperslab`.
    ///
    /// # Errors
    /// Returns [`ReadError::IncompatibleElementType`] if `T` does not match the data type of the array, or any error of [`read`](ExtensibleArray::read).
    pub fn read_elements<T: Element>(&self, hyperslab: &Hyperslab) -> Result<Vec<T>, ReadError> {
        T::validate_data_type(self.data_type())?;
        self.validate_read(hyperslab)?;
        let expected = self.buffer_size(hyperslab).map_err(ReadError::Geometry)?;
        let num_elements = usize::try_from(hyperslab.num_elements()).map_err(|_| {
            ReadError::InvalidBufferSize {
                got: usize::MAX,
                expected,
            }
        })?;
        let mut elements = vec![T::zeroed(); num_elements];
        self.read_validated(hyperslab, bytemuck::cast_slice_mut(&mut elements))?;
        Ok(elements)
    }

    /// Read the elements of `hyperslab` into an [`ndarray::ArrayD`].
    ///
    /// The shape of the output is the block shape if every count is one, otherwise the buffer shape `[count..., block...]`.
    ///
    /// # Errors
    /// See [`read_elements`](ExtensibleArray::read_elements).
    #[cfg(feature = "ndarray")]
    #[allow(clippy::missing_panics_doc)]
    pub fn read_ndarray<T: Element>(
        &self,
        hyperslab: &Hyperslab,
    ) -> Result<ndarray::ArrayD<T>, ReadError> {
        let elements = self.read_elements::<T>(hyperslab)?;
        let shape = if hyperslab.count().iter().all(|&count| count == 1) {
            hyperslab.block().to_vec()
        } else {
            hyperslab.buffer_shape()
        };
        let shape: Vec<usize> = shape
            .iter()
            .map(|&extent| usize::try_from(extent).unwrap())
            .collect();
        // the number of elements matches the shape
        Ok(ndarray::ArrayD::from_shape_vec(shape, elements).unwrap())
    }

    /// Read the attribute `name` of the array.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute does not exist, has an incompatible type, or there is an underlying storage error.
    pub fn attribute<T: DeserializeOwned>(&self, name: &str) -> Result<T, AttributeError> {
        get_attribute(
            &**self.storage_handle.storage(),
            self.storage_handle.handle(),
            name,
        )
    }

    /// Return the attribute names of the array.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    pub fn attribute_names(&self) -> Result<Vec<String>, StorageError> {
        self.storage_handle
            .storage()
            .attribute_names(self.storage_handle.handle())
    }

    fn validate_read(&self, hyperslab: &Hyperslab) -> Result<(), ReadError> {
        let shape = self.shape();
        let plan = self.plan(hyperslab).map_err(|err| match err {
            GeometryError::ExceedsMaximum {
                axis, requested, ..
            } => ReadError::OutOfRange {
                axis,
                requested,
                extent: shape[axis],
            },
            err => ReadError::Geometry(err),
        })?;
        let out_of_range = std::iter::zip(plan.required_shape(), shape)
            .enumerate()
            .find(|(_, (requested, extent))| requested > extent);
        if let Some((axis, (&requested, &extent))) = out_of_range {
            Err(ReadError::OutOfRange {
                axis,
                requested,
                extent,
            })
        } else {
            Ok(())
        }
    }

    fn read_validated(&self, hyperslab: &Hyperslab, bytes: &mut [u8]) -> Result<(), ReadError> {
        let expected = self.buffer_size(hyperslab).map_err(ReadError::Geometry)?;
        if bytes.len() as u64 != expected {
            return Err(ReadError::InvalidBufferSize {
                got: bytes.len(),
                expected,
            });
        }
        self.storage_handle.storage().read_region(
            self.storage_handle.handle(),
            hyperslab,
            bytes,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn array_read_validation() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array = root.create_array(
            "array",
            DataType::UInt16,
            vec![4, 4],
            vec![2, 2],
            vec![None, Some(8)],
        )?;
        array.write_elements::<u16>(&Hyperslab::new(vec![0, 0], vec![1, 4]), &[1, 2, 3, 4])?;

        assert_eq!(
            array.read_elements::<u16>(&Hyperslab::new(vec![0, 1], vec![2, 2]))?,
            vec![2, 3, 0, 0]
        );
        assert!(matches!(
            array.read_elements::<u16>(&Hyperslab::new(vec![3, 0], vec![2, 1])),
            Err(ReadError::OutOfRange {
                axis: 0,
                requested: 5,
                extent: 4
            })
        ));
        assert!(matches!(
            array.read_elements::<u16>(&Hyperslab::new(vec![0, 6], vec![1, 4])),
            Err(ReadError::OutOfRange {
                axis: 1,
                requested: 10,
                extent: 4
            })
        ));
        assert!(matches!(
            array.read_elements::<u16>(&Hyperslab::new(vec![0], vec![1])),
            Err(ReadError::Geometry(GeometryError::RankMismatch { .. }))
        ));
        assert!(matches!(
            array.read_elements::<i16>(&Hyperslab::new(vec![0, 0], vec![1, 1])),
            Err(ReadError::IncompatibleElementType(_))
        ));
        let mut bytes = vec![0u8; 3];
        assert!(matches!(
            array.read(&Hyperslab::new(vec![0, 0], vec![1, 1]), &mut bytes),
            Err(ReadError::InvalidBufferSize {
                got: 3,
                expected: 2
            })
        ));
        assert_eq!(array.shape(), &[4, 4]);
        Ok(())
    }

    #[test]
    fn array_open() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        root.create_array("array", DataType::Float64, vec![3], vec![2], vec![None])?;
        root.create_subgroup("group")?;

        let array = ExtensibleArray::open(&root, "array")?;
        assert_eq!(array.shape(), &[3]);
        assert_eq!(array.name().as_str(), "array");
        assert_eq!(array.path().as_str(), "/array");
        assert!(ExtensibleArray::open_with_data_type(&root, "array", DataType::Float64).is_ok());
        assert!(matches!(
            ExtensibleArray::open_with_data_type(&root, "array", DataType::Float32),
            Err(OpenError::TypeMismatch {
                expected: DataType::Float32,
                found: DataType::Float64
            })
        ));
        assert!(matches!(
            ExtensibleArray::open(&root, "group"),
            Err(OpenError::NotAnArray(_))
        ));
        assert!(matches!(
            ExtensibleArray::open(&root, "missing"),
            Err(OpenError::NotFound(_))
        ));
        Ok(())
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn array_read_ndarray() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array =
            root.create_array("array", DataType::Int32, vec![0, 3], vec![2, 3], vec![None, None])?;
        array.write_elements::<i32>(
            &Hyperslab::new(vec![0, 0], vec![2, 3]),
            &[0, 1, 2, 3, 4, 5],
        )?;
        let ndarray = array.read_ndarray::<i32>(&Hyperslab::new(vec![0, 1], vec![2, 2]))?;
        assert_eq!(ndarray.shape(), &[2, 2]);
        assert_eq!(ndarray.iter().copied().collect::<Vec<_>>(), vec![1, 2, 4, 5]);
        Ok(())
    }
}
