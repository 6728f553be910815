use serde::Serialize;

use crate::{
    group::{set_attribute, AttributeError, GroupNode},
    hyperslab::Hyperslab,
    node::CreateError,
    storage::{ReadableWritableStorageTraits, StorageError},
};

use super::{
    ArrayMaxShape, ArrayShape, DataType, Element, ExtensibleArray, ExtensibleArrayBuilder,
    WriteError,
};

impl<TStorage: ?Sized + ReadableWritableStorageTraits> ExtensibleArray<TStorage> {
    /// Create the array `name` in `parent` with the default fill value.
    ///
    /// `max_shape` elements that are [`None`] denote unbounded axes.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if
    ///  - `name` is invalid or already used by a member of `parent`,
    ///  - the rank is zero, a chunk extent is zero, or the chunk shape has a different rank,
    ///  - `initial_shape` exceeds `max_shape`, or
    ///  - there is an underlying storage error.
    pub fn create(
        parent: &GroupNode<TStorage>,
        name: &str,
        data_type: DataType,
        initial_shape: ArrayShape,
        chunk_shape: ArrayShape,
        max_shape: ArrayMaxShape,
    ) -> Result<Self, CreateError> {
        ExtensibleArrayBuilder::new(data_type, initial_shape, chunk_shape)
            .max_shape(max_shape)
            .build(parent, name)
    }

    /// Write `bytes` to the elements of `hyperslab`, extending the array if needed.
    ///
    /// `bytes` holds `hyperslab.num_elements()` elements in native byte order, laid out block fastest, then count.
    ///
    /// If the hyperslab lies beyond the current shape, the array is first extended to the elementwise maximum of its current shape and the extent required by the hyperslab.
    /// The extension is not rolled back if the subsequent data transfer fails.
    ///
    /// # Errors
    /// Returns a [`WriteError`] if
    ///  - the hyperslab is invalid or exceeds the maximum shape,
    ///  - the length of `bytes` does not match the hyperslab, or
    ///  - there is an underlying storage error.
    ///
    /// These are all detected before the array is mutated, except for [`WriteError::TransferAfterExtend`]:
    /// the array was extended but the data transfer failed, so the unwritten part of the region reads back as the fill value.
    pub fn write(&mut self, hyperslab: &Hyperslab, bytes: &[u8]) -> Result<(), WriteError> {
        let plan = self.plan(hyperslab)?;
        let expected = self.buffer_size(hyperslab)?;
        if bytes.len() as u64 != expected {
            return Err(WriteError::InvalidBufferSize {
                got: bytes.len(),
                expected,
            });
        }

        let storage = self.storage_handle.storage();
        let handle = self.storage_handle.handle();
        if let Some(extend_to) = plan.extend_to() {
            log::debug!(
                "extending {} from {:?} to {extend_to:?} ({:?} chunks)",
                self.path,
                self.metadata.shape,
                plan.chunk_grid_shape()
            );
            storage.extend(handle, extend_to)?;
            self.metadata.shape = extend_to.to_vec();
            storage
                .write_region(handle, hyperslab, bytes)
                .map_err(|source| WriteError::TransferAfterExtend {
                    extended_to: extend_to.to_vec(),
                    source,
                })
        } else {
            Ok(storage.write_region(handle, hyperslab, bytes)?)
        }
    }

    /// Write `elements` to `hyperslab`, extending the array if needed.
    ///
    /// # Errors
    /// Returns [`WriteError::IncompatibleElementType`] if `T` does not match the data type of the array, or any error of [`write`](ExtensibleArray::write).
    pub fn write_elements<T: Element>(
        &mut self,
        hyperslab: &Hyperslab,
        elements: &[T],
    ) -> Result<(), WriteError> {
        T::validate_data_type(self.data_type())?;
        self.write(hyperslab, bytemuck::cast_slice(elements))
    }

    /// Write an [`ndarray`] at `start`, extending the array if needed.
    ///
    /// # Errors
    /// See [`write_elements`](ExtensibleArray::write_elements).
    #[cfg(feature = "ndarray")]
    pub fn write_ndarray<T: Element, D: ndarray::Dimension>(
        &mut self,
        start: &[u64],
        array: ndarray::ArrayView<T, D>,
    ) -> Result<(), WriteError> {
        let block: Vec<u64> = array.shape().iter().map(|&extent| extent as u64).collect();
        let hyperslab = Hyperslab::new(start.to_vec(), block);
        let array = array.as_standard_layout();
        if let Some(elements) = array.as_slice() {
            self.write_elements(&hyperslab, elements)
        } else {
            let elements: Vec<T> = array.iter().copied().collect();
            self.write_elements(&hyperslab, &elements)
        }
    }

    /// Set the attribute `name` of the array to `value`.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if `value` cannot be serialized, is a vector that is too long, or there is an underlying storage error.
    pub fn set_attribute<T: ?Sized + Serialize>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), AttributeError> {
        set_attribute(
            &**self.storage_handle.storage(),
            self.storage_handle.handle(),
            name,
            value,
        )
    }

    /// Remove the attribute `name` of the array.
    ///
    /// Returns true if the attribute existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    pub fn remove_attribute(&self, name: &str) -> Result<bool, StorageError> {
        self.storage_handle
            .storage()
            .remove_attribute(self.storage_handle.handle(), name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{hyperslab::GeometryError, storage::store::MemoryStore};

    use super::*;

    #[test]
    fn array_write_extends() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array = ExtensibleArray::create(
            &root,
            "array",
            DataType::Int16,
            vec![0],
            vec![4],
            vec![None],
        )?;
        assert_eq!(array.chunk_grid_shape(), vec![0]);
        array.write_elements::<i16>(&Hyperslab::new(vec![2], vec![3]), &[1, 2, 3])?;
        assert_eq!(array.shape(), &[5]);
        assert_eq!(array.chunk_grid_shape(), vec![2]);
        assert_eq!(
            array.read_elements::<i16>(&Hyperslab::new_with_shape(vec![5]))?,
            vec![0, 0, 1, 2, 3]
        );
        Ok(())
    }

    #[test]
    fn array_write_strided() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array = root.create_array("array", DataType::UInt8, vec![0], vec![3], vec![None])?;
        let hyperslab = Hyperslab::new(vec![1], vec![2])
            .with_stride(vec![4])
            .with_count(vec![3]);
        array.write_elements::<u8>(&hyperslab, &[1, 2, 3, 4, 5, 6])?;
        assert_eq!(array.shape(), &[11]);
        assert_eq!(
            array.read_elements::<u8>(&Hyperslab::new_with_shape(vec![11]))?,
            vec![0, 1, 2, 0, 0, 3, 4, 0, 0, 5, 6]
        );
        assert_eq!(array.read_elements::<u8>(&hyperslab)?, vec![1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn array_write_rejected_before_mutation() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array =
            root.create_array("array", DataType::Float32, vec![2], vec![2], vec![Some(4)])?;
        assert!(matches!(
            array.write_elements::<f32>(&Hyperslab::new(vec![3], vec![2]), &[1.0, 2.0]),
            Err(WriteError::Geometry(GeometryError::ExceedsMaximum {
                axis: 0,
                requested: 5,
                max: 4
            }))
        ));
        assert!(matches!(
            array.write_elements::<f32>(&Hyperslab::new(vec![2], vec![2]), &[1.0]),
            Err(WriteError::InvalidBufferSize {
                got: 4,
                expected: 8
            })
        ));
        assert!(matches!(
            array.write_elements::<f64>(&Hyperslab::new(vec![2], vec![1]), &[1.0]),
            Err(WriteError::IncompatibleElementType(_))
        ));
        assert_eq!(array.shape(), &[2]);
        assert_eq!(ExtensibleArray::open(&root, "array")?.shape(), &[2]);
        Ok(())
    }

    #[test]
    fn array_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let array = root.create_array("001002003", DataType::Int16, vec![0], vec![8], vec![None])?;
        array.set_attribute("STATION_ID", &1u32)?;
        array.set_attribute("SAMPLE_FREQUENCY_UNIT", "MHz")?;
        assert_eq!(array.attribute::<u32>("STATION_ID")?, 1);
        assert_eq!(array.attribute::<String>("SAMPLE_FREQUENCY_UNIT")?, "MHz");
        let mut names = array.attribute_names()?;
        names.sort();
        assert_eq!(names, vec!["SAMPLE_FREQUENCY_UNIT", "STATION_ID"]);
        assert!(array.remove_attribute("STATION_ID")?);
        assert!(matches!(
            array.attribute::<u32>("STATION_ID"),
            Err(AttributeError::Missing(_))
        ));
        Ok(())
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn array_write_ndarray() -> Result<(), Box<dyn std::error::Error>> {
        let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
        let mut array =
            root.create_array("array", DataType::Float64, vec![0, 2], vec![4, 2], vec![None, None])?;
        let data = ndarray::array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        array.write_ndarray(&[1, 0], data.view())?;
        assert_eq!(array.shape(), &[4, 2]);
        assert_eq!(
            array.read_elements::<f64>(&Hyperslab::new(vec![0, 0], vec![4, 2]))?,
            vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        Ok(())
    }
}
