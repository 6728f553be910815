use std::sync::Arc;

use dalarray::array::{
    DataType, ExtensibleArray, ExtensibleArrayBuilder, FillValue, ReadError, WriteError,
};
use dalarray::group::{AttributeError, GroupNode};
use dalarray::hyperslab::{GeometryError, Hyperslab};
use dalarray::node::{CreateError, NodeName, NodePath};
use dalarray::storage::store::MemoryStore;
use dalarray::storage::{
    ChildNode, Handle, ReadableStorageTraits, StorageError, WritableStorageTraits,
};

fn samples(rows: u64, columns: u64, offset: f32) -> Vec<f32> {
    (0..rows * columns)
        .map(|i| offset + i as f32)
        .collect()
}

fn float_array(
    max_shape: Vec<Option<u64>>,
) -> Result<(GroupNode<MemoryStore>, ExtensibleArray<MemoryStore>), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let array = root.create_array(
        "beam",
        DataType::Float32,
        vec![0, 2048],
        vec![100, 2048],
        max_shape,
    )?;
    Ok((root, array))
}

#[test]
fn extensible_array_append() -> Result<(), Box<dyn std::error::Error>> {
    let (_root, mut array) = float_array(vec![None, Some(2048)])?;

    let first = samples(10, 2048, 0.0);
    array.write_elements(&Hyperslab::new(vec![0, 0], vec![10, 2048]), &first)?;
    assert_eq!(array.shape(), &[10, 2048]);

    let second = samples(10, 2048, 1.0e6);
    array.write_elements(&Hyperslab::new(vec![10, 0], vec![10, 2048]), &second)?;
    assert_eq!(array.shape(), &[20, 2048]);
    assert_eq!(array.chunk_grid_shape(), vec![1, 1]);

    assert_eq!(
        array.read_elements::<f32>(&Hyperslab::new(vec![0, 0], vec![10, 2048]))?,
        first
    );
    assert_eq!(
        array.read_elements::<f32>(&Hyperslab::new(vec![10, 0], vec![10, 2048]))?,
        second
    );
    Ok(())
}

#[test]
fn extensible_array_bounded_rejection() -> Result<(), Box<dyn std::error::Error>> {
    let (_root, mut array) = float_array(vec![Some(100), Some(2048)])?;
    array.write_elements(
        &Hyperslab::new(vec![0, 0], vec![10, 2048]),
        &samples(10, 2048, 0.0),
    )?;

    let result = array.write_elements(
        &Hyperslab::new(vec![95, 0], vec![10, 2048]),
        &samples(10, 2048, 0.0),
    );
    assert!(matches!(
        result,
        Err(WriteError::Geometry(GeometryError::ExceedsMaximum {
            axis: 0,
            requested: 105,
            max: 100
        }))
    ));
    assert_eq!(array.shape(), &[10, 2048]);

    // the maximum itself is reachable
    array.write_elements(
        &Hyperslab::new(vec![90, 0], vec![10, 2048]),
        &samples(10, 2048, 0.0),
    )?;
    assert_eq!(array.shape(), &[100, 2048]);
    Ok(())
}

#[test]
fn extensible_array_monotonic_growth() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = root.create_array(
        "grid",
        DataType::UInt8,
        vec![4, 4],
        vec![3, 3],
        vec![None, None],
    )?;

    let writes = [
        Hyperslab::new(vec![6, 0], vec![1, 2]),
        Hyperslab::new(vec![0, 9], vec![2, 1]),
        Hyperslab::new(vec![1, 1], vec![1, 1]),
        Hyperslab::new(vec![0, 0], vec![1, 1])
            .with_stride(vec![5, 5])
            .with_count(vec![2, 3]),
    ];
    for hyperslab in &writes {
        let before = array.shape().to_vec();
        let required = hyperslab.required_shape()?;
        let elements = vec![1u8; usize::try_from(hyperslab.num_elements())?];
        array.write_elements(hyperslab, &elements)?;
        for axis in 0..2 {
            assert!(array.shape()[axis] >= before[axis]);
            assert!(array.shape()[axis] >= required[axis]);
            assert_eq!(
                array.shape()[axis],
                std::cmp::max(before[axis], required[axis])
            );
        }
    }
    assert_eq!(array.shape(), &[7, 11]);
    Ok(())
}

#[test]
fn extensible_array_read_never_extends() -> Result<(), Box<dyn std::error::Error>> {
    let (_root, mut array) = float_array(vec![None, None])?;
    array.write_elements(
        &Hyperslab::new(vec![0, 0], vec![5, 2048]),
        &samples(5, 2048, 0.0),
    )?;
    assert!(array
        .read_elements::<f32>(&Hyperslab::new(vec![3, 0], vec![5, 2048]))
        .is_err());
    let _ = array.read_elements::<f32>(&Hyperslab::new(vec![1, 0], vec![2, 16]))?;
    assert_eq!(array.shape(), &[5, 2048]);
    Ok(())
}

#[test]
fn extensible_array_identical_write_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = root.create_array("a", DataType::Int32, vec![0], vec![8], vec![None])?;
    let hyperslab = Hyperslab::new(vec![2], vec![3])
        .with_stride(vec![4])
        .with_count(vec![3]);
    let elements: Vec<i32> = (1..=9).collect();

    array.write_elements(&hyperslab, &elements)?;
    let shape = array.shape().to_vec();
    let whole = Hyperslab::new_with_shape(shape.clone());
    let content = array.read_elements::<i32>(&whole)?;

    array.write_elements(&hyperslab, &elements)?;
    assert_eq!(array.shape(), shape.as_slice());
    assert_eq!(array.read_elements::<i32>(&whole)?, content);

    assert_eq!(shape, vec![13]);
    assert_eq!(
        content,
        vec![0, 0, 1, 2, 3, 0, 4, 5, 6, 0, 7, 8, 9]
    );
    Ok(())
}

#[test]
fn extensible_array_strided_buffer_layout() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = root.create_array("a", DataType::UInt16, vec![0, 0], vec![2, 2], vec![None, None])?;
    // two blocks of 1x2 along axis 1, the block index varies fastest
    let hyperslab = Hyperslab::new(vec![0, 0], vec![1, 2])
        .with_stride(vec![1, 3])
        .with_count(vec![1, 2]);
    assert_eq!(hyperslab.buffer_shape(), vec![1, 2, 1, 2]);
    array.write_elements::<u16>(&hyperslab, &[1, 2, 3, 4])?;
    assert_eq!(array.shape(), &[1, 5]);
    assert_eq!(
        array.read_elements::<u16>(&Hyperslab::new(vec![0, 0], vec![1, 5]))?,
        vec![1, 2, 0, 3, 4]
    );
    Ok(())
}

#[test]
fn extensible_array_rejections_before_mutation() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = root.create_array("a", DataType::Int16, vec![0], vec![4], vec![None])?;

    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![0, 0], vec![1, 1]), &[1]),
        Err(WriteError::Geometry(GeometryError::RankMismatch { .. }))
    ));
    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![0], vec![0]), &[]),
        Err(WriteError::Geometry(GeometryError::EmptyRegion { axis: 0 }))
    ));
    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![0], vec![1]).with_stride(vec![0]), &[1]),
        Err(WriteError::Geometry(GeometryError::InvalidStride { axis: 0 }))
    ));
    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![u64::MAX], vec![2]), &[1, 2]),
        Err(WriteError::Geometry(GeometryError::Overflow { axis: 0 }))
    ));
    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![4], vec![2]), &[1]),
        Err(WriteError::InvalidBufferSize {
            got: 2,
            expected: 4
        })
    ));
    assert!(matches!(
        array.write_elements::<u16>(&Hyperslab::new(vec![4], vec![1]), &[1]),
        Err(WriteError::IncompatibleElementType(_))
    ));
    assert_eq!(array.shape(), &[0]);
    Ok(())
}

#[test]
fn extensible_array_oversized_region_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let root = GroupNode::open_root(store.clone())?;
    let mut array = root.create_array("big", DataType::UInt8, vec![0, 0], vec![4, 4], vec![None, None])?;

    // the element count overflows u64
    let hyperslab = Hyperslab::new(vec![0, 0], vec![1 << 32, 1 << 32]);
    assert!(matches!(
        array.write(&hyperslab, &[]),
        Err(WriteError::Geometry(GeometryError::TooManyElements))
    ));
    assert!(matches!(
        array.read(&hyperslab, &mut []),
        Err(ReadError::Geometry(GeometryError::TooManyElements))
    ));

    // representable, but no caller can supply the buffer
    assert!(matches!(
        array.write(&Hyperslab::new(vec![0, 0], vec![1 << 31, 1 << 31]), &[]),
        Err(WriteError::InvalidBufferSize {
            got: 0,
            expected: 0x4000_0000_0000_0000
        })
    ));

    assert_eq!(array.shape(), &[0, 0]);
    assert_eq!(ExtensibleArray::open(&root, "big")?.shape(), &[0, 0]);
    assert_eq!(
        store.num_allocated_chunks(&NodePath::new("/big")?),
        Some(0)
    );
    Ok(())
}

#[test]
fn extensible_array_fill_value() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = ExtensibleArrayBuilder::new(DataType::Float64, vec![0], vec![4])
        .fill_value(FillValue::from(f64::NAN))
        .build(&root, "a")?;
    array.write_elements::<f64>(&Hyperslab::new(vec![6], vec![1]), &[1.5])?;
    let elements = array.read_elements::<f64>(&Hyperslab::new(vec![0], vec![7]))?;
    assert!(elements[..6].iter().all(|x| x.is_nan()));
    assert_eq!(elements[6], 1.5);
    Ok(())
}

#[test]
fn extensible_array_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let mut array = root.create_array("a", DataType::Int16, vec![0], vec![4], vec![Some(64)])?;
    array.write_elements::<i16>(&Hyperslab::new(vec![0], vec![5]), &[1, 2, 3, 4, 5])?;
    array.set_attribute("TIME", &1_700_000_000u32)?;
    array.close()?;

    let array = ExtensibleArray::open_with_data_type(&root, "a", DataType::Int16)?;
    assert_eq!(array.shape(), &[5]);
    assert_eq!(array.max_shape(), &[Some(64)]);
    assert_eq!(array.attribute::<u32>("TIME")?, 1_700_000_000);
    assert_eq!(
        array.read_elements::<i16>(&Hyperslab::new(vec![3], vec![2]))?,
        vec![4, 5]
    );
    assert!(ExtensibleArray::open_with_data_type(&root, "a", DataType::Float32).is_err());
    Ok(())
}

/// Delegates to a [`MemoryStore`] but fails every region write, and every attribute write if `fail_attributes` is set.
struct FailingWriteStore {
    inner: MemoryStore,
    fail_attributes: bool,
}

impl ReadableStorageTraits for FailingWriteStore {
    fn open_root(&self) -> Result<Handle, StorageError> {
        self.inner.open_root()
    }

    fn open_group(&self, location: Handle, name: &NodeName) -> Result<Option<Handle>, StorageError> {
        self.inner.open_group(location, name)
    }

    fn open_dataset(
        &self,
        location: Handle,
        name: &NodeName,
    ) -> Result<Option<Handle>, StorageError> {
        self.inner.open_dataset(location, name)
    }

    fn dataset_metadata(
        &self,
        dataset: Handle,
    ) -> Result<dalarray::array::DatasetMetadata, StorageError> {
        self.inner.dataset_metadata(dataset)
    }

    fn read_region(
        &self,
        dataset: Handle,
        hyperslab: &Hyperslab,
        bytes: &mut [u8],
    ) -> Result<(), StorageError> {
        self.inner.read_region(dataset, hyperslab, bytes)
    }

    fn list_children(&self, location: Handle) -> Result<Vec<ChildNode>, StorageError> {
        self.inner.list_children(location)
    }

    fn get_attribute(
        &self,
        handle: Handle,
        name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        self.inner.get_attribute(handle, name)
    }

    fn attribute_names(&self, handle: Handle) -> Result<Vec<String>, StorageError> {
        self.inner.attribute_names(handle)
    }

    fn close_handle(&self, handle: Handle) -> Result<(), StorageError> {
        self.inner.close_handle(handle)
    }
}

impl WritableStorageTraits for FailingWriteStore {
    fn create_group(&self, location: Handle, name: &NodeName) -> Result<Handle, StorageError> {
        self.inner.create_group(location, name)
    }

    fn create_dataset(
        &self,
        location: Handle,
        name: &NodeName,
        metadata: &dalarray::array::DatasetMetadata,
    ) -> Result<Handle, StorageError> {
        self.inner.create_dataset(location, name, metadata)
    }

    fn extend(&self, dataset: Handle, shape: &[u64]) -> Result<(), StorageError> {
        self.inner.extend(dataset, shape)
    }

    fn write_region(
        &self,
        _dataset: Handle,
        _hyperslab: &Hyperslab,
        _bytes: &[u8],
    ) -> Result<(), StorageError> {
        Err(StorageError::Other("disk full".to_string()))
    }

    fn set_attribute(
        &self,
        handle: Handle,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), StorageError> {
        if self.fail_attributes {
            Err(StorageError::Other("read-only attributes".to_string()))
        } else {
            self.inner.set_attribute(handle, name, value)
        }
    }

    fn remove_attribute(&self, handle: Handle, name: &str) -> Result<bool, StorageError> {
        self.inner.remove_attribute(handle, name)
    }

    fn remove_child(&self, location: Handle, name: &NodeName) -> Result<bool, StorageError> {
        self.inner.remove_child(location, name)
    }
}

#[test]
fn extensible_array_extended_but_unwritten() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FailingWriteStore {
        inner: MemoryStore::new(),
        fail_attributes: false,
    });
    let root = GroupNode::open_root(store.clone())?;
    let mut array = ExtensibleArrayBuilder::new(DataType::Int16, vec![4], vec![4])
        .fill_value(FillValue::from(-1i16))
        .build(&root, "a")?;

    let result = array.write_elements::<i16>(&Hyperslab::new(vec![2], vec![6]), &[1, 2, 3, 4, 5, 6]);
    match result {
        Err(WriteError::TransferAfterExtend { extended_to, .. }) => {
            assert_eq!(extended_to, vec![8]);
        }
        other => panic!("expected a transfer failure after extension, got {other:?}"),
    }

    // the extension is detectable, both in the cached and the stored shape
    assert_eq!(array.shape(), &[8]);
    let reopened = root.open_array("a")?;
    assert_eq!(reopened.shape(), &[8]);
    assert_eq!(
        reopened.read_elements::<i16>(&Hyperslab::new(vec![4], vec![4]))?,
        vec![-1; 4]
    );

    // a write within the current extent fails without extending
    assert!(matches!(
        array.write_elements::<i16>(&Hyperslab::new(vec![0], vec![1]), &[1]),
        Err(WriteError::StorageError(StorageError::Other(_)))
    ));
    assert_eq!(array.shape(), &[8]);
    assert_eq!(
        store
            .inner
            .num_allocated_chunks(&NodePath::new("/a")?),
        Some(0)
    );
    Ok(())
}

#[test]
fn extensible_array_initial_attributes_all_or_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FailingWriteStore {
        inner: MemoryStore::new(),
        fail_attributes: true,
    });
    let root = GroupNode::open_root(store.clone())?;
    let mut attributes = serde_json::Map::new();
    attributes.insert("FEED".to_string(), "LBA".into());
    let result = ExtensibleArrayBuilder::new(DataType::Int16, vec![0], vec![4])
        .attributes(attributes)
        .build(&root, "a");
    assert!(matches!(
        result,
        Err(CreateError::StorageError(StorageError::Other(_)))
    ));
    assert!(root.member_names()?.is_empty());
    assert_eq!(store.inner.num_open_handles(), 1);
    Ok(())
}

#[test]
fn extensible_array_initial_attributes_validated() -> Result<(), Box<dyn std::error::Error>> {
    let root = GroupNode::open_root(Arc::new(MemoryStore::new()))?;
    let max = dalarray::config::global_config().max_attribute_elements();
    let mut attributes = serde_json::Map::new();
    attributes.insert("TRIGGERED_ANTENNAS".to_string(), vec![0u32; max + 1].into());
    let result = ExtensibleArrayBuilder::new(DataType::Int16, vec![0], vec![4])
        .attributes(attributes)
        .build(&root, "a");
    assert!(matches!(
        result,
        Err(CreateError::AttributeError(AttributeError::TooLong { .. }))
    ));
    assert!(root.member_names()?.is_empty());
    Ok(())
}

#[test]
fn extensible_array_removed_then_recreated() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let root = GroupNode::open_root(store.clone())?;
    let mut stale = root.create_array("a", DataType::Int16, vec![4], vec![4], vec![None])?;
    assert!(root.remove_member("a")?);
    let fresh = root.create_array("a", DataType::Int16, vec![4], vec![4], vec![None])?;

    assert!(matches!(
        stale.write_elements::<i16>(&Hyperslab::new(vec![0], vec![2]), &[1, 2]),
        Err(WriteError::StorageError(StorageError::InvalidHandle(_)))
    ));
    assert!(matches!(
        stale.write_elements::<i16>(&Hyperslab::new(vec![6], vec![2]), &[1, 2]),
        Err(WriteError::StorageError(StorageError::InvalidHandle(_)))
    ));
    assert_eq!(
        fresh.read_elements::<i16>(&Hyperslab::new_with_shape(vec![4]))?,
        vec![0; 4]
    );
    assert_eq!(fresh.shape(), &[4]);
    assert_eq!(store.num_allocated_chunks(&NodePath::new("/a")?), Some(0));
    stale.close()?;
    Ok(())
}
