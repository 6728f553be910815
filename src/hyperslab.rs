//! Hyperslabs.
//!
//! A [`Hyperslab`] is a rectangular, possibly strided, sub-region of an N-dimensional array.
//! It is described per axis by a `start` offset, a `block` size, a `stride` between blocks and a `count` of blocks.
//! Overlapping blocks (a `stride` smaller than the `block`) are legal.
//!
//! [`plan`] validates a hyperslab against the current, maximum and chunk shape of a dataset and decides whether the dataset must grow to accommodate it.
//! Planning is pure arithmetic and performs no I/O, so a rejected request never mutates a dataset.
//!
//! The elements of a hyperslab are laid out in a buffer as a row-major array of shape `[count..., block...]`:
//! the block index varies fastest, then the count index.
//! [`Hyperslab::iter_contiguous_runs`] walks that layout as runs of elements contiguous along the last axis.

mod hyperslab_iterators;

pub use hyperslab_iterators::ContiguousRunsIterator;

use std::num::NonZeroU64;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayMaxShape, ArrayShape};

/// A hyperslab (region descriptor).
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display("start {start:?} block {block:?} stride {stride:?} count {count:?}")]
pub struct Hyperslab {
    /// The offset of the first block.
    start: ArrayShape,
    /// The shape of each block.
    block: ArrayShape,
    /// The distance between the starts of consecutive blocks.
    stride: ArrayShape,
    /// The number of blocks.
    count: ArrayShape,
}

impl Hyperslab {
    /// Create a new hyperslab of a single `block` at `start`.
    ///
    /// The stride and count are all ones.
    #[must_use]
    pub fn new(start: ArrayShape, block: ArrayShape) -> Self {
        let ones = vec![1; start.len()];
        Self {
            start,
            block,
            stride: ones.clone(),
            count: ones,
        }
    }

    /// Create a new hyperslab from all four components.
    #[must_use]
    pub fn new_with_start_block_stride_count(
        start: ArrayShape,
        block: ArrayShape,
        stride: ArrayShape,
        count: ArrayShape,
    ) -> Self {
        Self {
            start,
            block,
            stride,
            count,
        }
    }

    /// Create a new hyperslab covering an array with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self::new(vec![0; shape.len()], shape)
    }

    /// Set the stride.
    #[must_use]
    pub fn with_stride(mut self, stride: ArrayShape) -> Self {
        self.stride = stride;
        self
    }

    /// Set the count.
    #[must_use]
    pub fn with_count(mut self, count: ArrayShape) -> Self {
        self.count = count;
        self
    }

    /// Return the start of the hyperslab.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the block shape of the hyperslab.
    #[must_use]
    pub fn block(&self) -> &[u64] {
        &self.block
    }

    /// Return the stride of the hyperslab.
    #[must_use]
    pub fn stride(&self) -> &[u64] {
        &self.stride
    }

    /// Return the block count of the hyperslab.
    #[must_use]
    pub fn count(&self) -> &[u64] {
        &self.count
    }

    /// Return the dimensionality of the hyperslab (the length of `start`).
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the number of elements addressed by the hyperslab.
    ///
    /// Equal to `product(block) * product(count)`.
    /// Overlapping blocks are counted once per block.
    /// Saturates at [`u64::MAX`], a count [`plan`] rejects with [`GeometryError::TooManyElements`].
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.checked_num_elements().unwrap_or(u64::MAX)
    }

    /// Return the number of elements addressed by the hyperslab, or [`None`] if it overflows [`u64`].
    #[must_use]
    pub fn checked_num_elements(&self) -> Option<u64> {
        self.block
            .iter()
            .chain(self.count.iter())
            .try_fold(1u64, |product, &extent| product.checked_mul(extent))
    }

    /// Return the size in bytes of a buffer holding the elements of the hyperslab with `element_size` bytes each.
    ///
    /// # Errors
    /// Returns [`GeometryError::TooManyElements`] if the size overflows [`u64`].
    pub fn buffer_size(&self, element_size: usize) -> Result<u64, GeometryError> {
        self.checked_num_elements()
            .and_then(|num_elements| num_elements.checked_mul(element_size as u64))
            .ok_or(GeometryError::TooManyElements)
    }

    /// Return the shape of a buffer holding the elements of the hyperslab, `[count..., block...]`.
    #[must_use]
    pub fn buffer_shape(&self) -> ArrayShape {
        self.count.iter().chain(self.block.iter()).copied().collect()
    }

    /// Return the extent an array must have to contain the hyperslab.
    ///
    /// Per axis this is `start + stride * (count - 1) + block`.
    ///
    /// # Errors
    /// Returns [`GeometryError`] if the components have mismatched dimensionality, a block or count is zero, a stride is zero, or the end overflows.
    pub fn required_shape(&self) -> Result<ArrayShape, GeometryError> {
        self.validate(self.dimensionality())?;
        let mut required_shape = Vec::with_capacity(self.dimensionality());
        for (axis, (&start, &block, &stride, &count)) in
            izip!(&self.start, &self.block, &self.stride, &self.count).enumerate()
        {
            let end = stride
                .checked_mul(count - 1)
                .and_then(|offset| offset.checked_add(start))
                .and_then(|offset| offset.checked_add(block))
                .ok_or(GeometryError::Overflow { axis })?;
            required_shape.push(end);
        }
        Ok(required_shape)
    }

    /// Returns true if the hyperslab is valid and lies within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && self.required_shape().is_ok_and(|required_shape| {
                std::iter::zip(required_shape, array_shape).all(|(end, &shape)| end <= shape)
            })
    }

    /// Returns an iterator over the runs of elements in the hyperslab that are contiguous along the last axis, in buffer order.
    #[must_use]
    pub fn iter_contiguous_runs(&self) -> ContiguousRunsIterator<'_> {
        ContiguousRunsIterator::new(self)
    }

    fn validate(&self, rank: usize) -> Result<(), GeometryError> {
        for (what, len) in [
            ("start", self.start.len()),
            ("block", self.block.len()),
            ("stride", self.stride.len()),
            ("count", self.count.len()),
        ] {
            if len != rank {
                return Err(GeometryError::RankMismatch {
                    what,
                    got: len,
                    expected: rank,
                });
            }
        }
        for (axis, (&block, &stride, &count)) in
            izip!(&self.block, &self.stride, &self.count).enumerate()
        {
            if block == 0 || count == 0 {
                return Err(GeometryError::EmptyRegion { axis });
            }
            if stride == 0 {
                return Err(GeometryError::InvalidStride { axis });
            }
        }
        if self.checked_num_elements().is_none() {
            return Err(GeometryError::TooManyElements);
        }
        Ok(())
    }
}

/// A validated hyperslab, and the extent a dataset must grow to (if any) to accommodate it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HyperslabPlan {
    hyperslab: Hyperslab,
    required_shape: ArrayShape,
    extend_to: Option<ArrayShape>,
    chunk_grid_shape: ArrayShape,
}

impl HyperslabPlan {
    /// Return the validated hyperslab.
    #[must_use]
    pub fn hyperslab(&self) -> &Hyperslab {
        &self.hyperslab
    }

    /// Return the extent required by the hyperslab.
    #[must_use]
    pub fn required_shape(&self) -> &[u64] {
        &self.required_shape
    }

    /// Return the shape the dataset must be extended to, or [`None`] if the hyperslab lies within the current shape.
    #[must_use]
    pub fn extend_to(&self) -> Option<&[u64]> {
        self.extend_to.as_deref()
    }

    /// Return the number of chunks per axis covering the dataset once the plan is applied.
    ///
    /// Storage grows in whole chunks, so this is the physical allocation implied by the plan.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> &[u64] {
        &self.chunk_grid_shape
    }
}

/// A geometry error.
///
/// Always detected before any mutation of a dataset.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// A component has a dimensionality that does not match the dataset rank.
    #[error("{what} has dimensionality {got}, expected {expected}")]
    RankMismatch {
        /// The mismatched component.
        what: &'static str,
        /// The dimensionality of the component.
        got: usize,
        /// The dataset rank.
        expected: usize,
    },
    /// A block or count is zero.
    #[error("region is empty along axis {axis}")]
    EmptyRegion {
        /// The offending axis.
        axis: usize,
    },
    /// A stride is zero.
    #[error("stride is zero along axis {axis}")]
    InvalidStride {
        /// The offending axis.
        axis: usize,
    },
    /// The end of the region is not representable.
    #[error("region end overflows along axis {axis}")]
    Overflow {
        /// The offending axis.
        axis: usize,
    },
    /// The number of elements or bytes of the region is not representable.
    #[error("region holds too many elements to address")]
    TooManyElements,
    /// The region exceeds the maximum shape of the dataset.
    #[error("region requires extent {requested} along axis {axis}, exceeding the maximum {max}")]
    ExceedsMaximum {
        /// The offending axis.
        axis: usize,
        /// The required extent along the axis.
        requested: u64,
        /// The maximum extent along the axis.
        max: u64,
    },
}

/// Validate `hyperslab` against a dataset and plan any growth needed to accommodate it.
///
/// Growth is monotonic and tight: the planned extent is the elementwise maximum of `current_shape` and the required shape of the hyperslab.
/// An axis with a [`None`] maximum is unbounded.
///
/// # Errors
/// Returns [`GeometryError`] if
///  - any input does not match the rank of `current_shape`,
///  - a block or count is zero, or a stride is zero,
///  - the end of the region or its number of elements overflows, or
///  - the region exceeds a bounded maximum.
pub fn plan(
    current_shape: &[u64],
    max_shape: &[Option<u64>],
    chunk_shape: &[NonZeroU64],
    hyperslab: &Hyperslab,
) -> Result<HyperslabPlan, GeometryError> {
    let rank = current_shape.len();
    for (what, len) in [
        ("max shape", max_shape.len()),
        ("chunk shape", chunk_shape.len()),
    ] {
        if len != rank {
            return Err(GeometryError::RankMismatch {
                what,
                got: len,
                expected: rank,
            });
        }
    }
    hyperslab.validate(rank)?;
    let required_shape = hyperslab.required_shape()?;

    if std::iter::zip(&required_shape, current_shape).all(|(required, current)| required <= current)
    {
        return Ok(HyperslabPlan {
            hyperslab: hyperslab.clone(),
            chunk_grid_shape: chunk_grid_shape(current_shape, chunk_shape),
            required_shape,
            extend_to: None,
        });
    }

    for (axis, (&requested, max)) in std::iter::zip(&required_shape, max_shape).enumerate() {
        if let Some(max) = *max {
            if requested > max {
                return Err(GeometryError::ExceedsMaximum {
                    axis,
                    requested,
                    max,
                });
            }
        }
    }

    let extend_to: ArrayShape = std::iter::zip(current_shape, &required_shape)
        .map(|(&current, &required)| std::cmp::max(current, required))
        .collect();
    Ok(HyperslabPlan {
        hyperslab: hyperslab.clone(),
        chunk_grid_shape: chunk_grid_shape(&extend_to, chunk_shape),
        required_shape,
        extend_to: Some(extend_to),
    })
}

/// Return the number of chunks with `chunk_shape` per axis needed to cover an array with `shape`.
#[must_use]
pub fn chunk_grid_shape(shape: &[u64], chunk_shape: &[NonZeroU64]) -> ArrayShape {
    std::iter::zip(shape, chunk_shape)
        .map(|(&shape, chunk)| shape.div_ceil(chunk.get()))
        .collect()
}

/// Returns true if `shape` lies within `max_shape` on every axis.
#[must_use]
pub fn within_max_shape(shape: &[u64], max_shape: &ArrayMaxShape) -> bool {
    shape.len() == max_shape.len()
        && std::iter::zip(shape, max_shape).all(|(&shape, max)| max.map_or(true, |max| shape <= max))
}
