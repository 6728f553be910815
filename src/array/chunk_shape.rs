use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use super::{ArrayShape, NonZeroError};

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct ChunkShape(Vec<NonZeroU64>);

impl ChunkShape {
    /// Return the number of elements.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements_u64(&self) -> u64 {
        self.0.iter().copied().map(NonZeroU64::get).product::<u64>()
    }

    /// Convert the chunk shape to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        self.0.iter().copied().map(NonZeroU64::get).collect()
    }
}

impl From<ChunkShape> for Vec<NonZeroU64> {
    fn from(val: ChunkShape) -> Self {
        val.0
    }
}

impl From<Vec<NonZeroU64>> for ChunkShape {
    fn from(value: Vec<NonZeroU64>) -> Self {
        ChunkShape(value)
    }
}

impl std::ops::Deref for ChunkShape {
    type Target = Vec<NonZeroU64>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = NonZeroError;
    fn try_from(value: &[u64]) -> Result<Self, Self::Error> {
        Ok(ChunkShape(
            value
                .iter()
                .map(|&i| NonZeroU64::new(i).ok_or(NonZeroError))
                .collect::<Result<_, _>>()?,
        ))
    }
}

impl TryFrom<Vec<u64>> for ChunkShape {
    type Error = NonZeroError;
    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        ChunkShape::try_from(value.as_slice())
    }
}

impl<const N: usize> TryFrom<[u64; N]> for ChunkShape {
    type Error = NonZeroError;
    fn try_from(value: [u64; N]) -> Result<Self, Self::Error> {
        ChunkShape::try_from(value.as_slice())
    }
}
