//! Fill values.

use serde::{Deserialize, Serialize};

use super::DataType;

/// The fill value of an array.
///
/// Provides an element value to use for addressed but never written portions of an array.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

macro_rules! fill_value_from_ne_bytes {
    ( $($t:ty),* ) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    FillValue(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

fill_value_from_ne_bytes!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl From<num_complex::Complex32> for FillValue {
    fn from(value: num_complex::Complex32) -> Self {
        let mut bytes = Vec::with_capacity(std::mem::size_of::<num_complex::Complex32>());
        bytes.extend(value.re.to_ne_bytes());
        bytes.extend(value.im.to_ne_bytes());
        FillValue(bytes)
    }
}

impl From<num_complex::Complex64> for FillValue {
    fn from(value: num_complex::Complex64) -> Self {
        let mut bytes = Vec::with_capacity(std::mem::size_of::<num_complex::Complex64>());
        bytes.extend(value.re.to_ne_bytes());
        bytes.extend(value.im.to_ne_bytes());
        FillValue(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for FillValue {
    fn from(value: [u8; N]) -> Self {
        FillValue(value.to_vec())
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Create the default fill value of `data_type`: all bytes zero.
    #[must_use]
    pub fn new_default(data_type: &DataType) -> FillValue {
        FillValue(vec![0; data_type.size()])
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }
}
