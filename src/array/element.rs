use thiserror::Error;

use super::DataType;

/// An element type incompatible with the data type of an array.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("element type {element} is incompatible with data type {data_type}")]
pub struct IncompatibleElementTypeError {
    element: &'static str,
    data_type: DataType,
}

impl IncompatibleElementTypeError {
    /// Create a new incompatible element type error.
    #[must_use]
    pub const fn new(element: &'static str, data_type: DataType) -> Self {
        Self { element, data_type }
    }
}

/// A trait representing an array element type.
///
/// Elements are plain old data, so a slice of elements can be reinterpreted as the bytes of a region buffer.
pub trait Element: bytemuck::Pod + Send + Sync {
    /// Validate the data type.
    ///
    /// # Errors
    /// Returns an [`IncompatibleElementTypeError`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: &DataType) -> Result<(), IncompatibleElementTypeError>;
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $pattern:pat $(,)?) => {
        impl Element for $raw_type {
            fn validate_data_type(
                data_type: &DataType,
            ) -> Result<(), IncompatibleElementTypeError> {
                if matches!(data_type, $pattern) {
                    Ok(())
                } else {
                    Err(IncompatibleElementTypeError::new(
                        stringify!($raw_type),
                        *data_type,
                    ))
                }
            }
        }
    };
}

impl_element_pod!(i8, DataType::Int8);
impl_element_pod!(i16, DataType::Int16);
impl_element_pod!(i32, DataType::Int32);
impl_element_pod!(i64, DataType::Int64);
impl_element_pod!(u8, DataType::UInt8);
impl_element_pod!(u16, DataType::UInt16);
impl_element_pod!(u32, DataType::UInt32);
impl_element_pod!(u64, DataType::UInt64);
impl_element_pod!(f32, DataType::Float32);
impl_element_pod!(f64, DataType::Float64);
impl_element_pod!(num_complex::Complex32, DataType::Complex64);
impl_element_pod!(num_complex::Complex64, DataType::Complex128);

impl<const N: usize> Element for [u8; N] {
    fn validate_data_type(data_type: &DataType) -> Result<(), IncompatibleElementTypeError> {
        if data_type == &DataType::FixedString(N) {
            Ok(())
        } else {
            Err(IncompatibleElementTypeError::new("[u8; N]", *data_type))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_validate_data_type() {
        assert!(i16::validate_data_type(&DataType::Int16).is_ok());
        assert!(f32::validate_data_type(&DataType::Float32).is_ok());
        assert!(num_complex::Complex32::validate_data_type(&DataType::Complex64).is_ok());
        assert!(<[u8; 4]>::validate_data_type(&DataType::FixedString(4)).is_ok());
        assert!(<[u8; 4]>::validate_data_type(&DataType::FixedString(5)).is_err());
        assert_eq!(
            u16::validate_data_type(&DataType::Int16)
                .unwrap_err()
                .to_string(),
            "element type u16 is incompatible with data type int16"
        );
    }
}
