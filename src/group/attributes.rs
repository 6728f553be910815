//! Attribute access shared by groups and arrays.
//!
//! Attribute values are JSON values: a scalar or a small vector.
//! Typed access (de)serializes them with [`serde_json`].

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    config::global_config,
    storage::{Handle, ReadableStorageTraits, StorageError, WritableStorageTraits},
};

/// An attribute error.
#[derive(Debug, Error)]
pub enum AttributeError {
    /// The attribute does not exist.
    #[error("attribute {0} does not exist")]
    Missing(String),
    /// The attribute exists but could not be deserialized to the requested type.
    #[error("attribute {name} has an incompatible type: {source}")]
    TypeMismatch {
        /// The attribute name.
        name: String,
        /// The deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// A fixed length attribute has the wrong length.
    #[error("attribute {name} has {got} elements, expected {expected}")]
    InvalidLength {
        /// The attribute name.
        name: String,
        /// The expected number of elements.
        expected: usize,
        /// The number of elements.
        got: usize,
    },
    /// A vector attribute is longer than [`Config::max_attribute_elements`](crate::config::Config::max_attribute_elements).
    #[error("attribute {name} has {len} elements, the maximum is {max}")]
    TooLong {
        /// The attribute name.
        name: String,
        /// The number of elements.
        len: usize,
        /// The maximum number of elements.
        max: usize,
    },
    /// The value could not be serialized.
    #[error("attribute {name} could not be serialized: {source}")]
    Serialization {
        /// The attribute name.
        name: String,
        /// The serialization error.
        #[source]
        source: serde_json::Error,
    },
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

pub(crate) fn get_attribute<TStorage, T>(
    storage: &TStorage,
    handle: Handle,
    name: &str,
) -> Result<T, AttributeError>
where
    TStorage: ?Sized + ReadableStorageTraits,
    T: DeserializeOwned,
{
    let value = storage
        .get_attribute(handle, name)?
        .ok_or_else(|| AttributeError::Missing(name.to_string()))?;
    serde_json::from_value(value).map_err(|source| AttributeError::TypeMismatch {
        name: name.to_string(),
        source,
    })
}

pub(crate) fn get_fixed_length_attribute<TStorage, T, const N: usize>(
    storage: &TStorage,
    handle: Handle,
    name: &str,
) -> Result<[T; N], AttributeError>
where
    TStorage: ?Sized + ReadableStorageTraits,
    T: DeserializeOwned,
{
    let values: Vec<T> = get_attribute(storage, handle, name)?;
    let got = values.len();
    values
        .try_into()
        .map_err(|_| AttributeError::InvalidLength {
            name: name.to_string(),
            expected: N,
            got,
        })
}

pub(crate) fn set_attribute<TStorage, T>(
    storage: &TStorage,
    handle: Handle,
    name: &str,
    value: &T,
) -> Result<(), AttributeError>
where
    TStorage: ?Sized + WritableStorageTraits,
    T: ?Sized + Serialize,
{
    let value = serde_json::to_value(value).map_err(|source| AttributeError::Serialization {
        name: name.to_string(),
        source,
    })?;
    validate_attribute(name, &value)?;
    storage.set_attribute(handle, name, &value)?;
    Ok(())
}

/// Check that a vector attribute is within [`Config::max_attribute_elements`](crate::config::Config::max_attribute_elements).
pub(crate) fn validate_attribute(name: &str, value: &serde_json::Value) -> Result<(), AttributeError> {
    if let serde_json::Value::Array(elements) = value {
        let max = global_config().max_attribute_elements();
        if elements.len() > max {
            return Err(AttributeError::TooLong {
                name: name.to_string(),
                len: elements.len(),
                max,
            });
        }
    }
    Ok(())
}
