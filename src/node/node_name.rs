use derive_more::Display;
use thiserror::Error;

/// A node name.
///
/// The name of a group or array relative to its parent group.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{_0}")]
pub struct NodeName(String);

/// An invalid node name.
#[derive(Clone, Debug, Error)]
#[error("invalid node name {0:?}")]
pub struct NodeNameError(String);

impl NodeNameError {
    /// Create a new invalid node name error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl NodeName {
    /// Create a new node name from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeNameError`] if `name` is not valid according to [`NodeName::validate`()].
    pub fn new(name: &str) -> Result<Self, NodeNameError> {
        if Self::validate(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(NodeNameError(name.to_string()))
        }
    }

    /// The root node.
    ///
    /// The root has the empty name, which is not a valid member name.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice containing the node name `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates the name of a group member. It
    /// - must not be the empty string (""), which is reserved for the root node (see [`NodeName::root`]),
    /// - must not include the character "/", and
    /// - must not be a string composed only of period characters, e.g. "." or "..".
    #[must_use]
    pub fn validate(node_name: &str) -> bool {
        !node_name.contains('/') && !node_name.replace('.', "").is_empty()
    }

    /// Indicates if a node has the root node name ("").
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&str> for NodeName {
    type Error = NodeNameError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name() {
        assert!(NodeName::new("001002003").is_ok());
        assert!(NodeName::new("Station001").is_ok());
        assert!(NodeName::root().is_root());
        assert!(NodeName::new("").is_err());
        assert!(NodeName::new(".").is_err());
        assert!(NodeName::new("a/b").is_err());
        assert!(NodeName::new("..").is_err());
        assert_eq!(
            NodeName::new("a/b").unwrap_err().to_string(),
            "invalid node name \"a/b\""
        );
    }
}
