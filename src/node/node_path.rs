use derive_more::Display;
use thiserror::Error;

use super::NodeName;

/// A node path.
///
/// The absolute path of a group or array from the root group, e.g. `/Station001/001002003`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{_0}")]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Clone, Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate`()].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice containing the node path `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Indicates if the path is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Return the path of the child `name` of this node.
    ///
    /// The root name is its own child.
    #[must_use]
    pub fn child(&self, name: &NodeName) -> Self {
        if name.is_root() {
            self.clone()
        } else if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    /// Return the path of the parent of this node, or [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let (parent, _) = self.0.rsplit_once('/')?;
            Some(if parent.is_empty() {
                Self::root()
            } else {
                Self(parent.to_string())
            })
        }
    }

    /// Return the name of the node (the last path component).
    #[must_use]
    pub fn name(&self) -> NodeName {
        let name = self.0.rsplit('/').next().unwrap_or_default();
        NodeName::new(name).unwrap_or_else(|_| NodeName::root())
    }

    /// Returns true if this path is `ancestor` or lies below it.
    #[must_use]
    pub fn has_ancestor(&self, ancestor: &NodePath) -> bool {
        ancestor.is_root()
            || self == ancestor
            || self
                .0
                .strip_prefix(ancestor.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Validates a path:
    /// - A path always starts with `/`, and
    /// - a non-root path cannot end with `/`, because node names must be non-empty and cannot contain `/`.
    ///
    /// Additionally, it checks that there are no empty nodes (i.e. a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/a/b").is_ok());
        assert_eq!(NodePath::new("/a/b").unwrap().to_string(), "/a/b");
        assert!(NodePath::new("/a/b/").is_err());
        assert_eq!(
            NodePath::new("/a/b/").unwrap_err().to_string(),
            "invalid node path /a/b/"
        );
        assert!(NodePath::new("/a//b").is_err());
    }

    #[test]
    fn node_path_navigation() {
        let station = NodePath::root().child(&NodeName::new("Station001").unwrap());
        assert_eq!(station.as_str(), "/Station001");
        let channel = station.child(&NodeName::new("001002003").unwrap());
        assert_eq!(channel.as_str(), "/Station001/001002003");
        assert_eq!(channel.name().as_str(), "001002003");
        assert_eq!(channel.parent(), Some(station.clone()));
        assert_eq!(station.parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);
        assert!(NodePath::root().name().is_root());

        assert!(channel.has_ancestor(&station));
        assert!(channel.has_ancestor(&NodePath::root()));
        assert!(!NodePath::new("/Station0011").unwrap().has_ancestor(&station));
    }
}
