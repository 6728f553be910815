use std::iter::FusedIterator;

use crate::storage::ChildNode;

/// An iterator over the direct members (arrays and subgroups) of a group.
///
/// Members are listed from the backend when the iterator is created.
/// The order is stable for a given backend state, but is not necessarily the insertion order.
/// Enumeration is restartable: create a new iterator with [`GroupNode::members`](super::GroupNode::members).
#[derive(Debug, Clone)]
pub struct Members {
    children: std::vec::IntoIter<ChildNode>,
}

impl Members {
    pub(crate) fn new(children: Vec<ChildNode>) -> Self {
        Self {
            children: children.into_iter(),
        }
    }
}

impl Iterator for Members {
    type Item = ChildNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.children.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.children.size_hint()
    }
}

impl ExactSizeIterator for Members {}

impl FusedIterator for Members {}
