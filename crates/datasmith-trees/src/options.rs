use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::node::{ConflictPriority, MultiTreeNode};

type LeafPredicate<'a> = Box<dyn Fn(&[String], &Value) -> bool + 'a>;
type SiblingComparator<'a> =
    Box<dyn Fn(&MultiTreeNode<'_>, &MultiTreeNode<'_>) -> Ordering + 'a>;

/// Default leaf rule: anything that is not a JSON object is a leaf.
pub fn plain_leaf(_path: &[String], value: &Value) -> bool {
    !value.is_object()
}

/// Caller-supplied traversal policy shared by `reduce`, `translate` and
/// `flatten`.
///
/// The leaf predicate receives the full path of a node and the value one
/// tree holds there. Object-shaped values may be declared leaves this way.
pub struct TraversalOptions<'a> {
    is_leaf: LeafPredicate<'a>,
    conflict_priority: ConflictPriority,
    comparator: Option<SiblingComparator<'a>>,
}

impl<'a> TraversalOptions<'a> {
    pub fn new(is_leaf: impl Fn(&[String], &Value) -> bool + 'a) -> Self {
        Self {
            is_leaf: Box::new(is_leaf),
            conflict_priority: ConflictPriority::default(),
            comparator: None,
        }
    }

    pub fn with_conflict_priority(mut self, priority: ConflictPriority) -> Self {
        self.conflict_priority = priority;
        self
    }

    /// Order siblings before visiting them. The sort is stable, so ties keep
    /// first-seen key order.
    pub fn with_comparator(
        mut self,
        comparator: impl Fn(&MultiTreeNode<'_>, &MultiTreeNode<'_>) -> Ordering + 'a,
    ) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    pub fn conflict_priority(&self) -> ConflictPriority {
        self.conflict_priority
    }

    pub fn is_leaf(&self, path: &[String], value: &Value) -> bool {
        (self.is_leaf)(path, value)
    }

    pub(crate) fn sort_siblings(&self, nodes: &mut [MultiTreeNode<'_>]) {
        if let Some(comparator) = &self.comparator {
            nodes.sort_by(|a, b| comparator(a, b));
        }
    }
}

impl Default for TraversalOptions<'_> {
    fn default() -> Self {
        Self::new(plain_leaf)
    }
}

impl fmt::Debug for TraversalOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalOptions")
            .field("conflict_priority", &self.conflict_priority)
            .field("comparator", &self.comparator.is_some())
            .finish_non_exhaustive()
    }
}
