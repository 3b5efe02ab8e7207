use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::join_path;

/// Resolution applied when trees disagree on the shape of a shared key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictPriority {
    /// Leaf treatment wins: stop recursing at the shallower structure.
    Leaf,
    /// Branch treatment wins: keep recursing, trees without a branch here
    /// contribute no children.
    #[default]
    NonLeaf,
    /// Any disagreement, including a key missing from some trees, is an error.
    Neither,
}

/// One key seen simultaneously across every traversed tree.
///
/// `values` holds one slot per input tree, in input order; a slot is `None`
/// when that tree has nothing at this path.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiTreeNode<'t> {
    path: Vec<String>,
    pub values: Vec<Option<&'t Value>>,
    pub is_leaf: bool,
}

impl<'t> MultiTreeNode<'t> {
    pub(crate) fn new(path: Vec<String>, values: Vec<Option<&'t Value>>, is_leaf: bool) -> Self {
        Self {
            path,
            values,
            is_leaf,
        }
    }

    /// Key of this node within its parent.
    pub fn key(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Full path from the root, including [`key`](Self::key).
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path of the parent branch.
    pub fn parent_path(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    /// Textual `/`-joined form of [`path`](Self::path).
    pub fn path_string(&self) -> String {
        join_path(&self.path)
    }

    /// Value contributed by the tree at `tree` (input order), if any.
    pub fn value(&self, tree: usize) -> Option<&'t Value> {
        self.values.get(tree).copied().flatten()
    }

    /// First value defined across the trees, in input order.
    pub fn first_defined(&self) -> Option<&'t Value> {
        self.values.iter().copied().flatten().next()
    }

    /// Last value defined across the trees, in input order.
    pub fn last_defined(&self) -> Option<&'t Value> {
        self.values.iter().rev().copied().flatten().next()
    }

    /// Indices of the trees that have nothing at this path.
    pub fn missing_trees(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| value.is_none().then_some(idx))
            .collect()
    }
}
