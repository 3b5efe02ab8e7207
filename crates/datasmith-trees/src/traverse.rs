use std::collections::HashSet;

use serde_json::Value;
use tracing::trace;

use crate::Tree;
use crate::error::ShapeConflictError;
use crate::node::{ConflictPriority, MultiTreeNode};
use crate::options::TraversalOptions;
use crate::path::join_path;

/// Callbacks driven by [`walk`]. Every public operation is one visitor.
pub(crate) trait Visitor<'t> {
    type Error: From<ShapeConflictError>;

    /// Returning `false` prunes the node and its subtree.
    fn keep(&mut self, _node: &MultiTreeNode<'t>) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn leaf(&mut self, node: &MultiTreeNode<'t>) -> Result<(), Self::Error>;

    fn enter_branch(&mut self, node: &MultiTreeNode<'t>) -> Result<(), Self::Error>;

    fn leave_branch(&mut self, node: &MultiTreeNode<'t>) -> Result<(), Self::Error>;
}

/// Walk the branches at `parent_path` of every tree in lockstep.
///
/// `branches` has one slot per input tree; `None` means the tree has no
/// branch at this level and contributes no keys.
pub(crate) fn walk<'t, V: Visitor<'t>>(
    branches: &[Option<&'t Tree>],
    parent_path: &[String],
    options: &TraversalOptions<'_>,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut nodes = Vec::new();
    for key in union_keys(branches) {
        let mut path = parent_path.to_vec();
        path.push(key.to_string());
        let values: Vec<Option<&'t Value>> = branches
            .iter()
            .map(|branch| branch.and_then(|branch| branch.get(key)))
            .collect();
        let is_leaf = classify(&path, &values, options)?;
        nodes.push(MultiTreeNode::new(path, values, is_leaf));
    }
    options.sort_siblings(&mut nodes);

    for node in &nodes {
        if !visitor.keep(node)? {
            trace!(path = %node.path_string(), "pruned");
            continue;
        }

        if options.conflict_priority() == ConflictPriority::Neither {
            let missing = node.missing_trees();
            if !missing.is_empty() {
                return Err(ShapeConflictError::Missing {
                    path: node.path_string(),
                    missing,
                }
                .into());
            }
        }

        if node.is_leaf {
            trace!(path = %node.path_string(), "leaf");
            visitor.leaf(node)?;
        } else {
            trace!(path = %node.path_string(), "branch");
            visitor.enter_branch(node)?;
            // Trees that hold a leaf here contribute an empty branch.
            let children: Vec<Option<&'t Tree>> = node
                .values
                .iter()
                .map(|value| {
                    value
                        .filter(|value| !options.is_leaf(node.path(), value))
                        .and_then(Value::as_object)
                })
                .collect();
            walk(&children, node.path(), options, visitor)?;
            visitor.leave_branch(node)?;
        }
    }

    Ok(())
}

/// Keys of every branch, merged in first-seen order.
fn union_keys<'t>(branches: &[Option<&'t Tree>]) -> Vec<&'t str> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for branch in branches.iter().flatten() {
        for key in branch.keys() {
            if seen.insert(key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }
    keys
}

fn classify(
    path: &[String],
    values: &[Option<&Value>],
    options: &TraversalOptions<'_>,
) -> Result<bool, ShapeConflictError> {
    let mut leaf_trees = Vec::new();
    let mut branch_trees = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        if let Some(value) = value {
            if options.is_leaf(path, value) {
                leaf_trees.push(idx);
            } else {
                branch_trees.push(idx);
            }
        }
    }

    if leaf_trees.is_empty() || branch_trees.is_empty() {
        return Ok(branch_trees.is_empty());
    }

    match options.conflict_priority() {
        ConflictPriority::Leaf => Ok(true),
        ConflictPriority::NonLeaf => Ok(false),
        ConflictPriority::Neither => Err(ShapeConflictError::Classification {
            path: join_path(path),
            leaf_trees,
            branch_trees,
        }),
    }
}
