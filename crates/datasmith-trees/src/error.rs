use thiserror::Error;

/// Structural disagreement between trees traversed under
/// [`ConflictPriority::Neither`](crate::ConflictPriority::Neither).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeConflictError {
    /// Some trees hold a leaf at the path while others hold a branch.
    #[error("conflicting leaf/branch shape at '{path}' (leaf in trees {leaf_trees:?}, branch in trees {branch_trees:?})")]
    Classification {
        path: String,
        leaf_trees: Vec<usize>,
        branch_trees: Vec<usize>,
    },
    /// The key exists in some trees but is absent from others.
    #[error("'{path}' is missing from trees {missing:?}")]
    Missing { path: String, missing: Vec<usize> },
}

impl ShapeConflictError {
    /// Textual path of the node where the conflict was detected.
    pub fn path(&self) -> &str {
        match self {
            ShapeConflictError::Classification { path, .. } => path,
            ShapeConflictError::Missing { path, .. } => path,
        }
    }
}
