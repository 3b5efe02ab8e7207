//! Lockstep traversal of structurally similar JSON trees.
//!
//! The engine walks N trees by shared key, classifies every key as a leaf or
//! a branch through a caller-supplied predicate, resolves shape
//! disagreements according to a [`ConflictPriority`], and hands each
//! [`MultiTreeNode`] to caller callbacks. Three entry points are built on the
//! same walk: [`reduce`], [`translate`] and [`flatten`].
//!
//! Inputs are never mutated; every operation builds new output values.

pub mod error;
pub mod node;
pub mod ops;
pub mod options;
pub mod path;
pub mod selectors;
mod traverse;

pub use error::ShapeConflictError;
pub use node::{ConflictPriority, MultiTreeNode};
pub use ops::{FlattenSink, NodeFilter, flatten, reduce, translate};
pub use options::{TraversalOptions, plain_leaf};
pub use path::{PATH_SEPARATOR, Slashes, join_path, resolve, split_path};

/// A recursive key -> value mapping. Whether a value is a leaf or a nested
/// branch is decided by the traversal's leaf predicate, not by its shape.
pub type Tree = serde_json::Map<String, serde_json::Value>;
