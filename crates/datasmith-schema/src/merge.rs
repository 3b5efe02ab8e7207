//! Settings merge: new patch over old settings over schema defaults.

use datasmith_trees::{MultiTreeNode, TraversalOptions, Tree, resolve, selectors, translate};
use serde_json::Value;
use tracing::debug;

use crate::definitions::ObjectSchema;
use crate::errors::{Result, SchemaError};

const DEFAULTS: usize = 2;

/// Merge `new` over `old` over `defaults`, leaf by leaf.
///
/// Leaf/branch classification follows the defaults tree wherever it defines
/// the path, so a partial or oddly shaped patch cannot truncate the merge.
/// Keys unknown to the defaults are dropped: the result always has exactly
/// the shape of `defaults`.
pub fn merge_settings_with<F>(defaults: &Tree, old: &Tree, new: &Tree, is_leaf: F) -> Result<Tree>
where
    F: Fn(&[String], &Value) -> bool,
{
    let options = TraversalOptions::new(|path: &[String], value: &Value| {
        match resolve(defaults, path) {
            Some(default) => is_leaf(path, default),
            None => is_leaf(path, value),
        }
    });
    let mut known_setting =
        |node: &MultiTreeNode<'_>| -> Result<bool> { Ok(node.value(DEFAULTS).is_some()) };

    let merged = translate(
        &[new, old, defaults],
        Some(&mut known_setting),
        selectors::first::<SchemaError>,
        None,
        &options,
    )?;

    debug!(
        patch_keys = new.len(),
        settings_keys = merged.len(),
        "settings merged"
    );
    Ok(merged)
}

/// [`merge_settings_with`] using the leaf rule of `schema`.
pub fn merge_settings(schema: &ObjectSchema, old: &Tree, new: &Tree) -> Result<Tree> {
    schema.merge(old, new)
}
