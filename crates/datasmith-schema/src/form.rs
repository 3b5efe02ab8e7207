//! Form pruning: the visible, ordered inputs of one object's settings.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use datasmith_trees::{
    ConflictPriority, MultiTreeNode, TraversalOptions, Tree, flatten, reduce, resolve, translate,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::errors::{Result, SchemaError};
use crate::model::{DependsCondition, ElementDescriptor, FormLeaf};

/// Metadata keys of a form definition start with this character; setting
/// keys never do.
pub const METADATA_PREFIX: char = '_';
pub const ELEMENT_KEY: &str = "_element";
pub const INDEX_KEY: &str = "_index";
pub const DEPENDS_KEY: &str = "_depends";

const SETTINGS: usize = 0;
const FORM: usize = 1;

pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// A form node is a leaf when it names the element used to edit it.
pub fn is_form_leaf(value: &Value) -> bool {
    value.get(ELEMENT_KEY).is_some()
}

/// Parse the metadata of the form leaf at `path`.
pub fn parse_form_leaf(path: &[String], value: &Value) -> Result<FormLeaf> {
    FormLeaf::deserialize(value).map_err(|err| SchemaError::InvalidFormNode {
        path: datasmith_trees::join_path(path),
        message: err.to_string(),
    })
}

/// Leaf paths, sibling order and visibility conditions of a form tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormIndex {
    leaves: BTreeSet<Vec<String>>,
    order: BTreeMap<Vec<String>, i64>,
    depends: BTreeMap<Vec<String>, DependsCondition>,
}

impl FormIndex {
    pub fn from_form(form: &Tree) -> Result<Self> {
        let options = TraversalOptions::new(|_: &[String], value: &Value| {
            !value.is_object() || is_form_leaf(value)
        });

        reduce(
            &[form],
            |mut index: FormIndex, node: &MultiTreeNode<'_>| -> Result<FormIndex> {
                let Some(value) = node.value(0) else {
                    return Ok(index);
                };
                if node.path().iter().any(|segment| is_metadata_key(segment)) {
                    return Ok(index);
                }

                let path = node.path().to_vec();
                if node.is_leaf {
                    index.leaves.insert(path.clone());
                }
                if let Some(position) = value.get(INDEX_KEY) {
                    let position =
                        position
                            .as_i64()
                            .ok_or_else(|| SchemaError::InvalidFormNode {
                                path: node.path_string(),
                                message: "_index must be an integer".to_string(),
                            })?;
                    index.order.insert(path.clone(), position);
                }
                if let Some(depends) = value.get(DEPENDS_KEY) {
                    let condition = DependsCondition::deserialize(depends).map_err(|err| {
                        SchemaError::InvalidFormNode {
                            path: node.path_string(),
                            message: format!("invalid _depends: {err}"),
                        }
                    })?;
                    index.depends.insert(path, condition);
                }
                Ok(index)
            },
            FormIndex::default(),
            &options,
        )
    }

    pub fn is_leaf_path(&self, path: &[String]) -> bool {
        self.leaves.contains(path)
    }

    /// Leaf rule shared by settings and form trees: declared form leaves
    /// (including object-shaped settings) and any non-object value.
    pub fn is_leaf(&self, path: &[String], value: &Value) -> bool {
        self.is_leaf_path(path) || !value.is_object()
    }

    pub fn index_of(&self, path: &[String]) -> Option<i64> {
        self.order.get(path).copied()
    }

    pub fn depends_of(&self, path: &[String]) -> Option<&DependsCondition> {
        self.depends.get(path)
    }

    pub fn leaf_paths(&self) -> impl Iterator<Item = &Vec<String>> {
        self.leaves.iter()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&Vec<String>, &DependsCondition)> {
        self.depends.iter()
    }

    /// Sibling ordering: ascending `_index`, nodes without one last.
    fn compare(&self, a: &MultiTreeNode<'_>, b: &MultiTreeNode<'_>) -> Ordering {
        let key = |node: &MultiTreeNode<'_>| match self.index_of(node.path()) {
            Some(position) => (false, position),
            None => (true, 0),
        };
        key(a).cmp(&key(b))
    }
}

/// Ordered descriptors of every setting whose form node is currently visible.
///
/// Fails with [`SchemaError::Shape`] when the settings and form trees are not
/// congruent at a visible node.
pub fn build_visible_form(settings: &Tree, form: &Tree) -> Result<Vec<ElementDescriptor>> {
    let index = FormIndex::from_form(form)?;
    visible_form_with_index(settings, form, &index)
}

/// The settings restricted to visible nodes, e.g. without the parameters of
/// data types that are not selected.
pub fn visible_settings(settings: &Tree, form: &Tree) -> Result<Tree> {
    let index = FormIndex::from_form(form)?;
    visible_settings_with_index(settings, form, &index)
}

pub(crate) fn visible_form_with_index(
    settings: &Tree,
    form: &Tree,
    index: &FormIndex,
) -> Result<Vec<ElementDescriptor>> {
    let pruned = prune(settings, form, index, |node: &MultiTreeNode<'_>| {
        let form_node = node
            .value(FORM)
            .ok_or_else(|| SchemaError::InvalidFormNode {
                path: node.path_string(),
                message: "missing form node".to_string(),
            })?;
        let leaf = parse_form_leaf(node.path(), form_node)?;
        let value = node.value(SETTINGS).cloned().unwrap_or(Value::Null);
        let descriptor = ElementDescriptor::from_leaf(node.path().to_vec(), leaf, value);
        Ok(serde_json::to_value(descriptor)?)
    })?;

    let options = TraversalOptions::new(|path: &[String], value: &Value| index.is_leaf(path, value))
        .with_comparator(|a: &MultiTreeNode<'_>, b: &MultiTreeNode<'_>| index.compare(a, b));
    let flat = flatten(&pruned, Vec::<Value>::new(), &options)?;
    let descriptors = flat
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<ElementDescriptor>, _>>()?;

    debug!(elements = descriptors.len(), "visible form built");
    Ok(descriptors)
}

pub(crate) fn visible_settings_with_index(
    settings: &Tree,
    form: &Tree,
    index: &FormIndex,
) -> Result<Tree> {
    prune(settings, form, index, |node: &MultiTreeNode<'_>| {
        Ok(node.value(SETTINGS).cloned().unwrap_or(Value::Null))
    })
}

/// Strict lockstep walk of `[settings, form]` dropping metadata keys and
/// nodes whose `_depends` does not hold.
fn prune<M>(settings: &Tree, form: &Tree, index: &FormIndex, map: M) -> Result<Tree>
where
    M: FnMut(&MultiTreeNode<'_>) -> Result<Value>,
{
    let mut visibility = Visibility::new(settings, index);
    let mut filter = |node: &MultiTreeNode<'_>| -> Result<bool> {
        // Metadata lives only in the form; a settings key with the prefix is a stray.
        if is_metadata_key(node.key()) && node.value(SETTINGS).is_none() {
            return Ok(false);
        }
        Ok(visibility.condition_holds(node.path()))
    };
    let options = TraversalOptions::new(|path: &[String], value: &Value| index.is_leaf(path, value))
        .with_conflict_priority(ConflictPriority::Neither);

    translate::<_, SchemaError>(&[settings, form], Some(&mut filter), map, None, &options)
}

/// Equality used by `_depends`: numbers compare by numeric value, so `1`
/// matches `1.0`. Everything else uses plain JSON equality.
fn values_match(current: &Value, expected: &Value) -> bool {
    match (current, expected) {
        (Value::Number(left), Value::Number(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => left == right,
        },
        _ => current == expected,
    }
}

/// Memoized evaluation of `_depends` conditions against a settings tree.
///
/// A condition holds when its path resolves in the settings, every form node
/// along that path is itself visible, and the resolved value matches.
/// Unresolvable paths and dependency cycles count as "does not hold".
struct Visibility<'a> {
    settings: &'a Tree,
    index: &'a FormIndex,
    decided: HashMap<Vec<String>, bool>,
    pending: HashSet<Vec<String>>,
}

impl<'a> Visibility<'a> {
    fn new(settings: &'a Tree, index: &'a FormIndex) -> Self {
        Self {
            settings,
            index,
            decided: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    fn node_visible(&mut self, path: &[String]) -> bool {
        (1..=path.len()).all(|end| self.condition_holds(&path[..end]))
    }

    /// Whether the node at `owner` passes its own `_depends`, if any.
    fn condition_holds(&mut self, owner: &[String]) -> bool {
        let index = self.index;
        let Some(condition) = index.depends_of(owner) else {
            return true;
        };
        if let Some(decided) = self.decided.get(owner) {
            return *decided;
        }
        if !self.pending.insert(owner.to_vec()) {
            trace!(owner = %datasmith_trees::join_path(owner), "cyclic _depends");
            return false;
        }

        let holds = match resolve(self.settings, &condition.path) {
            Some(current) => {
                self.node_visible(&condition.path) && values_match(current, &condition.value)
            }
            None => {
                trace!(
                    owner = %datasmith_trees::join_path(owner),
                    depends = %datasmith_trees::join_path(&condition.path),
                    "_depends path unresolved"
                );
                false
            }
        };

        self.pending.remove(owner);
        self.decided.insert(owner.to_vec(), holds);
        holds
    }
}
