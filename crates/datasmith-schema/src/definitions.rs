//! Object-kind schemas: a defaults tree plus the form that edits it.

use std::collections::{BTreeMap, BTreeSet};

use datasmith_trees::{
    ConflictPriority, MultiTreeNode, ShapeConflictError, TraversalOptions, Tree, join_path,
    reduce, resolve, translate,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::builtin;
use crate::errors::{IssueSeverity, Result, SchemaError, ValidationIssue, ValidationReport};
use crate::form::{
    FormIndex, is_metadata_key, parse_form_leaf, visible_form_with_index,
    visible_settings_with_index,
};
use crate::merge::merge_settings_with;
use crate::model::{ElementDescriptor, ElementKind, ObjectKind};

/// Validated defaults and form definition for one kind of object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    kind: ObjectKind,
    defaults: Tree,
    form: Tree,
    index: FormIndex,
}

impl ObjectSchema {
    /// Validate and assemble a schema. Every problem found is reported at
    /// once through [`SchemaError::InvalidDefinition`].
    pub fn new(kind: ObjectKind, defaults: Tree, form: Tree) -> Result<Self> {
        let index = FormIndex::from_form(&form)?;
        let report = check_definition(&defaults, &form, &index);

        for issue in &report.warnings {
            warn!(%kind, code = %issue.code, path = %issue.path, "{}", issue.message);
        }
        if !report.is_ok() {
            return Err(SchemaError::InvalidDefinition { kind, report });
        }

        debug!(%kind, leaves = index.leaf_paths().count(), "object schema loaded");
        Ok(Self {
            kind,
            defaults,
            form,
            index,
        })
    }

    pub fn builtin(kind: ObjectKind) -> Result<Self> {
        match kind {
            ObjectKind::Table => Self::new(kind, builtin::table_defaults(), builtin::table_form()),
            ObjectKind::Field => Self::new(kind, builtin::field_defaults(), builtin::field_form()),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn defaults(&self) -> &Tree {
        &self.defaults
    }

    pub fn form(&self) -> &Tree {
        &self.form
    }

    pub fn index(&self) -> &FormIndex {
        &self.index
    }

    /// Leaf rule for settings of this kind: declared form leaves, including
    /// object-shaped ones such as `foreignKeyParams`, and any non-object.
    pub fn is_leaf(&self, path: &[String], value: &Value) -> bool {
        self.index.is_leaf(path, value)
    }

    /// Merge a partial patch over previous settings and this schema's defaults.
    pub fn merge(&self, old: &Tree, new: &Tree) -> Result<Tree> {
        merge_settings_with(&self.defaults, old, new, |path, value| {
            self.is_leaf(path, value)
        })
    }

    pub fn visible_form(&self, settings: &Tree) -> Result<Vec<ElementDescriptor>> {
        visible_form_with_index(settings, &self.form, &self.index)
    }

    pub fn visible_settings(&self, settings: &Tree) -> Result<Tree> {
        visible_settings_with_index(settings, &self.form, &self.index)
    }
}

/// The schemas of every object kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchemas {
    schemas: BTreeMap<ObjectKind, ObjectSchema>,
}

impl ObjectSchemas {
    pub fn builtin() -> Result<Self> {
        let mut schemas = BTreeMap::new();
        for kind in [ObjectKind::Table, ObjectKind::Field] {
            schemas.insert(kind, ObjectSchema::builtin(kind)?);
        }
        Ok(Self { schemas })
    }

    pub fn with_schema(mut self, schema: ObjectSchema) -> Self {
        self.schemas.insert(schema.kind(), schema);
        self
    }

    pub fn get(&self, kind: ObjectKind) -> Result<&ObjectSchema> {
        self.schemas
            .get(&kind)
            .ok_or(SchemaError::MissingSchema(kind))
    }

    pub fn table(&self) -> Result<&ObjectSchema> {
        self.get(ObjectKind::Table)
    }

    pub fn field(&self) -> Result<&ObjectSchema> {
        self.get(ObjectKind::Field)
    }
}

/// Check a defaults/form pair for authoring mistakes.
pub fn check_definition(defaults: &Tree, form: &Tree, index: &FormIndex) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_reserved_keys(defaults, index, &mut report);
    check_congruence(defaults, form, index, &mut report);
    check_form_leaves(defaults, form, index, &mut report);
    check_depends(defaults, index, &mut report);
    check_depends_cycles(index, &mut report);

    report
}

fn pointer(path: &[String]) -> String {
    format!("/{}", join_path(path))
}

fn check_reserved_keys(defaults: &Tree, index: &FormIndex, report: &mut ValidationReport) {
    let options = TraversalOptions::new(|path: &[String], value: &Value| index.is_leaf(path, value));
    let reserved = reduce(
        &[defaults],
        |mut found: Vec<Vec<String>>,
         node: &MultiTreeNode<'_>|
         -> std::result::Result<_, ShapeConflictError> {
            if is_metadata_key(node.key()) {
                found.push(node.path().to_vec());
            }
            Ok(found)
        },
        Vec::new(),
        &options,
    );

    match reserved {
        Ok(paths) => {
            for path in paths {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "reserved_key",
                    pointer(&path),
                    format!("setting key '{}' uses the reserved '_' prefix", join_path(&path)),
                    Some("rename the setting so it does not start with '_'".to_string()),
                ));
            }
        }
        Err(err) => report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "definition_error",
            "/",
            err.to_string(),
            None,
        )),
    }
}

/// Defaults and form must agree in shape once form metadata is ignored.
fn check_congruence(defaults: &Tree, form: &Tree, index: &FormIndex, report: &mut ValidationReport) {
    let options = TraversalOptions::new(|path: &[String], value: &Value| index.is_leaf(path, value))
        .with_conflict_priority(ConflictPriority::Neither);
    let mut skip_metadata =
        |node: &MultiTreeNode<'_>| -> std::result::Result<bool, ShapeConflictError> {
            Ok(!is_metadata_key(node.key()))
        };

    let result = translate(
        &[defaults, form],
        Some(&mut skip_metadata),
        |_: &MultiTreeNode<'_>| Ok(Value::Null),
        None,
        &options,
    );

    if let Err(err) = result {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "shape_mismatch",
            format!("/{}", err.path()),
            err.to_string(),
            Some("every form leaf needs a default and every default a form leaf".to_string()),
        ));
    }
}

fn check_form_leaves(defaults: &Tree, form: &Tree, index: &FormIndex, report: &mut ValidationReport) {
    for path in index.leaf_paths() {
        let Some(node) = resolve(form, path) else {
            continue;
        };
        let leaf = match parse_form_leaf(path, node) {
            Ok(leaf) => leaf,
            Err(err) => {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "invalid_form_leaf",
                    pointer(path),
                    err.to_string(),
                    Some("form leaves need _element, _label and an integer _index".to_string()),
                ));
                continue;
            }
        };

        if leaf.element == ElementKind::Select {
            if leaf.options.is_empty() {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "select_without_options",
                    pointer(path),
                    "select element has no _options".to_string(),
                    None,
                ));
            } else if let Some(default) = resolve(defaults, path)
                && !leaf.options.iter().any(|option| option.value == *default)
            {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "default_not_in_options",
                    pointer(path),
                    format!("default {default} is not one of the select options"),
                    None,
                ));
            }
        }
    }
}

/// Every `_depends` must point at a leaf that exists in the defaults.
fn check_depends(defaults: &Tree, index: &FormIndex, report: &mut ValidationReport) {
    for (owner, condition) in index.conditions() {
        let resolves = index.is_leaf_path(&condition.path)
            && resolve(defaults, &condition.path).is_some();
        if !resolves {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unresolved_depends",
                format!("{}/_depends", pointer(owner)),
                format!(
                    "_depends path '{}' is not a setting leaf",
                    join_path(&condition.path)
                ),
                Some("point _depends.path at a leaf of the defaults tree".to_string()),
            ));
        }
    }
}

fn check_depends_cycles(index: &FormIndex, report: &mut ValidationReport) {
    let graph = depends_graph(index);
    if let Err(cycle) = toposort(&graph) {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "depends_cycle",
            "/",
            format!("cyclic _depends between {}", cycle.join(", ")),
            Some("remove one of the conditions in the cycle".to_string()),
        ));
    }
}

/// Edges run from a conditioned node to every conditioned node that needs
/// it to be visible first.
fn depends_graph(index: &FormIndex) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (owner, condition) in index.conditions() {
        let owner_key = join_path(owner);
        graph.entry(owner_key.clone()).or_default();

        for end in 1..=condition.path.len() {
            let prefix = &condition.path[..end];
            if index.depends_of(prefix).is_some() {
                graph
                    .entry(join_path(prefix))
                    .or_default()
                    .insert(owner_key.clone());
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> =
        graph.keys().map(|node| (node.as_str(), 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());
        for target in graph.get(node).into_iter().flatten() {
            if let Some(count) = indegree.get_mut(target.as_str()) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert(target.as_str());
                }
            }
        }
    }

    if order.len() == indegree.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_string())
            .collect())
    }
}
