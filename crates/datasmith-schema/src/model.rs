use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of object a settings tree belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    Field,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => f.write_str("table"),
            ObjectKind::Field => f.write_str("field"),
        }
    }
}

/// Visibility condition of a form node: the setting at `path` must equal
/// `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DependsCondition {
    pub path: Vec<String>,
    pub value: Value,
}

/// Input control used to edit a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Number,
    Text,
    Checkbox,
    Select,
    /// Picks a `{table, field}` pair of the current project.
    FieldReference,
}

/// Sanitizer applied when a setting is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorKind {
    PositiveInteger,
    Integer,
    Number,
    Boolean,
    Text,
}

/// One choice of a `select` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

/// Metadata carried by a leaf of a form-definition tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormLeaf {
    #[serde(rename = "_element")]
    pub element: ElementKind,
    #[serde(rename = "_label")]
    pub label: String,
    #[serde(rename = "_index")]
    pub index: i64,
    #[serde(rename = "_options", default)]
    pub options: Vec<SelectOption>,
    #[serde(rename = "_attrs", default)]
    pub attrs: Map<String, Value>,
    #[serde(rename = "_validator", default)]
    pub validator: Option<ValidatorKind>,
    #[serde(rename = "_depends", default)]
    pub depends: Option<DependsCondition>,
}

/// Renderable input for one visible setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ElementDescriptor {
    /// Path of the setting inside the settings tree.
    pub path: Vec<String>,
    pub element: ElementKind,
    pub label: String,
    /// Sibling ordering key taken from the form definition.
    pub index: i64,
    /// Current value of the setting.
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorKind>,
}

impl ElementDescriptor {
    /// Build the descriptor of a form leaf holding `value`.
    pub fn from_leaf(path: Vec<String>, leaf: FormLeaf, value: Value) -> Self {
        Self {
            path,
            element: leaf.element,
            label: leaf.label,
            index: leaf.index,
            value,
            options: leaf.options,
            attrs: leaf.attrs,
            validator: leaf.validator,
        }
    }
}
