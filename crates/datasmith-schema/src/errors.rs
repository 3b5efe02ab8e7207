use datasmith_trees::ShapeConflictError;
use thiserror::Error;

use crate::model::ObjectKind;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Codes of every error, in the order they were reported.
    pub fn error_codes(&self) -> Vec<&str> {
        self.errors.iter().map(|issue| issue.code.as_str()).collect()
    }
}

/// Errors raised by schema loading, settings policies and project edits.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Trees expected to be congruent disagree in shape.
    #[error("shape conflict: {0}")]
    Shape(#[from] ShapeConflictError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A built-in or user-supplied schema definition is inconsistent.
    #[error("invalid {kind} schema definition ({} errors)", .report.errors.len())]
    InvalidDefinition {
        kind: ObjectKind,
        report: ValidationReport,
    },
    #[error("invalid form node at '{path}': {message}")]
    InvalidFormNode { path: String, message: String },
    /// An edited value failed sanitization.
    #[error("invalid value for '{path}': {message}")]
    InvalidValue { path: String, message: String },
    #[error("no schema registered for {0} objects")]
    MissingSchema(ObjectKind),
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),
    #[error("object names must not be empty")]
    EmptyName,
    #[error("'{path}' does not name a {kind}")]
    InvalidReference { kind: ObjectKind, path: String },
    #[error("no such table '{0}'")]
    UnknownTable(String),
    #[error("no such field '{field}' in table '{table}'")]
    UnknownField { table: String, field: String },
    #[error("schema error: {0}")]
    JsonSchema(String),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
