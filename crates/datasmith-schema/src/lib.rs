//! Object schemas and the settings policies built on the tree engine.
//!
//! Every table and field carries a settings tree shaped like its schema's
//! defaults. Edits are sanitized against the form definition, turned into a
//! partial patch and merged over the previous settings and the defaults.
//! The form definition also drives which inputs are visible and, at export
//! time, which settings are sent to the generator.

pub mod builtin;
pub mod definitions;
pub mod errors;
pub mod export;
pub mod form;
pub mod merge;
pub mod model;
pub mod names;
pub mod project;
pub mod sanitize;
pub mod schema;
pub mod validate;

pub use definitions::{ObjectSchema, ObjectSchemas, check_definition};
pub use errors::{IssueSeverity, Result, SchemaError, ValidationIssue, ValidationReport};
pub use export::{
    FieldRequest, GeneralOptions, GenerationRequest, OutputFormat, TableRequest, build_request,
};
pub use form::{FormIndex, build_visible_form, visible_settings};
pub use merge::{merge_settings, merge_settings_with};
pub use model::{
    DependsCondition, ElementDescriptor, ElementKind, FormLeaf, ObjectKind, SelectOption,
    ValidatorKind,
};
pub use names::unique_name;
pub use project::{FieldObject, ObjectRef, Project, TableObject};
pub use sanitize::{patch_for, sanitize_value};
pub use schema::{project_json_schema, request_json_schema};
pub use validate::{
    ValidatedRequest, validate_request, validate_request_document, validate_request_json,
};
