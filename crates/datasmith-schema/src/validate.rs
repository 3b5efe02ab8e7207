use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use jsonschema::JSONSchema;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{IssueSeverity, SchemaError, ValidationIssue, ValidationReport};
use crate::export::{FieldRequest, GenerationRequest, TableRequest};

/// Validated request with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub request: GenerationRequest,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a request JSON document against the request JSON Schema.
pub fn validate_request_json(
    request_json: &Value,
    request_schema: &Value,
) -> Result<ValidationReport, SchemaError> {
    let compiled = JSONSchema::compile(request_schema)
        .map_err(|err| SchemaError::JsonSchema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(request_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check names, record counts and foreign-key references of a parsed request.
pub fn validate_request(request: &GenerationRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_header(request, &mut report);
    validate_tables(&request.tables, &mut report);

    let index = RequestIndex::new(&request.tables);
    for (table_idx, table) in request.tables.iter().enumerate() {
        for (field_idx, field) in table.fields.iter().enumerate() {
            let base_path = format!("/tables/{table_idx}/fields/{field_idx}");
            validate_foreign_key(field, &base_path, &index, &mut report);
        }
    }

    report
}

/// Validate the request end-to-end, returning structured issues on failure.
pub fn validate_request_document(
    request_json: &Value,
    request_schema: &Value,
) -> Result<ValidatedRequest, ValidationReport> {
    let structural = match validate_request_json(request_json, request_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let request: GenerationRequest = match serde_json::from_value(request_json.clone()) {
        Ok(request) => request,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_request_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let report = validate_request(&request);
    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedRequest {
        request,
        warnings: report.warnings,
    })
}

fn validate_header(request: &GenerationRequest, report: &mut ValidationReport) {
    if Uuid::parse_str(&request.request_id).is_err() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "invalid_request_id",
            "/request_id",
            format!("request_id '{}' is not a UUID", request.request_id),
            None,
        ));
    }

    if DateTime::parse_from_rfc3339(&request.created_at).is_err() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "invalid_created_at",
            "/created_at",
            format!("created_at '{}' is not an RFC 3339 timestamp", request.created_at),
            Some("use a timestamp such as 2024-01-01T00:00:00Z".to_string()),
        ));
    }
}

fn validate_tables(tables: &[TableRequest], report: &mut ValidationReport) {
    if tables.is_empty() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "tables_empty",
            "/tables",
            "request contains no tables".to_string(),
            Some("add at least one table before generating".to_string()),
        ));
        return;
    }

    let mut seen_tables = HashSet::new();
    for (idx, table) in tables.iter().enumerate() {
        let base_path = format!("/tables/{idx}");
        check_name(&table.name, &base_path, "table", report);
        if !seen_tables.insert(table.name.as_str()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_table",
                format!("{base_path}/name"),
                format!("table '{}' appears more than once", table.name),
                None,
            ));
        }

        match table.settings.get("numRecords").and_then(Value::as_u64) {
            Some(records) if records >= 1 => {}
            _ => report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_num_records",
                format!("{base_path}/settings/numRecords"),
                "numRecords must be a positive integer".to_string(),
                Some("set numRecords to at least 1".to_string()),
            )),
        }

        if table.fields.is_empty() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "fields_empty",
                format!("{base_path}/fields"),
                format!("table '{}' has no fields", table.name),
                None,
            ));
        }

        let mut seen_fields = HashSet::new();
        for (field_idx, field) in table.fields.iter().enumerate() {
            let field_path = format!("{base_path}/fields/{field_idx}");
            check_name(&field.name, &field_path, "field", report);
            if !seen_fields.insert(field.name.as_str()) {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "duplicate_field",
                    format!("{field_path}/name"),
                    format!(
                        "field '{}' appears more than once in table '{}'",
                        field.name, table.name
                    ),
                    None,
                ));
            }
        }
    }
}

fn check_name(name: &str, base_path: &str, what: &str, report: &mut ValidationReport) {
    if name.trim().is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            format!("empty_{what}_name"),
            format!("{base_path}/name"),
            format!("{what} name must not be empty"),
            None,
        ));
    }
}

fn validate_foreign_key(
    field: &FieldRequest,
    base_path: &str,
    index: &RequestIndex<'_>,
    report: &mut ValidationReport,
) {
    let Some(key_settings) = field.settings.get("keySettings") else {
        return;
    };
    if key_settings.get("foreignKey") != Some(&Value::Bool(true)) {
        return;
    }

    let params_path = format!("{base_path}/settings/keySettings/foreignKeyParams");
    let params = key_settings.get("foreignKeyParams");
    let table = params.and_then(|params| params.get("table")).and_then(Value::as_str);
    let column = params.and_then(|params| params.get("field")).and_then(Value::as_str);

    let (Some(table), Some(column)) = (table, column) else {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "missing_foreign_key_params",
            params_path,
            format!("foreign key field '{}' does not name a target", field.name),
            Some("set foreignKeyParams.table and foreignKeyParams.field".to_string()),
        ));
        return;
    };

    let Some(fields) = index.tables.get(table) else {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "unknown_foreign_key_table",
            format!("{params_path}/table"),
            format!("table '{table}' referenced by '{}' does not exist", field.name),
            None,
        ));
        return;
    };

    match fields.get(column) {
        None => report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "unknown_foreign_key_field",
            format!("{params_path}/field"),
            format!("field '{table}.{column}' referenced by '{}' does not exist", field.name),
            None,
        )),
        Some(target) if !is_primary_key(target) => {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "foreign_key_target_not_primary",
                format!("{params_path}/field"),
                format!("field '{table}.{column}' is not a primary key"),
                Some("mark the referenced field as primary key".to_string()),
            ));
        }
        Some(_) => {}
    }
}

fn is_primary_key(field: &FieldRequest) -> bool {
    field
        .settings
        .get("keySettings")
        .and_then(|settings| settings.get("primaryKey"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

struct RequestIndex<'a> {
    tables: HashMap<&'a str, HashMap<&'a str, &'a FieldRequest>>,
}

impl<'a> RequestIndex<'a> {
    fn new(tables: &'a [TableRequest]) -> Self {
        let tables = tables
            .iter()
            .map(|table| {
                let fields = table
                    .fields
                    .iter()
                    .map(|field| (field.name.as_str(), field))
                    .collect();
                (table.name.as_str(), fields)
            })
            .collect();
        Self { tables }
    }
}
