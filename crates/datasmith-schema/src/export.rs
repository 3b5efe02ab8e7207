//! Generation request sent to the data generation backend.

use chrono::{SecondsFormat, Utc};
use datasmith_trees::Tree;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::definitions::ObjectSchemas;
use crate::errors::Result;
use crate::project::Project;

/// How the backend lays out generated tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One file per table.
    #[default]
    MultiTable,
    SingleTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneralOptions {
    #[serde(rename = "output-format")]
    pub output_format: OutputFormat,
}

/// Tables to generate, with only the settings relevant to each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// UUID v4 identifying this request.
    pub request_id: String,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    pub general: GeneralOptions,
    pub tables: Vec<TableRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableRequest {
    pub name: String,
    pub settings: Tree,
    pub fields: Vec<FieldRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRequest {
    pub name: String,
    pub settings: Tree,
}

/// Build the request for `project`, pruning every setting whose form node is
/// hidden (parameters of unselected data types, disabled foreign keys).
pub fn build_request(
    project: &Project,
    schemas: &ObjectSchemas,
    output_format: OutputFormat,
) -> Result<GenerationRequest> {
    let table_schema = schemas.table()?;
    let field_schema = schemas.field()?;

    let tables = project
        .tables
        .iter()
        .map(|table| -> Result<TableRequest> {
            let fields = table
                .fields
                .iter()
                .map(|field| -> Result<FieldRequest> {
                    Ok(FieldRequest {
                        name: field.name.clone(),
                        settings: field_schema.visible_settings(&field.settings)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(TableRequest {
                name: table.name.clone(),
                settings: table_schema.visible_settings(&table.settings)?,
                fields,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let request = GenerationRequest {
        request_id: Uuid::new_v4().to_string(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        general: GeneralOptions { output_format },
        tables,
    };
    info!(
        request_id = %request.request_id,
        tables = request.tables.len(),
        "generation request built"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ObjectRef;
    use serde_json::json;

    #[test]
    fn hidden_settings_are_stripped() {
        let schemas = ObjectSchemas::builtin().expect("schemas");
        let mut project = Project::new();
        project.create_table("users", &schemas).expect("table");
        project.create_field("users", "id", &schemas).expect("field");
        project
            .edit_setting(
                &ObjectRef::field("users", "id"),
                &["dataType".to_string(), "dataType".to_string()],
                json!("numberSequence"),
                &schemas,
            )
            .expect("edit");

        let request = build_request(&project, &schemas, OutputFormat::MultiTable).expect("request");

        let settings = serde_json::Value::Object(request.tables[0].fields[0].settings.clone());
        assert_eq!(
            settings,
            json!({
                "keySettings": {"primaryKey": false, "foreignKey": false},
                "dataType": {
                    "dataType": "numberSequence",
                    "numberSequence": {"start": 0, "step": 1, "sequenceType": "infinite"}
                }
            })
        );
        assert_eq!(request.tables[0].settings.get("numRecords"), Some(&json!(1)));
        assert!(Uuid::parse_str(&request.request_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&request.created_at).is_ok());
    }

    #[test]
    fn output_format_uses_kebab_case() {
        let general = GeneralOptions {
            output_format: OutputFormat::SingleTable,
        };

        assert_eq!(
            serde_json::to_value(general).expect("json"),
            json!({"output-format": "single-table"})
        );
    }
}
