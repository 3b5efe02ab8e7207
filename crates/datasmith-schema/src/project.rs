//! In-memory project: tables, their fields and each object's settings.

use datasmith_trees::{Slashes, Tree, split_path};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::definitions::ObjectSchemas;
use crate::errors::{Result, SchemaError};
use crate::model::{ElementDescriptor, ObjectKind};
use crate::names::unique_name;
use crate::sanitize::{patch_for, sanitize_value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    #[serde(default)]
    pub tables: Vec<TableObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableObject {
    pub name: String,
    pub settings: Tree,
    #[serde(default)]
    pub fields: Vec<FieldObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldObject {
    pub name: String,
    pub settings: Tree,
}

/// Address of a table or of a field inside a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectRef {
    Table { table: String },
    Field { table: String, field: String },
}

impl ObjectRef {
    pub fn table(table: impl Into<String>) -> Self {
        ObjectRef::Table {
            table: table.into(),
        }
    }

    pub fn field(table: impl Into<String>, field: impl Into<String>) -> Self {
        ObjectRef::Field {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Parse `"/table"` or `"/table/field"` into a reference of `kind`.
    pub fn parse(kind: ObjectKind, path: &str) -> Result<Self> {
        let invalid = || SchemaError::InvalidReference {
            kind,
            path: path.to_string(),
        };
        match (kind, split_path(path, Slashes::Leading).as_slice()) {
            (ObjectKind::Table, [table]) => Ok(Self::table(table.as_str())),
            (ObjectKind::Field, [table, field]) => Ok(Self::field(table.as_str(), field.as_str())),
            _ => Err(invalid()),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::Table { .. } => ObjectKind::Table,
            ObjectRef::Field { .. } => ObjectKind::Field,
        }
    }
}

fn non_empty(name: String) -> Result<String> {
    if name.is_empty() {
        Err(SchemaError::EmptyName)
    } else {
        Ok(name)
    }
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Result<&TableObject> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableObject> {
        self.tables
            .iter_mut()
            .find(|table| table.name == name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    fn table_position(&self, name: &str) -> Result<usize> {
        self.tables
            .iter()
            .position(|table| table.name == name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    pub fn field(&self, table: &str, field: &str) -> Result<&FieldObject> {
        self.table(table)?.field(field)
    }

    pub fn settings(&self, object: &ObjectRef) -> Result<&Tree> {
        match object {
            ObjectRef::Table { table } => Ok(&self.table(table)?.settings),
            ObjectRef::Field { table, field } => Ok(&self.field(table, field)?.settings),
        }
    }

    fn settings_mut(&mut self, object: &ObjectRef) -> Result<&mut Tree> {
        match object {
            ObjectRef::Table { table } => Ok(&mut self.table_mut(table)?.settings),
            ObjectRef::Field { table, field } => {
                Ok(&mut self.table_mut(table)?.field_mut(field)?.settings)
            }
        }
    }

    /// Append a table with default settings; returns the name it was given.
    pub fn create_table(&mut self, name: &str, schemas: &ObjectSchemas) -> Result<String> {
        let name = non_empty(unique_name(name, self.table_names()))?;
        let settings = schemas.table()?.defaults().clone();
        self.tables.push(TableObject {
            name: name.clone(),
            settings,
            fields: Vec::new(),
        });
        info!(table = %name, "table created");
        Ok(name)
    }

    pub fn delete_table(&mut self, name: &str) -> Result<TableObject> {
        let position = self.table_position(name)?;
        let table = self.tables.remove(position);
        info!(table = %name, fields = table.fields.len(), "table deleted");
        Ok(table)
    }

    pub fn rename_table(&mut self, name: &str, new_name: &str) -> Result<String> {
        self.table(name)?;
        let others = self
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .filter(|other| *other != name);
        let new_name = non_empty(unique_name(new_name, others))?;
        self.table_mut(name)?.name = new_name.clone();
        info!(table = %name, new_name = %new_name, "table renamed");
        Ok(new_name)
    }

    /// Append a field with default settings to `table`.
    pub fn create_field(&mut self, table: &str, name: &str, schemas: &ObjectSchemas) -> Result<String> {
        let settings = schemas.field()?.defaults().clone();
        let target = self.table_mut(table)?;
        let name = non_empty(unique_name(name, target.field_names()))?;
        target.fields.push(FieldObject {
            name: name.clone(),
            settings,
        });
        info!(table = %table, field = %name, "field created");
        Ok(name)
    }

    pub fn delete_field(&mut self, table: &str, field: &str) -> Result<FieldObject> {
        let target = self.table_mut(table)?;
        let position = target.field_position(field)?;
        let removed = target.fields.remove(position);
        info!(table = %table, field = %field, "field deleted");
        Ok(removed)
    }

    pub fn rename_field(&mut self, table: &str, field: &str, new_name: &str) -> Result<String> {
        let target = self.table_mut(table)?;
        let position = target.field_position(field)?;
        let others = target
            .fields
            .iter()
            .map(|other| other.name.as_str())
            .filter(|other| *other != field);
        let new_name = non_empty(unique_name(new_name, others))?;
        target.fields[position].name = new_name.clone();
        info!(table = %table, field = %field, new_name = %new_name, "field renamed");
        Ok(new_name)
    }

    /// Move a field to the end of another table, renaming it if the name is
    /// taken there.
    pub fn move_field(&mut self, field: &str, from: &str, to: &str) -> Result<String> {
        self.table(to)?;
        let source = self.table_mut(from)?;
        let position = source.field_position(field)?;
        let mut moved = source.fields.remove(position);

        let target = self.table_mut(to)?;
        moved.name = unique_name(&moved.name, target.field_names());
        let name = moved.name.clone();
        target.fields.push(moved);
        info!(field = %field, from = %from, to = %to, name = %name, "field moved");
        Ok(name)
    }

    /// Merge a partial settings patch into an object's settings.
    pub fn update_settings(
        &mut self,
        object: &ObjectRef,
        patch: &Tree,
        schemas: &ObjectSchemas,
    ) -> Result<&Tree> {
        let schema = schemas.get(object.kind())?;
        let settings = self.settings_mut(object)?;
        *settings = schema.merge(settings, patch)?;
        debug!(?object, "settings updated");
        Ok(settings)
    }

    pub fn update_table_settings(
        &mut self,
        table: &str,
        patch: &Tree,
        schemas: &ObjectSchemas,
    ) -> Result<&Tree> {
        self.update_settings(&ObjectRef::table(table), patch, schemas)
    }

    pub fn update_field_settings(
        &mut self,
        table: &str,
        field: &str,
        patch: &Tree,
        schemas: &ObjectSchemas,
    ) -> Result<&Tree> {
        self.update_settings(&ObjectRef::field(table, field), patch, schemas)
    }

    /// Sanitize one edited value and merge it into the object's settings.
    pub fn edit_setting(
        &mut self,
        object: &ObjectRef,
        path: &[String],
        raw: Value,
        schemas: &ObjectSchemas,
    ) -> Result<&Tree> {
        let schema = schemas.get(object.kind())?;
        let value = sanitize_value(schema.form(), path, raw)?;
        let patch = patch_for(path, value);
        self.update_settings(object, &patch, schemas)
    }

    /// The visible form of an object, ready for rendering.
    pub fn visible_form(
        &self,
        object: &ObjectRef,
        schemas: &ObjectSchemas,
    ) -> Result<Vec<ElementDescriptor>> {
        schemas
            .get(object.kind())?
            .visible_form(self.settings(object)?)
    }

    fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name.as_str())
    }
}

impl TableObject {
    pub fn field(&self, name: &str) -> Result<&FieldObject> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| self.unknown_field(name))
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut FieldObject> {
        let position = self.field_position(name)?;
        Ok(&mut self.fields[position])
    }

    fn field_position(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| self.unknown_field(name))
    }

    fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    fn unknown_field(&self, name: &str) -> SchemaError {
        SchemaError::UnknownField {
            table: self.name.clone(),
            field: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemas() -> ObjectSchemas {
        ObjectSchemas::builtin().expect("builtin schemas")
    }

    #[test]
    fn object_refs_parse_leading_slash_paths() {
        assert_eq!(
            ObjectRef::parse(ObjectKind::Field, "/users/id").expect("field"),
            ObjectRef::field("users", "id")
        );
        assert_eq!(
            ObjectRef::parse(ObjectKind::Table, "/users").expect("table"),
            ObjectRef::table("users")
        );
        assert!(ObjectRef::parse(ObjectKind::Table, "/users/id").is_err());
    }

    #[test]
    fn created_objects_get_unique_names_and_defaults() {
        let schemas = schemas();
        let mut project = Project::new();

        assert_eq!(project.create_table("users", &schemas).expect("create"), "users");
        assert_eq!(project.create_table("users", &schemas).expect("create"), "users1");
        assert_eq!(project.create_field("users", "id", &schemas).expect("field"), "id");
        assert_eq!(project.create_field("users", "id", &schemas).expect("field"), "id1");

        assert_eq!(
            project.table("users").expect("table").settings,
            schemas.table().expect("table").defaults().clone()
        );
        assert_eq!(
            project.field("users", "id1").expect("field").settings,
            schemas.field().expect("field").defaults().clone()
        );
    }

    #[test]
    fn renames_ignore_the_current_name() {
        let schemas = schemas();
        let mut project = Project::new();
        project.create_table("users", &schemas).expect("create");
        project.create_table("orders", &schemas).expect("create");

        assert_eq!(project.rename_table("users", "users").expect("rename"), "users");
        assert_eq!(project.rename_table("users", "orders").expect("rename"), "orders1");
        assert!(project.table("users").is_err());
    }

    #[test]
    fn move_field_renames_on_collision() {
        let schemas = schemas();
        let mut project = Project::new();
        project.create_table("a", &schemas).expect("create");
        project.create_table("b", &schemas).expect("create");
        project.create_field("a", "id", &schemas).expect("field");
        project.create_field("b", "id", &schemas).expect("field");

        assert_eq!(project.move_field("id", "a", "b").expect("move"), "id1");
        assert!(project.table("a").expect("a").fields.is_empty());
        assert_eq!(project.table("b").expect("b").fields.len(), 2);
    }

    #[test]
    fn missing_objects_are_reported() {
        let schemas = schemas();
        let mut project = Project::new();
        project.create_table("users", &schemas).expect("create");

        assert!(matches!(
            project.delete_table("ghosts"),
            Err(SchemaError::UnknownTable(name)) if name == "ghosts"
        ));
        assert!(matches!(
            project.delete_field("users", "email"),
            Err(SchemaError::UnknownField { table, field }) if table == "users" && field == "email"
        ));
    }

    #[test]
    fn edit_setting_sanitizes_then_merges() {
        let schemas = schemas();
        let mut project = Project::new();
        project.create_table("users", &schemas).expect("create");
        project.create_field("users", "id", &schemas).expect("field");
        let id = ObjectRef::field("users", "id");
        let data_type = vec!["dataType".to_string(), "dataType".to_string()];

        let settings = project
            .edit_setting(&id, &data_type, json!("numberSequence"), &schemas)
            .expect("edit");
        assert_eq!(settings["dataType"]["dataType"], json!("numberSequence"));
        assert_eq!(settings["dataType"]["numberSequence"]["step"], json!(1));

        let err = project
            .edit_setting(&id, &data_type, json!("colour"), &schemas)
            .expect_err("invalid");
        assert!(matches!(err, SchemaError::InvalidValue { .. }));
        assert_eq!(
            project.settings(&id).expect("settings")["dataType"]["dataType"],
            json!("numberSequence")
        );

        let table = project
            .edit_setting(
                &ObjectRef::table("users"),
                &["numRecords".to_string()],
                json!("50"),
                &schemas,
            )
            .expect("edit table");
        assert_eq!(table["numRecords"], json!(50));
    }
}
