use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::export::GenerationRequest;
use crate::project::Project;

/// Emit the JSON Schema of a generation request.
pub fn request_json_schema() -> RootSchema {
    schema_for!(GenerationRequest)
}

/// Emit the JSON Schema of a saved project.
pub fn project_json_schema() -> RootSchema {
    schema_for!(Project)
}
