//! Built-in defaults and form definitions for tables and fields.

use datasmith_trees::Tree;
use serde_json::{Value, json};

/// Data types a field can be generated with, as `(value, label)` pairs.
pub const DATA_TYPES: &[(&str, &str)] = &[
    ("null", "Null"),
    ("forename", "Forename"),
    ("surname", "Surname"),
    ("phoneNumber", "Phone number"),
    ("numberSequence", "Number sequence"),
    ("randomNumber", "Random number"),
];

fn object(value: Value) -> Tree {
    match value {
        Value::Object(map) => map,
        _ => Tree::new(),
    }
}

pub fn table_defaults() -> Tree {
    object(json!({ "numRecords": 1 }))
}

pub fn table_form() -> Tree {
    object(json!({
        "numRecords": {
            "_element": "number",
            "_label": "Number of records",
            "_index": 0,
            "_validator": "positiveInteger",
            "_attrs": { "min": 1 }
        }
    }))
}

pub fn field_defaults() -> Tree {
    object(json!({
        "keySettings": {
            "primaryKey": false,
            "foreignKey": false,
            "foreignKeyParams": { "table": "", "field": "" }
        },
        "dataType": {
            "dataType": "null",
            "numberSequence": {
                "start": 0,
                "step": 1,
                "sequenceType": "infinite",
                "loopingSequenceParams": { "loopAt": 10 }
            },
            "randomNumber": {
                "start": 0,
                "end": 1,
                "round": 1
            }
        }
    }))
}

pub fn field_form() -> Tree {
    let data_types: Vec<Value> = DATA_TYPES
        .iter()
        .map(|(value, label)| json!({ "value": value, "label": label }))
        .collect();

    object(json!({
        "keySettings": {
            "_index": 0,
            "primaryKey": {
                "_element": "checkbox",
                "_label": "Primary key",
                "_index": 0,
                "_validator": "boolean"
            },
            "foreignKey": {
                "_element": "checkbox",
                "_label": "Foreign key",
                "_index": 1,
                "_validator": "boolean"
            },
            "foreignKeyParams": {
                "_element": "fieldReference",
                "_label": "References",
                "_index": 2,
                "_depends": { "path": ["keySettings", "foreignKey"], "value": true }
            }
        },
        "dataType": {
            "_index": 1,
            "dataType": {
                "_element": "select",
                "_label": "Data type",
                "_index": 0,
                "_options": data_types
            },
            "numberSequence": {
                "_index": 1,
                "_depends": { "path": ["dataType", "dataType"], "value": "numberSequence" },
                "start": {
                    "_element": "number",
                    "_label": "Start",
                    "_index": 0,
                    "_validator": "integer"
                },
                "step": {
                    "_element": "number",
                    "_label": "Step",
                    "_index": 1,
                    "_validator": "integer"
                },
                "sequenceType": {
                    "_element": "select",
                    "_label": "Sequence type",
                    "_index": 2,
                    "_options": [
                        { "value": "infinite", "label": "Infinite" },
                        { "value": "looping", "label": "Looping" }
                    ]
                },
                "loopingSequenceParams": {
                    "_index": 3,
                    "_depends": {
                        "path": ["dataType", "numberSequence", "sequenceType"],
                        "value": "looping"
                    },
                    "loopAt": {
                        "_element": "number",
                        "_label": "Loop at",
                        "_index": 0,
                        "_validator": "positiveInteger",
                        "_attrs": { "min": 1 }
                    }
                }
            },
            "randomNumber": {
                "_index": 2,
                "_depends": { "path": ["dataType", "dataType"], "value": "randomNumber" },
                "start": {
                    "_element": "number",
                    "_label": "Start",
                    "_index": 0,
                    "_validator": "number"
                },
                "end": {
                    "_element": "number",
                    "_label": "End",
                    "_index": 1,
                    "_validator": "number"
                },
                "round": {
                    "_element": "number",
                    "_label": "Decimal places",
                    "_index": 2,
                    "_validator": "integer",
                    "_attrs": { "min": 0 }
                }
            }
        }
    }))
}
