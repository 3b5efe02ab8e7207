//! Edit-time sanitization of single setting values.

use datasmith_trees::{Tree, join_path, resolve};
use serde_json::{Map, Number, Value};

use crate::errors::{Result, SchemaError};
use crate::form::{is_form_leaf, parse_form_leaf};
use crate::model::{ElementKind, FormLeaf, ValidatorKind};

/// Coerce `raw` into the value the form leaf at `path` accepts.
///
/// Numeric strings are parsed, `_attrs.min`/`_attrs.max` bound numbers and
/// `select` values must be one of the leaf's `_options`.
pub fn sanitize_value(form: &Tree, path: &[String], raw: Value) -> Result<Value> {
    let node = resolve(form, path)
        .filter(|node| is_form_leaf(node))
        .ok_or_else(|| SchemaError::UnknownSetting(join_path(path)))?;
    let leaf = parse_form_leaf(path, node)?;
    let invalid = |message: String| SchemaError::InvalidValue {
        path: join_path(path),
        message,
    };

    let value = match leaf.validator.or_else(|| default_validator(leaf.element)) {
        Some(validator) => coerce(validator, raw).map_err(invalid)?,
        None => raw,
    };

    check_bounds(&leaf, &value).map_err(invalid)?;
    check_element(&leaf, &value).map_err(invalid)?;
    Ok(value)
}

/// The deeply partial patch holding `value` at `path` and nothing else.
pub fn patch_for(path: &[String], value: Value) -> Tree {
    let mut current = value;
    for key in path.iter().rev() {
        let mut branch = Map::new();
        branch.insert(key.clone(), current);
        current = Value::Object(branch);
    }
    match current {
        Value::Object(map) => map,
        _ => Tree::new(),
    }
}

fn default_validator(element: ElementKind) -> Option<ValidatorKind> {
    match element {
        ElementKind::Number => Some(ValidatorKind::Number),
        ElementKind::Text => Some(ValidatorKind::Text),
        ElementKind::Checkbox => Some(ValidatorKind::Boolean),
        ElementKind::Select | ElementKind::FieldReference => None,
    }
}

fn coerce(validator: ValidatorKind, raw: Value) -> std::result::Result<Value, String> {
    match validator {
        ValidatorKind::Boolean => match raw {
            Value::Bool(flag) => Ok(Value::Bool(flag)),
            Value::String(text) => match text.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("'{text}' is not a boolean")),
            },
            other => Err(format!("{other} is not a boolean")),
        },
        ValidatorKind::Text => match raw {
            Value::String(text) => Ok(Value::String(text)),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            other => Err(format!("{other} is not text")),
        },
        ValidatorKind::Integer => as_integer(&raw).map(Value::from),
        ValidatorKind::PositiveInteger => match as_integer(&raw)? {
            value if value >= 1 => Ok(Value::from(value)),
            value => Err(format!("{value} is not a positive integer")),
        },
        ValidatorKind::Number => as_number(&raw).map(Value::Number),
    }
}

fn as_integer(raw: &Value) -> std::result::Result<i64, String> {
    let parsed = match raw {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("{raw} is not an integer"))
}

fn as_number(raw: &Value) -> std::result::Result<Number, String> {
    let parsed = match raw {
        Value::Number(number) => Some(number.clone()),
        Value::String(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(integer) => Some(Number::from(integer)),
                Err(_) => text.parse::<f64>().ok().and_then(Number::from_f64),
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| format!("{raw} is not a number"))
}

fn check_bounds(leaf: &FormLeaf, value: &Value) -> std::result::Result<(), String> {
    let Some(number) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = leaf.attrs.get("min").and_then(Value::as_f64)
        && number < min
    {
        return Err(format!("{value} is below the minimum {min}"));
    }
    if let Some(max) = leaf.attrs.get("max").and_then(Value::as_f64)
        && number > max
    {
        return Err(format!("{value} is above the maximum {max}"));
    }
    Ok(())
}

fn check_element(leaf: &FormLeaf, value: &Value) -> std::result::Result<(), String> {
    match leaf.element {
        ElementKind::Select => {
            if leaf.options.iter().any(|option| option.value == *value) {
                Ok(())
            } else {
                Err(format!("{value} is not one of the available options"))
            }
        }
        ElementKind::FieldReference => {
            let is_reference = value.as_object().is_some_and(|reference| {
                ["table", "field"]
                    .iter()
                    .all(|key| reference.get(*key).is_some_and(Value::is_string))
            });
            if is_reference {
                Ok(())
            } else {
                Err("expected an object with string 'table' and 'field'".to_string())
            }
        }
        _ => Ok(()),
    }
}
