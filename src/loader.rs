use std::{fs, path::Path};

use serde_json::{Map, Number, Value};

use crate::error::{PipelineError, Result};

/// Reads a document from disk and parses it with [`parse_document`].
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(format!(
            "OAS document not found at {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| PipelineError::io(format!("reading {}", path.display()), err))?;
    parse_document(&raw, &path.display().to_string())
}

/// Strict JSON first, YAML as the fallback. Mapping order is preserved either way.
pub fn parse_document(raw: &str, origin: &str) -> Result<Value> {
    let json_err = match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(mut yaml) => {
            // Resolve `<<: *anchor` merge keys before the tree is converted.
            yaml.apply_merge().map_err(|merge_err| PipelineError::Parse {
                path: origin.to_string(),
                json: json_err.to_string(),
                yaml: merge_err.to_string(),
            })?;
            Ok(yaml_to_json(yaml))
        }
        Err(yaml_err) => Err(PipelineError::Parse {
            path: origin.to_string(),
            json: json_err.to_string(),
            yaml: yaml_err.to_string(),
        }),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                out.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// Unquoted status codes (`200:`) and booleans arrive as non-string keys.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
