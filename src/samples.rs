use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::{
    artifact_store::{ensure_dir, sample_output_path, write_json_artifact},
    error::Result,
    models::Operation,
    schema::{ScalarKind, SchemaNode},
};

const PLACEHOLDER: &str = "sample";

/// One representative value per schema node.
pub fn generate_sample(schema: &SchemaNode) -> Value {
    match schema {
        SchemaNode::Object { properties, .. } => {
            let mut data = Map::new();
            for (name, child) in properties.iter().flatten() {
                data.insert(name.clone(), generate_sample(child));
            }
            Value::Object(data)
        }
        SchemaNode::Array { items, .. } => {
            let item = items
                .as_deref()
                .map(generate_sample)
                .unwrap_or_else(|| json!(PLACEHOLDER));
            Value::Array(vec![item])
        }
        SchemaNode::Scalar { kind, .. } => match kind {
            ScalarKind::Integer => json!(1),
            ScalarKind::Number => json!(1.0),
            ScalarKind::Boolean => json!(true),
            ScalarKind::String | ScalarKind::Unspecified => json!(PLACEHOLDER),
        },
    }
}

/// Writes `{operation_id}_{tag}.json` for every non-empty request/response schema.
///
/// Files already written stay in place if a later write fails.
pub fn generate_samples(operations: &[Operation], output_dir: &Path) -> Result<Vec<String>> {
    ensure_dir(output_dir)?;
    let mut generated = Vec::new();

    for operation in operations {
        let sides = [
            ("request", operation.request_schema.as_ref()),
            ("response", operation.response_schema.as_ref()),
        ];
        for (tag, schema) in sides {
            let Some(schema) = schema else {
                continue;
            };
            let sample = generate_sample(schema);
            let path = sample_output_path(output_dir, &operation.operation_id, tag);
            write_json_artifact(&path, &sample)?;
            info!(
                operation_id = %operation.operation_id,
                tag,
                path = %path.display(),
                "Generated sample"
            );
            generated.push(path.display().to_string());
        }
    }

    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value)
    }

    #[test]
    fn scalar_leaves_use_fixed_values() {
        let schema = node(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "count": {"type": "integer"},
                "ratio": {"type": "number"},
                "active": {"type": "boolean"},
                "tags": {"type": "array", "items": {"type": "object", "properties": {"k": {"type": "integer"}}}},
                "anything": {}
            }
        }));
        let sample = generate_sample(&schema);
        assert_eq!(
            sample,
            json!({
                "name": "sample",
                "count": 1,
                "ratio": 1.0,
                "active": true,
                "tags": [{"k": 1}],
                "anything": "sample"
            })
        );
        assert!(sample["ratio"].is_f64());
        assert!(sample["count"].is_i64());
    }

    #[test]
    fn array_without_items_wraps_placeholder() {
        assert_eq!(generate_sample(&node(json!({"type": "array"}))), json!(["sample"]));
        assert_eq!(generate_sample(&node(json!({"type": "object"}))), json!({}));
    }

    #[test]
    fn writes_one_file_per_non_empty_schema() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("api_data");
        let operations = vec![
            Operation {
                operation_id: "createItem".to_string(),
                method: HttpMethod::Post,
                path: "/items".to_string(),
                request_schema: Some(node(json!({"type": "object", "properties": {"name": {"type": "string"}}}))),
                response_schema: Some(node(json!({"type": "integer"}))),
            },
            Operation {
                operation_id: "ping".to_string(),
                method: HttpMethod::Get,
                path: "/ping".to_string(),
                request_schema: None,
                response_schema: None,
            },
        ];

        let generated = generate_samples(&operations, &out).unwrap();
        assert_eq!(generated.len(), 2);
        assert!(generated[0].ends_with("createItem_request.json"));
        assert!(generated[1].ends_with("createItem_response.json"));

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&generated[0]).unwrap()).unwrap();
        assert_eq!(written, json!({"name": "sample"}));
    }
}
