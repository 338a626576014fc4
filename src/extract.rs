use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    models::{HttpMethod, Operation},
    schema::{schema_from_tree, SchemaNode},
};

/// One [`Operation`] per recognised method entry under `paths`, in document order.
///
/// Keys that are not HTTP verbs (`parameters`, `summary`, `x-*`) are skipped.
/// Absent or malformed sections read as empty.
pub fn extract_operations(document: &Value) -> Vec<Operation> {
    let mut operations = Vec::new();
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return operations;
    };

    for (path, item) in paths {
        let Some(methods) = item.as_object() else {
            continue;
        };
        for (method_key, payload) in methods {
            let Some(method) = HttpMethod::parse(method_key) else {
                continue;
            };

            let operation_id = payload
                .get("operationId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| synthesize_operation_id(method_key, path));

            let request_schema = payload
                .get("requestBody")
                .and_then(|body| body.get("content"))
                .and_then(Value::as_object)
                .and_then(pick_schema);

            let response_schema = payload
                .get("responses")
                .and_then(Value::as_object)
                .and_then(|responses| {
                    responses.values().find_map(|response| {
                        response
                            .get("content")
                            .and_then(Value::as_object)
                            .and_then(pick_schema)
                    })
                });

            debug!(
                operation_id = %operation_id,
                method = method.as_str(),
                path = %path,
                has_request = request_schema.is_some(),
                has_response = response_schema.is_some(),
                "Extracted operation"
            );

            operations.push(Operation {
                operation_id,
                method,
                path: path.clone(),
                request_schema,
                response_schema,
            });
        }
    }

    operations
}

/// `get` + `/items/{id}` becomes `get_itemsid`.
pub fn synthesize_operation_id(method: &str, path: &str) -> String {
    let stripped: String = path
        .chars()
        .filter(|ch| !matches!(ch, '/' | '{' | '}'))
        .collect();
    format!("{}_{}", method.to_ascii_lowercase(), stripped)
}

/// First content entry, in declaration order, with a JSON-compatible media type.
fn pick_schema(content: &Map<String, Value>) -> Option<SchemaNode> {
    content
        .iter()
        .find(|(mime, _)| is_json_mime(mime))
        .and_then(|(_, body)| schema_from_tree(body.get("schema")))
}

const JSON_MEDIA_TYPES: [&str; 2] = ["application/json", "application/*+json"];

/// Exact, case-sensitive match; parameters and other `+json` subtypes do not count.
pub fn is_json_mime(mime: &str) -> bool {
    JSON_MEDIA_TYPES.contains(&mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_operation_per_verb_and_non_verbs_skipped() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "parameters": [{"name": "x"}],
                    "get": {"operationId": "listPets"},
                    "POST": {},
                    "x-internal": true
                },
                "/pets/{id}": {"delete": {}}
            }
        });
        let ops = extract_operations(&doc);
        let ids: Vec<&str> = ops.iter().map(|op| op.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["listPets", "post_pets", "delete_petsid"]);
        assert_eq!(ops[1].method, HttpMethod::Post);
        assert_eq!(ops[2].path, "/pets/{id}");
    }

    #[test]
    fn parameterised_json_media_type_yields_no_schema() {
        let doc = json!({
            "paths": {"/items": {"get": {"responses": {"200": {"content": {
                "application/json; charset=utf-8": {"schema": {"type": "integer"}}
            }}}}}}
        });
        assert!(extract_operations(&doc)[0].response_schema.is_none());
    }

    #[test]
    fn documents_without_paths_yield_nothing() {
        assert!(extract_operations(&json!({"openapi": "3.0.0"})).is_empty());
        assert!(extract_operations(&json!("just text")).is_empty());
    }

    #[test]
    fn request_schema_uses_first_json_media_type() {
        let doc = json!({
            "paths": {"/upload": {"post": {
                "requestBody": {"content": {
                    "text/plain": {"schema": {"type": "string"}},
                    "application/problem+json": {"schema": {"type": "integer"}},
                    "application/json; charset=utf-8": {"schema": {"type": "number"}},
                    "application/json": {"schema": {"type": "boolean"}},
                    "application/*+json": {"schema": {"type": "string"}}
                }}
            }}}
        });
        let ops = extract_operations(&doc);
        assert!(matches!(
            ops[0].request_schema,
            Some(SchemaNode::Scalar {
                kind: crate::schema::ScalarKind::Boolean,
                ..
            })
        ));
        assert!(ops[0].response_schema.is_none());
    }

    #[test]
    fn response_schema_is_first_non_empty_in_declared_order() {
        let doc = json!({
            "paths": {"/items": {"get": {
                "responses": {
                    "204": {"description": "no content"},
                    "200": {"content": {"text/html": {"schema": {"type": "string"}}}},
                    "201": {"content": {"application/json": {"schema": {}}}},
                    "202": {"content": {"application/json": {"schema": {"type": "object", "description": "winner"}}}},
                    "203": {"content": {"application/json": {"schema": {"type": "string"}}}}
                }
            }}}
        });
        let ops = extract_operations(&doc);
        assert_eq!(
            ops[0].response_schema.as_ref().map(SchemaNode::description),
            Some("winner")
        );
    }

    #[test]
    fn json_mime_matching() {
        assert!(is_json_mime("application/json"));
        assert!(is_json_mime("application/*+json"));
        assert!(!is_json_mime("application/json; charset=utf-8"));
        assert!(!is_json_mime("application/problem+json"));
        assert!(!is_json_mime("Application/JSON"));
        assert!(!is_json_mime("application/xml"));
        assert!(!is_json_mime("text/json"));
    }

    #[test]
    fn demo_documents_have_operations() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let names = crate::artifact_store::list_documents(&dir).unwrap();
        assert!(!names.is_empty(), "no demo OAS documents found");
        for name in names {
            let document = crate::loader::load_document(&dir.join(&name)).unwrap();
            assert!(
                !extract_operations(&document).is_empty(),
                "expected operations in {name}"
            );
        }
    }
}
