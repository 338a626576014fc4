use crate::{
    models::{FlattenedField, Operation},
    schema::SchemaNode,
};

/// Dotted leaf paths of a schema. Arrays collapse into their items without
/// adding a segment; the root itself never yields a field.
pub fn flatten_schema(schema: &SchemaNode) -> Vec<FlattenedField> {
    let mut fields = Vec::new();
    flatten_into(schema, "", &mut fields);
    fields
}

fn flatten_into(schema: &SchemaNode, prefix: &str, fields: &mut Vec<FlattenedField>) {
    match schema {
        SchemaNode::Object {
            properties: Some(properties),
            ..
        } => {
            for (name, child) in properties {
                flatten_into(child, &format!("{prefix}{name}."), fields);
            }
        }
        SchemaNode::Array {
            items: Some(items), ..
        } => flatten_into(items, prefix, fields),
        leaf => {
            let name = prefix.strip_suffix('.').unwrap_or(prefix);
            if !name.is_empty() {
                fields.push(FlattenedField {
                    name: name.to_string(),
                    description: leaf.description().to_string(),
                });
            }
        }
    }
}

/// Request fields then response fields, prefixed `request_`/`response_`, dots replaced by `_`.
pub fn flatten_operation_fields(operation: &Operation) -> Vec<FlattenedField> {
    let mut fields = Vec::new();
    let sides = [
        ("request", operation.request_schema.as_ref()),
        ("response", operation.response_schema.as_ref()),
    ];
    for (side, schema) in sides {
        let Some(schema) = schema else {
            continue;
        };
        for field in flatten_schema(schema) {
            let name = if field.name.is_empty() {
                side.to_string()
            } else {
                format!("{side}.{}", field.name)
            };
            fields.push(FlattenedField {
                name: sanitize_field_name(&name),
                description: field.description,
            });
        }
    }
    fields
}

pub fn sanitize_field_name(name: &str) -> String {
    name.replace('.', "_")
}
