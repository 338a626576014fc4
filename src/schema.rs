use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Missing `type`, or a type this pipeline does not understand.
    Unspecified,
}

impl ScalarKind {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("string") => Self::String,
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            _ => Self::Unspecified,
        }
    }
}

/// Typed view of a JSON-schema fragment. Only `object` and `array` recurse.
///
/// `$ref` and `allOf`/`oneOf`/`anyOf` are not resolved: such a fragment carries
/// no `type` and becomes an unspecified scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        description: String,
        /// `None` when `properties` is not declared at all.
        properties: Option<Vec<(String, SchemaNode)>>,
    },
    Array {
        description: String,
        items: Option<Box<SchemaNode>>,
    },
    Scalar {
        kind: ScalarKind,
        description: String,
    },
}

impl SchemaNode {
    /// Builds a node from a tree value. Non-mapping values read as an empty schema.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(map) => Self::from_map(map),
            None => Self::Scalar {
                kind: ScalarKind::Unspecified,
                description: String::new(),
            },
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let declared = map.get("type").and_then(Value::as_str);

        match declared {
            Some("object") => {
                let properties = map.get("properties").map(|props| {
                    props
                        .as_object()
                        .map(|entries| {
                            entries
                                .iter()
                                .map(|(name, child)| (name.clone(), Self::from_value(child)))
                                .collect()
                        })
                        .unwrap_or_default()
                });
                Self::Object {
                    description,
                    properties,
                }
            }
            Some("array") => Self::Array {
                description,
                items: map.get("items").map(|items| Box::new(Self::from_value(items))),
            },
            other => Self::Scalar {
                kind: ScalarKind::parse(other),
                description,
            },
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Object { description, .. }
            | Self::Array { description, .. }
            | Self::Scalar { description, .. } => description,
        }
    }
}

/// An operation's request or response schema. Absent and `{}` are both "empty".
pub fn schema_from_tree(value: Option<&Value>) -> Option<SchemaNode> {
    let map = value?.as_object()?;
    if map.is_empty() {
        return None;
    }
    Some(SchemaNode::from_map(map))
}
