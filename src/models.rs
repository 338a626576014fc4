use serde::{Deserialize, Serialize};

use crate::schema::SchemaNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive match against the verbs an OAS path item may declare.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub request_schema: Option<SchemaNode>,
    pub response_schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedField {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub table_name: String,
    pub columns: Vec<String>,
}

/// Metadata stored next to every fingerprint in the vector store.
/// Keys missing from a stored payload read back as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPayload {
    pub operation_id: String,
    pub field: String,
    pub description: String,
    pub path: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    #[serde(flatten)]
    pub payload: FieldPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDocumentRequest {
    pub path: Option<String>,
    pub example: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDocumentResponse {
    pub path: String,
    pub operations: usize,
    pub preview: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplesResponse {
    pub path: String,
    pub generated: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    pub path: String,
    pub tables: Vec<TableDefinition>,
    pub indexed_fields: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("GeT"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("OPTIONS"), Some(HttpMethod::Options));
        assert_eq!(HttpMethod::parse("parameters"), None);
        assert_eq!(HttpMethod::parse("trace"), None);
        assert_eq!(HttpMethod::parse(" get"), None);
        assert_eq!(HttpMethod::parse("post "), None);
    }

    #[test]
    fn search_hit_flattens_payload() {
        let hit = SearchHit {
            score: 0.5,
            payload: FieldPayload {
                operation_id: "get_items".to_string(),
                field: "response_id".to_string(),
                description: String::new(),
                path: "/items".to_string(),
                method: "GET".to_string(),
            },
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["score"], 0.5);
        assert_eq!(value["operation_id"], "get_items");
        assert_eq!(value["method"], "GET");
    }
}
