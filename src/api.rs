use std::path::{Path as FsPath, PathBuf};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tokio::task;
use tracing::{error, info, warn};

use crate::{
    artifact_store::list_documents,
    error::PipelineError,
    extract::extract_operations,
    indexer::{search_fields, upsert_fields},
    loader::{load_document, parse_document},
    models::{
        LoadDocumentRequest, LoadDocumentResponse, Operation, PipelineRequest, SamplesResponse,
        SearchRequest, SearchResponse, TablesResponse,
    },
    samples::generate_samples,
    tabulate::{create_tables, list_columns, list_tables},
    AppState,
};

const PREVIEW_MAX_CHARS: usize = 20_000;

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now() }))
}

pub async fn list_examples(State(state): State<AppState>) -> impl IntoResponse {
    let dir = state.config.examples_dir.clone();
    match run_blocking(move || list_documents(&dir)).await {
        Ok(examples) => (StatusCode::OK, Json(json!({ "examples": examples }))).into_response(),
        Err(response) => response,
    }
}

pub async fn load_oas(
    State(state): State<AppState>,
    Json(payload): Json<LoadDocumentRequest>,
) -> impl IntoResponse {
    let path = match (payload.example.as_deref(), payload.path.as_deref()) {
        (Some(example), _) if !example.trim().is_empty() => {
            match example_path(&state.config.examples_dir, example) {
                Some(path) => path,
                None => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_REQUEST",
                        "Example must be a plain file name.",
                    )
                }
            }
        }
        (_, Some(path)) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                "Please provide a document path or select an example.",
            )
        }
    };

    let load_path = path.clone();
    let loaded = run_blocking(move || {
        let raw = std::fs::read_to_string(&load_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                PipelineError::MissingInput(format!(
                    "OAS document not found at {}",
                    load_path.display()
                ))
            } else {
                PipelineError::io(format!("reading {}", load_path.display()), err)
            }
        })?;
        let document = parse_document(&raw, &load_path.display().to_string())?;
        Ok((raw, extract_operations(&document).len()))
    })
    .await;

    let (raw, operations) = match loaded {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    *state.current_document.write().await = Some(path.clone());
    info!(path = %path.display(), operations, "Loaded OAS document");

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let response = LoadDocumentResponse {
        path: path.display().to_string(),
        operations,
        preview: truncate_chars(&raw, PREVIEW_MAX_CHARS),
        message: format!("Loaded {file_name}"),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let path = match resolve_document(&state, &body).await {
        Ok(path) => path,
        Err(response) => return response,
    };

    let output_dir = state.config.samples_dir.clone();
    let doc_path = path.clone();
    let generated = run_blocking(move || {
        let operations = load_operations(&doc_path)?;
        generate_samples(&operations, &output_dir)
    })
    .await;

    match generated {
        Ok(generated) => {
            let response = SamplesResponse {
                path: path.display().to_string(),
                message: format!("Generated {} sample files.", generated.len()),
                generated,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(response) => response,
    }
}

pub async fn tabulate(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let path = match resolve_document(&state, &body).await {
        Ok(path) => path,
        Err(response) => return response,
    };

    let database_path = state.config.database_path.clone();
    let vector_path = state.config.vector_path.clone();
    let collection = state.config.collection.clone();
    let doc_path = path.clone();
    let outcome = run_blocking(move || {
        let operations = load_operations(&doc_path)?;
        let tables = create_tables(&operations, &database_path)?;
        let indexed = upsert_fields(&operations, &vector_path, &collection)?;
        Ok((tables, indexed))
    })
    .await;

    match outcome {
        Ok((tables, indexed_fields)) => {
            let response = TablesResponse {
                path: path.display().to_string(),
                message: format!(
                    "Created {} tables and stored {} fields in the vector index.",
                    tables.len(),
                    indexed_fields
                ),
                tables,
                indexed_fields,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(response) => response,
    }
}

pub async fn tables(State(state): State<AppState>) -> impl IntoResponse {
    let database_path = state.config.database_path.clone();
    match run_blocking(move || list_tables(&database_path)).await {
        Ok(tables) => (StatusCode::OK, Json(json!({ "tables": tables }))).into_response(),
        Err(response) => response,
    }
}

pub async fn table_columns(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> impl IntoResponse {
    let database_path = state.config.database_path.clone();
    let name = table.clone();
    match run_blocking(move || list_columns(&database_path, &name)).await {
        Ok(columns) if columns.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            "TABLE_NOT_FOUND",
            &format!("Table `{table}` does not exist."),
        ),
        Ok(columns) => (
            StatusCode::OK,
            Json(json!({ "table": table, "columns": columns })),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> impl IntoResponse {
    let Some(query) = search_query(payload.query) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            "Enter a search query.",
        );
    };
    let limit = payload
        .limit
        .unwrap_or(state.config.search_limit)
        .min(state.config.max_search_limit);

    let vector_path = state.config.vector_path.clone();
    let collection = state.config.collection.clone();
    match run_blocking(move || search_fields(&query, &vector_path, &collection, limit)).await {
        Ok(results) => {
            let response = SearchResponse {
                message: format!("Found {} matches.", results.len()),
                results,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(response) => response,
    }
}

fn load_operations(path: &FsPath) -> crate::error::Result<Vec<Operation>> {
    let document = load_document(path)?;
    Ok(extract_operations(&document))
}

// An empty body means "use the current document".
async fn resolve_document(state: &AppState, body: &Bytes) -> Result<PathBuf, Response<Body>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PipelineRequest::default()
    } else {
        match serde_json::from_slice::<PipelineRequest>(body) {
            Ok(request) => request,
            Err(err) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_REQUEST",
                    &format!("Invalid request body: {err}"),
                ))
            }
        }
    };
    let explicit = request
        .path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    let path = match explicit {
        Some(path) => Some(path),
        None => state.current_document.read().await.clone(),
    };

    match path {
        Some(path) if path.exists() => Ok(path),
        _ => Err(error_response(
            StatusCode::CONFLICT,
            "MISSING_INPUT",
            "Load an OAS document first.",
        )),
    }
}

// Blank queries are rejected; any other query is fingerprinted exactly as sent.
fn search_query(raw: String) -> Option<String> {
    (!raw.trim().is_empty()).then_some(raw)
}

fn example_path(examples_dir: &FsPath, name: &str) -> Option<PathBuf> {
    let name = name.trim();
    let is_plain = !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && name != "."
        && name != "..";
    is_plain.then(|| examples_dir.join(name))
}

async fn run_blocking<T, F>(job: F) -> Result<T, Response<Body>>
where
    T: Send + 'static,
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
{
    match task::spawn_blocking(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(pipeline_error_response(&err)),
        Err(err) => {
            error!("Pipeline task join error: {err:#}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "TASK_FAILED",
                "Pipeline task did not complete.",
            ))
        }
    }
}

fn pipeline_error_response(err: &PipelineError) -> Response<Body> {
    let status = match err {
        PipelineError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::MissingInput(_) => StatusCode::CONFLICT,
        PipelineError::CollectionNotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Store { .. }
        | PipelineError::InvalidStoreRequest(_)
        | PipelineError::Io { .. }
        | PipelineError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Pipeline failed: {err}");
    } else {
        warn!("Pipeline request rejected: {err}");
    }
    error_response(status, err.code(), &err.to_string())
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Body> {
    (
        status,
        Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        })),
    )
        .into_response()
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
}

#[cfg(test)]
mod tests {
    use super::{example_path, search_query, truncate_chars};
    use std::path::{Path, PathBuf};

    #[test]
    fn example_names_cannot_escape_the_examples_dir() {
        let dir = Path::new("/srv/demos");
        assert_eq!(
            example_path(dir, "petstore.yaml"),
            Some(PathBuf::from("/srv/demos/petstore.yaml"))
        );
        assert_eq!(example_path(dir, "../secret.yaml"), None);
        assert_eq!(example_path(dir, ".."), None);
        assert_eq!(example_path(dir, "  "), None);
    }

    #[test]
    fn search_query_keeps_surrounding_whitespace() {
        assert_eq!(search_query("price ".to_string()), Some("price ".to_string()));
        assert_eq!(search_query(" \t\n".to_string()), None);
        assert_eq!(search_query(String::new()), None);
        assert_ne!(
            crate::embedding::embed_text("price "),
            crate::embedding::embed_text("price")
        );
    }

    #[test]
    fn preview_is_truncated_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo", 2), "hé\n...[truncated]");
    }
}
