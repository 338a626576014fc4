use std::path::Path;

use tracing::info;

use crate::{
    embedding::{embed_text, field_text, FINGERPRINT_DIMENSION},
    error::Result,
    flatten::flatten_operation_fields,
    models::{FieldPayload, Operation, SearchHit},
    vector_store::{Distance, VectorStore},
};

pub const DEFAULT_COLLECTION: &str = "oas_fields";

/// Fingerprints every flattened field and upserts them in one batch.
///
/// Point ids are sequential within this call (0, 1, 2, ...), so a later run
/// overwrites whatever earlier run used the same ids.
pub fn upsert_fields(operations: &[Operation], store_path: &Path, collection: &str) -> Result<usize> {
    let mut store = VectorStore::open_or_create(store_path)?;
    if store.ensure_collection(collection, FINGERPRINT_DIMENSION, Distance::Cosine)? {
        info!(collection, path = %store_path.display(), "Created vector collection");
    }

    let mut ids = Vec::new();
    let mut vectors = Vec::new();
    let mut payloads = Vec::new();
    for operation in operations {
        for field in flatten_operation_fields(operation) {
            let vector = embed_text(&field_text(
                &operation.operation_id,
                &field.name,
                &field.description,
            ));
            let payload = FieldPayload {
                operation_id: operation.operation_id.clone(),
                field: field.name,
                description: field.description,
                path: operation.path.clone(),
                method: operation.method.as_str().to_string(),
            };
            ids.push(ids.len() as u64);
            vectors.push(vector);
            payloads.push(serde_json::to_value(&payload)?);
        }
    }

    if payloads.is_empty() {
        return Ok(0);
    }

    let upserted = store.upsert_batch(collection, &ids, &vectors, &payloads)?;
    let total = store.count(collection)?;
    info!(collection, upserted, total, "Upserted field fingerprints");
    Ok(upserted)
}

/// Nearest fields to `query`. Fails when nothing has been indexed into `collection` yet.
pub fn search_fields(
    query: &str,
    store_path: &Path,
    collection: &str,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let store = VectorStore::open_existing(store_path, collection)?;
    let vector = embed_text(query);
    store
        .search(collection, &vector, limit)?
        .into_iter()
        .map(|point| -> Result<SearchHit> {
            Ok(SearchHit {
                score: point.score,
                payload: serde_json::from_value::<FieldPayload>(point.payload)?,
            })
        })
        .collect()
}
