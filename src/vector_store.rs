//! Directory-backed vector collections persisted in a single SQLite file.
//!
//! Search is an exact scan scored by cosine similarity; collections hold a few
//! thousand fingerprints at most.

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::{
    artifact_store::ensure_dir,
    error::{PipelineError, Result},
};

const STORE_FILE_NAME: &str = "vectors.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Cosine,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    pub payload: Value,
}

pub struct VectorStore {
    root: PathBuf,
    conn: Connection,
}

impl VectorStore {
    /// Opens the store under `root`, creating the directory and schema when absent.
    pub fn open_or_create(root: &Path) -> Result<Self> {
        ensure_dir(root)?;
        let db_path = root.join(STORE_FILE_NAME);
        let conn = Connection::open(&db_path)
            .map_err(|err| PipelineError::store(format!("opening {}", db_path.display()), err))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                distance TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS points (
                collection TEXT NOT NULL,
                point_id INTEGER NOT NULL,
                vector_json TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (collection, point_id)
            );
            ",
        )
        .map_err(|err| PipelineError::store("initialising vector store schema", err))?;
        Ok(Self {
            root: root.to_path_buf(),
            conn,
        })
    }

    /// Opens a store that must already hold `collection`.
    pub fn open_existing(root: &Path, collection: &str) -> Result<Self> {
        let not_found = || PipelineError::CollectionNotFound {
            collection: collection.to_string(),
            path: root.to_path_buf(),
        };
        let db_path = root.join(STORE_FILE_NAME);
        if !db_path.exists() {
            return Err(not_found());
        }
        let store = Self::open_or_create(root)?;
        if !store.collection_exists(collection)? {
            return Err(not_found());
        }
        Ok(store)
    }

    pub fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection_dimension(name)?.is_some())
    }

    pub fn collection_dimension(&self, name: &str) -> Result<Option<usize>> {
        self.conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|dim| dim.map(|d| d as usize))
            .map_err(|err| PipelineError::store(format!("reading collection {name}"), err))
    }

    /// Returns `true` when the collection was created by this call.
    pub fn ensure_collection(&self, name: &str, dimension: usize, distance: Distance) -> Result<bool> {
        if self.collection_exists(name)? {
            return Ok(false);
        }
        self.conn
            .execute(
                "INSERT INTO collections(name, dimension, distance) VALUES(?1, ?2, ?3)",
                params![name, dimension as i64, distance.as_str()],
            )
            .map_err(|err| PipelineError::store(format!("creating collection {name}"), err))?;
        Ok(true)
    }

    /// Inserts or replaces points by id in one transaction.
    pub fn upsert_batch(
        &mut self,
        collection: &str,
        ids: &[u64],
        vectors: &[Vec<f32>],
        payloads: &[Value],
    ) -> Result<usize> {
        if ids.len() != vectors.len() || ids.len() != payloads.len() {
            return Err(PipelineError::InvalidStoreRequest(format!(
                "batch length mismatch: {} ids, {} vectors, {} payloads",
                ids.len(),
                vectors.len(),
                payloads.len()
            )));
        }
        let dimension = self.collection_dimension(collection)?.ok_or_else(|| {
            PipelineError::CollectionNotFound {
                collection: collection.to_string(),
                path: self.root.clone(),
            }
        })?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(PipelineError::InvalidStoreRequest(format!(
                "vector dimension {} does not match collection dimension {dimension}",
                bad.len()
            )));
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|err| PipelineError::store("starting upsert transaction", err))?;
        for ((id, vector), payload) in ids.iter().zip(vectors).zip(payloads) {
            tx.execute(
                "INSERT OR REPLACE INTO points(collection, point_id, vector_json, payload_json) VALUES(?1, ?2, ?3, ?4)",
                params![
                    collection,
                    *id as i64,
                    serde_json::to_string(vector)?,
                    payload.to_string()
                ],
            )
            .map_err(|err| PipelineError::store(format!("upserting point {id}"), err))?;
        }
        tx.commit()
            .map_err(|err| PipelineError::store("committing upsert", err))?;
        Ok(ids.len())
    }

    pub fn count(&self, collection: &str) -> Result<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM points WHERE collection = ?1",
                params![collection],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(|err| PipelineError::store(format!("counting {collection}"), err))
    }

    /// Top `limit` points by descending cosine similarity; ties go to the lower id.
    pub fn search(&self, collection: &str, query: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        if !self.collection_exists(collection)? {
            return Err(PipelineError::CollectionNotFound {
                collection: collection.to_string(),
                path: self.root.clone(),
            });
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT point_id, vector_json, payload_json FROM points WHERE collection = ?1")
            .map_err(|err| PipelineError::store(format!("searching {collection}"), err))?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|err| PipelineError::store(format!("searching {collection}"), err))?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, vector_json, payload_json) =
                row.map_err(|err| PipelineError::store(format!("reading {collection}"), err))?;
            let vector: Vec<f32> = serde_json::from_str(&vector_json)?;
            let payload: Value = serde_json::from_str(&payload_json)?;
            scored.push(ScoredPoint {
                id: id as u64,
                score: cosine_similarity(query, &vector),
                payload,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ensure_collection_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert!(store.ensure_collection("oas_fields", 8, Distance::Cosine).unwrap());
        assert!(!store.ensure_collection("oas_fields", 8, Distance::Cosine).unwrap());
        assert_eq!(store.collection_dimension("oas_fields").unwrap(), Some(8));
    }

    #[test]
    fn open_existing_requires_collection() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorStore::open_existing(dir.path(), "oas_fields")
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::CollectionNotFound { .. }));

        VectorStore::open_or_create(dir.path()).unwrap();
        let err = VectorStore::open_existing(dir.path(), "oas_fields")
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::CollectionNotFound { .. }));
    }

    #[test]
    fn upsert_replaces_by_id_and_search_ranks_by_cosine() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::open_or_create(dir.path()).unwrap();
        store.ensure_collection("c", 2, Distance::Cosine).unwrap();

        store
            .upsert_batch(
                "c",
                &[0, 1, 2],
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
                &[json!({"n": 0}), json!({"n": 1}), json!({"n": 2})],
            )
            .unwrap();
        store
            .upsert_batch("c", &[1], &[vec![0.9, 0.1]], &[json!({"n": "replaced"})])
            .unwrap();
        assert_eq!(store.count("c").unwrap(), 3);

        let hits = store.search("c", &[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].payload, json!({"n": "replaced"}));
    }

    #[test]
    fn rejects_mismatched_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::open_or_create(dir.path()).unwrap();
        store.ensure_collection("c", 2, Distance::Cosine).unwrap();
        assert!(store.upsert_batch("c", &[0], &[], &[]).is_err());
        assert!(store
            .upsert_batch("c", &[0], &[vec![1.0]], &[json!({})])
            .is_err());
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
