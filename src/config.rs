use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Result;

use crate::indexer::DEFAULT_COLLECTION;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_root: PathBuf,
    pub samples_dir: PathBuf,
    pub database_path: PathBuf,
    pub vector_path: PathBuf,
    pub collection: String,
    pub examples_dir: PathBuf,
    pub search_limit: usize,
    pub max_search_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_raw =
            env::var("OAS_CATALOG_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_normalized = bind_raw
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string();
        let bind_addr = bind_normalized
            .parse::<SocketAddr>()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let data_root = env_path("OAS_CATALOG_DATA_ROOT", "generated_outputs");
        let samples_dir = data_root.join("api_data");
        let database_path = env_path("OAS_CATALOG_DATABASE_PATH", "database/oas.db");
        let vector_path = env_path("OAS_CATALOG_VECTOR_PATH", "database/vectors");
        let examples_dir = env_path("OAS_CATALOG_EXAMPLES_DIR", "demos");

        let collection = env::var("OAS_CATALOG_COLLECTION")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let search_limit = env::var("OAS_CATALOG_SEARCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(5);

        let max_search_limit = env::var("OAS_CATALOG_MAX_SEARCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100)
            .max(1);

        Ok(Self {
            bind_addr,
            data_root,
            samples_dir,
            database_path,
            vector_path,
            collection,
            examples_dir,
            search_limit: search_limit.clamp(1, max_search_limit),
            max_search_limit,
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
