use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to parse {path} as JSON ({json}) or YAML ({yaml})")]
    Parse {
        path: String,
        json: String,
        yaml: String,
    },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Collection `{collection}` not found in vector store at {}", .path.display())]
    CollectionNotFound { collection: String, path: PathBuf },

    #[error("Store error while {context}: {source}")]
    Store {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid store request: {0}")]
    InvalidStoreRequest(String),

    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn store(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable machine-readable code surfaced by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_FAILED",
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::CollectionNotFound { .. } => "NOT_INDEXED",
            Self::Store { .. } | Self::InvalidStoreRequest(_) => "STORE_FAILED",
            Self::Io { .. } => "IO_FAILED",
            Self::Serialize(_) => "SERIALIZE_FAILED",
        }
    }
}
