use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, Result};

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|err| PipelineError::io(format!("creating directory {}", path.display()), err))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

pub fn sample_file_name(operation_id: &str, tag: &str) -> String {
    format!("{operation_id}_{tag}.json")
}

pub fn sample_output_path(output_dir: &Path, operation_id: &str, tag: &str) -> PathBuf {
    output_dir.join(sample_file_name(operation_id, tag))
}

pub fn write_json_artifact(path: &Path, value: &serde_json::Value) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body)
        .map_err(|err| PipelineError::io(format!("writing {}", path.display()), err))
}

/// Lists `*.yaml`, `*.yml` and `*.json` documents directly under `dir`, sorted by name.
pub fn list_documents(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(PipelineError::io(
                format!("listing {}", dir.display()),
                err,
            ))
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|err| PipelineError::io(format!("listing {}", dir.display()), err))?;
        let path = entry.path();
        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext, "yaml" | "yml" | "json"))
            .unwrap_or(false);
        if is_document && path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
