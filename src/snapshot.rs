//! Snapshot input files.
//!
//! A snapshot file is the JSON hand-off from the memory profiler: the raw
//! managed object table and the hierarchical memory breakdown. Every section
//! is optional; a missing section simply yields header-only reports.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::report::{MemoryTree, ObjectTable};

/// Current snapshot file format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// In-memory snapshot, read-only for the duration of an export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    #[serde(default)]
    pub objects: ObjectTable,
    #[serde(default)]
    pub breakdown: MemoryTree,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read snapshot file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot JSON {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Parses a snapshot from JSON text.
pub fn parse_snapshot(content: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(content)
}

/// Loads a snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    debug!("Loading snapshot from: {}", path.display());

    if !path.exists() {
        return Err(SnapshotError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = parse_snapshot(&content).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded snapshot version {} ({} objects, {} types, {} categories)",
        snapshot.version,
        snapshot.objects.objects.len(),
        snapshot.objects.type_names.len(),
        snapshot.breakdown.roots().len()
    );

    Ok(snapshot)
}
