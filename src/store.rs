//! Load inventory loading.
//!
//! The inventory is a JSON array of loads read once at startup and treated as
//! read-only for the life of the process. A missing file is tolerated (empty
//! board); a malformed file is a startup error rather than a silently empty
//! one.

use std::path::Path;

use anyhow::{Context, Result};

use crate::types::Load;

pub const DEFAULT_LOADS_FILE: &str = "loads.json";

/// Read the load inventory from a JSON file
pub fn load_loads_from_file(path: impl AsRef<Path>) -> Result<Vec<Load>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!("Loads file {} not found, starting with an empty board", path.display());
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read loads file {}", path.display()))?;
    let loads: Vec<Load> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse loads file {}", path.display()))?;

    tracing::info!("Loaded {} loads from {}", loads.len(), path.display());
    Ok(loads)
}
