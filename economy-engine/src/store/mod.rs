//! Store collaborators.
//!
//! [`MemoryStore`] implements the ledger, portfolio and market tables in
//! process memory. Durability comes from whole-state JSON snapshots written
//! atomically to disk.

use anyhow::{Context, Result};
use economy::{AccountId, Holding, Instrument};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

pub mod memory;

pub use memory::MemoryStore;

/// File name of the store snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "economy.json";

/// Serializable image of every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub balances: BTreeMap<AccountId, i64>,
    pub holdings: Vec<Holding>,
    pub instruments: Vec<Instrument>,
}

/// Saves a serializable object to a file atomically.
///
/// Writes to a temporary file next to the target, syncs it, then renames it
/// over the target.
pub fn save_state<T: Serialize>(path: &Path, state: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create parent directory")?;
    }

    let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

    let temp_path = path.with_extension("tmp");
    let mut temp_file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;

    temp_file
        .write_all(json.as_bytes())
        .context("Failed to write to temp file")?;
    temp_file.sync_all().context("Failed to sync temp file")?;

    std::fs::rename(&temp_path, path).context("Failed to rename temp file to target")?;

    Ok(())
}

/// Loads a deserializable object from a file.
pub fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path).context("Failed to open state file")?;
    let reader = std::io::BufReader::new(file);
    let state = serde_json::from_reader(reader).context("Failed to deserialize state")?;
    Ok(state)
}
