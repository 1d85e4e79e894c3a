use std::fs;
use std::path::Path;

use quarry_core::DocumentPath;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keys::IndexCategory;
use crate::memory::MemoryIndex;
use crate::{IndexError, Result};

/// Bump when the snapshot layout changes; stale snapshots are rejected, not
/// migrated (reindexing from source is always possible).
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    generation: u64,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    category: IndexCategory,
    key: String,
    documents: Vec<DocumentPath>,
}

pub fn save_index(index: &MemoryIndex, path: &Path) -> Result<()> {
    let snapshot = Snapshot {
        schema_version: SCHEMA_VERSION,
        generation: index.generation(),
        entries: index
            .entries()
            .map(|(category, key, documents)| SnapshotEntry {
                category,
                key: key.to_string(),
                documents: documents.iter().cloned().collect(),
            })
            .collect(),
    };
    let json = serde_json::to_string(&snapshot)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), entries = snapshot.entries.len(), "saved index snapshot");
    Ok(())
}

pub fn load_index(path: &Path) -> Result<MemoryIndex> {
    let json = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&json)?;
    if snapshot.schema_version != SCHEMA_VERSION {
        return Err(IndexError::IncompatibleSchemaVersion {
            expected: SCHEMA_VERSION,
            found: snapshot.schema_version,
        });
    }

    let mut index = MemoryIndex::new();
    let entry_count = snapshot.entries.len();
    for entry in snapshot.entries {
        for document in entry.documents {
            index.add_entry(entry.category, entry.key.clone(), document);
        }
    }
    index.set_generation(snapshot.generation);
    debug!(path = %path.display(), entries = entry_count, "loaded index snapshot");
    Ok(index)
}
