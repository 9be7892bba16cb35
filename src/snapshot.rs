use crate::store::{AttendanceEvent, IdentityStore, StudentRecord};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serializable image of a whole store. The store itself never touches
/// disk; callers save and load snapshots explicitly.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub students: Vec<StudentRecord>,
    pub attendance: Vec<AttendanceEvent>,
}

pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "rollcall")
        .context("resolving user data directory")?;
    Ok(dirs.data_dir().join("store.bin"))
}

/// Missing file loads as an empty store.
pub fn load(path: &Path, dedup_same_day: bool) -> Result<IdentityStore> {
    if !path.exists() {
        return Ok(IdentityStore::with_dedup(dedup_same_day));
    }
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot = postcard::from_bytes(&data)
        .with_context(|| format!("decoding snapshot {}", path.display()))?;
    Ok(IdentityStore::restore(snapshot, dedup_same_day))
}

pub fn save(store: &IdentityStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = postcard::to_allocvec(&store.snapshot())?;
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn purge(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}
