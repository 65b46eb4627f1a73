//! Map directory discovery and bulk checking
//!
//! Walks a local directory tree looking for map directories (any directory
//! holding a feature list or a terrain type table) and loads both tables
//! of each one, separating files that are absent from files that fail to
//! decode.

use serde::Serialize;

use crate::map::{
    features_path, terrain_types_path, try_load_features, try_load_terrain_types, LoadError,
    Tileset,
};
use crate::storage::{join_path, LocalStorage, Storage, StorageError};

/// Directory depth limit for [`find_map_dirs`]
pub const MAX_SCAN_DEPTH: usize = 16;

/// Result of loading one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    /// Loaded with this many entries
    Loaded(usize),
    /// No file present
    Absent,
    /// File present but rejected
    Failed(String),
}

impl Outcome {
    fn from_result<T>(result: Result<T, LoadError>, len: impl FnOnce(&T) -> usize) -> Self {
        match result {
            Ok(table) => Outcome::Loaded(len(&table)),
            Err(e) if e.is_not_found() => Outcome::Absent,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Both tables of one map directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDirReport {
    pub dir: String,
    pub features: Outcome,
    pub terrain_types: Outcome,
    pub tileset: Option<Tileset>,
}

impl MapDirReport {
    pub fn has_failure(&self) -> bool {
        self.features.is_failure() || self.terrain_types.is_failure()
    }
}

/// Totals over a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub dirs: usize,
    pub loaded: usize,
    pub absent: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn add(&mut self, report: &MapDirReport) {
        self.dirs += 1;
        for outcome in [&report.features, &report.terrain_types] {
            match outcome {
                Outcome::Loaded(_) => self.loaded += 1,
                Outcome::Absent => self.absent += 1,
                Outcome::Failed(_) => self.failed += 1,
            }
        }
    }
}

/// Load both tables of a map directory
pub fn check_map_dir(storage: &Storage, dir: &str) -> MapDirReport {
    let features = Outcome::from_result(try_load_features(storage, &features_path(dir)), |t| {
        t.len()
    });
    let terrain = try_load_terrain_types(storage, dir);
    let tileset = terrain.as_ref().ok().and_then(|t| t.tileset());
    let terrain_types = Outcome::from_result(terrain, |t| t.count as usize);

    MapDirReport {
        dir: dir.to_string(),
        features,
        terrain_types,
        tileset,
    }
}

/// Find every map directory under `root`, sorted, depth first
///
/// Fails only if `root` itself can't be listed; unreadable
/// sub-directories are logged and skipped.
pub fn find_map_dirs(local: &LocalStorage, root: &str) -> Result<Vec<String>, StorageError> {
    let mut found = Vec::new();
    walk(local, root, 0, &mut found)?;
    Ok(found)
}

fn walk(
    local: &LocalStorage,
    dir: &str,
    depth: usize,
    found: &mut Vec<String>,
) -> Result<(), StorageError> {
    if local.exists(&features_path(dir)) || local.exists(&terrain_types_path(dir)) {
        found.push(dir.to_string());
    }
    if depth >= MAX_SCAN_DEPTH {
        log::warn!("not descending below {}: depth limit", dir);
        return Ok(());
    }
    let children = match local.list_dirs(if dir.is_empty() { "." } else { dir }) {
        Ok(children) => children,
        Err(e) if depth > 0 => {
            log::warn!("skipping {}: {}", dir, e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    for child in children {
        walk(local, &join_path(dir, &child), depth + 1, found)?;
    }
    Ok(())
}
