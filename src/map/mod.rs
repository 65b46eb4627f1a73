//! Map module - legacy map asset decoding
//!
//! Decoders for the per-map binary tables that sit next to a map's tile
//! data:
//! - `feat.bjo`: placed features (scenery, wrecks, oil resources)
//! - `ttypes.ttp`: surface classification for each tile texture slot
//!
//! Each loader opens one resource, validates its header and decodes all of
//! it or nothing. The public entry points return `None` for every failure;
//! the `try_` variants keep the [`LoadError`] for diagnostics.

mod features;
mod fixed_str;
mod terrain_types;

pub use features::*;
pub use fixed_str::FixedStr;
pub use terrain_types::*;

use std::fmt;

use crate::storage::join_path;

/// Feature list file name inside a map directory
pub const FEATURES_FILE: &str = "feat.bjo";

/// Terrain type table file name inside a map directory
pub const TERRAIN_TYPES_FILE: &str = "ttypes.ttp";

/// Format limits shared by the decoders
pub mod limits {
    /// Capacity of a terrain type table (texture slots per tileset)
    pub const MAX_TILE_TEXTURES: usize = 255;
    /// Largest terrain type count kept after clamping
    pub const MAX_TERRAIN_TYPE_COUNT: u32 = MAX_TILE_TEXTURES as u32 - 1;
    /// Capacity of a feature name buffer
    pub const FEATURE_NAME_CAPACITY: usize = 128;
    /// Capacity of a feature script reference buffer
    pub const FEATURE_SCRIPT_CAPACITY: usize = 32;
}

/// Path of the feature list for a map directory
pub fn features_path(map_dir: &str) -> String {
    join_path(map_dir, FEATURES_FILE)
}

/// Path of the terrain type table for a map directory
pub fn terrain_types_path(map_dir: &str) -> String {
    join_path(map_dir, TERRAIN_TYPES_FILE)
}

/// Why a table failed to load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The resource could not be opened
    ResourceNotFound(String),
    /// Wrong magic tag or header cut short
    MalformedHeader { path: String, reason: String },
    /// A record field was cut short
    TruncatedRecord {
        path: String,
        index: usize,
        field: &'static str,
    },
    /// A decoded value is outside its valid range
    OutOfRangeValue { path: String, index: usize, value: u32 },
}

impl LoadError {
    /// True when the file simply isn't there
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::ResourceNotFound(_))
    }

    /// Log at a level matching the failure and discard
    pub(crate) fn log(&self) {
        if self.is_not_found() {
            log::debug!("{}", self);
        } else {
            log::warn!("{}", self);
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ResourceNotFound(path) => write!(f, "{} not found", path),
            LoadError::MalformedHeader { path, reason } => {
                write!(f, "bad header in {}: {}", path, reason)
            }
            LoadError::TruncatedRecord { path, index, field } => {
                write!(f, "record {} in {} truncated at {}", index, path, field)
            }
            LoadError::OutOfRangeValue { path, index, value } => {
                write!(f, "entry {} in {} out of range: {}", index, path, value)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Read and check the `tag | version:u32 | count:u32` header both formats share
///
/// Returns `(version, count)`.
pub(crate) fn read_header(
    reader: &mut crate::storage::ResourceReader,
    tag: &[u8; 4],
) -> Result<(u32, u32), LoadError> {
    let path = reader.path().to_string();
    let malformed = |reason: String| LoadError::MalformedHeader {
        path: path.clone(),
        reason,
    };

    let found = reader
        .read_array::<4>()
        .ok_or_else(|| malformed("file shorter than tag".to_string()))?;
    if &found != tag {
        return Err(malformed(format!(
            "expected tag {:?}, found {:?}",
            String::from_utf8_lossy(tag),
            String::from_utf8_lossy(&found)
        )));
    }
    let version = reader
        .read_u32_le()
        .ok_or_else(|| malformed("missing version".to_string()))?;
    let count = reader
        .read_u32_le()
        .ok_or_else(|| malformed("missing count".to_string()))?;
    Ok((version, count))
}
