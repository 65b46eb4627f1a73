//! mapdata: decoders for legacy map asset tables
//!
//! Reads the binary tables stored alongside a map's tile data:
//! - Feature lists (`feat.bjo`), in every historical record layout
//! - Terrain type tables (`ttypes.ttp`), with the editor count clamp
//!
//! Resources come from a [`storage::Storage`]; each load opens one
//! resource, decodes it completely or not at all, and closes it again.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod endian;
pub mod map;
pub mod scan;
pub mod storage;

pub use map::{
    load_features, load_terrain_types, FeatureRecord, FeatureTable, LoadError, TerrainType,
    TerrainTypeTable, Tileset,
};
pub use storage::{LocalStorage, MemoryStorage, Storage, StorageError};
