//! Terrain type table loading (`ttypes.ttp`)
//!
//! ```text
//! tag "ttyp" | version u32 | count u32 | type[count] u16
//! ```
//!
//! One entry per tile texture slot. Map editors write a count one past the
//! table's capacity, so counts at or above [`MAX_TILE_TEXTURES`] are
//! clamped instead of rejected.

use serde::{Deserialize, Serialize};

use super::limits::{MAX_TERRAIN_TYPE_COUNT, MAX_TILE_TEXTURES};
use super::{read_header, terrain_types_path, LoadError};
use crate::endian::{u16_to_file, u32_to_file};
use crate::storage::{ResourceReader, Storage};

/// Magic tag at the start of a terrain type file
pub const TERRAIN_TYPES_TAG: [u8; 4] = *b"ttyp";

/// Surface classification of a tile texture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum TerrainType {
    #[default]
    Sand = 0,
    SandyBrush = 1,
    BakedEarth = 2,
    GreenMud = 3,
    RedBrush = 4,
    PinkRock = 5,
    Road = 6,
    Water = 7,
    CliffFace = 8,
    Rubble = 9,
    SheetIce = 10,
    Slush = 11,
    /// Count marker; still accepted as a stored value
    Max = 12,
}

impl TerrainType {
    /// Largest raw value a table may contain
    pub const TER_MAX: u16 = TerrainType::Max as u16;

    pub const ALL: [TerrainType; 13] = [
        TerrainType::Sand,
        TerrainType::SandyBrush,
        TerrainType::BakedEarth,
        TerrainType::GreenMud,
        TerrainType::RedBrush,
        TerrainType::PinkRock,
        TerrainType::Road,
        TerrainType::Water,
        TerrainType::CliffFace,
        TerrainType::Rubble,
        TerrainType::SheetIce,
        TerrainType::Slush,
        TerrainType::Max,
    ];

    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn raw(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for TerrainType {
    type Error = u16;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(raw)
    }
}

/// Tileset family, recognised from a table's leading entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tileset {
    Arizona,
    Urban,
    Rockies,
}

impl Tileset {
    pub fn label(&self) -> &'static str {
        match self {
            Tileset::Arizona => "arizona",
            Tileset::Urban => "urban",
            Tileset::Rockies => "rockies",
        }
    }
}

/// Decoded terrain type table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTable")]
pub struct TerrainTypeTable {
    /// Number of meaningful slots, after clamping
    pub count: u32,
    /// Version as stored in the file
    pub version: u32,
    /// Slot types; slots past `count` stay `Sand`
    #[serde(with = "slots")]
    pub types: [TerrainType; MAX_TILE_TEXTURES],
}

/// Serialized form, checked before it becomes a [`TerrainTypeTable`]
#[derive(Deserialize)]
struct StoredTable {
    count: u32,
    version: u32,
    #[serde(with = "slots")]
    types: [TerrainType; MAX_TILE_TEXTURES],
}

impl TryFrom<StoredTable> for TerrainTypeTable {
    type Error = String;

    fn try_from(stored: StoredTable) -> Result<Self, Self::Error> {
        if stored.count > MAX_TERRAIN_TYPE_COUNT {
            return Err(format!(
                "terrain type count {} exceeds {}",
                stored.count, MAX_TERRAIN_TYPE_COUNT
            ));
        }
        Ok(Self {
            count: stored.count,
            version: stored.version,
            types: stored.types,
        })
    }
}

impl TerrainTypeTable {
    pub fn new(version: u32) -> Self {
        Self {
            count: 0,
            version,
            types: [TerrainType::default(); MAX_TILE_TEXTURES],
        }
    }

    /// The first `count` slots
    pub fn active(&self) -> &[TerrainType] {
        &self.types[..self.count.min(MAX_TERRAIN_TYPE_COUNT) as usize]
    }

    /// Append a slot type, or `false` once the table is full
    pub fn push(&mut self, terrain: TerrainType) -> bool {
        if self.count >= MAX_TERRAIN_TYPE_COUNT {
            return false;
        }
        self.types[self.count as usize] = terrain;
        self.count += 1;
        true
    }

    /// Tileset signature carried by the first three slots
    pub fn tileset(&self) -> Option<Tileset> {
        use TerrainType::*;

        match [self.types[0], self.types[1], self.types[2]] {
            [SandyBrush, Sand, BakedEarth] => Some(Tileset::Arizona),
            [BakedEarth, BakedEarth, BakedEarth] => Some(Tileset::Urban),
            [Sand, Sand, BakedEarth] => Some(Tileset::Rockies),
            _ => None,
        }
    }
}

/// Load `<base_path>/ttypes.ttp`, or `None` if missing or invalid
pub fn load_terrain_types(storage: &Storage, base_path: &str) -> Option<TerrainTypeTable> {
    try_load_terrain_types(storage, base_path)
        .inspect_err(LoadError::log)
        .ok()
}

/// Load `<base_path>/ttypes.ttp`, keeping the reason for a failure
pub fn try_load_terrain_types(
    storage: &Storage,
    base_path: &str,
) -> Result<TerrainTypeTable, LoadError> {
    let path = terrain_types_path(base_path);
    let mut reader = storage.open_read(&path).map_err(|e| {
        log::trace!("open {} failed: {}", path, e);
        LoadError::ResourceNotFound(path.clone())
    })?;
    read_terrain_types(&mut reader)
}

/// Decode a terrain type table from an open resource
pub fn read_terrain_types(reader: &mut ResourceReader) -> Result<TerrainTypeTable, LoadError> {
    let (version, declared) = read_header(reader, &TERRAIN_TYPES_TAG)?;

    let count = if declared >= MAX_TILE_TEXTURES as u32 {
        // Map editors over-report the count; keep what fits
        log::debug!(
            "{}: terrain type count {} clamped to {}",
            reader.path(),
            declared,
            MAX_TERRAIN_TYPE_COUNT
        );
        MAX_TERRAIN_TYPE_COUNT
    } else {
        declared
    };

    let mut table = TerrainTypeTable::new(version);
    table.count = count;
    for index in 0..count as usize {
        let raw = reader.read_u16_le().ok_or_else(|| LoadError::TruncatedRecord {
            path: reader.path().to_string(),
            index,
            field: "type",
        })?;
        table.types[index] = TerrainType::from_raw(raw).ok_or_else(|| LoadError::OutOfRangeValue {
            path: reader.path().to_string(),
            index,
            value: raw as u32,
        })?;
    }

    log::debug!("{}: terrain version {}, {} types", reader.path(), version, count);
    Ok(table)
}

/// Encode a terrain type table
pub fn encode_terrain_types(table: &TerrainTypeTable) -> Vec<u8> {
    let active = table.active();
    let mut out = Vec::with_capacity(12 + active.len() * 2);
    out.extend_from_slice(&TERRAIN_TYPES_TAG);
    out.extend_from_slice(&u32_to_file(table.version));
    out.extend_from_slice(&u32_to_file(table.count));
    for terrain in active {
        out.extend_from_slice(&u16_to_file(terrain.raw()));
    }
    out
}

/// Serde for the slot array, which is longer than serde's built-in arrays
mod slots {
    use super::{TerrainType, MAX_TILE_TEXTURES};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        types: &[TerrainType; MAX_TILE_TEXTURES],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        types.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[TerrainType; MAX_TILE_TEXTURES], D::Error> {
        let list = Vec::<TerrainType>::deserialize(deserializer)?;
        if list.len() > MAX_TILE_TEXTURES {
            return Err(D::Error::custom(format!(
                "too many terrain types ({} > {})",
                list.len(),
                MAX_TILE_TEXTURES
            )));
        }
        let mut types = [TerrainType::default(); MAX_TILE_TEXTURES];
        types[..list.len()].copy_from_slice(&list);
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, MemoryStorage};

    fn raw_file(version: u32, count: u32, entries: &[u16]) -> Vec<u8> {
        let mut out = b"ttyp".to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        for e in entries {
            out.extend_from_slice(&e.to_le_bytes());
        }
        out
    }

    fn storage_with(bytes: Vec<u8>) -> Storage {
        MemoryStorage::new()
            .with_file("maps/Rush/ttypes.ttp", bytes)
            .into()
    }

    #[test]
    fn test_basic_table() {
        let storage = storage_with(raw_file(7, 4, &[1, 0, 2, 7]));
        let table = load_terrain_types(&storage, "maps/Rush").unwrap();

        assert_eq!(table.version, 7);
        assert_eq!(table.count, 4);
        assert_eq!(
            table.active(),
            &[
                TerrainType::SandyBrush,
                TerrainType::Sand,
                TerrainType::BakedEarth,
                TerrainType::Water
            ]
        );
        assert!(table.types[4..].iter().all(|&t| t == TerrainType::Sand));
    }

    #[test]
    fn test_trailing_slash_base() {
        let storage = storage_with(raw_file(1, 1, &[3]));
        let table = load_terrain_types(&storage, "maps/Rush/").unwrap();
        assert_eq!(table.active(), &[TerrainType::GreenMud]);
    }

    #[test]
    fn test_count_clamp() {
        for declared in [255u32, 256, 1000, u32::MAX] {
            let storage = storage_with(raw_file(1, declared, &[0; 256]));
            let table = load_terrain_types(&storage, "maps/Rush").unwrap();
            assert_eq!(table.count, 254, "declared {}", declared);
        }

        let storage = storage_with(raw_file(1, 254, &[0; 254]));
        assert_eq!(load_terrain_types(&storage, "maps/Rush").unwrap().count, 254);

        let storage = storage_with(raw_file(1, 0, &[]));
        assert_eq!(load_terrain_types(&storage, "maps/Rush").unwrap().count, 0);
    }

    #[test]
    fn test_clamped_load_stops_reading() {
        let mut entries = vec![0u16; 256];
        // Past the clamped count; never looked at
        entries[254] = 9999;
        entries[255] = 9999;
        let bytes = raw_file(1, 256, &entries);
        let storage = MemoryStorage::new().with_file("ttypes.ttp", bytes.clone());

        let mut reader = storage.open_read("ttypes.ttp").unwrap();
        let table = read_terrain_types(&mut reader).unwrap();
        assert_eq!(table.count, 254);
        assert_eq!(reader.consumed(), 12 + 254 * 2);
        assert_eq!(reader.consumed() as usize, bytes.len() - 4);
    }

    #[test]
    fn test_ter_max_is_accepted() {
        let storage = storage_with(raw_file(1, 2, &[TerrainType::TER_MAX, 0]));
        let table = load_terrain_types(&storage, "maps/Rush").unwrap();
        assert_eq!(table.types[0], TerrainType::Max);
    }

    #[test]
    fn test_out_of_range_rejects_table() {
        let storage = storage_with(raw_file(1, 3, &[0, TerrainType::TER_MAX + 1, 0]));
        assert!(load_terrain_types(&storage, "maps/Rush").is_none());
        assert_eq!(
            try_load_terrain_types(&storage, "maps/Rush").unwrap_err(),
            LoadError::OutOfRangeValue {
                path: "maps/Rush/ttypes.ttp".into(),
                index: 1,
                value: 13,
            }
        );

        for position in [0usize, 5, 9] {
            let mut entries = vec![2u16; 10];
            entries[position] = 9999;
            let storage = storage_with(raw_file(1, 10, &entries));
            assert!(load_terrain_types(&storage, "maps/Rush").is_none());
        }
    }

    #[test]
    fn test_short_entries() {
        let storage = storage_with(raw_file(1, 5, &[0, 1, 2]));
        assert!(matches!(
            try_load_terrain_types(&storage, "maps/Rush"),
            Err(LoadError::TruncatedRecord { index: 3, .. })
        ));
    }

    #[test]
    fn test_bad_header() {
        let mut bytes = raw_file(1, 1, &[0]);
        bytes[..4].copy_from_slice(b"feat");
        let storage = storage_with(bytes);
        assert!(matches!(
            try_load_terrain_types(&storage, "maps/Rush"),
            Err(LoadError::MalformedHeader { .. })
        ));

        let storage = storage_with(b"ttyp\x01\0\0".to_vec());
        assert!(load_terrain_types(&storage, "maps/Rush").is_none());
    }

    #[test]
    fn test_missing_base_path() {
        let storage = storage_with(raw_file(1, 0, &[]));
        let err = try_load_terrain_types(&storage, "maps/Nowhere").unwrap_err();
        assert_eq!(err, LoadError::ResourceNotFound("maps/Nowhere/ttypes.ttp".into()));

        let dir = tempfile::TempDir::new().unwrap();
        let local: Storage = LocalStorage::with_base_dir(dir.path()).into();
        assert!(load_terrain_types(&local, "does/not/exist").is_none());
    }

    #[test]
    fn test_tileset_signatures() {
        let cases: [(&[u16], Option<Tileset>); 4] = [
            (&[1, 0, 2, 5], Some(Tileset::Arizona)),
            (&[2, 2, 2], Some(Tileset::Urban)),
            (&[0, 0, 2, 8], Some(Tileset::Rockies)),
            (&[7, 7, 7], None),
        ];
        for (entries, expected) in cases {
            let storage = storage_with(raw_file(1, entries.len() as u32, entries));
            let table = load_terrain_types(&storage, "maps/Rush").unwrap();
            assert_eq!(table.tileset(), expected);
        }
    }

    #[test]
    fn test_encode_round_trip() {
        let mut table = TerrainTypeTable::new(3);
        for t in [TerrainType::Road, TerrainType::CliffFace, TerrainType::Slush] {
            assert!(table.push(t));
        }

        let bytes = encode_terrain_types(&table);
        assert_eq!(bytes, raw_file(3, 3, &[6, 8, 11]));

        let storage = storage_with(bytes);
        assert_eq!(load_terrain_types(&storage, "maps/Rush").unwrap(), table);
    }

    #[test]
    fn test_push_stops_at_clamp() {
        let mut table = TerrainTypeTable::new(1);
        for _ in 0..254 {
            assert!(table.push(TerrainType::Water));
        }
        assert!(!table.push(TerrainType::Water));
        assert_eq!(table.count, 254);
    }

    #[test]
    fn test_raw_conversion() {
        assert_eq!(TerrainType::from_raw(12), Some(TerrainType::Max));
        assert_eq!(TerrainType::from_raw(13), None);
        assert_eq!(TerrainType::try_from(4u16), Ok(TerrainType::RedBrush));
        assert_eq!(TerrainType::try_from(40u16), Err(40));
        for t in TerrainType::ALL {
            assert_eq!(TerrainType::from_raw(t.raw()), Some(t));
        }
    }

    #[test]
    fn test_serde_table() {
        let mut table = TerrainTypeTable::new(2);
        table.push(TerrainType::Rubble);

        let text = ron::to_string(&table).unwrap();
        let back: TerrainTypeTable = ron::from_str(&text).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_serde_rejects_oversized_count() {
        let mut table = TerrainTypeTable::new(2);
        table.push(TerrainType::Rubble);

        let text = ron::to_string(&table).unwrap().replacen("count:1", "count:300", 1);
        assert!(text.contains("count:300"));
        assert!(ron::from_str::<TerrainTypeTable>(&text).is_err());

        let text = ron::to_string(&table).unwrap().replacen("count:1", "count:254", 1);
        let edge: TerrainTypeTable = ron::from_str(&text).unwrap();
        assert_eq!(edge.active().len(), 254);
    }

    #[test]
    fn test_active_never_overruns() {
        let mut table = TerrainTypeTable::new(1);
        table.count = 1000;
        assert_eq!(table.active().len(), 254);
    }
}
