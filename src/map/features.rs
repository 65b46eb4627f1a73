//! Feature list loading (`feat.bjo`)
//!
//! ```text
//! tag "feat" | version u32 | count u32 | record[count]
//! record: name[40|60] | id | x | y | z | direction | player
//!       | in_fire | burn_start | burn_damage | [visibility[8]]
//! ```
//!
//! All integers are little-endian u32. Names are 40 bytes up to version
//! 19 and 60 bytes after; the visibility block exists from version 14.

use serde::{Deserialize, Serialize};

use super::fixed_str::FixedStr;
use super::limits::{FEATURE_NAME_CAPACITY, FEATURE_SCRIPT_CAPACITY};
use super::{read_header, LoadError};
use crate::endian::u32_to_file;
use crate::storage::{ResourceReader, Storage};

/// Magic tag at the start of a feature file
pub const FEATURES_TAG: [u8; 4] = *b"feat";

/// Size of the per-player visibility block in newer files
const VISIBILITY_LEN: usize = 8;

/// Legacy runtime state stored after each record's fields
const RESERVED_FIELDS: [&str; 3] = ["in_fire", "burn_start", "burn_damage"];

/// Upper bound on up-front allocation; the declared count is untrusted
const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// On-disk record layout, chosen once per file from its version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureFormat {
    /// Versions up to 13: 40-byte names, no visibility
    Classic,
    /// Versions 14 to 19: 40-byte names, visibility block
    Visible,
    /// Versions 20 and later: 60-byte names, visibility block
    Extended,
}

impl FeatureFormat {
    pub fn for_version(version: u32) -> Self {
        match version {
            0..=13 => FeatureFormat::Classic,
            14..=19 => FeatureFormat::Visible,
            _ => FeatureFormat::Extended,
        }
    }

    /// Bytes in the embedded name field
    pub fn name_len(self) -> usize {
        match self {
            FeatureFormat::Classic | FeatureFormat::Visible => 40,
            FeatureFormat::Extended => 60,
        }
    }

    pub fn has_visibility(self) -> bool {
        !matches!(self, FeatureFormat::Classic)
    }

    /// Bytes per record on disk
    pub fn record_len(self) -> usize {
        let visibility = if self.has_visibility() { VISIBILITY_LEN } else { 0 };
        self.name_len() + 9 * 4 + visibility
    }
}

const _: () = assert!(60 <= FEATURE_NAME_CAPACITY);

/// One placed feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: u32,
    /// Owning player; always 0 after loading
    pub player: u32,
    /// Reference into the feature catalog, resolved by the caller
    pub type_tag: i32,
    pub name: FixedStr<FEATURE_NAME_CAPACITY>,
    /// Script reference, not stored in feature files
    pub script: FixedStr<FEATURE_SCRIPT_CAPACITY>,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub direction: u32,
}

/// Decoded feature list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Version as stored in the file
    pub version: u32,
    /// Records in file order
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            records: Vec::new(),
        }
    }

    pub fn format(&self) -> FeatureFormat {
        FeatureFormat::for_version(self.version)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureRecord> {
        self.records.iter()
    }
}

/// Load a feature list, or `None` if it is missing or unreadable
pub fn load_features(storage: &Storage, resource_name: &str) -> Option<FeatureTable> {
    try_load_features(storage, resource_name)
        .inspect_err(LoadError::log)
        .ok()
}

/// Load a feature list, keeping the reason for a failure
pub fn try_load_features(storage: &Storage, resource_name: &str) -> Result<FeatureTable, LoadError> {
    let mut reader = storage.open_read(resource_name).map_err(|e| {
        log::trace!("open {} failed: {}", resource_name, e);
        LoadError::ResourceNotFound(resource_name.to_string())
    })?;
    read_features(&mut reader)
}

/// Decode a feature list from an open resource
pub fn read_features(reader: &mut ResourceReader) -> Result<FeatureTable, LoadError> {
    let (version, count) = read_header(reader, &FEATURES_TAG)?;
    let format = FeatureFormat::for_version(version);
    log::debug!(
        "{}: feature version {} ({:?}), {} records",
        reader.path(),
        version,
        format,
        count
    );

    let mut records = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_RECORDS));
    for index in 0..count as usize {
        records.push(read_record(reader, format, index)?);
    }

    Ok(FeatureTable { version, records })
}

fn read_record(
    reader: &mut ResourceReader,
    format: FeatureFormat,
    index: usize,
) -> Result<FeatureRecord, LoadError> {
    let path = reader.path().to_string();
    let truncated = |field: &'static str| LoadError::TruncatedRecord {
        path: path.clone(),
        index,
        field,
    };

    let mut name_buf = [0u8; 60];
    let name_len = format.name_len();
    if reader.read_bytes(&mut name_buf[..name_len]) != name_len {
        return Err(truncated("name"));
    }
    let name = FixedStr::from_bytes(&name_buf[..name_len]).unwrap_or_default();

    let mut field = |what: &'static str| reader.read_u32_le().ok_or_else(|| truncated(what));
    let id = field("id")?;
    let x = field("x")?;
    let y = field("y")?;
    let z = field("z")?;
    let direction = field("direction")?;
    let stored_player = field("player")?;
    // Transient simulation state, never restored
    for reserved in RESERVED_FIELDS {
        field(reserved)?;
    }

    if stored_player != 0 {
        log::trace!("{}: feature {} owner {} reset to 0", path, id, stored_player);
    }

    if format.has_visibility() && !reader.skip(VISIBILITY_LEN) {
        return Err(truncated("visibility"));
    }

    Ok(FeatureRecord {
        id,
        // work around invalid feature owner
        player: 0,
        type_tag: 0,
        name,
        script: FixedStr::new(),
        x,
        y,
        z,
        direction,
    })
}

/// Encode a feature list in the layout selected by `table.version`
///
/// Reserved fields and visibility are written as zeros. Names longer than
/// the format's name field are cut to fit.
pub fn encode_features(table: &FeatureTable) -> Vec<u8> {
    let format = table.format();
    let mut out = Vec::with_capacity(12 + table.records.len() * format.record_len());
    out.extend_from_slice(&FEATURES_TAG);
    out.extend_from_slice(&u32_to_file(table.version));
    out.extend_from_slice(&u32_to_file(table.records.len() as u32));

    for record in &table.records {
        let mut name_field = [0u8; 60];
        let text = record.name.text_bytes();
        let n = text.len().min(format.name_len());
        name_field[..n].copy_from_slice(&text[..n]);
        out.extend_from_slice(&name_field[..format.name_len()]);

        for value in [
            record.id,
            record.x,
            record.y,
            record.z,
            record.direction,
            record.player,
            0,
            0,
            0,
        ] {
            out.extend_from_slice(&u32_to_file(value));
        }
        if format.has_visibility() {
            out.extend_from_slice(&[0u8; VISIBILITY_LEN]);
        }
    }
    out
}
