//! Storage Abstraction Layer
//!
//! Read-only resource access for the map loaders. Paths are virtual,
//! `/`-separated names routed to one backend:
//! - [`LocalStorage`] → a directory on the local filesystem
//! - [`MemoryStorage`] → an in-memory path → bytes table
//!
//! Opening a resource yields a [`ResourceReader`] that owns the handle and
//! closes it when dropped, so every early return in a decoder releases it.

pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::io::Read;

/// Storage error types
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// File or directory not found
    NotFound(String),
    /// Permission denied
    PermissionDenied(String),
    /// Path escapes the storage root or is otherwise unusable
    InvalidPath(String),
    /// I/O error
    IoError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(path) => write!(f, "not found: {}", path),
            StorageError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StorageError::InvalidPath(path) => write!(f, "invalid path: {}", path),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(e.to_string()),
            _ => StorageError::IoError(e.to_string()),
        }
    }
}

/// An open resource
///
/// Reads never fail loudly: [`ResourceReader::read_bytes`] reports how many
/// bytes it actually got and the caller treats anything short as the end of
/// usable data. The underlying handle is closed on drop.
pub struct ResourceReader {
    path: String,
    inner: Box<dyn Read + Send>,
    consumed: u64,
}

impl ResourceReader {
    pub(crate) fn new(path: impl Into<String>, inner: Box<dyn Read + Send>) -> Self {
        let path = path.into();
        log::trace!("open {}", path);
        Self {
            path,
            inner,
            consumed: 0,
        }
    }

    /// Virtual path this reader was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Total bytes consumed so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Fill as much of `buf` as the resource allows
    ///
    /// Returns the number of bytes read. A value smaller than `buf.len()`
    /// means the resource ended or an I/O error occurred.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("read error in {}: {}", self.path, e);
                    break;
                }
            }
        }
        self.consumed += filled as u64;
        filled
    }

    /// Read exactly `N` bytes, or `None` on a short read
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut buf = [0u8; N];
        (self.read_bytes(&mut buf) == N).then_some(buf)
    }

    /// Read a little-endian `u16`
    pub fn read_u16_le(&mut self) -> Option<u16> {
        self.read_array::<2>().map(crate::endian::u16_from_file)
    }

    /// Read a little-endian `u32`
    pub fn read_u32_le(&mut self) -> Option<u32> {
        self.read_array::<4>().map(crate::endian::u32_from_file)
    }

    /// Read and throw away `len` bytes, returning false on a short read
    pub fn skip(&mut self, len: usize) -> bool {
        let mut scratch = [0u8; 64];
        let mut left = len;
        while left > 0 {
            let chunk = left.min(scratch.len());
            if self.read_bytes(&mut scratch[..chunk]) != chunk {
                return false;
            }
            left -= chunk;
        }
        true
    }
}

impl Drop for ResourceReader {
    fn drop(&mut self) {
        log::trace!("close {} after {} bytes", self.path, self.consumed);
    }
}

impl fmt::Debug for ResourceReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReader")
            .field("path", &self.path)
            .field("consumed", &self.consumed)
            .finish()
    }
}

/// Storage mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Local filesystem directory
    Local,
    /// In-memory table
    Memory,
}

impl StorageMode {
    /// Human-readable label for the storage mode
    pub fn label(&self) -> &'static str {
        match self {
            StorageMode::Local => "Local",
            StorageMode::Memory => "Memory",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage - Unified read access over one backend
// ─────────────────────────────────────────────────────────────────────────────

/// Unified storage handed to the loaders
///
/// Shared by reference; loads never mutate it, so one `Storage` can serve
/// concurrent loads from several threads.
#[derive(Debug, Clone)]
pub enum Storage {
    Local(LocalStorage),
    Memory(MemoryStorage),
}

impl Storage {
    /// Storage rooted at the current directory
    pub fn new() -> Self {
        Storage::Local(LocalStorage::new())
    }

    /// Storage rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<std::path::PathBuf>) -> Self {
        Storage::Local(LocalStorage::with_base_dir(base_dir))
    }

    pub fn mode(&self) -> StorageMode {
        match self {
            Storage::Local(_) => StorageMode::Local,
            Storage::Memory(_) => StorageMode::Memory,
        }
    }

    /// Open a resource for reading
    pub fn open_read(&self, path: &str) -> Result<ResourceReader, StorageError> {
        match self {
            Storage::Local(local) => local.open_read(path),
            Storage::Memory(memory) => memory.open_read(path),
        }
    }

    /// Check if a resource exists
    pub fn exists(&self, path: &str) -> bool {
        match self {
            Storage::Local(local) => local.exists(path),
            Storage::Memory(memory) => memory.exists(path),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl From<LocalStorage> for Storage {
    fn from(local: LocalStorage) -> Self {
        Storage::Local(local)
    }
}

impl From<MemoryStorage> for Storage {
    fn from(memory: MemoryStorage) -> Self {
        Storage::Memory(memory)
    }
}

/// Join a virtual directory and a file name with a single `/`
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8]) -> ResourceReader {
        ResourceReader::new("test.bin", Box::new(Cursor::new(bytes.to_vec())))
    }

    #[test]
    fn test_read_bytes_reports_short_reads() {
        let mut r = reader(&[1, 2, 3]);
        let mut buf = [0u8; 4];
        assert_eq!(r.read_bytes(&mut buf), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(r.read_bytes(&mut buf), 0);
        assert_eq!(r.consumed(), 3);
    }

    #[test]
    fn test_typed_reads() {
        let mut r = reader(&[0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xff]);
        assert_eq!(r.read_u16_le(), Some(0x1234));
        assert_eq!(r.read_u32_le(), Some(0x1234_5678));
        assert_eq!(r.read_u16_le(), None);
    }

    #[test]
    fn test_skip() {
        let mut r = reader(&[0u8; 100]);
        assert!(r.skip(90));
        assert_eq!(r.consumed(), 90);
        assert!(!r.skip(11));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("maps/Rush", "ttypes.ttp"), "maps/Rush/ttypes.ttp");
        assert_eq!(join_path("maps/Rush/", "ttypes.ttp"), "maps/Rush/ttypes.ttp");
        assert_eq!(join_path("", "ttypes.ttp"), "ttypes.ttp");
    }

    #[test]
    fn test_io_error_mapping() {
        let e = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(StorageError::from(e).is_not_found());
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert!(matches!(StorageError::from(e), StorageError::PermissionDenied(_)));
    }

    #[test]
    fn test_storage_mode() {
        let storage = Storage::from(MemoryStorage::new());
        assert_eq!(storage.mode(), StorageMode::Memory);
        assert_eq!(Storage::new().mode(), StorageMode::Local);
        assert_eq!(StorageMode::Local.label(), "Local");
    }
}
