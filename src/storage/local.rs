//! Local filesystem storage backend
//!
//! Maps virtual paths onto a base directory. All operations complete
//! immediately.

use super::{ResourceReader, StorageError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

/// Local filesystem storage backend
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Base directory for relative paths (usually current working directory)
    base_dir: PathBuf,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorage {
    /// Create a new local storage backend rooted at the current directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }

    /// Create a local storage backend with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a virtual path relative to the base directory
    ///
    /// Absolute paths and `..` segments are refused so a map can never
    /// name a file outside the storage root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        Ok(self.base_dir.join(relative))
    }

    /// Open a file for buffered reading
    pub fn open_read(&self, path: &str) -> Result<ResourceReader, StorageError> {
        let full_path = self.resolve(path)?;
        if full_path.is_dir() {
            return Err(StorageError::NotFound(format!("{} is a directory", path)));
        }
        let file = File::open(&full_path)?;
        Ok(ResourceReader::new(path, Box::new(BufReader::new(file))))
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// List sub-directories of a directory
    ///
    /// Returns directory names (not full paths), sorted.
    pub fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let full_path = self.resolve(path)?;
        let mut dirs: Vec<String> = std::fs::read_dir(&full_path)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}
