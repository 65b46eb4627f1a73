//! In-memory storage backend
//!
//! Holds resources as byte blobs keyed by virtual path. Used for data
//! embedded in a binary and for tests.

use super::{ResourceReader, StorageError};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.files.insert(path.into(), Arc::from(data));
    }

    /// Builder form of [`MemoryStorage::insert`]
    pub fn with_file(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn open_read(&self, path: &str) -> Result<ResourceReader, StorageError> {
        let data = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        Ok(ResourceReader::new(path, Box::new(Cursor::new(data))))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
