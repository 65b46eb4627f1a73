//! Fixed-capacity byte strings
//!
//! On-disk names live in fixed-size character fields. `FixedStr<N>` keeps
//! that shape with an explicit stored length, and refuses to hold more
//! than `N` bytes instead of truncating.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Two values are equal when their text matches; NUL padding is ignored
#[derive(Clone, Copy)]
pub struct FixedStr<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> FixedStr<N> {
    pub const CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Copy raw field bytes, or `None` if they don't fit
    pub fn from_bytes(src: &[u8]) -> Option<Self> {
        if src.len() > N {
            return None;
        }
        let mut out = Self::new();
        out.bytes[..src.len()].copy_from_slice(src);
        out.len = src.len();
        Some(out)
    }

    /// Copy text, or `None` if it doesn't fit
    pub fn from_text(s: &str) -> Option<Self> {
        Self::from_bytes(s.as_bytes())
    }

    /// Bytes as stored, including any NUL padding
    pub fn raw(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Bytes up to the first NUL
    pub fn text_bytes(&self) -> &[u8] {
        let raw = self.raw();
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        &raw[..end]
    }

    /// Text up to the first NUL, invalid UTF-8 replaced
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.text_bytes())
    }

    /// Number of stored bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.text_bytes().is_empty()
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for FixedStr<N> {
    fn eq(&self, other: &Self) -> bool {
        self.text_bytes() == other.text_bytes()
    }
}

impl<const N: usize> Eq for FixedStr<N> {}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedStr<{}>({:?})", N, self.as_str())
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl<const N: usize> Serialize for FixedStr<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedStr<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_text(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("string too long ({} > {})", s.len(), N))
        })
    }
}
