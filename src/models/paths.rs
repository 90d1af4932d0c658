use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Canonical path separator used throughout the crate.
///
/// BSA archives and game INI values use backslashes; loose files on disk may
/// use either depending on platform. Every path entering the crate is
/// rewritten to forward slashes so the two spellings collapse to one key.
pub const CANONICAL_SEPARATOR: char = '/';

/// The logical identity of a file inside the virtual file system.
///
/// A `VirtualPath` keeps two forms of the same relative path:
/// - the **display form**: separators canonicalized to `/`, original letter
///   case preserved (this is what gets joined back onto the data directory
///   when a loose file is read);
/// - the **key**: the display form lowercased.
///
/// Equality, hashing and ordering go through the key exclusively, so
/// `Textures\Rock_P.dds` and `textures/rock_p.dds` are the same map entry.
#[derive(Debug, Clone)]
pub struct VirtualPath {
    display: String,
    key: String,
}

impl VirtualPath {
    /// Create a virtual path from any relative path spelling.
    pub fn new(path: impl AsRef<str>) -> Self {
        let display = path.as_ref().replace('\\', "/");
        let key = display.to_lowercase();
        Self { display, key }
    }

    /// The display form with original letter case.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The lowercase normalized key all comparisons use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A copy of this path in canonical lowercase form.
    ///
    /// Classified asset sets hand these to downstream consumers so path
    /// comparisons stay stable without re-normalizing on every lookup.
    pub fn to_canonical(&self) -> Self {
        Self {
            display: self.key.clone(),
            key: self.key.clone(),
        }
    }

    /// Case-insensitive suffix test against the normalized key.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.key.ends_with(&suffix.to_lowercase())
    }

    /// Case-insensitive prefix test against the normalized key.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.key.starts_with(&prefix.to_lowercase())
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl PartialEq for VirtualPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for VirtualPath {}

impl Hash for VirtualPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for VirtualPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for VirtualPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl Serialize for VirtualPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for VirtualPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}
