use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;

/// File extension of an archive container, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "bsa";

/// Plugin metadata extensions excluded from loose-file enumeration.
pub const PLUGIN_EXTENSIONS: [&str; 3] = ["esp", "esl", "esm"];

/// Origin name reported for files supplied by the override directory.
pub const LOOSE_FILES_MARKER: &str = "LOOSE_FILES";

/// An archive container referenced by the load order or the game INI.
///
/// `name` is the bare file name as it appears in INI values and next to
/// plugins; `path` is where the file is expected on disk. The path may not
/// exist — an INI can list archives that were never installed, which the
/// VFS builder skips with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRef {
    pub name: String,
    pub path: Utf8PathBuf,
}

impl ArchiveRef {
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a virtual file's bytes come from.
///
/// Loose files always outrank archives; among archives, the one later in
/// the priority list wins. The VFS builder realizes this by processing
/// archives in ascending priority and overwriting, then overlaying loose
/// files last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOrigin {
    /// Supplied by a specific archive container.
    Archive(Arc<ArchiveRef>),
    /// Supplied by the loose-file override directory.
    Loose,
}

impl FileOrigin {
    /// The origin name used for archive-blocklist matching: the archive
    /// file name, or the loose-files marker.
    pub fn name(&self) -> &str {
        match self {
            FileOrigin::Archive(archive) => &archive.name,
            FileOrigin::Loose => LOOSE_FILES_MARKER,
        }
    }

    pub fn is_loose(&self) -> bool {
        matches!(self, FileOrigin::Loose)
    }
}

impl fmt::Display for FileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_name_for_archive() {
        let archive = Arc::new(ArchiveRef::new("Skyrim - Textures.bsa", "data/Skyrim - Textures.bsa"));
        let origin = FileOrigin::Archive(archive);
        assert_eq!(origin.name(), "Skyrim - Textures.bsa");
        assert!(!origin.is_loose());
    }

    #[test]
    fn test_origin_name_for_loose() {
        let origin = FileOrigin::Loose;
        assert_eq!(origin.name(), LOOSE_FILES_MARKER);
        assert!(origin.is_loose());
    }
}
