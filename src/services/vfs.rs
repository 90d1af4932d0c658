//! Virtual file system construction and queries.
//!
//! The VFS is the single source of truth for "where does this logical file
//! come from". It is built once per run and frozen; afterwards any number
//! of readers may query it concurrently.
//!
//! # Precedence
//!
//! Archives are processed in ascending priority and each one overwrites
//! earlier entries for the same path — processing order IS the precedence
//! contract, so the last archive listed wins. Loose files are overlaid
//! last and win unconditionally, regardless of archive order.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use thiserror::Error;
use walkdir::WalkDir;

use crate::decoder::{ArchiveDecoder, DecodeError};
use crate::models::{ARCHIVE_EXTENSION, ArchiveRef, FileOrigin, GameProfile, PLUGIN_EXTENSIONS, VirtualPath};
use crate::services::archive_resolver::resolve_archive_priority;
use crate::services::load_order::{LoadOrderError, read_load_order};

/// Errors from VFS construction and byte fetches.
#[derive(Error, Debug)]
pub enum VfsError {
    #[error(transparent)]
    LoadOrder(#[from] LoadOrderError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no such virtual path: {0}")]
    PathNotFound(VirtualPath),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// The resolved `VirtualPath -> FileOrigin` mapping for one run.
///
/// Invariant: each path maps to exactly one origin, the highest-precedence
/// source available for it.
#[derive(Debug)]
pub struct VirtualFileSystem {
    files: IndexMap<VirtualPath, FileOrigin>,
    data_dir: Utf8PathBuf,
}

impl VirtualFileSystem {
    /// Run the full resolution pipeline for a profile: read the load order,
    /// resolve archive priority, then build the file map.
    pub fn discover(
        profile: &GameProfile,
        decoder: &dyn ArchiveDecoder,
    ) -> Result<Self, VfsError> {
        tracing::info!("Opening data folder \"{}\"", profile.data_dir);

        let load_order = read_load_order(&profile.load_order_path, true)?;
        let archives = resolve_archive_priority(profile, &load_order);
        Ok(Self::build(&archives, &profile.data_dir, decoder))
    }

    /// Build the file map from an already-resolved archive priority list
    /// plus the loose files under `data_dir`.
    pub fn build(
        archives: &[Arc<ArchiveRef>],
        data_dir: &Utf8Path,
        decoder: &dyn ArchiveDecoder,
    ) -> Self {
        let mut files = IndexMap::new();

        for archive in archives {
            // An INI or load-order reference to an archive that was never
            // installed is not fatal.
            if !archive.path.exists() {
                tracing::warn!("Skipping archive {} because it doesn't exist", archive.path);
                continue;
            }

            // The handle drops at the end of this iteration, so at most one
            // archive is open at a time.
            let opened = match decoder.open(&archive.path) {
                Ok(opened) => opened,
                Err(e) => {
                    tracing::warn!("Failed to decode archive {}: {} - skipping", archive.path, e);
                    continue;
                }
            };

            tracing::debug!("Reading file tree from {}.", archive.name);
            for path in opened.paths() {
                files.insert(path, FileOrigin::Archive(Arc::clone(archive)));
            }
        }

        add_loose_files(&mut files, data_dir);

        Self {
            files,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Origin of a virtual path, if resolved.
    pub fn lookup(&self, path: &VirtualPath) -> Option<&FileOrigin> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &VirtualPath) -> bool {
        self.files.contains_key(path)
    }

    /// All resolved entries, in insertion order (archive priority order,
    /// then loose-walk order).
    pub fn iter(&self) -> impl Iterator<Item = (&VirtualPath, &FileOrigin)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Fetch the bytes of a resolved file from its owning source.
    ///
    /// Loose files are read straight from disk; archive entries go through
    /// the decoder, reopening the owning archive for the duration of the
    /// call.
    pub fn read(
        &self,
        path: &VirtualPath,
        decoder: &dyn ArchiveDecoder,
    ) -> Result<Vec<u8>, VfsError> {
        let (stored, origin) = self
            .files
            .get_key_value(path)
            .ok_or_else(|| VfsError::PathNotFound(path.clone()))?;

        match origin {
            FileOrigin::Loose => {
                // The stored display form carries the on-disk spelling, so
                // this resolves on case-sensitive filesystems even when the
                // caller passed a differently-cased key.
                let disk_path = self.data_dir.join(stored.as_str());
                std::fs::read(disk_path.as_std_path()).map_err(|source| VfsError::Io {
                    path: disk_path,
                    source,
                })
            }
            FileOrigin::Archive(archive) => {
                let opened = decoder.open(&archive.path)?;
                Ok(opened.read(path)?)
            }
        }
    }
}

/// Overlay every loose file under `data_dir` onto the map, unconditionally
/// overwriting archive origins. Archive containers and plugin metadata
/// files are not assets and are excluded.
fn add_loose_files(files: &mut IndexMap<VirtualPath, FileOrigin>, data_dir: &Utf8Path) {
    for entry in WalkDir::new(data_dir.as_std_path())
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(data_dir.as_std_path()) else {
            continue;
        };
        let Some(relative) = relative.to_str() else {
            tracing::warn!("Skipping non-UTF-8 loose path: {}", entry.path().display());
            continue;
        };

        if is_excluded_extension(relative) {
            continue;
        }

        // Re-key rather than update in place: the stored display form must
        // be the on-disk spelling, not whatever an overridden archive entry
        // used.
        let path = VirtualPath::new(relative);
        files.shift_remove(&path);
        files.insert(path, FileOrigin::Loose);
    }
}

fn is_excluded_extension(path: &str) -> bool {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION)
        || PLUGIN_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p))
}
