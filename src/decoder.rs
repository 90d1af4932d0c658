//! Seams to the external binary-format collaborators.
//!
//! Decoding archive containers and image data is out of scope for this
//! crate; the host application plugs implementations in through the traits
//! here. The pipeline treats both as black boxes: it asks an archive for
//! its contained paths and for entry bytes, and asks an image probe one
//! question about a texture's alpha channel.

use camino::Utf8Path;
use thiserror::Error;

use crate::models::VirtualPath;

/// A collaborator-side decode failure.
///
/// Decode failures are never fatal to a run: the affected archive or image
/// is skipped with a warning and the pipeline continues.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("archive decode failed: {0}")]
    Archive(String),

    #[error("image decode failed: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens archive containers by path.
///
/// One handle is open at a time during the VFS build pass; the returned
/// [`OpenedArchive`] is dropped before the next archive is opened.
pub trait ArchiveDecoder {
    fn open(&self, path: &Utf8Path) -> Result<Box<dyn OpenedArchive>, DecodeError>;
}

/// A single opened archive container.
pub trait OpenedArchive {
    /// Virtual paths of every entry in the archive.
    fn paths(&self) -> Vec<VirtualPath>;

    /// Bytes of one entry.
    fn read(&self, path: &VirtualPath) -> Result<Vec<u8>, DecodeError>;
}

/// Answers whether a decoded image's alpha channel is uniformly opaque.
///
/// Used by the complex-material refinement pass: an environment-map
/// texture with a non-opaque alpha channel carries material data.
pub trait ImageProbe {
    fn alpha_is_all_opaque(&self, data: &[u8]) -> Result<bool, DecodeError>;
}
