// BethVFS - Load-order-aware virtual file system for Bethesda game data
//
// This is the library crate containing the resolution pipeline and data
// structures. The binary crate (main.rs) provides a load-order report CLI.

pub mod config;
pub mod decoder;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigError, LookupLists};
pub use decoder::{ArchiveDecoder, DecodeError, ImageProbe, OpenedArchive};
pub use models::{ArchiveRef, FileOrigin, GameProfile, GameType, VirtualPath};
pub use services::{AssetClassifier, LoadOrderError, VfsError, VirtualFileSystem};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
