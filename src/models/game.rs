use camino::{Utf8Path, Utf8PathBuf};

/// `[Archive]` section fields holding comma-separated archive lists, in the
/// order the game concatenates them.
pub const ARCHIVE_LIST_FIELDS: [&str; 2] = ["sResourceArchiveList", "sResourceArchiveList2"];

/// Supported game editions.
///
/// Each edition carries the INI file names its settings live in. Locating
/// the installation itself is the host application's job; this crate only
/// consumes the paths handed to it through [`GameProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameType {
    SkyrimSe,
    SkyrimVr,
    SkyrimLe,
}

impl GameType {
    /// Base INI file name for this edition.
    pub fn ini_name(&self) -> &'static str {
        match self {
            GameType::SkyrimSe | GameType::SkyrimLe => "Skyrim.ini",
            GameType::SkyrimVr => "SkyrimVR.ini",
        }
    }

    /// Custom-override INI file name. Values here win over the base INI.
    pub fn custom_ini_name(&self) -> &'static str {
        match self {
            GameType::SkyrimSe | GameType::SkyrimLe => "SkyrimCustom.ini",
            GameType::SkyrimVr => "SkyrimVRCustom.ini",
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            GameType::SkyrimSe => "Skyrim SE",
            GameType::SkyrimVr => "Skyrim VR",
            GameType::SkyrimLe => "Skyrim LE",
        }
    }
}

/// Everything the resolution pipeline needs to know about one installation.
///
/// All paths are explicit: the data directory holding archives and loose
/// files, the plugin load-order file, and the INI files in ascending
/// precedence (base first, custom last).
#[derive(Debug, Clone)]
pub struct GameProfile {
    pub game: GameType,
    pub data_dir: Utf8PathBuf,
    pub load_order_path: Utf8PathBuf,
    pub ini_paths: Vec<Utf8PathBuf>,
}

impl GameProfile {
    pub fn new(
        game: GameType,
        data_dir: impl Into<Utf8PathBuf>,
        load_order_path: impl Into<Utf8PathBuf>,
        ini_paths: Vec<Utf8PathBuf>,
    ) -> Self {
        Self {
            game,
            data_dir: data_dir.into(),
            load_order_path: load_order_path.into(),
            ini_paths,
        }
    }

    /// Convenience constructor deriving the INI paths from a documents
    /// directory using the edition's conventional file names.
    pub fn with_document_dir(
        game: GameType,
        data_dir: impl Into<Utf8PathBuf>,
        load_order_path: impl Into<Utf8PathBuf>,
        document_dir: &Utf8Path,
    ) -> Self {
        let ini_paths = vec![
            document_dir.join(game.ini_name()),
            document_dir.join(game.custom_ini_name()),
        ];
        Self::new(game, data_dir, load_order_path, ini_paths)
    }
}
