//! Plugin load-order and game INI readers.
//!
//! The load-order file is the authority on plugin precedence: one plugin
//! per line, lowest priority first. The game INI `[Archive]` section seeds
//! the archive priority list before any plugin-driven discovery happens.

use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use ini::Ini;
use thiserror::Error;

use crate::models::ARCHIVE_LIST_FIELDS;

/// Errors from the load-order reader.
#[derive(Error, Debug)]
pub enum LoadOrderError {
    /// The load-order source could not be read. Fatal: no meaningful
    /// resolution is possible without plugin precedence.
    #[error("load order source unreadable: {path}: {source}")]
    SourceUnreadable {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Read the ordered plugin list from a load-order file.
///
/// Lines starting with `#` and blank lines are ignored; everything else is
/// returned verbatim, in file order, lowest priority first. No
/// deduplication happens here — the source format guarantees one line per
/// plugin, and a malformed source should be visible downstream rather than
/// silently repaired.
///
/// # Arguments
/// * `path` - Path to the load-order file (e.g. `loadorder.txt`)
/// * `trim_extension` - If true, strip each entry at its last `.`
pub fn read_load_order(path: &Utf8Path, trim_extension: bool) -> Result<Vec<String>, LoadOrderError> {
    let file = File::open(path).map_err(|source| LoadOrderError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut plugins = Vec::new();

    for line_result in reader.lines() {
        let line = line_result.map_err(|source| LoadOrderError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = if trim_extension {
            match line.rfind('.') {
                Some(idx) => line[..idx].to_string(),
                None => line,
            }
        } else {
            line
        };

        plugins.push(entry);
    }

    tracing::debug!("Plugin load order: {}", plugins.join(","));
    Ok(plugins)
}

/// Read the comma-separated archive names from the `[Archive]` section of
/// the game INI files.
///
/// `ini_paths` is in ascending precedence: for each field, the value from
/// the last INI defining it wins, mirroring how the game layers its custom
/// INI over the base one. A missing file or field is skipped with a log —
/// never an error. Tokens are whitespace-trimmed; field values concatenate
/// in field-declaration order.
pub fn read_archive_fields(ini_paths: &[Utf8PathBuf]) -> Vec<String> {
    let mut documents = Vec::new();
    for path in ini_paths {
        if !path.exists() {
            tracing::debug!("Game INI not present, skipping: {}", path);
            continue;
        }
        match Ini::load_from_file(path.as_std_path()) {
            Ok(ini) => documents.push(ini),
            Err(e) => {
                tracing::warn!("Unable to read game INI {}: {}", path, e);
            }
        }
    }

    let mut archives = Vec::new();
    for field in ARCHIVE_LIST_FIELDS {
        // Highest-precedence INI defining the field wins.
        let value = documents
            .iter()
            .rev()
            .find_map(|ini| ini.get_from(Some("Archive"), field));

        let Some(value) = value else {
            tracing::info!("Unable to find {} in [Archive] section in game ini: Ignoring.", field);
            continue;
        };

        for token in value.split(',') {
            let token = token.trim();
            if !token.is_empty() {
                archives.push(token.to_string());
            }
        }
    }

    archives
}
