//! Archive priority resolution.
//!
//! Reproduces the host game's archive load order: explicit INI directives
//! load first, then each plugin in load-order precedence pulls in the
//! archives named after it. The resulting list is the definitive precedence
//! order the VFS builder consumes — lowest priority first, highest last.

use std::fs;
use std::sync::Arc;

use camino::Utf8Path;

use crate::models::{ARCHIVE_EXTENSION, ArchiveRef, GameProfile};
use crate::services::load_order::read_archive_fields;

/// Compute the final ordered archive list for a profile.
///
/// `load_order` is the plugin list with extensions already stripped.
/// Ordering contract: INI-seeded archives first (field-declaration order),
/// then per-plugin discoveries in load-order precedence. Later entries
/// overwrite earlier ones during the VFS build, so position in this list IS
/// load priority.
pub fn resolve_archive_priority(
    profile: &GameProfile,
    load_order: &[String],
) -> Vec<Arc<ArchiveRef>> {
    let mut ordered: Vec<String> = Vec::new();

    for name in read_archive_fields(&profile.ini_paths) {
        push_unique(&mut ordered, name);
    }

    let on_disk = list_archives_in_dir(&profile.data_dir);

    for plugin in load_order {
        for name in find_archives_for_plugin(&on_disk, plugin) {
            push_unique(&mut ordered, name);
        }
    }

    tracing::debug!("Archive load order: {}", ordered.join(","));

    for name in &on_disk {
        if !ordered.contains(name) {
            tracing::warn!("Archive {} not loaded by any plugin.", name);
        }
    }

    ordered
        .into_iter()
        .map(|name| {
            let path = profile.data_dir.join(&name);
            Arc::new(ArchiveRef::new(name, path))
        })
        .collect()
}

/// Archive files physically present in the data directory (top level only,
/// case-insensitive extension match). Sorted case-insensitively so
/// discovery order is stable across platforms.
pub fn list_archives_in_dir(data_dir: &Utf8Path) -> Vec<String> {
    let entries = match fs::read_dir(data_dir.as_std_path()) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Unable to list data directory {}: {}", data_dir, e);
            return Vec::new();
        }
    };

    let mut archives = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let is_archive = name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if is_archive {
            archives.push(name.to_string());
        }
    }

    archives.sort_by_key(|name| name.to_lowercase());
    archives
}

/// Archives belonging to one plugin, in load order.
///
/// The exact-name archive (`<plugin>.bsa`) loads before the plugin's other
/// archives. Beyond that the game's rule is a prefix heuristic: after the
/// shared prefix, a digit or a `" -"` continuation is accepted; a bare
/// space or any other character marks the archive as belonging to a
/// different, similarly-prefixed plugin.
fn find_archives_for_plugin(archives: &[String], plugin: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for archive in archives {
        let Some(after_prefix) = archive.strip_prefix(plugin) else {
            continue;
        };

        if after_prefix.eq_ignore_ascii_case(".bsa") {
            // The plugin's own archive loads before any others.
            found.insert(0, archive.clone());
            continue;
        }

        // todo: Is this actually how the game handles BSA files? Example:
        // 3DNPC0.bsa and 3DNPC - Textures.bsa both load for 3DNPC.esp, but
        // the rule separating them from 3DNPCX.bsa is undocumented.
        if after_prefix.starts_with(' ') && !after_prefix.starts_with(" -") {
            continue;
        }

        if !after_prefix.starts_with(' ')
            && !after_prefix.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }

        found.push(archive.clone());
    }

    found
}

fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}
