//! Asset classification over the virtual file system.
//!
//! A classified set is the answer to "every file of this kind, from the
//! winning source only": suffix match first, then the category's allow and
//! block globs, then the archive blocklist against the owning source.
//! Output order follows VFS iteration order, deduplicated, with paths in
//! canonical lowercase form so downstream comparisons are stable.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;
use serde_yaml_ng::Value;

use crate::config::lookup_lists;
use crate::decoder::{ArchiveDecoder, ImageProbe};
use crate::models::VirtualPath;
use crate::services::vfs::VirtualFileSystem;

/// Material config entry fields holding texture paths; these get anchored
/// to the tree root during preprocessing.
const MATERIAL_PATH_FIELDS: [&str; 2] = ["match_diffuse", "match_normal"];

/// Queries the frozen VFS for typed asset collections.
pub struct AssetClassifier<'a> {
    vfs: &'a VirtualFileSystem,
}

impl<'a> AssetClassifier<'a> {
    pub fn new(vfs: &'a VirtualFileSystem) -> Self {
        Self { vfs }
    }

    /// Every virtual path ending in `suffix` (case-insensitive) that passes
    /// the pattern filters.
    ///
    /// With `use_patterns` set, a path must match at least one allow glob
    /// (an empty allowlist matches everything) and no block glob. The
    /// archive blocklist applies regardless, matched against the owning
    /// archive's file name or the loose-files marker.
    pub fn find_by_suffix(
        &self,
        suffix: &str,
        use_patterns: bool,
        allowlist: &[String],
        blocklist: &[String],
        archive_blocklist: &[String],
    ) -> Vec<VirtualPath> {
        let allow = build_glob_set(allowlist);
        let block = build_glob_set(blocklist);
        let archive_block = build_glob_set(archive_blocklist);

        let mut results: IndexSet<VirtualPath> = IndexSet::new();

        for (path, origin) in self.vfs.iter() {
            if !path.ends_with(suffix) {
                continue;
            }

            if use_patterns {
                if !allowlist.is_empty() && !allow.is_match(path.key()) {
                    continue;
                }
                if block.is_match(path.key()) {
                    continue;
                }
            }

            if archive_block.is_match(origin.name()) {
                continue;
            }

            results.insert(path.to_canonical());
        }

        results.into_iter().collect()
    }

    /// Parallax height map textures (`_p.dds`).
    pub fn find_height_maps(&self, config: &Value) -> Vec<VirtualPath> {
        tracing::info!("Finding parallax height maps");

        let lists = lookup_lists(config, "height_map_lookup");
        let height_maps = self.find_by_suffix(
            "_p.dds",
            true,
            &lists.allowlist,
            &lists.blocklist,
            &lists.archive_blocklist,
        );

        tracing::info!("Found {} height maps", height_maps.len());
        height_maps
    }

    /// Complex material map textures: environment maps (`_m.dds`) whose
    /// alpha channel carries data.
    ///
    /// Every candidate is fetched and probed; a candidate that fails to
    /// fetch or decode is skipped with a warning, and one whose alpha
    /// channel is uniformly opaque holds no material data and is dropped.
    pub fn find_complex_material_maps(
        &self,
        config: &Value,
        decoder: &dyn ArchiveDecoder,
        probe: &dyn ImageProbe,
    ) -> Vec<VirtualPath> {
        tracing::info!("Finding complex material maps");

        let lists = lookup_lists(config, "complex_material_lookup");
        let env_maps = self.find_by_suffix(
            "_m.dds",
            true,
            &lists.allowlist,
            &lists.blocklist,
            &lists.archive_blocklist,
        );

        let mut material_maps = Vec::new();
        for env_map in env_maps {
            let data = match self.vfs.read(&env_map, decoder) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {} - skipping", env_map, e);
                    continue;
                }
            };

            match probe.alpha_is_all_opaque(&data) {
                Ok(false) => {
                    tracing::trace!("Adding {} as a complex material map", env_map);
                    material_maps.push(env_map);
                }
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!("Failed to decode image {}: {} - skipping", env_map, e);
                }
            }
        }

        tracing::info!("Found {} complex material maps", material_maps.len());
        material_maps
    }

    /// Mesh files (`.nif`).
    pub fn find_meshes(&self, config: &Value) -> Vec<VirtualPath> {
        tracing::info!("Finding meshes");

        let lists = lookup_lists(config, "mesh_lookup");
        let meshes = self.find_by_suffix(
            ".nif",
            true,
            &lists.allowlist,
            &lists.blocklist,
            &lists.archive_blocklist,
        );

        tracing::info!("Found {} meshes", meshes.len());
        meshes
    }

    /// Structured material config entries from `.json` files in the VFS.
    ///
    /// Each file holds an array of entries. Preprocessing per entry: a
    /// `texture` field is copied to `match_diffuse`, then every known path
    /// field gets a leading separator so matches anchor at the tree root.
    /// A file that fails to parse is skipped.
    pub fn find_material_configs(
        &self,
        config: &Value,
        decoder: &dyn ArchiveDecoder,
    ) -> Vec<serde_json::Value> {
        tracing::info!("Finding material configs");

        let lists = lookup_lists(config, "material_config_lookup");
        let config_files = self.find_by_suffix(
            ".json",
            true,
            &lists.allowlist,
            &lists.blocklist,
            &lists.archive_blocklist,
        );

        let mut entries = Vec::new();
        for config_file in config_files {
            let bytes = match self.vfs.read(&config_file, decoder) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {} - skipping", config_file, e);
                    continue;
                }
            };

            let parsed: serde_json::Value = match serde_json::from_slice(&bytes) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::error!("Unable to parse material config file {}: {}", config_file, e);
                    continue;
                }
            };

            let Some(elements) = parsed.as_array() else {
                tracing::warn!("Material config {} is not an entry array - skipping", config_file);
                continue;
            };

            for element in elements {
                entries.push(preprocess_material_entry(element.clone()));
            }
        }

        tracing::info!("Found {} material entries", entries.len());
        entries
    }
}

fn preprocess_material_entry(mut entry: serde_json::Value) -> serde_json::Value {
    if let Some(object) = entry.as_object_mut() {
        if let Some(texture) = object.get("texture").cloned() {
            object.insert("match_diffuse".to_string(), texture);
        }

        for field in MATERIAL_PATH_FIELDS {
            if let Some(serde_json::Value::String(path)) = object.get_mut(field) {
                path.insert(0, '/');
            }
        }
    }
    entry
}

/// Compile a pattern list, dropping invalid globs with a warning rather
/// than failing the query.
fn build_glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match GlobBuilder::new(pattern).case_insensitive(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                tracing::warn!("Invalid pattern {}: {} - ignoring", pattern, e);
            }
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Failed to compile pattern set: {} - matching nothing", e);
        GlobSet::empty()
    })
}
