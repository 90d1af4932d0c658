//! Cascading configuration for asset classification.
//!
//! The tool ships one mandatory base config (`cfg/default.yaml` relative to
//! the executable); mods may override or extend it by placing YAML
//! fragments under the `bethvfs/` directory of the virtual file system —
//! packed in an archive or loose, the normal VFS precedence applies to the
//! fragment files themselves.
//!
//! Fragments are deep-merged into the base tree key by key:
//! - mapping into mapping: recurse
//! - sequence into sequence: order-preserving union without duplicates
//! - anything else (scalar or type mismatch): the fragment value replaces
//!   the base value
//!
//! After the merge, a normalization pass rewrites backslashes in every
//! string scalar to the crate's canonical `/` separator.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobMatcher};
use serde_yaml_ng::mapping::Entry;
use serde_yaml_ng::{Mapping, Value};
use thiserror::Error;

use crate::decoder::ArchiveDecoder;
use crate::services::vfs::VirtualFileSystem;

/// VFS directory override fragments are discovered under.
pub const FRAGMENT_DIR: &str = "bethvfs";

/// File suffix of override fragments.
pub const FRAGMENT_SUFFIX: &str = ".yaml";

/// Errors from the config cascade.
///
/// Only the mandatory base fragment can fail the run; override fragments
/// are skipped with a warning.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("base config unreadable: {path}: {source}")]
    BaseUnreadable {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("base config malformed: {path}: {source}")]
    BaseMalformed {
        path: Utf8PathBuf,
        source: serde_yaml_ng::Error,
    },
}

/// Allow/block pattern lists for one asset category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupLists {
    pub allowlist: Vec<String>,
    pub blocklist: Vec<String>,
    pub archive_blocklist: Vec<String>,
}

/// Load the mandatory base configuration. Missing or malformed is fatal.
pub fn load_base(path: &Utf8Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path.as_std_path()).map_err(|source| {
        ConfigError::BaseUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;

    serde_yaml_ng::from_str(&contents).map_err(|source| ConfigError::BaseMalformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the merged configuration tree for a run: base config first, then
/// every discovered override fragment in VFS order, then the separator
/// normalization pass.
pub fn load_cascade(
    base_path: &Utf8Path,
    vfs: &VirtualFileSystem,
    decoder: &dyn ArchiveDecoder,
) -> Result<Value, ConfigError> {
    tracing::info!("Loading classification configs from load order");

    let mut config = load_base(base_path)?;

    let fragment_glob = fragment_matcher();
    let fragments: Vec<_> = vfs
        .iter()
        .filter(|(path, _)| path.ends_with(FRAGMENT_SUFFIX) && fragment_glob.is_match(path.key()))
        .map(|(path, _)| path.clone())
        .collect();

    let mut merged_count = 0usize;
    for fragment in fragments {
        let bytes = match vfs.read(&fragment, decoder) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read config fragment {}: {} - skipping", fragment, e);
                continue;
            }
        };

        let parsed: Value = match serde_yaml_ng::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse config fragment {}: {} - skipping", fragment, e);
                continue;
            }
        };

        merge_value(&mut config, parsed);
        merged_count += 1;
    }

    normalize_separators(&mut config);

    tracing::info!("Loaded {} override configs from load order", merged_count);
    Ok(config)
}

/// Deep-merge `source` into `target`.
///
/// Mapping pairs recurse key by key; sequence pairs take the
/// order-preserving union (source elements append unless already present);
/// any other pairing replaces the target value. Insertion into an absent
/// key routes through an empty node of the source's kind so duplicates
/// inside the source itself are still collapsed.
pub fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Mapping(target_map), Value::Mapping(source_map)) => {
            for (key, value) in source_map {
                match target_map.entry(key) {
                    Entry::Occupied(occupied) => merge_value(occupied.into_mut(), value),
                    Entry::Vacant(vacant) => {
                        vacant.insert(normalized(value));
                    }
                }
            }
        }
        (Value::Sequence(target_seq), Value::Sequence(source_seq)) => {
            for item in source_seq {
                if !target_seq.contains(&item) {
                    target_seq.push(item);
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merge a value into an empty node of its own kind, deduplicating any
/// sequences nested inside it.
fn normalized(value: Value) -> Value {
    match value {
        mapping @ Value::Mapping(_) => {
            let mut base = Value::Mapping(Mapping::new());
            merge_value(&mut base, mapping);
            base
        }
        sequence @ Value::Sequence(_) => {
            let mut base = Value::Sequence(Vec::new());
            merge_value(&mut base, sequence);
            base
        }
        scalar => scalar,
    }
}

/// Rewrite backslashes in every string scalar to the canonical separator,
/// leaving mapping/sequence structure untouched.
pub fn normalize_separators(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('\\') {
                *s = s.replace('\\', "/");
            }
        }
        Value::Mapping(map) => {
            for (_, nested) in map.iter_mut() {
                normalize_separators(nested);
            }
        }
        Value::Sequence(seq) => {
            for nested in seq {
                normalize_separators(nested);
            }
        }
        _ => {}
    }
}

/// Extract the three pattern lists for one category section. Missing keys
/// and non-string elements yield empty/skipped entries rather than errors.
pub fn lookup_lists(config: &Value, section: &str) -> LookupLists {
    LookupLists {
        allowlist: string_list(config, section, "allowlist"),
        blocklist: string_list(config, section, "blocklist"),
        archive_blocklist: string_list(config, section, "archive_blocklist"),
    }
}

fn string_list(config: &Value, section: &str, key: &str) -> Vec<String> {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn fragment_matcher() -> GlobMatcher {
    // Infallible: the pattern is a compile-time constant.
    Glob::new(&format!("{}/*", FRAGMENT_DIR))
        .expect("fragment glob is valid")
        .compile_matcher()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn yaml(doc: &str) -> Value {
        serde_yaml_ng::from_str(doc).unwrap()
    }

    #[test]
    fn test_mapping_merge_recurses() {
        let mut target = yaml("mesh_lookup:\n  allowlist: [a]\n  enabled: true\n");
        let source = yaml("mesh_lookup:\n  allowlist: [b]\n");

        merge_value(&mut target, source);

        assert_eq!(
            target,
            yaml("mesh_lookup:\n  allowlist: [a, b]\n  enabled: true\n")
        );
    }

    #[test]
    fn test_sequence_merge_is_union() {
        let mut target = yaml("[a, b]");
        merge_value(&mut target, yaml("[b, c]"));
        assert_eq!(target, yaml("[a, b, c]"));
    }

    #[test]
    fn test_scalar_replaces() {
        let mut target = yaml("key: 1");
        merge_value(&mut target, yaml("key: 2"));
        assert_eq!(target, yaml("key: 2"));
    }

    #[test]
    fn test_type_mismatch_replaces() {
        let mut target = yaml("key: [a, b]");
        merge_value(&mut target, yaml("key: scalar"));
        assert_eq!(target, yaml("key: scalar"));
    }

    #[test]
    fn test_new_key_inserted() {
        let mut target = yaml("a: 1");
        merge_value(&mut target, yaml("b: [x, x]"));
        // Duplicates inside the inserted sequence collapse too.
        assert_eq!(target, yaml("a: 1\nb: [x]"));
    }

    #[test]
    fn test_merge_idempotent() {
        let tree = yaml("lookup:\n  allowlist: [a, b]\n  limit: 3\nnames: [x]\n");
        let mut merged = tree.clone();
        merge_value(&mut merged, tree.clone());
        assert_eq!(merged, tree);
    }

    #[test]
    fn test_normalize_separators_rewrites_strings_only() {
        let mut tree = yaml("paths: ['textures\\rock.dds']\nname: 'no\\change\\here'\ncount: 2\n");
        normalize_separators(&mut tree);
        assert_eq!(
            tree,
            yaml("paths: ['textures/rock.dds']\nname: 'no/change/here'\ncount: 2\n")
        );
    }

    #[test]
    fn test_lookup_lists_extraction() {
        let config = yaml(
            "mesh_lookup:\n  allowlist: [a, 42, b]\n  blocklist: [c]\n",
        );

        let lists = lookup_lists(&config, "mesh_lookup");
        assert_eq!(lists.allowlist, vec!["a", "b"]);
        assert_eq!(lists.blocklist, vec!["c"]);
        assert!(lists.archive_blocklist.is_empty());
    }

    #[test]
    fn test_lookup_lists_missing_section_is_empty() {
        let config = yaml("other: {}");
        assert_eq!(lookup_lists(&config, "mesh_lookup"), LookupLists::default());
    }

    #[test]
    fn test_load_base_missing_is_fatal() {
        let result = load_base(Utf8Path::new("does/not/exist.yaml"));
        assert!(matches!(result, Err(ConfigError::BaseUnreadable { .. })));
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                prop::collection::vec(("[a-d]{1,3}", inner), 0..4).prop_map(|entries| {
                    let mut map = Mapping::new();
                    for (key, value) in entries {
                        map.insert(Value::String(key), value);
                    }
                    Value::Mapping(map)
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_merge_into_self_is_identity(tree in arb_value()) {
            let mut merged = tree.clone();
            merge_value(&mut merged, tree.clone());
            prop_assert_eq!(merged, tree);
        }

        #[test]
        fn prop_sequence_union_complete_and_stable(
            target in prop::collection::vec(arb_scalar(), 0..6),
            source in prop::collection::vec(arb_scalar(), 0..6),
        ) {
            let mut merged = Value::Sequence(target.clone());
            merge_value(&mut merged, Value::Sequence(source.clone()));

            let Value::Sequence(items) = &merged else { unreachable!() };
            for item in target.iter().chain(source.iter()) {
                prop_assert!(items.contains(item));
            }
            // No duplicates beyond those already in the target.
            for (i, item) in items.iter().enumerate().skip(target.len()) {
                prop_assert!(!items[..i].contains(item));
            }

            // Re-applying the source changes nothing.
            let mut again = merged.clone();
            merge_value(&mut again, Value::Sequence(source));
            prop_assert_eq!(again, merged);
        }
    }
}
