//! Integration tests for the configuration cascade
//!
//! These tests verify:
//! - Base config is mandatory; override fragments are not
//! - Fragments discovered inside the VFS merge in, archive or loose
//! - Sequence union and scalar replacement across the cascade
//! - Separator normalization of the merged tree

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use bethvfs::config::{ConfigError, load_base, load_cascade, lookup_lists};
use bethvfs::decoder::{ArchiveDecoder, DecodeError, OpenedArchive};
use bethvfs::models::{ArchiveRef, VirtualPath};
use bethvfs::services::VirtualFileSystem;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

#[derive(Default)]
struct FakeDecoder {
    archives: HashMap<String, Vec<(String, Vec<u8>)>>,
}

impl FakeDecoder {
    fn with_archive(mut self, name: &str, entries: &[(&str, &[u8])]) -> Self {
        self.archives.insert(
            name.to_string(),
            entries
                .iter()
                .map(|(path, bytes)| (path.to_string(), bytes.to_vec()))
                .collect(),
        );
        self
    }
}

impl ArchiveDecoder for FakeDecoder {
    fn open(&self, path: &Utf8Path) -> Result<Box<dyn OpenedArchive>, DecodeError> {
        let name = path.file_name().unwrap_or_default();
        let entries = self
            .archives
            .get(name)
            .ok_or_else(|| DecodeError::Archive(format!("corrupt archive: {}", name)))?;
        Ok(Box::new(FakeArchive {
            entries: entries
                .iter()
                .map(|(path, bytes)| (VirtualPath::new(path), bytes.clone()))
                .collect(),
        }))
    }
}

struct FakeArchive {
    entries: Vec<(VirtualPath, Vec<u8>)>,
}

impl OpenedArchive for FakeArchive {
    fn paths(&self) -> Vec<VirtualPath> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }

    fn read(&self, path: &VirtualPath) -> Result<Vec<u8>, DecodeError> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| DecodeError::Archive(format!("no such entry: {}", path)))
    }
}

struct TestSetup {
    _temp_dir: TempDir,
    base_path: Utf8PathBuf,
    data_dir: Utf8PathBuf,
}

const BASE_CONFIG: &str = "\
mesh_lookup:
  allowlist: []
  blocklist:
    - '*/lod/*'
  archive_blocklist: []
";

fn create_test_setup() -> TestSetup {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();

    let base_path = root.join("cfg/default.yaml");
    fs::create_dir_all(base_path.parent().unwrap()).unwrap();
    fs::write(&base_path, BASE_CONFIG).unwrap();

    let data_dir = root.join("Data");
    fs::create_dir_all(&data_dir).unwrap();

    TestSetup {
        _temp_dir: temp_dir,
        base_path,
        data_dir,
    }
}

fn place_loose(data_dir: &Utf8Path, relative: &str, bytes: &[u8]) {
    let path = data_dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
}

#[test]
fn test_base_alone() {
    let setup = create_test_setup();
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    let lists = lookup_lists(&merged, "mesh_lookup");
    assert_eq!(lists.blocklist, vec!["*/lod/*"]);
}

#[test]
fn test_missing_base_is_fatal() {
    let setup = create_test_setup();
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let result = load_cascade(
        &setup.base_path.with_file_name("nope.yaml"),
        &vfs,
        &FakeDecoder::default(),
    );
    assert!(matches!(result, Err(ConfigError::BaseUnreadable { .. })));
}

#[test]
fn test_malformed_base_is_fatal() {
    let setup = create_test_setup();
    fs::write(&setup.base_path, "mesh_lookup: [unclosed").unwrap();
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let result = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default());
    assert!(matches!(result, Err(ConfigError::BaseMalformed { .. })));
}

#[test]
fn test_loose_fragment_unions_into_base() {
    let setup = create_test_setup();
    place_loose(
        &setup.data_dir,
        "bethvfs/extra.yaml",
        b"mesh_lookup:\n  blocklist:\n    - '*/lod/*'\n    - '*/sky/*'\n",
    );
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    let lists = lookup_lists(&merged, "mesh_lookup");
    // Union: no duplicate for the shared element, new one appended.
    assert_eq!(lists.blocklist, vec!["*/lod/*", "*/sky/*"]);
}

#[test]
fn test_archive_fragment_discovered() {
    let setup = create_test_setup();
    let archive_path = setup.data_dir.join("Overrides.bsa");
    fs::write(&archive_path, b"").unwrap();
    let decoder = FakeDecoder::default().with_archive(
        "Overrides.bsa",
        &[(
            "bethvfs/packed.yaml",
            b"material_config_lookup:\n  allowlist:\n    - 'textures/pbr/*'\n".as_slice(),
        )],
    );
    let archives = vec![Arc::new(ArchiveRef::new("Overrides.bsa", archive_path))];
    let vfs = VirtualFileSystem::build(&archives, &setup.data_dir, &decoder);

    let merged = load_cascade(&setup.base_path, &vfs, &decoder).unwrap();

    let lists = lookup_lists(&merged, "material_config_lookup");
    assert_eq!(lists.allowlist, vec!["textures/pbr/*"]);
}

#[test]
fn test_malformed_fragment_skipped() {
    let setup = create_test_setup();
    place_loose(&setup.data_dir, "bethvfs/broken.yaml", b"mesh_lookup: [unclosed");
    place_loose(
        &setup.data_dir,
        "bethvfs/good.yaml",
        b"mesh_lookup:\n  blocklist: ['*/magic/*']\n",
    );
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    let lists = lookup_lists(&merged, "mesh_lookup");
    assert!(lists.blocklist.contains(&"*/magic/*".to_string()));
}

#[test]
fn test_fragment_outside_convention_dir_ignored() {
    let setup = create_test_setup();
    place_loose(
        &setup.data_dir,
        "other/stray.yaml",
        b"mesh_lookup:\n  blocklist: ['*/stray/*']\n",
    );
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    let lists = lookup_lists(&merged, "mesh_lookup");
    assert!(!lists.blocklist.contains(&"*/stray/*".to_string()));
}

#[test]
fn test_scalar_override_replaces() {
    let setup = create_test_setup();
    fs::write(&setup.base_path, "output_limit: 100\n").unwrap();
    place_loose(&setup.data_dir, "bethvfs/tune.yaml", b"output_limit: 250\n");
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    assert_eq!(merged.get("output_limit").and_then(|v| v.as_u64()), Some(250));
}

#[test]
fn test_merged_tree_uses_canonical_separators() {
    let setup = create_test_setup();
    place_loose(
        &setup.data_dir,
        "bethvfs/paths.yaml",
        b"mesh_lookup:\n  blocklist: ['*\\dyndolod\\*']\n",
    );
    let vfs = VirtualFileSystem::build(&[], &setup.data_dir, &FakeDecoder::default());

    let merged = load_cascade(&setup.base_path, &vfs, &FakeDecoder::default()).unwrap();

    let lists = lookup_lists(&merged, "mesh_lookup");
    assert!(lists.blocklist.contains(&"*/dyndolod/*".to_string()));
}

#[test]
fn test_load_base_reads_tree() {
    let setup = create_test_setup();
    let base = load_base(&setup.base_path).unwrap();
    assert!(base.get("mesh_lookup").is_some());
}
