//! Locating fixture files and scratch directories.

use std::path::{Path, PathBuf};

/// Directory holding the XML fixtures embedded by [`crate::fixtures`].
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Resolve a fixture by file name.
///
/// `TEST_DATA_DIR` is consulted first so captured server responses that are
/// too large to commit can be dropped in without touching the tree.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain(std::iter::once(fixtures_dir().join(name)))
        .find(|path| path.is_file())
}

/// Scratch directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("ogc_test_")
        .tempdir()
        .expect("create scratch directory")
}

/// Write `contents` to `dir/name`, returning the path.
pub fn write_temp_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write scratch file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_lookup() {
        let path = find_test_file("wms_130_world.xml").unwrap();
        assert!(path.starts_with(fixtures_dir()));
        assert!(std::fs::read_to_string(path).unwrap().contains("WMS_Capabilities"));
        assert!(find_test_file("missing.xml").is_none());
    }

    #[test]
    fn test_scratch_file() {
        let dir = temp_test_dir();
        let path = write_temp_file(dir.path(), "http.yaml", "timeout_secs: 5\n");
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "timeout_secs: 5\n");
    }
}
