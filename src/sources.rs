use crate::model::{CapsuleExport, LibraryExport, PlaylistExport, SourceBundle, WrappedExport};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const WRAPPED_FILE: &str = "wrapped.json";
pub const CAPSULE_FILE: &str = "sound_capsule.json";
pub const PLAYLISTS_FILE: &str = "playlists.json";
pub const LIBRARY_FILE: &str = "library.json";

/// Reads the four export documents from a bundle directory. The library
/// catalog is optional: a missing or unreadable file degrades to an
/// empty catalog, while any failure on the other three aborts the boot.
pub fn load_bundle(dir: &Path) -> Result<SourceBundle> {
    let wrapped: WrappedExport = load_document(&dir.join(WRAPPED_FILE))?;
    let capsule: CapsuleExport = load_document(&dir.join(CAPSULE_FILE))?;
    let playlist: PlaylistExport = load_document(&dir.join(PLAYLISTS_FILE))?;
    let library: LibraryExport = load_document(&dir.join(LIBRARY_FILE)).unwrap_or_default();

    Ok(SourceBundle {
        wrapped,
        capsule,
        playlist,
        library,
    })
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_minimal_bundle(dir: &Path) {
        fs::write(dir.join(WRAPPED_FILE), r#"{"topTracks":{"topTracks":[]}}"#).expect("wrapped");
        fs::write(dir.join(CAPSULE_FILE), r#"{"stats":[],"highlights":[]}"#).expect("capsule");
        fs::write(dir.join(PLAYLISTS_FILE), r#"{"playlists":[]}"#).expect("playlists");
    }

    #[test]
    fn missing_library_degrades_to_empty_catalog() {
        let dir = tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());

        let bundle = load_bundle(dir.path()).expect("load");

        assert!(bundle.library.tracks.is_empty());
    }

    #[test]
    fn corrupt_library_is_also_tolerated() {
        let dir = tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());
        fs::write(dir.path().join(LIBRARY_FILE), "{not json").expect("library");

        let bundle = load_bundle(dir.path()).expect("load");

        assert!(bundle.library.tracks.is_empty());
    }

    #[test]
    fn missing_mandatory_document_fails_with_its_path() {
        let dir = tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());
        fs::remove_file(dir.path().join(CAPSULE_FILE)).expect("remove");

        let err = load_bundle(dir.path()).expect_err("should fail");

        assert!(format!("{err:#}").contains(CAPSULE_FILE));
    }

    #[test]
    fn malformed_mandatory_document_fails_to_parse() {
        let dir = tempdir().expect("tempdir");
        write_minimal_bundle(dir.path());
        fs::write(dir.path().join(WRAPPED_FILE), "[1,2,3").expect("wrapped");

        let err = load_bundle(dir.path()).expect_err("should fail");

        assert!(format!("{err:#}").contains("failed to parse"));
    }
}
