//! Output artifacts: the binary graph and the debug GeoJSON document

pub mod binary;
pub mod schema;
pub mod to_geojson;
pub mod wkb;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use binary::{decode_graph, encode_graph, read_graph, root_as_graph, write_graph};
pub use to_geojson::{debug_geojson_string, to_debug_geojson, write_debug_geojson};

use crate::Error;

/// Write through a sibling temporary file renamed into place, so readers
/// never see a partial artifact
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    write_atomic_all(&[(path, bytes)])
}

/// Stage every artifact next to its target, then rename them all into place.
///
/// Nothing is published unless every staged write succeeded; if a rename
/// fails, targets already renamed by this call are removed again.
pub(crate) fn write_atomic_all(artifacts: &[(&Path, &[u8])]) -> Result<(), Error> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(artifacts.len());
    for &(path, bytes) in artifacts {
        let temp = partial_path(path);
        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            discard_staged(&staged);
            return Err(write_error(path, e));
        }
        staged.push((temp, path));
    }

    for (i, (temp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp, path) {
            discard_staged(&staged[i..]);
            for (_, published) in &staged[..i] {
                let _ = fs::remove_file(published);
            }
            return Err(write_error(path, e));
        }
    }
    Ok(())
}

fn discard_staged(staged: &[(PathBuf, &Path)]) {
    for (temp, _) in staged {
        let _ = fs::remove_file(temp);
    }
}

fn write_error(path: &Path, e: std::io::Error) -> Error {
    Error::IoError(std::io::Error::new(
        e.kind(),
        format!("Failed to write '{}': {}", path.display(), e),
    ))
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_leaves_only_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_artifact_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("graph.bin");
        let debug = dir.path().join("missing").join("graph_debug.geojson");

        let result = write_atomic_all(&[(graph.as_path(), &b"graph"[..]), (debug.as_path(), &b"{}"[..])]);
        assert!(matches!(result, Err(Error::IoError(_))));
        assert!(!graph.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn all_artifacts_land_together() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("graph.bin");
        let debug = dir.path().join("graph_debug.geojson");

        write_atomic_all(&[(graph.as_path(), &b"graph"[..]), (debug.as_path(), &b"{}"[..])]).unwrap();
        assert_eq!(fs::read(&graph).unwrap(), b"graph");
        assert_eq!(fs::read(&debug).unwrap(), b"{}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("graph.bin");
        assert!(matches!(write_atomic(&path, b"x"), Err(Error::IoError(_))));
        assert!(!path.exists());
    }
}
