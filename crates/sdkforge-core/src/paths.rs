//! Upward directory discovery.
//!
//! Roots are recognised by marker sets: a directory qualifies when every name
//! in one of the sets exists in it, as a file or a directory.

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build descriptor present in both the repository root and every module.
pub const BUILD_DESCRIPTOR: &str = "pom.xml";

/// Markers of the SDK repository root.
pub const REPO_ROOT_MARKERS: &[&str] = &[BUILD_DESCRIPTOR, "sdk", "eng"];

/// Markers of a single library module.
pub const MODULE_MARKERS: &[&str] = &[BUILD_DESCRIPTOR, "src"];

/// A library module and the repository that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLocation {
    pub module_root: PathBuf,
    pub repo_root: PathBuf,
}

impl ModuleLocation {
    /// Name of the module directory, e.g. `azure-resourcemanager-widgets`.
    pub fn module_name(&self) -> String {
        self.module_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `pom.xml` of the module.
    pub fn descriptor(&self) -> PathBuf {
        self.module_root.join(BUILD_DESCRIPTOR)
    }
}

/// Walk upward from the parent of `start` and return the first directory
/// that satisfies one of `marker_sets`, tried in order at each level.
///
/// A relative `start` is resolved against the current directory first. The
/// filesystem root itself is never a candidate, so the walk takes fewer steps
/// than `start` has components.
pub fn find_root(start: &Path, marker_sets: &[&[&str]]) -> Result<PathBuf, PathError> {
    let absolute = absolutize(start);
    let mut current = absolute.parent();

    while let Some(dir) = current {
        let parent = match dir.parent() {
            Some(parent) if parent != dir => parent,
            _ => break,
        };

        for markers in marker_sets {
            if satisfies(dir, markers) {
                debug!(root = %dir.display(), markers = ?markers, "found root");
                return Ok(dir.to_path_buf());
            }
        }

        current = Some(parent);
    }

    Err(PathError::NotFound {
        start: start.to_path_buf(),
        markers: describe(marker_sets),
    })
}

/// `path` made absolute against the current directory, without touching the
/// filesystem. `.` components are dropped; an empty path is returned as is.
pub fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Locate the module containing `path` and the repository above it.
///
/// `path` is typically a file inside the module (`tsp-location.yaml`, a
/// source file, a built jar); pass `module_dir.join(BUILD_DESCRIPTOR)` to
/// resolve a module directory itself.
pub fn locate_module(path: &Path) -> Result<ModuleLocation, PathError> {
    let module_root = find_root(path, &[MODULE_MARKERS])?;
    let repo_root = find_root(&module_root, &[REPO_ROOT_MARKERS])?;
    Ok(ModuleLocation {
        module_root,
        repo_root,
    })
}

/// Locate the repository root at or above `dir`.
pub fn locate_repo_root(dir: &Path) -> Result<PathBuf, PathError> {
    find_root(&dir.join(BUILD_DESCRIPTOR), &[REPO_ROOT_MARKERS])
}

fn satisfies(dir: &Path, markers: &[&str]) -> bool {
    markers.iter().all(|name| dir.join(name).exists())
}

fn describe(marker_sets: &[&[&str]]) -> String {
    marker_sets
        .iter()
        .map(|set| format!("[{}]", set.join(", ")))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_search_starts_at_parent() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("widgets");
        touch(&module.join("pom.xml"));
        fs::create_dir_all(module.join("src")).unwrap();

        // The start path itself is never tested, only its ancestors.
        let found = find_root(&module.join("pom.xml"), &[MODULE_MARKERS]).unwrap();
        assert_eq!(found, module);
    }

    #[test]
    fn test_marker_directories_count() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("repo");
        touch(&root.join("pom.xml"));
        fs::create_dir_all(root.join("sdk/widgets/src/main/java")).unwrap();
        fs::create_dir_all(root.join("eng")).unwrap();

        let start = root.join("sdk/widgets/src/main/java");
        let found = find_root(&start, &[REPO_ROOT_MARKERS]).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn test_partial_marker_set_does_not_match() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("repo");
        touch(&root.join("pom.xml"));
        fs::create_dir_all(root.join("sdk")).unwrap();
        let start = root.join("sdk/a/b.txt");

        let err = find_root(&start, &[&["pom.xml", "sdk", "eng-marker-absent-7c1e"]]).unwrap_err();
        assert!(matches!(err, PathError::NotFound { .. }));
    }

    #[test]
    fn test_nearest_satisfied_level_wins() {
        let dir = tempdir().unwrap();
        let level = dir.path().join("level");
        touch(&level.join("second.marker"));
        touch(&level.join("inner/first.marker"));

        let start = level.join("inner/file.txt");
        let found = find_root(&start, &[&["first.marker"], &["second.marker"]]).unwrap();
        assert_eq!(found, level.join("inner"));
    }

    #[test]
    fn test_describe_marker_sets() {
        assert_eq!(
            describe(&[MODULE_MARKERS, REPO_ROOT_MARKERS]),
            "[pom.xml, src] or [pom.xml, sdk, eng]"
        );
    }

    #[test]
    fn test_filesystem_root_is_not_a_candidate() {
        let err = find_root(Path::new("/pom.xml"), &[&[]]).unwrap_err();
        assert!(matches!(err, PathError::NotFound { .. }));
    }

    #[test]
    fn test_absolutize_drops_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("./pom.xml")), cwd.join("pom.xml"));
        assert_eq!(absolutize(Path::new("/abs/pom.xml")), PathBuf::from("/abs/pom.xml"));
    }

    #[test]
    fn test_relative_start_without_parent_is_not_found() {
        let err = find_root(Path::new(""), &[MODULE_MARKERS]).unwrap_err();
        assert!(matches!(err, PathError::NotFound { .. }));
    }
}
