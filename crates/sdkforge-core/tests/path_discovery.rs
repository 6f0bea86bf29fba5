//! Upward root discovery over real directory trees.

use sdkforge_core::paths::BUILD_DESCRIPTOR;
use sdkforge_core::{
    find_root, locate_module, locate_repo_root, PathError, MODULE_MARKERS, REPO_ROOT_MARKERS,
};
use std::fs;
use std::path::{Path, PathBuf};

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

/// `repo/{pom.xml, sdk/, eng/}` with one module below `sdk/<service>/`.
fn sdk_repo(base: &Path, service: &str, module: &str) -> (PathBuf, PathBuf) {
    let repo = base.join("azure-sdk-for-java");
    touch(&repo.join("pom.xml"));
    fs::create_dir_all(repo.join("eng")).unwrap();
    let module_dir = repo.join("sdk").join(service).join(module);
    touch(&module_dir.join("pom.xml"));
    touch(&module_dir.join("src/main/java/com/azure/Widget.java"));
    (repo, module_dir)
}

#[test]
fn test_root_at_depth_d_is_found() {
    const MARKERS: &[&str] = &["root.marker", "anchor"];

    for depth in 1..=6 {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        touch(&root.join("root.marker"));
        fs::create_dir_all(root.join("anchor")).unwrap();

        let mut start = root.clone();
        for level in 1..depth {
            start = start.join(format!("level{level}"));
            // A partial set on the way up must not stop the search.
            touch(&start.join("root.marker"));
        }
        let start = start.join("file.txt");

        let found = find_root(&start, &[MARKERS]).unwrap();
        assert_eq!(found, root, "depth {depth}");
    }
}

#[test]
fn test_search_without_match_terminates_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let start = dir.path().join("a/b/c/d/e/f/file.txt");
    fs::create_dir_all(start.parent().unwrap()).unwrap();

    let err = find_root(&start, &[&["sdkforge-absent-marker-0c5b"]]).unwrap_err();
    match err {
        PathError::NotFound { start: reported, markers } => {
            assert_eq!(reported, start);
            assert_eq!(markers, "[sdkforge-absent-marker-0c5b]");
        }
    }
}

#[test]
fn test_locate_module_from_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, module_dir) = sdk_repo(dir.path(), "widgets", "azure-resourcemanager-widgets");

    let location =
        locate_module(&module_dir.join("src/main/java/com/azure/Widget.java")).unwrap();

    // src/main/java has no pom.xml, so the first match is the module itself.
    assert_eq!(location.module_root, module_dir);
    assert_eq!(location.repo_root, repo);
    assert_eq!(location.module_name(), "azure-resourcemanager-widgets");
    assert_eq!(location.descriptor(), module_dir.join(BUILD_DESCRIPTOR));
}

#[test]
fn test_locate_module_from_its_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, module_dir) = sdk_repo(dir.path(), "widgets", "widgets-core");

    let location = locate_module(&module_dir.join(BUILD_DESCRIPTOR)).unwrap();
    assert_eq!(location.module_root, module_dir);
    assert_eq!(location.repo_root, repo);
}

#[test]
fn test_locate_repo_root_accepts_the_root_itself() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, module_dir) = sdk_repo(dir.path(), "widgets", "widgets-core");

    assert_eq!(locate_repo_root(&repo).unwrap(), repo);
    assert_eq!(locate_repo_root(&module_dir).unwrap(), repo);
}

#[test]
fn test_module_outside_repository_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let module_dir = dir.path().join("loose-module");
    touch(&module_dir.join("pom.xml"));
    fs::create_dir_all(module_dir.join("src")).unwrap();

    // The module resolves, but no ancestor carries pom.xml + sdk + eng.
    assert!(find_root(&module_dir.join("pom.xml"), &[MODULE_MARKERS]).is_ok());
    let err = locate_module(&module_dir.join("pom.xml")).unwrap_err();
    assert!(matches!(err, PathError::NotFound { .. }));
    assert!(find_root(&module_dir, &[REPO_ROOT_MARKERS]).is_err());
}
