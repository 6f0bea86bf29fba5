//! Locating TypeSpec inputs inside a module.

use std::path::{Path, PathBuf};

/// Location descriptor written by `tsp-client init`.
pub const LOCATION_DESCRIPTOR: &str = "tsp-location.yaml";

/// Directory `tsp-client sync` saves specification sources into.
pub const SPEC_SOURCE_DIR: &str = "TempTypeSpecFiles";

/// Entry files in order of preference.
pub const ENTRY_FILES: [&str; 2] = ["client.tsp", "main.tsp"];

/// Pick the compiler entry file in `dir`: `client.tsp` over `main.tsp`.
pub fn select_entry_file(dir: &Path) -> Option<&'static str> {
    ENTRY_FILES
        .into_iter()
        .find(|name| dir.join(name).is_file())
}

/// First directory under `<module>/TempTypeSpecFiles/` (sorted by name) that
/// holds an entry file, together with that entry file.
pub fn find_spec_source(module_dir: &Path) -> Option<(PathBuf, &'static str)> {
    let root = module_dir.join(SPEC_SOURCE_DIR);
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(&root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter()
        .find_map(|dir| select_entry_file(&dir).map(|entry| (dir, entry)))
}

/// Paths named in `git status --porcelain` output that end in
/// `tsp-location.yaml`. Renames report their destination.
pub fn descriptors_in_status(porcelain: &str) -> Vec<PathBuf> {
    porcelain
        .lines()
        .filter_map(|line| line.get(3..))
        .map(|path| path.rsplit(" -> ").next().unwrap_or(path))
        .map(|path| path.trim().trim_matches('"'))
        .filter(|path| {
            Path::new(path)
                .file_name()
                .is_some_and(|name| name == LOCATION_DESCRIPTOR)
        })
        .map(PathBuf::from)
        .collect()
}
