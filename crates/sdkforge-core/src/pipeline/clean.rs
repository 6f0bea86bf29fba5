//! Removal of generated sources from management-plane modules.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name segment that marks a management-plane module.
pub const MANAGEMENT_PLANE_SEGMENT: &str = "resourcemanager";

/// Subtrees of `src/` that hold generated code.
pub const GENERATED_SUBTREES: [&str; 3] = ["main", "samples", "test"];

/// Whether `module_name` follows the management-plane naming convention,
/// e.g. `azure-resourcemanager-widgets`.
pub fn is_management_plane(module_name: &str) -> bool {
    module_name
        .split('-')
        .any(|segment| segment == MANAGEMENT_PLANE_SEGMENT)
}

/// Remove `src/main`, `src/samples` and `src/test` under `module_dir`.
///
/// Missing subtrees are skipped. Returns the directories actually removed.
pub(crate) fn remove_generated_sources(module_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for subtree in GENERATED_SUBTREES {
        let dir = module_dir.join("src").join(subtree);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "removed generated sources");
                removed.push(dir);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(removed)
}
