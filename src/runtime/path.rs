//! Path utility functions for normalization, comparison and link targets.

use anyhow::Result;
use std::path::{Component, Path, PathBuf};

use super::Runtime;

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // If we can't pop (e.g., at root), keep the `..`
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// `/repo/cores/../../etc` is NOT under `/repo`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Shortest relative path that reaches `source_dir` from inside `dest_dir`.
///
/// Both paths are expected to be absolute. For example, a site at
/// `/var/www/site` linking into `/srv/dslm/cores/drupal-7.32` gets
/// `../../../srv/dslm/cores/drupal-7.32`.
///
/// Returns `None` if a relative path cannot be computed (e.g., different drive letters on Windows).
pub fn relative_link_target(source_dir: &Path, dest_dir: &Path) -> Option<PathBuf> {
    let result = pathdiff::diff_paths(source_dir, dest_dir)?;

    if result.is_absolute() {
        return None;
    }

    if result.as_os_str().is_empty() {
        return Some(PathBuf::from("."));
    }

    Some(result)
}

/// The target to write into a symlink placed in `dest_dir` that must reach `source_dir`.
///
/// Relative targets keep an installation valid when the repository and the
/// site move together. Windows symlinks with relative targets are unreliable
/// in the shells this tool runs in, so there the canonical absolute path of
/// `source_dir` is used instead; such links break if the repository moves.
pub fn portable_link_target<R: Runtime + ?Sized>(
    runtime: &R,
    source_dir: &Path,
    dest_dir: &Path,
) -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let _ = dest_dir;
        runtime.canonicalize(source_dir)
    }
    #[cfg(not(windows))]
    {
        match relative_link_target(source_dir, dest_dir) {
            Some(relative) => Ok(relative),
            None => runtime.canonicalize(source_dir),
        }
    }
}
