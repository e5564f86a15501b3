//! Symlink operations (create, read, resolve, remove).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use super::path::normalize_path;

/// Absolute location a link at `link` with target `target` points to.
fn link_target_path(link: &Path, target: &Path) -> Result<PathBuf> {
    if target.is_absolute() {
        Ok(target.to_path_buf())
    } else {
        // `is_dir()` on a relative path is relative to CWD; we want it relative to the link's parent.
        let parent = link
            .parent()
            .context("Failed to get parent directory of symlink")?;
        Ok(normalize_path(&parent.join(target)))
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link)
                .with_context(|| format!("Failed to create symlink {:?} -> {:?}", link, original))?;
        }
        #[cfg(windows)]
        {
            use anyhow::bail;
            use std::os::windows::fs::{symlink_dir, symlink_file};
            use tracing::trace;

            let target_path = link_target_path(link, original)?;

            if target_path.is_dir() {
                trace!(
                    "Target path {} is a directory, creating directory symlink",
                    target_path.display()
                );
                symlink_dir(original, link).context("Failed to create directory symlink")?;
            } else {
                trace!(
                    "Target path {} is a file, creating file symlink",
                    target_path.display()
                );
                symlink_file(original, link).context("Failed to create file symlink")?;
            }

            if fs::symlink_metadata(link).is_err() {
                bail!(
                    "Symlink creation reported success but link does not exist: link={:?} target={:?}",
                    link,
                    original
                );
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).with_context(|| format!("Failed to read symlink {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = self.read_link_impl(path)?;
        link_target_path(path, &target)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("Failed to canonicalize {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::remove_file(path).with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        #[cfg(windows)]
        {
            use tracing::debug;

            let points_to_dir = self
                .resolve_link_impl(path)
                .map(|target| target.is_dir())
                .unwrap_or(false);
            debug!("Removing symlink {:?} (directory target: {})", path, points_to_dir);
            if points_to_dir {
                fs::remove_dir(path)
            } else {
                fs::remove_file(path)
            }
            .with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        Ok(())
    }
}
