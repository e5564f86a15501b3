//! Link set inspection for installation directories.
//!
//! There is no manifest of the links dslm created. Which top-level entries
//! belong to a core is recovered every time by reading link targets and
//! checking whether the target's parent directory is named like a core, so
//! out-of-band edits to the site are always seen.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::catalog::{PackageKind, Repository, VersionEntry};
use crate::runtime::{Runtime, is_path_under};

/// A top-level symlink of a site and the repository entry it points into.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkBinding {
    /// Entry name inside the inspected directory, e.g. `index.php`
    pub entry: String,
    /// Target resolved against the link's directory
    pub target: PathBuf,
    /// The repository entry the target lives in
    pub package: VersionEntry,
}

/// True when `target`'s parent directory is named like a core, e.g.
/// `../cores/drupal-7.32/index.php`.
pub fn is_core_link_target(target: &Path) -> bool {
    target
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .and_then(|name| VersionEntry::parse(name, PackageKind::Core))
        .is_some()
}

pub struct LinkInspector<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> LinkInspector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Whether anything occupies `path`, including a dangling symlink.
    pub fn entry_exists(&self, path: &Path) -> bool {
        self.runtime.is_symlink(path) || self.runtime.exists(path)
    }

    /// Every top-level symlink in `dir` with its target as stored in the link.
    pub fn current_links(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut links = Vec::new();
        for path in self.runtime.read_dir(dir)? {
            if !self.runtime.is_symlink(&path) {
                continue;
            }
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let target = self.runtime.read_link(&path)?;
            links.push((name, target));
        }
        Ok(links)
    }

    /// Target of the first symlink in `dir` (by name order), if any.
    ///
    /// A missing or unreadable directory has no links.
    pub fn first_link_target(&self, dir: &Path) -> Option<PathBuf> {
        match self.current_links(dir) {
            Ok(links) => links.into_iter().next().map(|(_, target)| target),
            Err(e) => {
                debug!("Cannot list links in {:?}: {:#}", dir, e);
                None
            }
        }
    }

    /// Names of the top-level symlinks in `dir` that point into a core.
    #[tracing::instrument(skip(self))]
    pub fn links_into_core(&self, dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .current_links(dir)?
            .into_iter()
            .filter(|(_, target)| is_core_link_target(target))
            .map(|(name, _)| name)
            .collect())
    }

    /// Symlinks in `dir` that resolve inside one of the repository's
    /// collections, with the entry each one points into.
    pub fn bindings(&self, dir: &Path, repository: &Repository<'_, R>) -> Result<Vec<LinkBinding>> {
        let mut bindings = Vec::new();
        for (entry, _) in self.current_links(dir)? {
            let target = self.runtime.resolve_link(&dir.join(&entry))?;
            if let Some(package) = Self::package_of(&target, repository) {
                bindings.push(LinkBinding {
                    entry,
                    target,
                    package,
                });
            }
        }
        Ok(bindings)
    }

    fn package_of(target: &Path, repository: &Repository<'_, R>) -> Option<VersionEntry> {
        [PackageKind::Core, PackageKind::Distribution, PackageKind::Profile]
            .into_iter()
            .filter(|kind| repository.has_collection(*kind))
            .find_map(|kind| {
                let collection = repository.collection_dir(kind);
                if !is_path_under(target, &collection) {
                    return None;
                }
                let relative = target.strip_prefix(&collection).ok()?;
                let name = relative.components().next()?.as_os_str().to_str()?;
                VersionEntry::parse(name, kind)
            })
    }

    /// Remove the symlink at `path`; the runtime picks directory or file
    /// removal as the platform requires.
    pub fn remove_link(&self, path: &Path) -> Result<()> {
        debug!("Removing link {:?}", path);
        self.runtime.remove_symlink(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    /// Site with: a core link, a dists link, a foreign link and a real file.
    fn site_runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let site = PathBuf::from("/var/www/site");

        runtime
            .expect_read_dir()
            .with(eq(site.clone()))
            .returning(|p| {
                Ok(vec![
                    p.join("README.txt"),
                    p.join("index.php"),
                    p.join("libraries"),
                    p.join("notes"),
                ])
            });

        runtime
            .expect_is_symlink()
            .with(eq(site.join("README.txt")))
            .returning(|_| false);
        runtime
            .expect_is_symlink()
            .with(eq(site.join("index.php")))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(site.join("libraries")))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(site.join("notes")))
            .returning(|_| true);

        runtime
            .expect_read_link()
            .with(eq(site.join("index.php")))
            .returning(|_| Ok(PathBuf::from("../../../srv/dslm/cores/drupal-7.32/index.php")));
        runtime
            .expect_read_link()
            .with(eq(site.join("libraries")))
            .returning(|_| Ok(PathBuf::from("/srv/dslm/dists/7.x-3.9")));
        runtime
            .expect_read_link()
            .with(eq(site.join("notes")))
            .returning(|_| Ok(PathBuf::from("/home/web/notes")));

        runtime
    }

    #[test]
    fn test_current_links_skips_real_entries() {
        let runtime = site_runtime();
        let inspector = LinkInspector::new(&runtime);

        let links = inspector.current_links(Path::new("/var/www/site")).unwrap();
        let names: Vec<_> = links.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["index.php", "libraries", "notes"]);
        assert_eq!(
            links[0].1,
            PathBuf::from("../../../srv/dslm/cores/drupal-7.32/index.php")
        );
    }

    #[test]
    fn test_links_into_core_matches_core_parent_only() {
        let runtime = site_runtime();
        let inspector = LinkInspector::new(&runtime);

        let links = inspector.links_into_core(Path::new("/var/www/site")).unwrap();
        assert_eq!(links, ["index.php"]);
    }

    #[test]
    fn test_first_link_target() {
        let runtime = site_runtime();
        let inspector = LinkInspector::new(&runtime);

        let target = inspector.first_link_target(Path::new("/var/www/site"));
        assert_eq!(
            target,
            Some(PathBuf::from("../../../srv/dslm/cores/drupal-7.32/index.php"))
        );
    }

    #[test]
    fn test_first_link_target_missing_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let inspector = LinkInspector::new(&runtime);
        assert_eq!(inspector.first_link_target(Path::new("/var/www/none")), None);
    }

    #[test]
    fn test_is_core_link_target() {
        assert!(is_core_link_target(Path::new("/srv/dslm/cores/drupal-7.32/index.php")));
        assert!(is_core_link_target(Path::new("../cores/drupal-7.x-dev/modules")));
        assert!(!is_core_link_target(Path::new("../../dslm/dists/7.x-3.9")));
        assert!(!is_core_link_target(Path::new("index.php")));
        assert!(!is_core_link_target(Path::new("/")));
    }

    #[test]
    fn test_entry_exists_sees_dangling_links() {
        let mut runtime = MockRuntime::new();
        let link = PathBuf::from("/var/www/site/cron.php");
        runtime
            .expect_is_symlink()
            .with(eq(link.clone()))
            .returning(|_| true);

        let inspector = LinkInspector::new(&runtime);
        assert!(inspector.entry_exists(&link));
    }

    #[test]
    fn test_remove_link_delegates_to_runtime() {
        let mut runtime = MockRuntime::new();
        let link = PathBuf::from("/var/www/site/index.php");
        runtime
            .expect_remove_symlink()
            .with(eq(link.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let inspector = LinkInspector::new(&runtime);
        inspector.remove_link(&link).unwrap();
    }
}
