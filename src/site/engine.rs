use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::catalog::{Bucket, Catalog, PackageKind, Repository, VersionEntry, major_version};
use crate::error::DslmError;
use crate::runtime::{Runtime, normalize_path, portable_link_target};

use super::inspector::{LinkBinding, LinkInspector, is_core_link_target};
use super::scaffold::ensure_site_scaffold;

/// Files that together mark a directory as an installation.
pub const INSTALLATION_MARKERS: [&str; 3] = ["install.php", "update.php", "cron.php"];

/// What an installation is currently linked to.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub core: String,
    pub dist: Option<String>,
    pub profiles: Vec<String>,
}

/// Newest release-bucket entries of the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Latest {
    pub core: VersionEntry,
    /// `None` when the repository has no dists collection
    pub dist: Option<VersionEntry>,
}

/// The switching engine: points an installation's symlinks at repository
/// entries.
///
/// Every public operation that fails also records its message, readable
/// through [`Dslm::last_error`]. A cancelled selection is an abort and is not
/// recorded.
pub struct Dslm<'a, R: Runtime> {
    runtime: &'a R,
    repository: Repository<'a, R>,
    inspector: LinkInspector<'a, R>,
    last_error: Option<String>,
}

impl<'a, R: Runtime> Dslm<'a, R> {
    pub fn new(runtime: &'a R, repository: Repository<'a, R>) -> Self {
        Self {
            runtime,
            repository,
            inspector: LinkInspector::new(runtime),
            last_error: None,
        }
    }

    /// Validate the repository at `base` and build an engine on it.
    pub fn open(runtime: &'a R, base: &Path) -> Result<Self> {
        let repository = Repository::open(runtime, base)?;
        Ok(Self::new(runtime, repository))
    }

    pub fn repository(&self) -> &Repository<'a, R> {
        &self.repository
    }

    /// Message of the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !matches!(e.downcast_ref::<DslmError>(), Some(DslmError::Cancelled)) {
                let message = format!("{:#}", e);
                debug!("Operation failed: {}", message);
                self.last_error = Some(message);
            }
        }
        result
    }

    /// Catalog of one collection. A collection that cannot be listed gives an
    /// empty catalog and sets the last error.
    pub fn catalog(&mut self, kind: PackageKind) -> Catalog {
        let result = self.repository.catalog(kind);
        self.record(result).unwrap_or_else(|_| Catalog::empty(kind))
    }

    pub fn cores(&mut self) -> Catalog {
        self.catalog(PackageKind::Core)
    }

    pub fn dists(&mut self) -> Catalog {
        self.catalog(PackageKind::Distribution)
    }

    pub fn profiles(&mut self) -> Catalog {
        self.catalog(PackageKind::Profile)
    }

    pub fn is_valid_core(&mut self, name: &str) -> bool {
        self.cores().contains(name)
    }

    pub fn is_valid_dist(&mut self, name: &str) -> bool {
        self.dists().contains(name)
    }

    /// Newest release core and (when the repository has dists) newest release dist.
    pub fn latest(&mut self) -> Result<Latest> {
        let result = self.latest_inner();
        self.record(result)
    }

    fn latest_inner(&self) -> Result<Latest> {
        let core = self
            .repository
            .catalog(PackageKind::Core)?
            .latest(Bucket::Release)?
            .clone();
        let dist = if self.repository.has_dists() {
            Some(
                self.repository
                    .catalog(PackageKind::Distribution)?
                    .latest(Bucket::Release)?
                    .clone(),
            )
        } else {
            None
        };
        Ok(Latest { core, dist })
    }

    /// Whether `dir` holds every installation marker file (linked or real).
    pub fn is_installation(&self, dir: &Path) -> bool {
        INSTALLATION_MARKERS
            .iter()
            .all(|marker| self.inspector.entry_exists(&dir.join(marker)))
    }

    /// Absolute form of `dir`: canonical when it exists, lexically
    /// normalized otherwise.
    fn resolve_dest(&self, dir: &Path) -> Result<PathBuf> {
        let dir = if dir.is_relative() {
            self.runtime.current_dir()?.join(dir)
        } else {
            dir.to_path_buf()
        };
        if self.runtime.exists(&dir) {
            self.runtime.canonicalize(&dir)
        } else {
            Ok(normalize_path(&dir))
        }
    }

    fn require_installation(&self, dest: &Path, force: bool) -> Result<()> {
        if force || self.is_installation(dest) {
            return Ok(());
        }
        Err(DslmError::InvalidDestination {
            path: dest.to_path_buf(),
            reason: "Invalid Drupal directory".to_string(),
        }
        .into())
    }

    /// Pick an entry from `catalog`.
    ///
    /// A requested name present in the catalog is used as-is. Otherwise the
    /// user chooses among the entries (restricted to `major` when given).
    fn select(
        &self,
        catalog: &Catalog,
        requested: Option<&str>,
        major: Option<u64>,
    ) -> Result<VersionEntry> {
        let kind = catalog.kind();
        if let Some(requested) = requested {
            if let Some(entry) = catalog.find(requested) {
                return Ok(entry.clone());
            }
            warn!("{} {} is not in the repository", kind, requested);
        }

        let candidates = match major {
            Some(major) => catalog.with_major(major),
            None => catalog.clone(),
        };
        let names = candidates.names(Bucket::All);
        if names.is_empty() {
            return Err(DslmError::NoCandidate {
                kind,
                detail: major
                    .map(|m| format!("matching major version {}", m))
                    .unwrap_or_default(),
            }
            .into());
        }

        match self.runtime.choose(&format!("Choose a {}", kind), &names)? {
            Some(choice) => candidates.find(&choice).cloned().ok_or_else(|| {
                DslmError::NoCandidate {
                    kind,
                    detail: format!("named {}", choice),
                }
                .into()
            }),
            None => Err(DslmError::Cancelled.into()),
        }
    }

    /// Core entries never linked at the top level of an installation.
    fn reserved_entries(&self) -> Vec<&'static str> {
        let mut reserved = vec!["sites"];
        if self.repository.has_profiles() {
            reserved.push("profiles");
        }
        reserved
    }

    /// Name of the core the top-level links of `dest` point into, if any.
    fn linked_core(&self, dest: &Path) -> Result<Option<String>> {
        Ok(self
            .inspector
            .current_links(dest)?
            .into_iter()
            .map(|(_, target)| target)
            .find(|target| is_core_link_target(target))
            .and_then(|target| file_name_of(target.parent()?)))
    }

    /// Core currently linked into `dir`. Unreadable or unlinked sites have none.
    pub fn current_core(&self, dir: &Path) -> Option<String> {
        let dest = self.resolve_dest(dir).ok()?;
        self.linked_core(&dest).ok().flatten()
    }

    /// Describe the core, dist and profiles `dir` is linked to.
    #[tracing::instrument(skip(self))]
    pub fn site_info(&mut self, dir: &Path) -> Result<SiteInfo> {
        let result = self.site_info_inner(dir);
        self.record(result)
    }

    fn site_info_inner(&self, dir: &Path) -> Result<SiteInfo> {
        let dest = self.resolve_dest(dir)?;
        if !self.is_installation(&dest) {
            return Err(DslmError::InvalidDestination {
                path: dest,
                reason: "This directory isn't a Drupal dir".to_string(),
            }
            .into());
        }

        let core = self.linked_core(&dest)?;

        let dist = self
            .inspector
            .first_link_target(&dest.join("sites"))
            .and_then(|target| file_name_of(&target));

        let profiles: Vec<String> = if self.repository.has_profiles() {
            self.inspector
                .current_links(&dest.join("profiles"))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(_, target)| file_name_of(&target))
                .filter(|name| VersionEntry::parse(name, PackageKind::Profile).is_some())
                .collect()
        } else {
            Vec::new()
        };

        match core {
            Some(core) if dist.is_some() || !profiles.is_empty() => Ok(SiteInfo {
                core,
                dist,
                profiles,
            }),
            _ => Err(DslmError::InvalidDestination {
                path: dest,
                reason: "Invalid symlinked site".to_string(),
            }
            .into()),
        }
    }

    /// Every top-level link of `dir` (and of its `sites` and `profiles`
    /// directories) that points into the repository.
    pub fn links(&mut self, dir: &Path) -> Result<Vec<LinkBinding>> {
        let result = self.links_inner(dir);
        self.record(result)
    }

    fn links_inner(&self, dir: &Path) -> Result<Vec<LinkBinding>> {
        let dest = self.resolve_dest(dir)?;
        let mut bindings = self.inspector.bindings(&dest, &self.repository)?;
        for sub in ["sites", "profiles"] {
            let sub_dir = dest.join(sub);
            if self.runtime.is_dir(&sub_dir) && !self.runtime.is_symlink(&sub_dir) {
                bindings.extend(
                    self.inspector
                        .bindings(&sub_dir, &self.repository)?
                        .into_iter()
                        .map(|mut binding| {
                            binding.entry = format!("{}/{}", sub, binding.entry);
                            binding
                        }),
                );
            }
        }
        Ok(bindings)
    }

    /// Create an installation at `dir` linked to `core` and (when the
    /// repository has dists) to a dist of the same major version.
    #[tracing::instrument(skip(self))]
    pub fn new_site(
        &mut self,
        dir: &Path,
        core: Option<&str>,
        dist: Option<&str>,
        force: bool,
    ) -> Result<SiteInfo> {
        let result = self.new_site_inner(dir, core, dist, force);
        self.record(result)
    }

    fn new_site_inner(
        &self,
        dir: &Path,
        core: Option<&str>,
        dist: Option<&str>,
        force: bool,
    ) -> Result<SiteInfo> {
        let dest = self.resolve_dest(dir)?;
        if !force && self.inspector.entry_exists(&dest) {
            return Err(DslmError::InvalidDestination {
                path: dest,
                reason: "The directory already exists".to_string(),
            }
            .into());
        }

        let core = self.switch_core_inner(&dest, core, true)?;
        let dist = if self.repository.has_dists() {
            Some(self.switch_distribution_inner(&dest, dist, true, Some(&core))?)
        } else {
            None
        };
        info!("Created site {:?}", dest);

        Ok(SiteInfo {
            core,
            dist,
            profiles: Vec::new(),
        })
    }

    /// Point every top-level entry of `dir` at `core` and return the core
    /// actually linked.
    ///
    /// Each conflict is detected before anything is touched: a real file or
    /// directory, or a symlink that does not point into a core, in the way of
    /// a core entry aborts the switch with the site unchanged. If linking
    /// fails part way, the stale links are already gone and the site is left
    /// partially switched; re-running the switch repairs it.
    #[tracing::instrument(skip(self))]
    pub fn switch_core(&mut self, dir: &Path, core: Option<&str>, force: bool) -> Result<String> {
        let result = self.switch_core_inner(dir, core, force);
        self.record(result)
    }

    fn switch_core_inner(&self, dir: &Path, core: Option<&str>, force: bool) -> Result<String> {
        let dest = self.resolve_dest(dir)?;
        self.require_installation(&dest, force)?;

        let cores = self.repository.catalog(PackageKind::Core)?;
        let core = self.select(&cores, core, None)?;
        let source_dir = self.repository.entry_dir(PackageKind::Core, &core.raw);

        let reserved = self.reserved_entries();
        let entries: Vec<String> = self
            .runtime
            .read_dir(&source_dir)?
            .iter()
            .filter_map(|path| file_name_of(path))
            .filter(|name| !reserved.contains(&name.as_str()))
            .collect();

        let dest_exists = self.runtime.exists(&dest);
        let stale = if dest_exists {
            self.inspector.links_into_core(&dest)?
        } else {
            Vec::new()
        };
        for entry in &entries {
            let path = dest.join(entry);
            if !stale.contains(entry) && self.inspector.entry_exists(&path) {
                return Err(DslmError::DestinationConflict { path }.into());
            }
        }

        if !dest_exists {
            info!("Creating {:?}", dest);
            self.runtime.create_dir_all(&dest)?;
        }
        let dest = self.runtime.canonicalize(&dest)?;

        for name in &stale {
            self.inspector.remove_link(&dest.join(name))?;
        }

        let link_base = portable_link_target(self.runtime, &source_dir, &dest)?;
        for entry in &entries {
            self.runtime.symlink(&link_base.join(entry), &dest.join(entry))?;
        }
        debug!("Linked {} entries from {:?}", entries.len(), source_dir);

        ensure_site_scaffold(
            self.runtime,
            &source_dir,
            &dest,
            self.repository.has_profiles(),
        )?;

        info!("Switched {:?} to core {}", dest, core.raw);
        Ok(core.raw)
    }

    /// Point `dir/sites/all` at `dist` and return the dist actually linked.
    ///
    /// `major_filter` (usually the core name) restricts the prompt to dists
    /// of the same major version. Only the `sites/all` link changes.
    #[tracing::instrument(skip(self))]
    pub fn switch_distribution(
        &mut self,
        dir: &Path,
        dist: Option<&str>,
        force: bool,
        major_filter: Option<&str>,
    ) -> Result<String> {
        let result = self.switch_distribution_inner(dir, dist, force, major_filter);
        self.record(result)
    }

    fn switch_distribution_inner(
        &self,
        dir: &Path,
        dist: Option<&str>,
        force: bool,
        major_filter: Option<&str>,
    ) -> Result<String> {
        let dest = self.resolve_dest(dir)?;
        self.require_installation(&dest, force)?;

        let dists = self.repository.catalog(PackageKind::Distribution)?;
        let major = major_filter.and_then(|filter| {
            let major = major_version(filter);
            if major.is_none() {
                warn!("No major version in {:?}; not filtering", filter);
            }
            major
        });
        let dist = self.select(&dists, dist, major)?;

        let sites = dest.join("sites");
        if self.runtime.is_symlink(&sites)
            || (self.runtime.exists(&sites) && !self.runtime.is_dir(&sites))
        {
            return Err(DslmError::DestinationConflict { path: sites }.into());
        }
        let link = sites.join("all");
        let replace = self.runtime.is_symlink(&link);
        if !replace && self.runtime.exists(&link) {
            return Err(DslmError::DestinationConflict { path: link }.into());
        }

        if !self.runtime.exists(&sites) {
            self.runtime.create_dir_all(&sites)?;
        }
        let sites = self.runtime.canonicalize(&sites)?;
        let link = sites.join("all");
        if replace {
            self.inspector.remove_link(&link)?;
        }

        let source_dir = self.repository.entry_dir(PackageKind::Distribution, &dist.raw);
        let target = portable_link_target(self.runtime, &source_dir, &sites)?;
        self.runtime.symlink(&target, &link)?;

        info!("Switched {:?} to distribution {}", dest, dist.raw);
        Ok(dist.raw)
    }

    /// Link profile `name` at `version` into `dir/profiles/<name>` and return
    /// the link path.
    ///
    /// An existing link is replaced only with `allow_relink`; a real
    /// directory in its place is never touched.
    #[tracing::instrument(skip(self))]
    pub fn link_profile(
        &mut self,
        name: &str,
        version: &str,
        dir: &Path,
        allow_relink: bool,
    ) -> Result<PathBuf> {
        let result = self.link_profile_inner(name, version, dir, allow_relink);
        self.record(result)
    }

    fn link_profile_inner(
        &self,
        name: &str,
        version: &str,
        dir: &Path,
        allow_relink: bool,
    ) -> Result<PathBuf> {
        let raw = format!("{}-{}", name, version);
        let profiles = self.repository.catalog(PackageKind::Profile)?;
        let entry = profiles
            .find(&raw)
            .filter(|entry| entry.name.as_deref() == Some(name))
            .cloned()
            .ok_or_else(|| DslmError::NoCandidate {
                kind: PackageKind::Profile,
                detail: format!("named {}", raw),
            })?;

        let dest = self.resolve_dest(dir)?;
        self.require_installation(&dest, false)?;

        // A linked `profiles` belongs to a core; writing through it would
        // change the repository.
        let profiles_dir = dest.join("profiles");
        if self.runtime.is_symlink(&profiles_dir)
            || (self.runtime.exists(&profiles_dir) && !self.runtime.is_dir(&profiles_dir))
        {
            return Err(DslmError::DestinationConflict { path: profiles_dir }.into());
        }
        let link = profiles_dir.join(name);
        if self.inspector.entry_exists(&link) {
            if !allow_relink {
                return Err(DslmError::AlreadyLinked {
                    name: name.to_string(),
                    path: link,
                }
                .into());
            }
            if !self.runtime.is_symlink(&link) {
                return Err(DslmError::DestinationConflict { path: link }.into());
            }
        }

        if !self.runtime.exists(&profiles_dir) {
            self.runtime.create_dir_all(&profiles_dir)?;
        }
        if self.runtime.is_symlink(&link) {
            self.inspector.remove_link(&link)?;
        }

        let source_dir = self.repository.entry_dir(PackageKind::Profile, &entry.raw);
        let target = portable_link_target(self.runtime, &source_dir, &profiles_dir)?;
        self.runtime.symlink(&target, &link)?;

        info!("Linked profile {} to {}", name, entry.raw);
        Ok(link)
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
