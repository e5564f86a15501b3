//! The central repository ("dslm base") holding cores and extension packages.
//!
//! Layout: `<base>/cores/<core>` plus `<base>/dists/<dist>` and/or
//! `<base>/profiles/<profile>`. Entries are only ever read here; how they get
//! into the repository is not this crate's business.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::DslmError;
use crate::runtime::Runtime;

use super::Catalog;
use super::version::PackageKind;

/// A validated repository root.
///
/// Construction fails unless `cores/` and at least one of `dists/` or
/// `profiles/` exist, so every `Repository` value is usable.
pub struct Repository<'a, R: Runtime> {
    runtime: &'a R,
    base: PathBuf,
    has_dists: bool,
    has_profiles: bool,
}

impl<'a, R: Runtime> Repository<'a, R> {
    /// Validate `base` and resolve it to its canonical path.
    #[tracing::instrument(skip(runtime))]
    pub fn open(runtime: &'a R, base: &Path) -> Result<Self> {
        let invalid = |reason: &str| DslmError::InvalidRepository {
            path: base.to_path_buf(),
            reason: reason.to_string(),
        };

        if !runtime.is_dir(base) {
            return Err(invalid("not a directory").into());
        }
        if !runtime.is_dir(&base.join(PackageKind::Core.collection())) {
            return Err(invalid("missing the cores directory").into());
        }

        let has_dists = runtime.is_dir(&base.join(PackageKind::Distribution.collection()));
        let has_profiles = runtime.is_dir(&base.join(PackageKind::Profile.collection()));
        if !has_dists && !has_profiles {
            return Err(invalid("missing a dists or profiles directory").into());
        }

        let base = runtime
            .canonicalize(base)
            .map_err(|e| invalid(&format!("{:#}", e)))?;
        debug!(
            "Using repository {:?} (dists: {}, profiles: {})",
            base, has_dists, has_profiles
        );

        Ok(Self {
            runtime,
            base,
            has_dists,
            has_profiles,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn has_dists(&self) -> bool {
        self.has_dists
    }

    pub fn has_profiles(&self) -> bool {
        self.has_profiles
    }

    /// Whether the repository carries a collection for `kind`.
    pub fn has_collection(&self, kind: PackageKind) -> bool {
        match kind {
            PackageKind::Core => true,
            PackageKind::Distribution => self.has_dists,
            PackageKind::Profile => self.has_profiles,
        }
    }

    /// Returns: `<base>/<cores|dists|profiles>`
    pub fn collection_dir(&self, kind: PackageKind) -> PathBuf {
        self.base.join(kind.collection())
    }

    /// Returns: `<base>/<collection>/<raw>`
    pub fn entry_dir(&self, kind: PackageKind, raw: &str) -> PathBuf {
        self.collection_dir(kind).join(raw)
    }

    /// Scan the collection for `kind`. Nothing is cached; every call lists
    /// the directory again.
    pub fn catalog(&self, kind: PackageKind) -> Result<Catalog> {
        if !self.has_collection(kind) {
            return Err(DslmError::InvalidRepository {
                path: self.base.clone(),
                reason: format!("it has no {} directory", kind.collection()),
            }
            .into());
        }
        Catalog::scan(self.runtime, &self.collection_dir(kind), kind)
    }
}
