//! Ordered listing of the versioned entries in one repository collection.

use anyhow::Result;
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DslmError;
use crate::runtime::Runtime;

use super::version::{Bucket, PackageKind, VersionEntry};

/// Entries of one kind, ordered by version (oldest first).
///
/// A catalog is derived from a directory listing every time it is needed and
/// is never cached; names that fail to parse are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    kind: PackageKind,
    entries: Vec<VersionEntry>,
}

impl Catalog {
    /// Build a catalog from raw directory names.
    ///
    /// The sort is stable, so entries with equal version tokens keep their
    /// input order.
    pub fn from_names<I, S>(kind: PackageKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<VersionEntry> = names
            .into_iter()
            .filter_map(|name| VersionEntry::parse(name.as_ref(), kind))
            .collect();
        entries.sort_by(|a, b| a.cmp_version(b));
        Self { kind, entries }
    }

    pub fn empty(kind: PackageKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// List `dir` (non-recursive) and keep every entry that parses as `kind`.
    #[tracing::instrument(skip(runtime))]
    pub fn scan<R: Runtime + ?Sized>(runtime: &R, dir: &Path, kind: PackageKind) -> Result<Self> {
        let names: Vec<String> = runtime
            .read_dir(dir)?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        let catalog = Self::from_names(kind, &names);
        debug!(
            "Scanned {:?}: {} of {} entries are valid {} entries",
            dir,
            catalog.len(),
            names.len(),
            kind
        );
        Ok(catalog)
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `bucket`, oldest first.
    pub fn bucket(&self, bucket: Bucket) -> Vec<&VersionEntry> {
        self.entries.iter().filter(|e| e.in_bucket(bucket)).collect()
    }

    /// Raw names in `bucket`, oldest first.
    pub fn names(&self, bucket: Bucket) -> Vec<String> {
        self.bucket(bucket).into_iter().map(|e| e.raw.clone()).collect()
    }

    /// Highest entry in `bucket`. An empty bucket is a `NoCandidate` failure,
    /// never a fallback to another bucket.
    pub fn latest(&self, bucket: Bucket) -> Result<&VersionEntry> {
        self.bucket(bucket).into_iter().last().ok_or_else(|| {
            let detail = match bucket {
                Bucket::All => String::new(),
                Bucket::Release => "in the release bucket".to_string(),
                Bucket::Dev => "in the dev bucket".to_string(),
            };
            DslmError::NoCandidate {
                kind: self.kind,
                detail,
            }
            .into()
        })
    }

    /// Look up an entry by its raw directory name.
    pub fn find(&self, raw: &str) -> Option<&VersionEntry> {
        self.entries.iter().find(|e| e.raw == raw)
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.find(raw).is_some()
    }

    /// Only the entries whose major version is `major`.
    pub fn with_major(&self, major: u64) -> Self {
        Self {
            kind: self.kind,
            entries: self
                .entries
                .iter()
                .filter(|e| e.major == major)
                .cloned()
                .collect(),
        }
    }

    /// Split by logical name, each group keeping version order.
    ///
    /// Distributions have no logical name and land under the empty string.
    pub fn by_name(&self) -> BTreeMap<String, Catalog> {
        let mut groups: BTreeMap<String, Catalog> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.name.clone().unwrap_or_default())
                .or_insert_with(|| Catalog {
                    kind: self.kind,
                    entries: Vec::new(),
                })
                .entries
                .push(entry.clone());
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind_of;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn raw(entries: &[&VersionEntry]) -> Vec<String> {
        entries.iter().map(|e| e.raw.clone()).collect()
    }

    #[test]
    fn test_from_names_orders_and_filters() {
        let catalog = Catalog::from_names(
            PackageKind::Core,
            ["drupal-7.32", "README.txt", "drupal-7.9", "drupal-7.x-dev", "drupal-7.10"],
        );
        assert_eq!(
            catalog.names(Bucket::All),
            ["drupal-7.x-dev", "drupal-7.9", "drupal-7.10", "drupal-7.32"]
        );
        assert_eq!(
            catalog.names(Bucket::Release),
            ["drupal-7.9", "drupal-7.10", "drupal-7.32"]
        );
        assert_eq!(catalog.names(Bucket::Dev), ["drupal-7.x-dev"]);
    }

    #[test]
    fn test_latest_per_bucket() {
        let catalog = Catalog::from_names(PackageKind::Core, ["drupal-7.32", "drupal-7.x-dev"]);
        assert_eq!(catalog.latest(Bucket::Release).unwrap().raw, "drupal-7.32");
        assert_eq!(catalog.latest(Bucket::Dev).unwrap().raw, "drupal-7.x-dev");
        assert_eq!(catalog.latest(Bucket::All).unwrap().raw, "drupal-7.32");
    }

    #[test]
    fn test_latest_empty_bucket_is_no_candidate() {
        let catalog = Catalog::from_names(PackageKind::Distribution, ["7.x-3.9-beta1"]);
        let err = catalog.latest(Bucket::Release).unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(DslmError::NoCandidate {
                kind: PackageKind::Distribution,
                ..
            })
        ));
        assert_eq!(catalog.latest(Bucket::Dev).unwrap().raw, "7.x-3.9-beta1");
    }

    #[test]
    fn test_sorting_is_idempotent_and_stable() {
        let names = ["drupal-7.32", "pressflow-7.32", "drupal-7.9", "acquia-7.32"];
        let catalog = Catalog::from_names(PackageKind::Core, names);
        let sorted = catalog.names(Bucket::All);
        // Equal version tokens keep their input order
        assert_eq!(
            sorted,
            ["drupal-7.9", "drupal-7.32", "pressflow-7.32", "acquia-7.32"]
        );

        let again = Catalog::from_names(PackageKind::Core, &sorted);
        assert_eq!(again.names(Bucket::All), sorted);
    }

    #[test]
    fn test_with_major_filters() {
        let catalog =
            Catalog::from_names(PackageKind::Distribution, ["6.x-2.20", "7.x-3.9", "7.x-3.10"]);
        let seven = catalog.with_major(7);
        assert_eq!(seven.names(Bucket::All), ["7.x-3.9", "7.x-3.10"]);
        assert!(catalog.with_major(8).is_empty());
    }

    #[test]
    fn test_by_name_groups_profiles() {
        let catalog = Catalog::from_names(
            PackageKind::Profile,
            [
                "openatrium-7.x-2.10",
                "commons-7.x-3.1",
                "openatrium-7.x-2.9",
                "openatrium-7.x-2.11-beta1",
            ],
        );
        let groups = catalog.by_name();
        assert_eq!(groups.keys().collect::<Vec<_>>(), ["commons", "openatrium"]);
        let atrium = &groups["openatrium"];
        assert_eq!(
            raw(&atrium.bucket(Bucket::All)),
            ["openatrium-7.x-2.9", "openatrium-7.x-2.10", "openatrium-7.x-2.11-beta1"]
        );
        assert_eq!(atrium.latest(Bucket::Release).unwrap().raw, "openatrium-7.x-2.10");
    }

    #[test]
    fn test_find_and_contains() {
        let catalog = Catalog::from_names(PackageKind::Core, ["drupal-7.32"]);
        assert!(catalog.contains("drupal-7.32"));
        assert!(!catalog.contains("drupal-7.31"));
        assert_eq!(catalog.find("drupal-7.32").unwrap().version, "7.32");
    }

    #[test]
    fn test_scan_reads_directory_names() {
        let mut runtime = MockRuntime::new();
        let cores = PathBuf::from("/srv/dslm/cores");

        // Read dir /srv/dslm/cores -> two cores and a stray file
        runtime
            .expect_read_dir()
            .with(eq(cores.clone()))
            .returning(|p| {
                Ok(vec![
                    p.join("drupal-7.31"),
                    p.join("drupal-7.32"),
                    p.join("notes.txt"),
                ])
            });

        let catalog = Catalog::scan(&runtime, &cores, PackageKind::Core).unwrap();
        assert_eq!(catalog.names(Bucket::All), ["drupal-7.31", "drupal-7.32"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let result = Catalog::scan(&runtime, &PathBuf::from("/nope"), PackageKind::Core);
        assert!(result.is_err());
    }
}
