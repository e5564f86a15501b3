//! Repository catalog module
//!
//! This module turns the repository's directory listings into typed,
//! version-ordered entries: the version parser, the catalog built from one
//! collection, and the validated repository root that owns the collections.

mod repository;
mod scan;
mod version;

pub use repository::Repository;
pub use scan::Catalog;
pub use version::{Bucket, PackageKind, VersionEntry, compare_versions, is_prerelease, major_version};
