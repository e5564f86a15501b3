use anyhow::{Result, bail};
use log::debug;
use std::path::PathBuf;

use crate::catalog::{Bucket, Catalog, PackageKind};
use crate::runtime::Runtime;
use crate::site::Dslm;

use super::open;

/// List cores ordered by version
#[tracing::instrument(skip(runtime, base))]
pub fn cores<R: Runtime>(runtime: R, base: Option<PathBuf>, bucket: Bucket) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let catalog = checked_catalog(&mut dslm, PackageKind::Core)?;
    print_names(&catalog, bucket);
    Ok(())
}

/// List distributions ordered by version
#[tracing::instrument(skip(runtime, base))]
pub fn dists<R: Runtime>(runtime: R, base: Option<PathBuf>, bucket: Bucket) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let catalog = checked_catalog(&mut dslm, PackageKind::Distribution)?;
    print_names(&catalog, bucket);
    Ok(())
}

/// List profiles grouped by name, optionally only the group `name`
#[tracing::instrument(skip(runtime, base))]
pub fn profiles<R: Runtime>(runtime: R, base: Option<PathBuf>, name: Option<&str>) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let catalog = checked_catalog(&mut dslm, PackageKind::Profile)?;

    let groups: Vec<(String, Catalog)> = catalog
        .by_name()
        .into_iter()
        .filter(|(group, _)| name.is_none_or(|wanted| wanted == group.as_str()))
        .collect();
    if groups.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    for (group, entries) in groups {
        println!("{}:", group);
        for entry in entries.iter() {
            println!("  {}", entry.version);
        }
    }
    Ok(())
}

/// Print the latest release core, dist and profiles
#[tracing::instrument(skip(runtime, base))]
pub fn latest<R: Runtime>(runtime: R, base: Option<PathBuf>) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let latest = dslm.latest()?;

    println!("Core: {}", latest.core);
    if let Some(dist) = latest.dist {
        println!("Distribution: {}", dist);
    }
    if dslm.repository().has_profiles() {
        for (name, group) in dslm.profiles().by_name() {
            match group.latest(Bucket::Release) {
                Ok(entry) => println!("Profile {}: {}", name, entry),
                Err(e) => debug!("Skipping profile {}: {}", name, e),
            }
        }
    }
    Ok(())
}

/// The catalog of `kind`, or the failure that left it empty.
fn checked_catalog<R: Runtime>(dslm: &mut Dslm<'_, R>, kind: PackageKind) -> Result<Catalog> {
    let catalog = dslm.catalog(kind);
    if catalog.is_empty() {
        if let Some(error) = dslm.last_error() {
            bail!("{}", error);
        }
    }
    Ok(catalog)
}

fn print_names(catalog: &Catalog, bucket: Bucket) {
    let names = catalog.names(bucket);
    if names.is_empty() {
        println!("No {} found.", catalog.kind().collection());
        return;
    }
    for name in names {
        println!("{}", name);
    }
}
