use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::catalog::{Bucket, PackageKind, VersionEntry};
use crate::runtime::Runtime;
use crate::site::{Dslm, SiteInfo};

use super::{dest_dir, open};

/// Show what a site is linked to
#[tracing::instrument(skip(runtime, base))]
pub fn info<R: Runtime>(runtime: R, base: Option<PathBuf>, dir: Option<&Path>) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let info = dslm.site_info(&dest_dir(dir))?;
    print_site_info(&info);
    Ok(())
}

/// Show every link of a site that points into the repository
#[tracing::instrument(skip(runtime, base))]
pub fn links<R: Runtime>(runtime: R, base: Option<PathBuf>, dir: Option<&Path>) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let bindings = dslm.links(&dest_dir(dir))?;
    if bindings.is_empty() {
        println!("No links into {}.", dslm.repository().base().display());
        return Ok(());
    }
    for binding in bindings {
        println!(
            "{} -> {} ({} {})",
            binding.entry,
            binding.target.display(),
            binding.package.kind,
            binding.package
        );
    }
    Ok(())
}

/// Create a new site linked to a core and a matching dist
#[tracing::instrument(skip(runtime, base))]
pub fn new_site<R: Runtime>(
    runtime: R,
    base: Option<PathBuf>,
    dir: &Path,
    core: Option<&str>,
    dist: Option<&str>,
    force: bool,
    use_latest: bool,
) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let core = requested_or_latest(&mut dslm, PackageKind::Core, core, use_latest, None)?;
    let dist = if dslm.repository().has_dists() {
        let major = core.as_deref().and_then(|core| core_major(&mut dslm, core));
        requested_or_latest(&mut dslm, PackageKind::Distribution, dist, use_latest, major)?
    } else {
        dist.map(str::to_string)
    };

    let info = dslm.new_site(dir, core.as_deref(), dist.as_deref(), force)?;
    println!("Created {}", dir.display());
    print_site_info(&info);
    Ok(())
}

/// Point a site's top-level links at another core
#[tracing::instrument(skip(runtime, base))]
pub fn switch_core<R: Runtime>(
    runtime: R,
    base: Option<PathBuf>,
    core: Option<&str>,
    dir: Option<&Path>,
    force: bool,
    use_latest: bool,
) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let core = requested_or_latest(&mut dslm, PackageKind::Core, core, use_latest, None)?;
    let linked = dslm.switch_core(&dest_dir(dir), core.as_deref(), force)?;
    println!("Switched to core {}", linked);
    Ok(())
}

/// Point a site's `sites/all` at another dist of its core's major version
#[tracing::instrument(skip(runtime, base))]
pub fn switch_dist<R: Runtime>(
    runtime: R,
    base: Option<PathBuf>,
    dist: Option<&str>,
    dir: Option<&Path>,
    force: bool,
    use_latest: bool,
) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let dest = dest_dir(dir);
    let current_core = dslm.current_core(&dest);
    debug!("Current core of {:?}: {:?}", dest, current_core);

    let major = current_core
        .as_deref()
        .and_then(|core| core_major(&mut dslm, core));
    let dist = requested_or_latest(&mut dslm, PackageKind::Distribution, dist, use_latest, major)?;
    let linked =
        dslm.switch_distribution(&dest, dist.as_deref(), force, current_core.as_deref())?;
    println!("Switched to distribution {}", linked);
    Ok(())
}

/// Link a profile version into a site's `profiles` directory
#[tracing::instrument(skip(runtime, base))]
pub fn link_profile<R: Runtime>(
    runtime: R,
    base: Option<PathBuf>,
    name: &str,
    version: &str,
    dir: Option<&Path>,
    relink: bool,
) -> Result<()> {
    let mut dslm = open(&runtime, base)?;
    let link = dslm.link_profile(name, version, &dest_dir(dir), relink)?;
    println!("Linked {} to {}-{}", link.display(), name, version);
    Ok(())
}

/// The requested version, or with `use_latest` the newest release entry
/// (of `major` when given) in place of an omitted one.
fn requested_or_latest<R: Runtime>(
    dslm: &mut Dslm<'_, R>,
    kind: PackageKind,
    requested: Option<&str>,
    use_latest: bool,
    major: Option<u64>,
) -> Result<Option<String>> {
    if requested.is_some() || !use_latest {
        return Ok(requested.map(str::to_string));
    }
    let catalog = dslm.catalog(kind);
    let catalog = match major {
        Some(major) => catalog.with_major(major),
        None => catalog,
    };
    Ok(Some(catalog.latest(Bucket::Release)?.raw.clone()))
}

/// Major version of a core, from its catalog entry when the repository has it.
fn core_major<R: Runtime>(dslm: &mut Dslm<'_, R>, core: &str) -> Option<u64> {
    dslm.cores()
        .find(core)
        .map(|entry| entry.major)
        .or_else(|| VersionEntry::parse(core, PackageKind::Core).map(|entry| entry.major))
}

fn print_site_info(info: &SiteInfo) {
    println!("Core: {}", info.core);
    if let Some(dist) = &info.dist {
        println!("Distribution: {}", dist);
    }
    if !info.profiles.is_empty() {
        println!("Profiles: {}", info.profiles.join(", "));
    }
}
