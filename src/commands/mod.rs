//! Command handlers behind the `dslm` binary. Each one resolves the
//! configuration, opens the engine and prints its result to stdout.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::{config::Config, runtime::Runtime, site::Dslm};

mod catalog;
mod site;

pub use catalog::{cores, dists, latest, profiles};
pub use site::{info, link_profile, links, new_site, switch_core, switch_dist};

/// Open the engine on the configured repository.
fn open<R: Runtime>(runtime: &R, base: Option<PathBuf>) -> Result<Dslm<'_, R>> {
    let config = Config::load(runtime, base)?;
    Dslm::open(runtime, &config.base)
}

/// Destination directory; the working directory when none is given.
fn dest_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
