use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// On-disk settings, `<config_dir>/dslm/config.json`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base: Option<PathBuf>,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The repository root ("dslm base")
    pub base: PathBuf,
}

impl Config {
    /// Resolve the repository root: an explicit `base` (flag or `DSLM_BASE`)
    /// wins, then the `base` key of the config file.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, base: Option<PathBuf>) -> Result<Self> {
        if let Some(base) = base {
            debug!("Using base from command line: {:?}", base);
            return Ok(Self { base });
        }

        let path = config_path(runtime).context("Could not find the config directory")?;
        let file = load_file(runtime, &path)?;
        let base = file.base.with_context(|| {
            format!(
                "No dslm base configured. Pass --base, set DSLM_BASE, or add \"base\" to {}",
                path.display()
            )
        })?;

        let base = if base.is_relative() {
            runtime
                .home_dir()
                .context("Could not find home directory")?
                .join(base)
        } else {
            base
        };
        debug!("Using base from {:?}: {:?}", path, base);
        Ok(Self { base })
    }
}

/// Returns: `<config_dir>/dslm/config.json`
pub fn config_path<R: Runtime + ?Sized>(runtime: &R) -> Option<PathBuf> {
    runtime
        .config_dir()
        .map(|dir| dir.join("dslm").join("config.json"))
}

fn load_file<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<ConfigFile> {
    if !runtime.exists(path) {
        return Ok(ConfigFile::default());
    }
    let content = runtime.read_to_string(path)?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}
