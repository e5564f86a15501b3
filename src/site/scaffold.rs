//! Installation-local directories that core switches never link.

use anyhow::Result;
use log::{debug, info};
use std::path::Path;

use crate::runtime::Runtime;

/// Settings template shipped inside every core.
pub const SETTINGS_TEMPLATE: &str = "default.settings.php";

/// Make sure `sites/default/files` exists under `dest` (and `profiles` when
/// the repository links profiles), then copy the core's settings template
/// into `sites/default` unless one is already there.
///
/// Existing directories and an existing template are left alone, so running
/// this after every core switch is harmless. `sites/all` is not created: it
/// is the distribution link.
#[tracing::instrument(skip(runtime))]
pub fn ensure_site_scaffold<R: Runtime + ?Sized>(
    runtime: &R,
    core_dir: &Path,
    dest: &Path,
    with_profiles: bool,
) -> Result<()> {
    let sites_default = dest.join("sites").join("default");
    let files = sites_default.join("files");
    if !runtime.exists(&files) {
        debug!("Creating {:?}", files);
        runtime.create_dir_all(&files)?;
    }

    if with_profiles {
        let profiles = dest.join("profiles");
        if !runtime.exists(&profiles) && !runtime.is_symlink(&profiles) {
            debug!("Creating {:?}", profiles);
            runtime.create_dir_all(&profiles)?;
        }
    }

    let template = core_dir.join("sites").join("default").join(SETTINGS_TEMPLATE);
    let copy = sites_default.join(SETTINGS_TEMPLATE);
    if runtime.exists(&template) && !runtime.exists(&copy) {
        info!("Copying {:?} to {:?}", template, copy);
        runtime.copy(&template, &copy)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_fresh_site_gets_directories_and_template() {
        let mut runtime = MockRuntime::new();
        let core = PathBuf::from("/srv/dslm/cores/drupal-7.32");
        let dest = PathBuf::from("/var/www/site");
        let files = dest.join("sites/default/files");
        let template = core.join("sites/default/default.settings.php");
        let copy = dest.join("sites/default/default.settings.php");

        // --- 1. sites/default/files is missing ---
        runtime
            .expect_exists()
            .with(eq(files.clone()))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(files.clone()))
            .times(1)
            .returning(|_| Ok(()));

        // --- 2. Template copied once ---
        runtime
            .expect_exists()
            .with(eq(template.clone()))
            .returning(|_| true);
        runtime
            .expect_exists()
            .with(eq(copy.clone()))
            .returning(|_| false);
        runtime
            .expect_copy()
            .with(eq(template), eq(copy))
            .times(1)
            .returning(|_, _| Ok(10));

        ensure_site_scaffold(&runtime, &core, &dest, false).unwrap();
    }

    #[test]
    fn test_existing_template_is_never_overwritten() {
        let mut runtime = MockRuntime::new();
        let core = PathBuf::from("/srv/dslm/cores/drupal-7.32");
        let dest = PathBuf::from("/var/www/site");

        // Everything already exists
        runtime.expect_exists().returning(|_| true);
        runtime.expect_create_dir_all().times(0);
        runtime.expect_copy().times(0);

        ensure_site_scaffold(&runtime, &core, &dest, false).unwrap();
    }

    #[test]
    fn test_profiles_dir_created_for_profile_repositories() {
        let mut runtime = MockRuntime::new();
        let core = PathBuf::from("/srv/dslm/cores/drupal-7.32");
        let dest = PathBuf::from("/var/www/site");
        let profiles = dest.join("profiles");

        let missing = profiles.clone();
        runtime
            .expect_exists()
            .returning(move |p| p != missing.as_path());
        runtime
            .expect_is_symlink()
            .with(eq(profiles.clone()))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(profiles))
            .times(1)
            .returning(|_| Ok(()));

        ensure_site_scaffold(&runtime, &core, &dest, true).unwrap();
    }
}
