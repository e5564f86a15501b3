//! Installation side of dslm: reading what a site is linked to and
//! re-pointing its links at repository entries.

mod engine;
mod inspector;
mod scaffold;

pub use engine::{Dslm, INSTALLATION_MARKERS, Latest, SiteInfo};
pub use inspector::{LinkBinding, LinkInspector, is_core_link_target};
pub use scaffold::{SETTINGS_TEMPLATE, ensure_site_scaffold};
