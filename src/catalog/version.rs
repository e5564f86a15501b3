//! Version parsing and ordering for repository entries.
//!
//! Directory names double as version records: `drupal-7.32` is a core,
//! `7.x-3.9` a distribution, `openatrium-7.x-2.0` a profile. Parsing turns
//! the name into a [`VersionEntry`] once, so nothing downstream handles the
//! raw string.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

static CORE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<name>.+?)-(?<version>(?<major>[0-9]+)\.[0-9A-Za-z._+\-]*)$").unwrap()
});

static DIST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<version>(?<major>[0-9]+)\.x-[0-9]+[0-9A-Za-z._+\-]*)$").unwrap()
});

static PROFILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<name>.+?)-(?<version>(?<major>[0-9]+)\.x-[0-9]+[0-9A-Za-z._+\-]*)$").unwrap()
});

static PRERELEASE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^a-z])(dev|alpha|beta|rc|pl)[0-9]*$").unwrap());

static MAJOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|-)([0-9]+)\.").unwrap());

/// The collection an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageKind {
    Core,
    Distribution,
    Profile,
}

impl PackageKind {
    /// Name of the repository subdirectory holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            PackageKind::Core => "cores",
            PackageKind::Distribution => "dists",
            PackageKind::Profile => "profiles",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            PackageKind::Core => &CORE_REGEX,
            PackageKind::Distribution => &DIST_REGEX,
            PackageKind::Profile => &PROFILE_REGEX,
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageKind::Core => "core",
            PackageKind::Distribution => "distribution",
            PackageKind::Profile => "profile",
        };
        f.write_str(s)
    }
}

/// Release maturity grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bucket {
    #[default]
    All,
    Release,
    Dev,
}

/// A directory entry recognized as a versioned package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Directory name, e.g. `drupal-7.32`
    pub raw: String,
    /// Logical name before the version; `None` for distributions
    pub name: Option<String>,
    /// Version token, e.g. `7.32` or `7.x-3.9`
    pub version: String,
    pub kind: PackageKind,
    pub major: u64,
    pub prerelease: bool,
}

impl VersionEntry {
    /// Parse a directory name as an entry of `kind`.
    ///
    /// Names that do not match the kind's pattern are not entries at all and
    /// yield `None`.
    pub fn parse(raw: &str, kind: PackageKind) -> Option<Self> {
        let caps = kind.pattern().captures(raw)?;
        let version = caps.name("version")?.as_str().to_string();
        let major = caps.name("major")?.as_str().parse().ok()?;

        Some(Self {
            raw: raw.to_string(),
            name: caps.name("name").map(|m| m.as_str().to_string()),
            prerelease: is_prerelease(&version),
            version,
            kind,
            major,
        })
    }

    pub fn in_bucket(&self, bucket: Bucket) -> bool {
        match bucket {
            Bucket::All => true,
            Bucket::Release => !self.prerelease,
            Bucket::Dev => self.prerelease,
        }
    }

    /// Order two entries by version token, ignoring logical names.
    pub fn cmp_version(&self, other: &Self) -> Ordering {
        compare_versions(&self.sort_key(), &other.sort_key())
    }

    /// Version token as compared: distribution-style `7.x-3.9` reads as `7.3.9`.
    fn sort_key(&self) -> String {
        match self.kind {
            PackageKind::Core => self.version.clone(),
            PackageKind::Distribution | PackageKind::Profile => self.version.replace(".x-", "."),
        }
    }
}

impl fmt::Display for VersionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether a version token ends in a pre-release marker (dev, alpha, beta, rc, pl).
pub fn is_prerelease(version: &str) -> bool {
    PRERELEASE_REGEX.is_match(version)
}

/// Major version carried by a core or distribution name: `drupal-7.32` and
/// `7.x-3.9` both give 7.
pub fn major_version(s: &str) -> Option<u64> {
    MAJOR_REGEX
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Number(u64),
    Word(u8),
}

/// Rank of a part relative to the other forms. Numbers rank between `rc` and `pl`.
const NUMBER_RANK: u8 = 5;

fn word_rank(word: &str) -> u8 {
    match word.to_ascii_lowercase().as_str() {
        "dev" => 1,
        "alpha" | "a" => 2,
        "beta" | "b" => 3,
        "rc" => 4,
        "pl" | "p" => 6,
        _ => 0,
    }
}

/// Split a version token into numeric and word parts.
///
/// Separators (`.`, `-`, `_`, `+`) and every digit/letter boundary start a new
/// part, so `3.9-beta2` becomes `3 9 beta 2`.
fn split_parts(version: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, parts: &mut Vec<Part>| {
        if current.is_empty() {
            return;
        }
        let part = if current.chars().all(|c| c.is_ascii_digit()) {
            // Absurdly long numerals saturate instead of failing
            Part::Number(current.parse().unwrap_or(u64::MAX))
        } else {
            Part::Word(word_rank(current))
        };
        parts.push(part);
        current.clear();
    };

    for c in version.chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, &mut parts);
            continue;
        }
        let boundary = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != c.is_ascii_digit());
        if boundary {
            flush(&mut current, &mut parts);
        }
        current.push(c);
    }
    flush(&mut current, &mut parts);

    parts
}

fn compare_parts(a: &Part, b: &Part) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => x.cmp(y),
        (Part::Number(_), Part::Word(r)) => NUMBER_RANK.cmp(r),
        (Part::Word(r), Part::Number(_)) => r.cmp(&NUMBER_RANK),
        (Part::Word(x), Part::Word(y)) => x.cmp(y),
    }
}

/// Compare two version tokens.
///
/// Numeric parts compare numerically (`7.9 < 7.10 < 7.32`). A pre-release
/// word sorts below a number in the same position, and a version with a
/// trailing pre-release suffix sorts below the bare version
/// (`3.9-beta2 < 3.9`), while extra numeric parts sort above (`3.9 < 3.9.1`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = split_parts(a);
    let b_parts = split_parts(b);

    for (x, y) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = compare_parts(x, y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    // Only the first leftover part decides
    match (a_parts.get(b_parts.len()), b_parts.get(a_parts.len())) {
        (Some(Part::Number(_)), _) => Ordering::Greater,
        (Some(Part::Word(r)), _) => r.cmp(&NUMBER_RANK),
        (None, Some(Part::Number(_))) => Ordering::Less,
        (None, Some(Part::Word(r))) => NUMBER_RANK.cmp(r),
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core() {
        let entry = VersionEntry::parse("drupal-7.32", PackageKind::Core).unwrap();
        assert_eq!(entry.name.as_deref(), Some("drupal"));
        assert_eq!(entry.version, "7.32");
        assert_eq!(entry.major, 7);
        assert!(!entry.prerelease);
    }

    #[test]
    fn test_parse_core_dev_and_dashed_name() {
        let entry = VersionEntry::parse("drupal-7.x-dev", PackageKind::Core).unwrap();
        assert_eq!(entry.name.as_deref(), Some("drupal"));
        assert_eq!(entry.version, "7.x-dev");
        assert!(entry.prerelease);

        let entry = VersionEntry::parse("pressflow-core-6.22.107", PackageKind::Core).unwrap();
        assert_eq!(entry.name.as_deref(), Some("pressflow-core"));
        assert_eq!(entry.version, "6.22.107");
    }

    #[test]
    fn test_parse_core_valid_names() {
        for name in ["drupal-7.0", "drupal-8.0-beta1", "d-10.1.RC2", "drupal-6.38-pl1"] {
            let entry = VersionEntry::parse(name, PackageKind::Core)
                .unwrap_or_else(|| panic!("{} should parse", name));
            assert_eq!(entry.kind, PackageKind::Core);
        }
    }

    #[test]
    fn test_parse_core_rejects_names_without_version() {
        for name in ["drupal", "drupal-", "drupal-x.1", "drupal-7", "7.32", "-7.32", "README.txt", ".", ".."] {
            assert!(
                VersionEntry::parse(name, PackageKind::Core).is_none(),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_dist() {
        let entry = VersionEntry::parse("7.x-3.9", PackageKind::Distribution).unwrap();
        assert_eq!(entry.name, None);
        assert_eq!(entry.version, "7.x-3.9");
        assert_eq!(entry.major, 7);
        assert!(!entry.prerelease);

        let entry = VersionEntry::parse("7.x-3.9-beta1", PackageKind::Distribution).unwrap();
        assert!(entry.prerelease);

        let entry = VersionEntry::parse("6.x-1.x-dev", PackageKind::Distribution).unwrap();
        assert_eq!(entry.major, 6);
        assert!(entry.prerelease);
    }

    #[test]
    fn test_parse_dist_rejects() {
        for name in ["7.32", "drupal-7.x-3.9", "7.x-", "x-3.9", "7.x-beta", "notes"] {
            assert!(
                VersionEntry::parse(name, PackageKind::Distribution).is_none(),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_profile() {
        let entry = VersionEntry::parse("openatrium-7.x-2.0", PackageKind::Profile).unwrap();
        assert_eq!(entry.name.as_deref(), Some("openatrium"));
        assert_eq!(entry.version, "7.x-2.0");

        let entry = VersionEntry::parse("my-profile-7.x-1.0-rc1", PackageKind::Profile).unwrap();
        assert_eq!(entry.name.as_deref(), Some("my-profile"));
        assert_eq!(entry.version, "7.x-1.0-rc1");
        assert!(entry.prerelease);

        assert!(VersionEntry::parse("7.x-2.0", PackageKind::Profile).is_none());
        assert!(VersionEntry::parse("openatrium-2.0", PackageKind::Profile).is_none());
    }

    #[test]
    fn test_is_prerelease() {
        for v in ["7.x-dev", "3.9-beta2", "8.0-ALPHA1", "1.0-rc", "6.38-pl1", "1.0RC3"] {
            assert!(is_prerelease(v), "{} should be a pre-release", v);
        }
        for v in ["7.32", "7.x-3.9", "1.0-devel.2", "2.0.1", "1.0-appl", "2.0-xrc"] {
            assert!(!is_prerelease(v), "{} should be a release", v);
        }
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("drupal-7.32"), Some(7));
        assert_eq!(major_version("7.x-3.9"), Some(7));
        assert_eq!(major_version("pressflow-6.22"), Some(6));
        assert_eq!(major_version("drupal"), None);
    }

    #[test]
    fn test_compare_numeric_precedence() {
        assert_eq!(compare_versions("7.9", "7.10"), Ordering::Less);
        assert_eq!(compare_versions("7.10", "7.32"), Ordering::Less);
        assert_eq!(compare_versions("7.32", "7.9"), Ordering::Greater);
        assert_eq!(compare_versions("7.32", "7.32"), Ordering::Equal);
        assert_eq!(compare_versions("3.9", "3.9.1"), Ordering::Less);
    }

    #[test]
    fn test_compare_prerelease_before_release() {
        assert_eq!(compare_versions("7.32-beta1", "7.32"), Ordering::Less);
        assert_eq!(compare_versions("3.9", "3.9-beta2"), Ordering::Greater);
        assert_eq!(compare_versions("3.9-alpha1", "3.9-beta1"), Ordering::Less);
        assert_eq!(compare_versions("3.9-beta1", "3.9-beta2"), Ordering::Less);
        assert_eq!(compare_versions("3.9-rc1", "3.9"), Ordering::Less);
        assert_eq!(compare_versions("3.9-dev", "3.9-alpha1"), Ordering::Less);
        assert_eq!(compare_versions("3.9-pl1", "3.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_dev_branch_below_releases() {
        assert_eq!(compare_versions("7.x-dev", "7.32"), Ordering::Less);
        assert_eq!(compare_versions("7.x-dev", "7.0"), Ordering::Less);
        assert_eq!(compare_versions("7.x-dev", "6.38"), Ordering::Greater);
    }

    #[test]
    fn test_cmp_version_normalizes_distribution_tokens() {
        let a = VersionEntry::parse("7.x-3.9-beta1", PackageKind::Distribution).unwrap();
        let b = VersionEntry::parse("7.x-3.9", PackageKind::Distribution).unwrap();
        let c = VersionEntry::parse("7.x-3.10", PackageKind::Distribution).unwrap();
        let d = VersionEntry::parse("6.x-2.20", PackageKind::Distribution).unwrap();
        assert_eq!(a.cmp_version(&b), Ordering::Less);
        assert_eq!(b.cmp_version(&c), Ordering::Less);
        assert_eq!(d.cmp_version(&a), Ordering::Less);
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let versions = [
            "7.x-dev", "7.0", "7.9", "7.10", "7.32-beta1", "7.32-rc1", "7.32", "7.32-pl1", "7.32.1",
            "8.0-alpha2",
        ];
        for a in versions {
            for b in versions {
                assert_eq!(
                    compare_versions(a, b),
                    compare_versions(b, a).reverse(),
                    "{} vs {}",
                    a,
                    b
                );
            }
        }
    }
}
