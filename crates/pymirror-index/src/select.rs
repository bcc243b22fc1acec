//! Choosing which versions of a package to mirror.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::release::{PackageMetadata, ReleaseFile};

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^v?
        (?:(?<epoch>[0-9]+)!)?
        (?<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?<pre_n>[0-9]+)?)?
        (?:-(?<post_n1>[0-9]+)|[-_.]?(?<post_l>post|rev|r)[-_.]?(?<post_n2>[0-9]+)?)?
        (?:[-_.]?(?<dev_l>dev)[-_.]?(?<dev_n>[0-9]+)?)?
        (?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?$",
    )
    .unwrap()
});

/// Pre-release phase; declaration order is precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Pre {
    Alpha,
    Beta,
    Rc,
}

/// A release version, ordered the way installers order them.
///
/// Local labels are accepted and ignored for ordering.
#[derive(Clone, Debug)]
pub struct ReleaseVersion {
    epoch:   u64,
    release: Vec<u64>,
    pre:     Option<(Pre, u64)>,
    post:    Option<u64>,
    dev:     Option<u64>,
}

impl ReleaseVersion {
    pub fn parse(s: &str) -> Option<Self> {
        let caps = VERSION_REGEX.captures(s.trim())?;
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());

        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .ok()?;

        let pre = caps.name("pre_l").map(|label| {
            let phase = match label.as_str().to_ascii_lowercase().as_str() {
                "a" | "alpha" => Pre::Alpha,
                "b" | "beta" => Pre::Beta,
                _ => Pre::Rc,
            };
            (phase, number("pre_n").unwrap_or(0))
        });

        let post = number("post_n1").or_else(|| caps.name("post_l").map(|_| number("post_n2").unwrap_or(0)));
        let dev = caps.name("dev_l").map(|_| number("dev_n").unwrap_or(0));

        Some(Self {
            epoch: number("epoch").unwrap_or(0),
            release,
            pre,
            post,
            dev,
        })
    }

    pub fn major(&self) -> u64 { self.release.first().copied().unwrap_or(0) }

    pub fn minor(&self) -> u64 { self.release.get(1).copied().unwrap_or(0) }

    pub fn is_prerelease(&self) -> bool { self.pre.is_some() || self.dev.is_some() }

    /// Release segments with trailing zeros dropped, so `1.0` equals `1.0.0`.
    fn trimmed_release(&self) -> &[u64] {
        let end = self.release.iter().rposition(|&n| n != 0).map_or(0, |i| i + 1);
        &self.release[..end]
    }

    /// Sort key for the suffix: dev-only < pre < final < post.
    fn suffix_key(&self) -> (u8, Option<(Pre, u64)>, Option<u64>, u64) {
        let dev = self.dev.map_or(u64::MAX, |d| d);
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, None, None, dev),
            (Some(pre), post, _) => (1, Some(pre), post, dev),
            (None, post, _) => (2, None, post, dev),
        }
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.suffix_key().cmp(&other.suffix_key()))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            let label = match phase {
                Pre::Alpha => "a",
                Pre::Beta => "b",
                Pre::Rc => "rc",
            };
            write!(f, "{label}{n}")?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        Ok(())
    }
}

/// Which versions of a package to mirror.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionSelection {
    /// Exactly this version string.
    Pinned(String),

    /// Every version that ships at least one Python 3 file.
    All,

    /// Like `All`, keeping only the newest release of each `major.minor`.
    LatestPatch,

    /// The newest final release with a Python 3 file, for unpinned lines.
    Latest,
}

/// Versions picked for one package, in ascending key order.
#[derive(Clone, Debug, Default)]
pub struct Selected<'a> {
    pub versions: Vec<(&'a str, &'a [ReleaseFile])>,
}

impl<'a> Selected<'a> {
    pub fn is_empty(&self) -> bool { self.versions.is_empty() }

    pub fn files(&self) -> impl Iterator<Item = &'a ReleaseFile> + '_ {
        self.versions.iter().flat_map(|(_, files)| files.iter())
    }
}

impl VersionSelection {
    /// Label for reports: the pinned version, or a mode with a version count.
    pub fn label(&self, selected: &Selected<'_>) -> String {
        match self {
            VersionSelection::Pinned(version) => version.clone(),
            VersionSelection::All => format!("all ({} versions)", selected.versions.len()),
            VersionSelection::LatestPatch => format!("latest-patch ({} versions)", selected.versions.len()),
            VersionSelection::Latest => match selected.versions.first() {
                Some((version, _)) => (*version).to_string(),
                None => "latest".to_string(),
            },
        }
    }

    pub fn select<'a>(&self, metadata: &'a PackageMetadata) -> Selected<'a> {
        let versions = match self {
            VersionSelection::Pinned(version) => metadata
                .releases
                .get_key_value(version)
                .map(|(v, files)| vec![(v.as_str(), files.as_slice())])
                .unwrap_or_default(),
            VersionSelection::All => python3_versions(metadata),
            VersionSelection::LatestPatch => latest_patch(python3_versions(metadata)),
            VersionSelection::Latest => latest(python3_versions(metadata)),
        };
        Selected { versions }
    }
}

fn python3_versions(metadata: &PackageMetadata) -> Vec<(&str, &[ReleaseFile])> {
    metadata
        .releases
        .iter()
        .filter(|(_, files)| files.iter().any(ReleaseFile::supports_python3))
        .map(|(v, files)| (v.as_str(), files.as_slice()))
        .collect()
}

fn latest_patch<'a>(versions: Vec<(&'a str, &'a [ReleaseFile])>) -> Vec<(&'a str, &'a [ReleaseFile])> {
    let mut newest: BTreeMap<(u64, u64), (ReleaseVersion, &'a str, &'a [ReleaseFile])> = BTreeMap::new();
    let mut kept = Vec::new();

    for (raw, files) in versions {
        let Some(version) = ReleaseVersion::parse(raw) else {
            tracing::warn!(version = raw, "unparseable version, keeping it");
            kept.push((raw, files));
            continue;
        };
        let key = (version.major(), version.minor());
        match newest.get(&key) {
            Some((current, _, _)) if *current >= version => {}
            _ => {
                newest.insert(key, (version, raw, files));
            }
        }
    }

    kept.extend(newest.into_values().map(|(_, raw, files)| (raw, files)));
    kept.sort_by(|a, b| a.0.cmp(b.0));
    kept
}

fn latest<'a>(versions: Vec<(&'a str, &'a [ReleaseFile])>) -> Vec<(&'a str, &'a [ReleaseFile])> {
    versions
        .into_iter()
        .filter_map(|(raw, files)| ReleaseVersion::parse(raw).map(|v| (v, raw, files)))
        .filter(|(v, _, _)| !v.is_prerelease())
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, raw, files)| vec![(raw, files)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ReleaseVersion { ReleaseVersion::parse(s).unwrap() }

    fn metadata(versions: Vec<(&str, Vec<&str>)>) -> PackageMetadata {
        PackageMetadata {
            name:     "pkg".into(),
            releases: versions
                .into_iter()
                .map(|(version, files)| {
                    let files = files
                        .into_iter()
                        .map(|f| ReleaseFile::new(f, format!("https://files.pythonhosted.org/packages/{f}")))
                        .collect();
                    (version.to_string(), files)
                })
                .collect(),
        }
    }

    #[test]
    fn ordering_follows_installer_rules() {
        assert!(v("1.0") == v("1.0.0"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("2.0.0rc1") < v("2.0.0"));
        assert!(v("2.0.0a1") < v("2.0.0b1"));
        assert!(v("2.0.0.dev1") < v("2.0.0a1"));
        assert!(v("2.0.0.post1") > v("2.0.0"));
        assert!(v("1!0.1") > v("9.9"));
        assert!(v("1.0+local") == v("1.0"));
    }

    #[test]
    fn major_minor_grouping_key() {
        let version = v("3.11.4");
        assert_eq!((version.major(), version.minor()), (3, 11));
        assert_eq!(v("7").minor(), 0);
        assert!(v("1.0rc2").is_prerelease());
        assert!(ReleaseVersion::parse("not-a-version").is_none());
    }

    #[test]
    fn pinned_selects_only_that_version() {
        let meta = metadata(vec![("1.0", vec!["pkg-1.0.tar.gz"]), ("2.0", vec!["pkg-2.0.tar.gz"])]);
        let selection = VersionSelection::Pinned("2.0".into());
        let selected = selection.select(&meta);
        assert_eq!(selected.versions.len(), 1);
        assert_eq!(selected.versions[0].0, "2.0");
        assert_eq!(selection.label(&selected), "2.0");
    }

    #[test]
    fn pinned_missing_version_selects_nothing() {
        let meta = metadata(vec![("1.0", vec!["pkg-1.0.tar.gz"])]);
        assert!(VersionSelection::Pinned("9.9".into()).select(&meta).is_empty());
    }

    #[test]
    fn all_skips_versions_without_python3_files() {
        let meta = metadata(vec![
            ("0.9", vec!["pkg-0.9-py2-none-any.whl"]),
            ("1.0", vec!["pkg-1.0-py2-none-any.whl", "pkg-1.0-py3-none-any.whl"]),
            ("1.1", vec![]),
            ("1.2", vec!["pkg-1.2.tar.gz"]),
        ]);
        let selected = VersionSelection::All.select(&meta);
        let versions: Vec<_> = selected.versions.iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, vec!["1.0", "1.2"]);
        assert_eq!(selected.files().count(), 3);
        assert_eq!(VersionSelection::All.label(&selected), "all (2 versions)");
    }

    #[test]
    fn latest_patch_keeps_newest_per_minor() {
        let sdist = vec!["x.tar.gz"];
        let meta = metadata(vec![
            ("2.1.3", sdist.clone()),
            ("2.1.5", sdist.clone()),
            ("2.1.9", sdist.clone()),
            ("2.1.9rc1", sdist.clone()),
            ("2.2.2", sdist.clone()),
            ("2.2.8", sdist.clone()),
            ("3.0.0", sdist.clone()),
            ("weird", sdist.clone()),
        ]);
        let selected = VersionSelection::LatestPatch.select(&meta);
        let versions: Vec<_> = selected.versions.iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, vec!["2.1.9", "2.2.8", "3.0.0", "weird"]);
        assert_eq!(VersionSelection::LatestPatch.label(&selected), "latest-patch (4 versions)");
    }

    #[test]
    fn latest_ignores_prereleases() {
        let meta = metadata(vec![
            ("1.9", vec!["pkg-1.9.tar.gz"]),
            ("1.10", vec!["pkg-1.10.tar.gz"]),
            ("2.0rc1", vec!["pkg-2.0rc1.tar.gz"]),
        ]);
        let selected = VersionSelection::Latest.select(&meta);
        assert_eq!(VersionSelection::Latest.label(&selected), "1.10");

        let empty = metadata(vec![("1.0", vec!["pkg-1.0-py2-none-any.whl"])]);
        let selected = VersionSelection::Latest.select(&empty);
        assert!(selected.is_empty());
        assert_eq!(VersionSelection::Latest.label(&selected), "latest");
    }
}
