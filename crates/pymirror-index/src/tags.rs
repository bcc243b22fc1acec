//! Wheel filename tags.
//!
//! A wheel is named `{dist}-{version}(-{build})?-{python}-{abi}-{platform}.whl`,
//! where each of the last three fields may be a dot-compressed set such as
//! `py2.py3` or `manylinux1_x86_64.manylinux_2_5_x86_64`. Tags are split and
//! lowercased once here; matching works on the resulting sets only.

use std::collections::BTreeSet;

/// Lowercase tag components of one dimension.
pub type Tags = BTreeSet<String>;

/// Split a dot-compressed tag field into lowercase components.
pub fn split_tags(field: &str) -> Tags {
    field
        .split('.')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether a single python tag targets major version 3.
///
/// Covers `py3`, `py310`, `cp311`, `pp39` and any other implementation
/// prefix followed by a `3`.
pub fn is_python3_tag(tag: &str) -> bool {
    let digits = tag.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.len() < tag.len() && digits.starts_with('3')
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    pub python:   Tags,
    pub abi:      Tags,
    pub platform: Tags,
}

impl TagSet {
    pub fn supports_python3(&self) -> bool { self.python.iter().any(|t| is_python3_tag(t)) }
}

/// Parsed wheel filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WheelName {
    pub distribution: String,
    pub version:      String,
    pub build:        Option<String>,
    pub tags:         TagSet,
}

impl WheelName {
    /// `None` when `filename` is not a well-formed wheel name.
    pub fn parse(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(".whl")?;
        let parts: Vec<&str> = stem.split('-').collect();
        let (distribution, version, build, tags) = match parts.as_slice() {
            [d, v, py, abi, plat] => (d, v, None, [py, abi, plat]),
            [d, v, b, py, abi, plat] => (d, v, Some(b.to_string()), [py, abi, plat]),
            _ => return None,
        };
        Some(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build,
            tags: TagSet {
                python:   split_tags(tags[0]),
                abi:      split_tags(tags[1]),
                platform: split_tags(tags[2]),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_tags_are_split() {
        let wheel = WheelName::parse("six-1.16.0-py2.py3-none-any.whl").unwrap();
        assert_eq!(wheel.distribution, "six");
        assert_eq!(wheel.version, "1.16.0");
        assert_eq!(wheel.build, None);
        assert!(wheel.tags.python.contains("py2"));
        assert!(wheel.tags.python.contains("py3"));
        assert!(wheel.tags.supports_python3());
    }

    #[test]
    fn build_tag_is_optional() {
        let wheel = WheelName::parse("pkg-2.0-1-CP311-cp311-manylinux1_x86_64.manylinux_2_5_x86_64.whl").unwrap();
        assert_eq!(wheel.build.as_deref(), Some("1"));
        assert!(wheel.tags.python.contains("cp311"));
        assert_eq!(wheel.tags.platform.len(), 2);
    }

    #[test]
    fn not_a_wheel() {
        assert!(WheelName::parse("pkg-1.0.tar.gz").is_none());
        assert!(WheelName::parse("pkg-1.0-py3.whl").is_none());
    }

    #[test]
    fn python3_tags() {
        for tag in ["py3", "py310", "cp38", "pp39", "cp3"] {
            assert!(is_python3_tag(tag), "{tag}");
        }
        for tag in ["py2", "cp27", "py", "3", "pp27"] {
            assert!(!is_python3_tag(tag), "{tag}");
        }
    }

    #[test]
    fn python2_only_wheel() {
        let wheel = WheelName::parse("futures-3.3.0-py2-none-any.whl").unwrap();
        assert!(!wheel.tags.supports_python3());
    }
}
