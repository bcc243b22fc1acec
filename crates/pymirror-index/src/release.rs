//! Release files and package metadata as published by the JSON API.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use pymirror_fetch::DownloadObligation;
use pymirror_verify::{Digest, DigestAlgorithm};
use serde::Deserialize;

use crate::error::{IndexError, Result};
use crate::tags::{TagSet, WheelName};

/// One downloadable artifact of a release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseFile {
    pub filename:  String,
    pub url:       String,
    pub digest:    Option<Digest>,
    pub size:      Option<u64>,

    /// Wheel tags; `None` for anything that is not a well-formed wheel.
    pub tags:      Option<TagSet>,
    pub is_source: bool,
}

impl ReleaseFile {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        let filename = filename.into();
        let tags = WheelName::parse(&filename).map(|w| w.tags);
        Self {
            is_source: !filename.ends_with(".whl"),
            filename,
            url: url.into(),
            digest: None,
            size: None,
            tags,
        }
    }

    /// Installable on some Python 3 interpreter.
    pub fn supports_python3(&self) -> bool {
        match &self.tags {
            Some(tags) => tags.supports_python3(),
            None => true,
        }
    }

    /// Obligation to place this file directly under `download_dir`.
    pub fn obligation(&self, download_dir: &Path) -> DownloadObligation {
        DownloadObligation {
            filename:    self.filename.clone(),
            url:         self.url.clone(),
            digest:      self.digest.clone(),
            size:        self.size,
            destination: download_dir.join(&self.filename),
        }
    }
}

/// All releases of one package, keyed by version string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name:     String,
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    info:     Option<RawInfo>,
    #[serde(default)]
    releases: BTreeMap<String, Vec<RawFile>>,
}

#[derive(Deserialize)]
struct RawInfo {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawFile {
    filename: String,
    url:      String,
    #[serde(default)]
    digests:  HashMap<String, String>,
    #[serde(default)]
    size:     Option<u64>,
}

impl PackageMetadata {
    /// Parse a JSON API document for `package`.
    pub fn from_json(package: &str, body: &[u8]) -> Result<Self> {
        let raw: RawMetadata = serde_json::from_slice(body).map_err(|source| IndexError::Malformed {
            package: package.to_string(),
            source,
        })?;

        let releases = raw
            .releases
            .into_iter()
            .map(|(version, files)| {
                let files = files.into_iter().filter_map(|f| release_file(package, f)).collect();
                (version, files)
            })
            .collect();

        Ok(Self {
            name: raw.info.and_then(|i| i.name).unwrap_or_else(|| package.to_string()),
            releases,
        })
    }

    pub fn files(&self, version: &str) -> Option<&[ReleaseFile]> { self.releases.get(version).map(Vec::as_slice) }

    /// Total number of files across all versions, before any filtering.
    pub fn file_count(&self) -> usize { self.releases.values().map(Vec::len).sum() }
}

fn release_file(package: &str, raw: RawFile) -> Option<ReleaseFile> {
    // Published names never contain separators; keep only the last component.
    let filename = Path::new(&raw.filename).file_name()?.to_str()?.to_string();

    let digest = raw.digests.get(DigestAlgorithm::Sha256.as_str()).and_then(|hex| {
        Digest::from_hex(DigestAlgorithm::Sha256, hex)
            .inspect_err(|e| tracing::warn!(package, file = %filename, error = %e, "ignoring malformed digest"))
            .ok()
    });

    let mut file = ReleaseFile::new(filename, raw.url);
    file.digest = digest;
    file.size = raw.size;
    Some(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "info": {"name": "six"},
        "releases": {
            "1.16.0": [
                {
                    "filename": "six-1.16.0-py2.py3-none-any.whl",
                    "url": "https://files.pythonhosted.org/packages/d9/5a/six-1.16.0-py2.py3-none-any.whl",
                    "digests": {"md5": "abc", "sha256": "8abb2f1d86890a2dfb989f9a77cfcfd3e47c2a354b01111771326f8aa26e0254"},
                    "size": 11053
                },
                {
                    "filename": "six-1.16.0.tar.gz",
                    "url": "https://files.pythonhosted.org/packages/71/39/six-1.16.0.tar.gz",
                    "digests": {"md5": "def"}
                }
            ],
            "0.9.0": []
        }
    }"#;

    #[test]
    fn parses_files_digests_and_tags() {
        let meta = PackageMetadata::from_json("six", DOC.as_bytes()).unwrap();
        assert_eq!(meta.name, "six");
        assert_eq!(meta.releases.len(), 2);
        assert_eq!(meta.file_count(), 2);

        let files = meta.files("1.16.0").unwrap();
        assert!(files[0].digest.is_some());
        assert_eq!(files[0].size, Some(11053));
        assert!(files[0].tags.is_some());
        assert!(!files[0].is_source);

        assert!(files[1].is_source);
        assert_eq!(files[1].digest, None, "non-sha256 digests are ignored");
        assert!(files[1].supports_python3());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = PackageMetadata::from_json("six", b"<html>502</html>").unwrap_err();
        assert!(matches!(err, IndexError::Malformed { .. }));
    }

    #[test]
    fn obligation_lands_in_download_dir() {
        let file = ReleaseFile::new("a-1.0.tar.gz", "https://files.pythonhosted.org/packages/a-1.0.tar.gz");
        let ob = file.obligation(Path::new("/srv/mirror"));
        assert_eq!(ob.destination, Path::new("/srv/mirror/a-1.0.tar.gz"));
        assert_eq!(ob.url, file.url);
    }
}
