//! Requirement lines.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IndexError, Result};

static PINNED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w\-.]+)(?:\[([\w,\-]+)\])?==([\w.\-]+)$").unwrap());
static BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w\-.]+)(?:\[([\w,\-]+)\])?$").unwrap());

/// One requested package: `name[extras]==version` or bare `name[extras]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub name:    String,
    pub version: Option<String>,

    /// Informational only; extras never change which files are mirrored.
    pub extras:  Vec<String>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            extras: Vec::new(),
        }
    }

    /// Parse a single requirements line.
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (caps, version) = if let Some(caps) = PINNED.captures(line) {
            let version = caps.get(3).map(|m| m.as_str().to_string());
            (caps, version)
        } else if let Some(caps) = BARE.captures(line) {
            (caps, None)
        } else {
            return Err(IndexError::InvalidRequirement(line.to_string()));
        };

        let extras = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(Self {
            name: caps[1].to_string(),
            version,
            extras,
        }))
    }

    /// `name[extras]` as written in the requirements file.
    pub fn display_name(&self) -> String {
        if self.extras.is_empty() {
            self.name.clone()
        } else {
            format!("{}[{}]", self.name, self.extras.join(","))
        }
    }
}

impl FromStr for PackageSpec {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s)?.ok_or_else(|| IndexError::InvalidRequirement(s.to_string()))
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())?;
        if let Some(version) = &self.version {
            write!(f, "=={version}")?;
        }
        Ok(())
    }
}

/// Parse a whole requirements document.
///
/// Unparseable lines are logged and skipped; order is preserved.
pub fn parse_requirements(text: &str) -> Vec<PackageSpec> {
    text.lines()
        .enumerate()
        .filter_map(|(number, line)| match PackageSpec::parse_line(line) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(line = number + 1, error = %e, "skipping requirement");
                None
            }
        })
        .collect()
}
