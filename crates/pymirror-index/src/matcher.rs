//! Platform and interpreter filtering of release files.

use crate::release::ReleaseFile;
use crate::tags::{Tags, split_tags};

/// Tag constraints for one run. An unset dimension matches anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagFilter {
    python:   Option<Tags>,
    abi:      Option<Tags>,
    platform: Option<Tags>,
}

fn dimension(filter: Option<&str>) -> Option<Tags> {
    let filter = filter?.trim();
    if filter.is_empty() || filter == "*" {
        return None;
    }
    Some(split_tags(filter))
}

impl TagFilter {
    pub fn new() -> Self { Self::default() }

    /// Python tag filter such as `cp311` or `py2.py3`; `*` matches anything.
    #[must_use]
    pub fn python(mut self, filter: Option<&str>) -> Self {
        self.python = dimension(filter);
        self
    }

    #[must_use]
    pub fn abi(mut self, filter: Option<&str>) -> Self {
        self.abi = dimension(filter);
        self
    }

    #[must_use]
    pub fn platform(mut self, filter: Option<&str>) -> Self {
        self.platform = dimension(filter);
        self
    }

    /// Whether `file` should be mirrored.
    ///
    /// Source distributions always pass. Wheels without any Python 3 tag are
    /// rejected regardless of the filter.
    pub fn matches(&self, file: &ReleaseFile) -> bool {
        if file.is_source {
            return true;
        }
        let Some(tags) = &file.tags else {
            return true;
        };
        if !tags.supports_python3() {
            return false;
        }
        overlaps(self.python.as_ref(), &tags.python)
            && overlaps(self.abi.as_ref(), &tags.abi)
            && overlaps(self.platform.as_ref(), &tags.platform)
    }
}

fn overlaps(filter: Option<&Tags>, tags: &Tags) -> bool {
    filter.is_none_or(|wanted| !wanted.is_disjoint(tags))
}
