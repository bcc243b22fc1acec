//! Package index mirrors and per-operation fallback cursors.
//!
//! A [`MirrorRegistry`] is an immutable, ordered list shared by the whole run.
//! Every logical operation (one metadata query, one file download) takes its
//! own [`MirrorCursor`], so one operation exhausting mirrors never moves
//! another operation's position.

use rand::seq::SliceRandom;

use crate::error::{FetchError, Result};

/// Base URL of the official JSON API.
pub const OFFICIAL_INDEX: &str = "https://pypi.org/pypi";

/// Prefix under which the official index publishes artifact URLs.
pub const PUBLISHED_FILES_PREFIX: &str = "https://files.pythonhosted.org/packages/";

/// Public mirrors of the official index, tried in shuffled order.
pub const WELL_KNOWN_MIRRORS: &[&str] = &[
    "http://mirrors.aliyun.com/pypi",
    "https://mirrors.cloud.tencent.com/pypi",
    "https://mirror.nju.edu.cn/pypi",
    "https://mirror.nyist.edu.cn/pypi",
    "https://mirror.sjtu.edu.cn/pypi",
    "https://mirrors.bfsu.edu.cn/pypi",
    "https://mirrors.jlu.edu.cn/pypi",
    "https://mirrors.neusoft.edu.cn/pypi",
    "https://mirrors.njtech.edu.cn/pypi",
    "https://mirrors.pku.edu.cn/pypi",
    "https://mirrors.qlu.edu.cn/pypi",
    "https://mirrors.tuna.tsinghua.edu.cn/pypi",
    "https://mirrors.ustc.edu.cn/pypi",
    "https://mirrors.zju.edu.cn/pypi",
];

/// URL layout served by a mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorKind {
    /// The official index: `{base}/{name}/json`, artifact URLs used as published.
    Official,

    /// A proxy mirror: `{base}/web/json/{name}`, artifacts under `{base}/web/packages/`.
    Proxy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mirror {
    base: String,
    kind: MirrorKind,
}

impl Mirror {
    pub fn official() -> Self {
        Self {
            base: OFFICIAL_INDEX.to_string(),
            kind: MirrorKind::Official,
        }
    }

    pub fn proxy(base: impl AsRef<str>) -> Result<Self> { Self::with_kind(base, MirrorKind::Proxy) }

    pub fn with_kind(base: impl AsRef<str>, kind: MirrorKind) -> Result<Self> {
        let base = base.as_ref().trim().trim_end_matches('/');
        let has_host = base
            .split_once("://")
            .is_some_and(|(scheme, rest)| matches!(scheme, "http" | "https") && !rest.is_empty());
        if !has_host {
            return Err(FetchError::InvalidMirror(base.to_string()));
        }
        Ok(Self {
            base: base.to_string(),
            kind,
        })
    }

    pub fn base(&self) -> &str { &self.base }

    pub fn kind(&self) -> MirrorKind { self.kind }

    /// JSON metadata endpoint for `package`; any `[extras]` suffix is dropped.
    pub fn metadata_url(&self, package: &str) -> String {
        let name = package.split('[').next().unwrap_or(package).trim();
        match self.kind {
            MirrorKind::Official => format!("{}/{}/json", self.base, name),
            MirrorKind::Proxy => format!("{}/web/json/{}", self.base, name),
        }
    }

    /// Rewrite a published artifact URL so it is served by this mirror.
    ///
    /// URLs outside the official file host are returned unchanged.
    pub fn file_url(&self, published: &str) -> String {
        match self.kind {
            MirrorKind::Official => published.to_string(),
            MirrorKind::Proxy => match published.strip_prefix(PUBLISHED_FILES_PREFIX) {
                Some(rest) => format!("{}/web/packages/{}", self.base, rest),
                None => published.to_string(),
            },
        }
    }
}

/// Ordered, immutable list of candidate mirrors.
#[derive(Clone, Debug)]
pub struct MirrorRegistry {
    mirrors: Vec<Mirror>,
}

impl MirrorRegistry {
    /// Single-entry registry pointing at the official index.
    pub fn official() -> Self {
        Self {
            mirrors: vec![Mirror::official()],
        }
    }

    /// Registry in exactly the given order.
    pub fn ordered(mirrors: Vec<Mirror>) -> Result<Self> {
        if mirrors.is_empty() {
            return Err(FetchError::NoMirrors);
        }
        Ok(Self { mirrors })
    }

    /// Proxy mirrors in random order, with the official index as last resort.
    ///
    /// Shuffling spreads load across mirrors between runs.
    pub fn with_fallback<I, S>(proxies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mirrors = proxies
            .into_iter()
            .map(Mirror::proxy)
            .collect::<Result<Vec<_>>>()?;
        mirrors.shuffle(&mut rand::rng());
        mirrors.push(Mirror::official());
        Ok(Self { mirrors })
    }

    pub fn well_known() -> Self {
        // The built-in list is static and valid.
        Self::with_fallback(WELL_KNOWN_MIRRORS.iter().copied()).unwrap_or_else(|_| Self::official())
    }

    pub fn len(&self) -> usize { self.mirrors.len() }

    pub fn is_empty(&self) -> bool { self.mirrors.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Mirror> { self.mirrors.iter() }

    /// Fresh cursor positioned on the first mirror.
    pub fn cursor(&self) -> MirrorCursor<'_> {
        MirrorCursor {
            mirrors: &self.mirrors,
            index:   0,
        }
    }
}

/// Fallback position of a single operation.
#[derive(Clone, Debug)]
pub struct MirrorCursor<'a> {
    mirrors: &'a [Mirror],
    index:   usize,
}

impl<'a> MirrorCursor<'a> {
    pub fn current(&self) -> &'a Mirror { &self.mirrors[self.index] }

    /// Move to the next mirror; `false` (position unchanged) when none remain.
    pub fn advance(&mut self) -> bool {
        if self.index + 1 < self.mirrors.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Return to the first mirror.
    pub fn rewind(&mut self) { self.index = 0; }

    pub fn position(&self) -> usize { self.index }
}
