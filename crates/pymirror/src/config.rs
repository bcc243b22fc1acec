//! Layered run settings.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file
//! (`--config`, or `pymirror.toml` when present), `PYMIRROR_*` environment
//! variables and finally command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pymirror_fetch::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENCY, FetchOptions, Mirror, MirrorRegistry};
use pymirror_index::{PackageSpec, TagFilter, VersionSelection};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::logging::LogFileConfig;

pub const DEFAULT_CONFIG_FILE: &str = "pymirror.toml";

pub const ENV_PREFIX: &str = "PYMIRROR_";

/// URL list written in dry-run mode when no path is configured.
pub const DEFAULT_URL_LIST: &str = "url_list.txt";

/// Log file written beside the working directory unless disabled.
pub const DEFAULT_LOG_FILE: &str = "pymirror.log";

/// Size at which the log file is rotated.
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Simple index handed to the resolver in mirror mode.
pub const DEFAULT_RESOLVER_INDEX: &str = "https://mirrors.tuna.tsinghua.edu.cn/pypi/web/simple";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub requirements:          PathBuf,
    pub download_dir:          PathBuf,
    pub concurrency:           usize,
    pub dry_run:               bool,

    /// Use the well-known proxy mirrors, official index last.
    pub mirrors:               bool,

    /// Explicit proxy mirrors, tried in order before the official index.
    pub mirror_urls:           Vec<String>,
    pub build_index:           bool,
    pub python_version:        Option<String>,
    pub abi:                   Option<String>,
    pub platform:              Option<String>,
    pub all_versions:          bool,
    pub latest_patch:          bool,
    pub url_list:              Option<PathBuf>,

    /// Read requirements as-is instead of running the resolver.
    pub no_resolve:            bool,
    pub resolver:              String,
    pub resolver_index:        Option<String>,
    pub index_builder:         String,
    pub max_attempts:          u32,
    pub retry_backoff_ms:      u64,
    pub connect_timeout_secs:  u64,
    pub read_timeout_secs:     u64,
    pub metadata_timeout_secs: u64,

    /// Blocking threads for digest checks; unset means one per core.
    pub hash_workers:          Option<usize>,

    /// Trace-level log file, rotated by size.
    pub log_file:              PathBuf,
    pub log_to_file:           bool,
    pub log_max_bytes:         u64,

    /// Rotated log files kept besides the active one.
    pub log_retention:         usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            requirements:          PathBuf::from("requirements.txt"),
            download_dir:          PathBuf::from("pypi"),
            concurrency:           DEFAULT_MAX_CONCURRENCY,
            dry_run:               false,
            mirrors:               false,
            mirror_urls:           Vec::new(),
            build_index:           false,
            python_version:        None,
            abi:                   None,
            platform:              None,
            all_versions:          false,
            latest_patch:          false,
            url_list:              None,
            no_resolve:            false,
            resolver:              "pip-compile".to_string(),
            resolver_index:        None,
            index_builder:         "dir2pi".to_string(),
            max_attempts:          DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms:      250,
            connect_timeout_secs:  60,
            read_timeout_secs:     60,
            metadata_timeout_secs: 60,
            hash_workers:          None,
            log_file:              PathBuf::from(DEFAULT_LOG_FILE),
            log_to_file:           true,
            log_max_bytes:         DEFAULT_LOG_MAX_BYTES,
            log_retention:         3,
        }
    }
}

/// Values set on the command line. Unset fields leave lower layers alone.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements:   Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir:   Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency:    Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run:        Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirrors:        Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_urls:    Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_index:    Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi:            Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform:       Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_versions:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_patch:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_list:       Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_resolve:     Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file:       Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_to_file:    Option<bool>,
}

impl Settings {
    /// Layered figment without command-line overrides.
    pub fn figment(config: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match config {
            Some(path) if !path.is_file() => return Err(SyncError::ConfigNotFound(path.to_path_buf())),
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let settings: Settings = Self::figment(config)?
            .merge(Serialized::defaults(overrides))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.all_versions && self.latest_patch {
            return Err(SyncError::InvalidSettings(
                "latest_patch and all_versions are mutually exclusive".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(SyncError::InvalidSettings("concurrency must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(SyncError::InvalidSettings("max_attempts must be at least 1".into()));
        }
        if self.hash_workers == Some(0) {
            return Err(SyncError::InvalidSettings("hash_workers must be at least 1".into()));
        }
        if self.resolver.trim().is_empty() || self.index_builder.trim().is_empty() {
            return Err(SyncError::InvalidSettings("external commands must not be empty".into()));
        }
        if self.log_to_file && self.log_max_bytes == 0 {
            return Err(SyncError::InvalidSettings("log_max_bytes must be at least 1".into()));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .max_concurrency(self.concurrency)
            .max_attempts(self.max_attempts)
            .retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .read_timeout(Duration::from_secs(self.read_timeout_secs))
            .dry_run(self.dry_run)
    }

    pub fn metadata_timeout(&self) -> Duration { Duration::from_secs(self.metadata_timeout_secs) }

    pub fn log_file_config(&self) -> Option<LogFileConfig> {
        self.log_to_file.then(|| LogFileConfig {
            path:      self.log_file.clone(),
            max_bytes: self.log_max_bytes,
            retention: self.log_retention,
        })
    }

    /// Explicit mirrors win over the built-in list; the official index is always last.
    pub fn registry(&self) -> Result<MirrorRegistry> {
        if !self.mirror_urls.is_empty() {
            let mirrors = self
                .mirror_urls
                .iter()
                .map(Mirror::proxy)
                .chain(std::iter::once(Ok(Mirror::official())))
                .collect::<pymirror_fetch::Result<Vec<_>>>()?;
            return Ok(MirrorRegistry::ordered(mirrors)?);
        }
        if self.mirrors {
            return Ok(MirrorRegistry::well_known());
        }
        Ok(MirrorRegistry::official())
    }

    /// Index for the resolver, only in mirror mode.
    pub fn resolver_index(&self) -> Option<String> {
        if let Some(index) = &self.resolver_index {
            return Some(index.clone());
        }
        if let Some(first) = self.mirror_urls.first() {
            return Some(format!("{}/web/simple", first.trim_end_matches('/')));
        }
        self.mirrors.then(|| DEFAULT_RESOLVER_INDEX.to_string())
    }

    pub fn tag_filter(&self) -> TagFilter {
        TagFilter::new()
            .python(self.python_version.as_deref())
            .abi(self.abi.as_deref())
            .platform(self.platform.as_deref())
    }

    /// Version selection for one requirement; the run-wide mode beats pins.
    pub fn selection(&self, spec: &PackageSpec) -> VersionSelection {
        if self.latest_patch {
            return VersionSelection::LatestPatch;
        }
        if self.all_versions {
            return VersionSelection::All;
        }
        match &spec.version {
            Some(version) => VersionSelection::Pinned(version.clone()),
            None => VersionSelection::Latest,
        }
    }

    /// Where to write the URL list, if anywhere.
    pub fn url_list_path(&self) -> Option<PathBuf> {
        match &self.url_list {
            Some(path) => Some(path.clone()),
            None => self.dry_run.then(|| PathBuf::from(DEFAULT_URL_LIST)),
        }
    }
}
