//! One synchronization run.
//!
//! Metadata for every requirement is fetched first so the total number of
//! files is known up front. All packages then share one
//! [`DownloadScheduler`], and with it one admission gate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use pymirror_fetch::{DownloadObligation, DownloadOutcome, DownloadScheduler, Fetcher, HttpClient, ProgressSnapshot, SyncProgress};
use pymirror_index::{IndexError, MetadataClient, PackageSpec, TagFilter, VersionSelection};
use pymirror_verify::HashPool;

use crate::aggregate::PackageSyncResult;
use crate::config::Settings;
use crate::error::{Result, SyncError};

/// Metadata documents requested at once.
pub const METADATA_CONCURRENCY: usize = 32;

/// Files chosen for one requirement.
#[derive(Debug)]
pub struct PackagePlan {
    pub package:     String,
    pub version:     String,
    pub obligations: std::result::Result<Vec<DownloadObligation>, IndexError>,
}

impl PackagePlan {
    pub fn filtered(&self) -> usize { self.obligations.as_ref().map_or(0, Vec::len) }
}

#[derive(Debug)]
pub struct SyncReport {
    /// One row per requirement, in requirement order.
    pub packages: Vec<PackageSyncResult>,

    /// Download URLs of every file fetched, already present or planned.
    /// Fetched files list the mirror that actually served them.
    pub urls:     Vec<String>,
    pub progress: ProgressSnapshot,
}

fn pending_label(selection: &VersionSelection) -> String {
    match selection {
        VersionSelection::Pinned(version) => version.clone(),
        VersionSelection::All => "all".to_string(),
        VersionSelection::LatestPatch => "latest-patch".to_string(),
        VersionSelection::Latest => "latest".to_string(),
    }
}

pub struct Synchronizer<C: HttpClient> {
    settings:  Arc<Settings>,
    metadata:  MetadataClient<C>,
    scheduler: DownloadScheduler<C>,
    filter:    TagFilter,
}

impl<C: HttpClient + Clone> Synchronizer<C> {
    pub fn new(client: C, settings: Settings) -> Result<Self> {
        let registry = Arc::new(settings.registry()?);
        let metadata = MetadataClient::new(client.clone(), registry.clone()).with_timeout(settings.metadata_timeout());
        let fetcher = Fetcher::new(client, settings.fetch_options());
        let mut scheduler = DownloadScheduler::new(fetcher, registry);
        if let Some(workers) = settings.hash_workers {
            scheduler = scheduler.with_hash_pool(HashPool::new(workers));
        }
        Ok(Self {
            filter: settings.tag_filter(),
            settings: Arc::new(settings),
            metadata,
            scheduler,
        })
    }
}

impl<C: HttpClient> Synchronizer<C> {
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<SyncProgress>) -> Self {
        self.scheduler = self.scheduler.with_progress(progress);
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn scheduler(&self) -> &DownloadScheduler<C> { &self.scheduler }

    /// Fetch metadata for `spec` and pick the files to mirror.
    pub async fn plan(&self, spec: &PackageSpec) -> PackagePlan {
        let package = spec.display_name();
        let selection = self.settings.selection(spec);

        let metadata = match self.metadata.fetch(&spec.name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(package = %package, error = %e, "metadata unavailable");
                return PackagePlan {
                    package,
                    version: pending_label(&selection),
                    obligations: Err(e),
                };
            }
        };

        let selected = selection.select(&metadata);
        let obligations: Vec<_> = selected
            .files()
            .filter(|file| self.filter.matches(file))
            .map(|file| file.obligation(&self.settings.download_dir))
            .collect();
        tracing::debug!(
            package = %package,
            versions = selected.versions.len(),
            listed = metadata.file_count(),
            filtered = obligations.len(),
            "planned package"
        );

        PackagePlan {
            version: selection.label(&selected),
            package,
            obligations: Ok(obligations),
        }
    }

    /// Plan every requirement, keeping requirement order.
    pub async fn plan_all(&self, specs: &[PackageSpec]) -> Vec<PackagePlan> {
        stream::iter(specs)
            .map(|spec| self.plan(spec))
            .buffered(METADATA_CONCURRENCY)
            .collect()
            .await
    }

    /// Plan and download every requirement.
    ///
    /// Failures stay inside their obligation and package. Directories are
    /// created per download, so an unusable download directory fails each
    /// file with [`FailureReason::Filesystem`](pymirror_fetch::FailureReason).
    pub async fn run(&self, specs: &[PackageSpec]) -> SyncReport {
        tracing::info!(packages = specs.len(), "fetching package metadata");
        let plans = self.plan_all(specs).await;

        let (unique, members) = deduplicate(&plans);
        tracing::info!(files = unique.len(), "files to synchronize");

        let completed = self.scheduler.run(unique).await;

        let packages = plans
            .iter()
            .zip(&members)
            .map(|(plan, indices)| match &plan.obligations {
                Err(_) => PackageSyncResult::metadata_unavailable(&plan.package, &plan.version),
                Ok(_) => PackageSyncResult::from_outcomes(
                    &plan.package,
                    &plan.version,
                    indices.len(),
                    indices.iter().map(|&i| &completed[i].outcome),
                ),
            })
            .collect();

        let urls = completed
            .iter()
            .filter_map(|c| match &c.outcome {
                DownloadOutcome::Downloaded { url, .. } => Some(url.clone()),
                DownloadOutcome::Skipped(_) => Some(self.scheduler.planned_url(&c.obligation)),
                DownloadOutcome::Failed { .. } => None,
            })
            .collect();

        SyncReport {
            packages,
            urls,
            progress: self.scheduler.progress().snapshot(),
        }
    }
}

/// Collapse obligations that share a destination.
///
/// Returns the unique obligations and, per plan, indices into them.
fn deduplicate(plans: &[PackagePlan]) -> (Vec<DownloadObligation>, Vec<Vec<usize>>) {
    let mut unique = Vec::new();
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    let mut members = Vec::with_capacity(plans.len());

    for plan in plans {
        let mut indices = Vec::new();
        if let Ok(obligations) = &plan.obligations {
            for obligation in obligations {
                let index = *seen.entry(obligation.destination.clone()).or_insert_with(|| {
                    unique.push(obligation.clone());
                    unique.len() - 1
                });
                indices.push(index);
            }
        }
        members.push(indices);
    }

    (unique, members)
}

/// Write one URL per line. An empty list writes nothing.
pub async fn write_url_list(path: &Path, urls: &[String]) -> Result<bool> {
    if urls.is_empty() {
        tracing::info!("no download URLs collected, URL list not written");
        return Ok(false);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|e| SyncError::io(parent, e))?;
    }
    let mut body = urls.join("\n");
    body.push('\n');
    tokio::fs::write(path, body).await.map_err(|e| SyncError::io(path, e))?;
    tracing::info!(path = %path.display(), urls = urls.len(), "URL list saved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obligation(name: &str) -> DownloadObligation {
        DownloadObligation {
            filename:    name.to_string(),
            url:         format!("https://files.pythonhosted.org/packages/{name}"),
            digest:      None,
            size:        None,
            destination: PathBuf::from("pypi").join(name),
        }
    }

    fn plan(names: &[&str]) -> PackagePlan {
        PackagePlan {
            package:     "pkg".into(),
            version:     "1.0".into(),
            obligations: Ok(names.iter().map(|n| obligation(n)).collect()),
        }
    }

    #[test]
    fn shared_files_are_fetched_once() {
        let missing = PackagePlan {
            package:     "ghost".into(),
            version:     "1.0".into(),
            obligations: Err(IndexError::InvalidRequirement("ghost".into())),
        };
        let plans = vec![plan(&["a.whl", "b.whl"]), missing, plan(&["b.whl", "c.whl"])];
        let (unique, members) = deduplicate(&plans);
        assert_eq!(unique.len(), 3);
        assert_eq!(members, vec![vec![0, 1], vec![], vec![1, 2]]);
        assert_eq!(plans[1].filtered(), 0);
    }

    #[test]
    fn pending_labels_name_the_mode() {
        assert_eq!(pending_label(&VersionSelection::Pinned("2.0".into())), "2.0");
        assert_eq!(pending_label(&VersionSelection::LatestPatch), "latest-patch");
    }

    #[tokio::test]
    async fn url_list_is_one_url_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("urls.txt");
        let urls = vec!["https://a.example/x.whl".to_string(), "https://a.example/y.tar.gz".to_string()];
        assert!(write_url_list(&path, &urls).await.unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), urls);

        let empty = dir.path().join("empty.txt");
        assert!(!write_url_list(&empty, &[]).await.unwrap());
        assert!(!empty.exists());
    }
}
