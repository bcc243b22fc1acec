//! Terminal output: the live progress bar and the final summary table.

use std::sync::Arc;

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use pymirror_fetch::{ProgressObserver, ProgressSnapshot};
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

use crate::aggregate::{PackageSyncResult, SyncStatus};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Formatter {
    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }
        if let Some(footer) = self.footer {
            table.with(Panel::footer(footer));
        }
        table.with(Style::blank());
        table
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status:  SyncStatus,
    #[tabled(rename = "Files")]
    ratio:   String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Status counts and byte totals under the table.
pub fn footer(results: &[PackageSyncResult], progress: &ProgressSnapshot) -> String {
    let count = |status: SyncStatus| results.iter().filter(|r| r.status == status).count();
    format!(
        "{} package(s): {} synchronized, {} partial, {} failed, {} without files | {} downloaded ({}), {} up to date, {} failed",
        results.len(),
        count(SyncStatus::Synchronized),
        count(SyncStatus::PartialSync),
        count(SyncStatus::Failed),
        count(SyncStatus::NoFiles),
        progress.downloaded,
        HumanBytes(progress.bytes),
        progress.skipped,
        progress.failed,
    )
}

pub fn summary_table(results: &[PackageSyncResult], progress: &ProgressSnapshot) -> Table {
    let rows = results.iter().map(|r| SummaryRow {
        package: r.package.clone(),
        version: r.version.clone(),
        status:  r.status,
        ratio:   r.ratio(),
        details: r.details.clone(),
    });
    Formatter {
        header: Some("Package Synchronization Summary".to_string()),
        footer: Some(footer(results, progress)),
    }
    .build(rows)
}

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} ({eta}) {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

/// Progress bar over settled obligations.
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn new(prefix: &str) -> Self { Self::from_bar(ProgressBar::new(0), prefix) }

    /// Tracker that never draws.
    pub fn hidden() -> Self { Self::from_bar(ProgressBar::hidden(), "") }

    fn from_bar(pb: ProgressBar, prefix: &str) -> Self {
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(prefix.to_string());
        Self { pb }
    }

    /// Observer that keeps this bar in step with the shared counters.
    pub fn observer(&self) -> ProgressObserver {
        let pb = self.pb.clone();
        Arc::new(move |snapshot: &ProgressSnapshot| apply(&pb, snapshot))
    }

    pub fn position(&self) -> u64 { self.pb.position() }

    pub fn finish(self) { self.pb.finish_and_clear(); }
}

fn apply(pb: &ProgressBar, snapshot: &ProgressSnapshot) {
    pb.set_length(snapshot.total);
    pb.set_position(snapshot.settled());
    pb.set_message(format!(
        "{} new, {} cached, {} failed, {}",
        snapshot.downloaded,
        snapshot.skipped,
        snapshot.failed,
        HumanBytes(snapshot.bytes)
    ));
}

#[cfg(test)]
mod tests {
    use pymirror_fetch::{DownloadOutcome, SkipReason};

    use super::*;

    fn results() -> Vec<PackageSyncResult> {
        let done = [
            DownloadOutcome::Downloaded {
                attempts: 1,
                bytes:    10,
                url:      "https://files.pythonhosted.org/packages/numpy.whl".into(),
            },
            DownloadOutcome::Skipped(SkipReason::HashMatched),
        ];
        vec![
            PackageSyncResult::from_outcomes("numpy", "1.26.4", 2, &done),
            PackageSyncResult::metadata_unavailable("ghost", "0.1"),
        ]
    }

    #[test]
    fn table_lists_every_package() {
        let snapshot = ProgressSnapshot {
            total: 2,
            downloaded: 1,
            skipped: 1,
            failed: 0,
            bytes: 10,
        };
        let rendered = summary_table(&results(), &snapshot).to_string();
        assert!(rendered.contains("Package Synchronization Summary"));
        assert!(rendered.contains("numpy"));
        assert!(rendered.contains("2/2"));
        assert!(rendered.contains("Failed to fetch metadata"));
        assert!(rendered.contains("2 package(s): 1 synchronized, 0 partial, 1 failed"));
    }

    #[test]
    fn plain_formatter_has_no_panels() {
        let rendered = Formatter::default().build([("numpy", "1.26.4")]).to_string();
        assert!(rendered.contains("numpy"));
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn observer_moves_the_bar() {
        let tracker = ProgressTracker::hidden();
        let observe = tracker.observer();
        observe(&ProgressSnapshot {
            total: 5,
            downloaded: 2,
            skipped: 1,
            failed: 0,
            bytes: 0,
        });
        assert_eq!(tracker.position(), 3);
        tracker.finish();
    }
}
