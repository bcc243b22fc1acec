//! Log output: human-readable records on stderr plus a size-rotated trace
//! file that keeps the full history of recent runs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoggingError;

/// Directives for the log file: everything from this workspace, warnings from dependencies.
const FILE_DIRECTIVES: &str = "warn,pymirror=trace";

/// Keeps the background log writer alive; buffered records are flushed on drop.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFileConfig {
    pub path:      PathBuf,
    pub max_bytes: u64,

    /// Rotated files kept as `<path>.1` (newest) to `<path>.<retention>`.
    pub retention: usize,
}

/// Level selected by repeated `-v` flags.
pub fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `-v` overrides `RUST_LOG`; without it `RUST_LOG` applies, defaulting to `info`.
pub fn env_filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
        n => EnvFilter::new(verbosity_level(n).to_string()),
    }
}

pub fn file_filter() -> EnvFilter { EnvFilter::new(FILE_DIRECTIVES) }

/// Install the global subscriber.
///
/// Console records go to stderr so stdout stays clean for the report. The
/// file layer ignores `-v` and `RUST_LOG` and always records at trace level.
pub fn init(verbose: u8, file: Option<&LogFileConfig>) -> Result<LoggingGuard, LoggingError> {
    let (writer, guard) = match file {
        Some(config) => {
            let rotating = RotatingFile::open(config).map_err(|source| LoggingError::LogFile {
                path: config.path.clone(),
                source,
            })?;
            let (writer, guard) = tracing_appender::non_blocking(rotating);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let file_layer = writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(file_filter())
    });
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(env_filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LoggingGuard {
        _worker_guard: guard,
    })
}

/// Append-only log file that rolls over once it would exceed `max_bytes`.
///
/// On rollover `<path>.N` becomes `<path>.N+1`, the active file becomes
/// `<path>.1` and anything past the retention count is deleted.
#[derive(Debug)]
pub struct RotatingFile {
    path:      PathBuf,
    max_bytes: u64,
    retention: usize,
    file:      File,
    written:   u64,
}

impl RotatingFile {
    pub fn open(config: &LogFileConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = append(&config.path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: config.path.clone(),
            max_bytes: config.max_bytes,
            retention: config.retention,
            file,
            written,
        })
    }

    pub fn archive_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.retention == 0 {
            self.file = File::create(&self.path)?;
        } else {
            remove_if_present(&self.archive_path(self.retention))?;
            for n in (1..self.retention).rev() {
                let from = self.archive_path(n);
                if from.exists() {
                    fs::rename(&from, self.archive_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.archive_path(1))?;
            self.file = append(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { self.file.flush() }
}

fn append(path: &Path) -> io::Result<File> { OpenOptions::new().create(true).append(true).open(path) }

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
