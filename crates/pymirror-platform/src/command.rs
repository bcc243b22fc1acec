use std::ffi::OsStr;
use std::process::{Output, Stdio};

use tokio::process::Command as TokioCommand;

use crate::error::{Error, Result};

/// Longest stderr excerpt carried in [`Error::NonZeroExit`].
const STDERR_TAIL: usize = 2048;

/// Async process builder that reports failures with the program name.
#[derive(Debug)]
pub struct Command {
    inner:   TokioCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        let mut inner = TokioCommand::new(program);
        inner.stdin(Stdio::null()).kill_on_drop(true);
        Self {
            inner,
            program: program.to_string_lossy().into_owned(),
        }
    }

    pub fn program(&self) -> &str { &self.program }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    /// Argument list as it will be passed, for logging.
    pub fn display(&self) -> String {
        let std = self.inner.as_std();
        std::iter::once(self.program.clone())
            .chain(std.get_args().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, capturing stdout and stderr.
    pub async fn output(mut self) -> Result<Output> {
        self.inner.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::CommandNotFound {
                cmd: self.program.clone(),
            },
            _ => Error::CommandFailed {
                cmd:    self.program.clone(),
                source: e,
            },
        })
    }

    /// Run to completion and require a zero exit status.
    pub async fn run(self) -> Result<Output> {
        let line = self.display();
        tracing::debug!(command = %line, "running");
        let cmd = self.program.clone();
        let output = self.output().await?;
        if output.status.success() {
            return Ok(output);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let start = stderr.len().saturating_sub(STDERR_TAIL);
        let start = (start..stderr.len()).find(|&i| stderr.is_char_boundary(i)).unwrap_or(stderr.len());
        Err(Error::NonZeroExit {
            cmd,
            status: output.status.to_string(),
            stderr: stderr[start..].trim().to_string(),
        })
    }
}
