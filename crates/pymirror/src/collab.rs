//! External collaborators: the dependency resolver and the index builder.
//!
//! Both are plain programs. The resolver reads a requirements file and writes
//! a pinned one; the index builder turns the download directory into a simple
//! index. Nothing here looks inside either tool.

use std::path::{Path, PathBuf};

use pymirror_platform::{Command, Tool};

use crate::config::Settings;
use crate::error::{Result, SyncError};

fn unavailable(tool: &Tool, e: pymirror_platform::Error) -> SyncError {
    SyncError::CollaboratorUnavailable {
        tool:   tool.program().to_string(),
        reason: e.to_string(),
    }
}

fn configured(line: &str) -> Result<Tool> {
    Tool::parse(line).map_err(|e| SyncError::InvalidSettings(format!("{e}: {line:?}")))
}

/// Sibling file the resolver writes, e.g. `requirements.resolved.txt`.
pub fn resolved_path(requirements: &Path) -> PathBuf {
    let stem = requirements
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "requirements".to_string());
    requirements.with_file_name(format!("{stem}.resolved.txt"))
}

/// Invokes `<resolver> <requirements> -o <output> --no-header [-i <index>]`.
#[derive(Clone, Debug)]
pub struct Resolver {
    tool:  Tool,
    index: Option<String>,
}

impl Resolver {
    pub fn new(tool: Tool) -> Self { Self { tool, index: None } }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(configured(&settings.resolver)?).with_index(settings.resolver_index()))
    }

    #[must_use]
    pub fn with_index(mut self, index: Option<String>) -> Self {
        self.index = index;
        self
    }

    pub fn tool(&self) -> &Tool { &self.tool }

    pub fn command(&self, requirements: &Path, output: &Path) -> Result<Command> {
        let mut cmd = self
            .tool
            .command()
            .map_err(|e| unavailable(&self.tool, e))?
            .arg(requirements)
            .arg("-o")
            .arg(output)
            .arg("--no-header");
        if let Some(index) = &self.index {
            cmd = cmd.args(["-i", index.as_str()]);
        }
        Ok(cmd)
    }

    /// Run the resolver and return the pinned requirements it produced.
    pub async fn resolve(&self, requirements: &Path, output: &Path) -> Result<String> {
        let cmd = self.command(requirements, output)?;
        tracing::info!(command = %cmd.display(), "resolving dependencies");
        let run = cmd.run().await.map_err(|e| unavailable(&self.tool, e))?;
        for line in String::from_utf8_lossy(&run.stderr).lines() {
            tracing::debug!(tool = self.tool.program(), "{line}");
        }
        tokio::fs::read_to_string(output)
            .await
            .map_err(|e| SyncError::io(output, e))
    }
}

/// Invokes `<index-builder> <download-dir>`.
#[derive(Clone, Debug)]
pub struct IndexBuilder {
    tool: Tool,
}

impl IndexBuilder {
    pub fn new(tool: Tool) -> Self { Self { tool } }

    pub fn from_settings(settings: &Settings) -> Result<Self> { Ok(Self::new(configured(&settings.index_builder)?)) }

    pub fn tool(&self) -> &Tool { &self.tool }

    pub async fn build(&self, download_dir: &Path) -> Result<()> {
        let cmd = self
            .tool
            .command()
            .map_err(|e| unavailable(&self.tool, e))?
            .arg(download_dir);
        tracing::info!(command = %cmd.display(), "building index");
        let run = cmd.run().await.map_err(|e| unavailable(&self.tool, e))?;
        let stdout = String::from_utf8_lossy(&run.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(tool = self.tool.program(), "{}", stdout.trim());
        }
        tracing::info!(dir = %download_dir.join("simple").display(), "index built");
        Ok(())
    }
}

/// Requirements text for the run.
///
/// Runs the resolver unless disabled. A missing or failing resolver degrades
/// to the requirements file as written.
pub async fn requirements_text(settings: &Settings) -> Result<String> {
    let path = settings.requirements.as_path();
    if !path.is_file() {
        return Err(SyncError::RequirementsNotFound(path.to_path_buf()));
    }

    if !settings.no_resolve {
        let resolver = Resolver::from_settings(settings)?;
        match resolver.resolve(path, &resolved_path(path)).await {
            Ok(text) => return Ok(text),
            Err(e) => tracing::warn!(error = %e, "resolver unavailable, using requirements as written"),
        }
    }

    tokio::fs::read_to_string(path).await.map_err(|e| SyncError::io(path, e))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const MISSING: &str = "pymirror-no-such-binary-12345";

    #[test]
    fn resolved_path_sits_beside_input() {
        assert_eq!(
            resolved_path(Path::new("/work/requirements.in")),
            PathBuf::from("/work/requirements.resolved.txt")
        );
    }

    #[test]
    fn missing_resolver_is_unavailable() {
        let resolver = Resolver::new(Tool::new(MISSING));
        let err = resolver.command(Path::new("r.txt"), Path::new("o.txt")).unwrap_err();
        assert!(matches!(err, SyncError::CollaboratorUnavailable { tool, .. } if tool == MISSING));
    }

    #[tokio::test]
    async fn missing_index_builder_is_unavailable() {
        let builder = IndexBuilder::new(Tool::new(MISSING));
        let err = builder.build(Path::new(".")).await.unwrap_err();
        assert!(matches!(err, SyncError::CollaboratorUnavailable { .. }));
    }

    #[tokio::test]
    async fn requirements_file_must_exist() {
        let settings = Settings {
            requirements: PathBuf::from("/nonexistent/requirements.txt"),
            no_resolve: true,
            ..Settings::default()
        };
        assert!(matches!(
            requirements_text(&settings).await,
            Err(SyncError::RequirementsNotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_resolver_degrades_to_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("requirements.txt");
        std::fs::write(&input, "numpy\n").unwrap();
        let settings = Settings {
            requirements: input,
            resolver: MISSING.to_string(),
            ..Settings::default()
        };
        assert_eq!(requirements_text(&settings).await.unwrap(), "numpy\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolver_output_is_read_back() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("resolve.sh");
        std::fs::write(
            &script,
            "while [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then shift; echo \"numpy==1.26.4\" > \"$1\"; fi\n  shift\ndone\n",
        )
        .unwrap();
        let input = dir.path().join("requirements.in");
        std::fs::write(&input, "numpy\n").unwrap();

        let settings = Settings {
            requirements: input.clone(),
            resolver: format!("sh {}", script.display()),
            ..Settings::default()
        };
        let text = requirements_text(&settings).await.unwrap();
        assert_eq!(text.trim(), "numpy==1.26.4");
        assert!(resolved_path(&input).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn resolver_receives_index_in_mirror_mode() {
        let resolver = Resolver::new(Tool::new("sh")).with_index(Some("https://m.example/pypi/web/simple".into()));
        let cmd = resolver.command(Path::new("in.txt"), Path::new("out.txt")).unwrap();
        assert!(cmd.display().ends_with("in.txt -o out.txt --no-header -i https://m.example/pypi/web/simple"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn index_builder_exit_status_is_checked() {
        let dir = TempDir::new().unwrap();
        let ok = IndexBuilder::new(Tool::parse("sh -c true").unwrap());
        ok.build(dir.path()).await.unwrap();

        let failing = IndexBuilder::new(Tool::parse("sh -c false").unwrap());
        assert!(matches!(
            failing.build(dir.path()).await,
            Err(SyncError::CollaboratorUnavailable { .. })
        ));
    }
}
