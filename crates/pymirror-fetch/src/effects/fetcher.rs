use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use pymirror_verify::{AnyHasher, Digest, Hasher};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::data::{DownloadObligation, FetchOptions};
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Performs single download attempts: stream, hash, verify, commit.
///
/// Retries and mirror selection live in
/// [`DownloadScheduler`](crate::DownloadScheduler); a `Fetcher` only knows
/// how to turn one URL into one verified file.
pub struct Fetcher<C: HttpClient> {
    client:  C,
    options: FetchOptions,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, options: FetchOptions) -> Self { Self { client, options } }

    pub fn client(&self) -> &C { &self.client }

    pub fn options(&self) -> &FetchOptions { &self.options }

    /// Download `url` into the obligation's destination.
    ///
    /// The body is streamed to a hidden staging file beside the destination
    /// and hashed on the way. The staging file is renamed into place only
    /// after the declared digest matches; on any error it is removed, so the
    /// destination never holds partial data. Returns the bytes written.
    pub async fn attempt(&self, url: &str, obligation: &DownloadObligation) -> Result<u64> {
        let destination = &obligation.destination;
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::fs(parent, e))?;

        let staging = staging_path(destination, &obligation.filename);
        let written = match self.stream_to(url, &staging, obligation.digest.as_ref()).await {
            Ok(written) => written,
            Err(e) => {
                discard(&staging).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&staging, destination).await {
            discard(&staging).await;
            return Err(FetchError::fs(destination, e));
        }
        Ok(written)
    }

    async fn stream_to(&self, url: &str, staging: &Path, expected: Option<&Digest>) -> Result<u64> {
        let connect = self.options.connect_timeout;
        let read = self.options.read_timeout;

        let mut body = match timeout(connect, self.client.stream(url, &self.options.headers)).await {
            Err(_) => return Err(FetchError::Timeout(connect)),
            Ok(Err(e)) => return Err(FetchError::Transport(e.to_string())),
            Ok(Ok(body)) => body,
        };

        let mut file = tokio::fs::File::create(staging)
            .await
            .map_err(|e| FetchError::fs(staging, e))?;
        let mut hasher = expected.map(|d| AnyHasher::for_algorithm(d.algorithm()));
        let mut written = 0u64;

        loop {
            let chunk = match timeout(read, body.next()).await {
                Err(_) => return Err(FetchError::Timeout(read)),
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(FetchError::Transport(e.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };
            if let Some(hasher) = hasher.as_mut() {
                hasher.update(&chunk);
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::fs(staging, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| FetchError::fs(staging, e))?;
        file.sync_all().await.map_err(|e| FetchError::fs(staging, e))?;
        drop(file);

        if let (Some(expected), Some(hasher)) = (expected, hasher) {
            let actual = hasher.finalize();
            if &actual != expected {
                return Err(FetchError::DigestMismatch {
                    expected: expected.to_hex(),
                    actual:   actual.to_hex(),
                });
            }
        }
        Ok(written)
    }
}

/// `dir/.name.part` for destination `dir/name`.
pub fn staging_path(destination: &Path, filename: &str) -> PathBuf {
    destination.with_file_name(format!(".{filename}.part"))
}

async fn discard(staging: &Path) {
    if let Err(e) = tokio::fs::remove_file(staging).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %staging.display(), error = %e, "failed to remove staging file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::http::BodyStream;
    use bytes::Bytes;
    use pymirror_verify::Sha256Hasher;
    use tempfile::tempdir;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct StubError(String);

    /// Serves the same chunks for every URL, optionally failing mid-body.
    struct StubClient {
        chunks:    Vec<&'static [u8]>,
        fail_body: bool,
    }

    impl HttpClient for StubClient {
        type Error = StubError;

        async fn stream(
            &self,
            _url: &str,
            _headers: &[(String, String)],
        ) -> std::result::Result<BodyStream<StubError>, StubError> {
            let mut items: Vec<std::result::Result<Bytes, StubError>> =
                self.chunks.iter().map(|c| Ok(Bytes::from_static(*c))).collect();
            if self.fail_body {
                items.push(Err(StubError("connection reset".into())));
            }
            Ok(Box::pin(futures_util::stream::iter(items)))
        }

        async fn get(&self, _url: &str, _headers: &[(String, String)]) -> std::result::Result<Bytes, StubError> {
            Ok(Bytes::new())
        }
    }

    fn obligation(dir: &Path, digest: Option<Digest>) -> DownloadObligation {
        DownloadObligation {
            filename: "demo-1.0-py3-none-any.whl".into(),
            url: "https://files.pythonhosted.org/packages/aa/demo-1.0-py3-none-any.whl".into(),
            digest,
            size: None,
            destination: dir.join("pkgs").join("demo-1.0-py3-none-any.whl"),
        }
    }

    #[tokio::test]
    async fn verified_body_lands_at_destination() {
        let dir = tempdir().unwrap();
        let fetcher = Fetcher::new(
            StubClient {
                chunks:    vec![&b"hello "[..], &b"world"[..]],
                fail_body: false,
            },
            FetchOptions::default(),
        );
        let ob = obligation(dir.path(), Some(Sha256Hasher::digest(b"hello world")));

        let written = fetcher.attempt("https://x/y", &ob).await.unwrap();
        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&ob.destination).unwrap(), b"hello world");
        assert!(!staging_path(&ob.destination, &ob.filename).exists());
    }

    #[tokio::test]
    async fn mismatch_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let fetcher = Fetcher::new(
            StubClient {
                chunks:    vec![&b"tampered"[..]],
                fail_body: false,
            },
            FetchOptions::default(),
        );
        let ob = obligation(dir.path(), Some(Sha256Hasher::digest(b"original")));

        let err = fetcher.attempt("https://x/y", &ob).await.unwrap_err();
        assert!(matches!(err, FetchError::DigestMismatch { .. }));
        assert!(!ob.destination.exists());
        assert!(!staging_path(&ob.destination, &ob.filename).exists());
    }

    #[tokio::test]
    async fn broken_body_is_transport_error() {
        let dir = tempdir().unwrap();
        let fetcher = Fetcher::new(
            StubClient {
                chunks:    vec![&b"partial"[..]],
                fail_body: true,
            },
            FetchOptions::default(),
        );
        let ob = obligation(dir.path(), None);

        let err = fetcher.attempt("https://x/y", &ob).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(err.is_retryable());
        assert!(!ob.destination.exists());
    }

    #[test]
    fn staging_is_hidden_sibling() {
        let path = staging_path(Path::new("/srv/pkgs/a.whl"), "a.whl");
        assert_eq!(path, Path::new("/srv/pkgs/.a.whl.part"));
    }
}
