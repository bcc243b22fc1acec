//! Blocking digest computation over on-disk files.
//!
//! These functions block the calling thread; async callers go through
//! [`HashPool`](crate::HashPool) instead of calling them directly.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{Result, VerifyError};
use crate::hasher::AnyHasher;
use crate::reader::VerifiedReader;

/// Read size used when streaming a file through a hasher.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the digest of `path` without buffering the whole file.
pub fn digest_of(path: &Path, algorithm: DigestAlgorithm) -> Result<Digest> {
    let read_err = |source: io::Error| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let reader = VerifiedReader::new(
        BufReader::with_capacity(CHUNK_SIZE, file),
        AnyHasher::for_algorithm(algorithm),
    );
    let (digest, _) = reader.drain(CHUNK_SIZE).map_err(read_err)?;
    Ok(digest)
}

/// `true` iff `path` exists and its content hashes to `expected`.
///
/// A missing file, an unreadable file and a mismatch are all `false`.
pub fn is_valid(path: &Path, expected: &Digest) -> bool {
    if !path.is_file() {
        return false;
    }
    match digest_of(path, expected.algorithm()) {
        Ok(actual) => &actual == expected,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not hash existing file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha256Hasher;
    use tempfile::tempdir;

    #[test]
    fn digest_of_matches_in_memory_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkg-1.0.tar.gz");
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let digest = digest_of(&path, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(digest, Sha256Hasher::digest(&data));
    }

    #[test]
    fn digest_of_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = digest_of(&dir.path().join("absent.whl"), DigestAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, VerifyError::Read { .. }));
    }

    #[test]
    fn is_valid_cases() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.whl");
        std::fs::write(&path, b"content").unwrap();

        assert!(is_valid(&path, &Sha256Hasher::digest(b"content")));
        assert!(!is_valid(&path, &Sha256Hasher::digest(b"other")));
        assert!(!is_valid(&dir.path().join("missing.whl"), &Sha256Hasher::digest(b"content")));
        assert!(!is_valid(dir.path(), &Sha256Hasher::digest(b"content")));
    }
}
