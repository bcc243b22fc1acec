use sha2::Digest as _;

use crate::digest::{Digest, DigestAlgorithm};

/// Incremental hasher fed chunk by chunk.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Digest;
}

pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }

    fn finalize(self) -> Digest { Digest::new(DigestAlgorithm::Sha256, self.0.finalize().to_vec()) }
}

impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Digest {
        Digest::new(DigestAlgorithm::Sha256, sha2::Sha256::digest(data).to_vec())
    }
}

/// Hasher for whichever algorithm a declared digest uses.
pub enum AnyHasher {
    Sha256(Sha256Hasher),
}

impl AnyHasher {
    pub fn for_algorithm(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256Hasher::new()),
        }
    }
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => h.finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(
            hasher.finalize().to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn any_hasher_matches_direct_digest() {
        let mut hasher = AnyHasher::for_algorithm(DigestAlgorithm::Sha256);
        hasher.update(b"wheel bytes");
        assert_eq!(hasher.finalize(), Sha256Hasher::digest(b"wheel bytes"));
    }
}
