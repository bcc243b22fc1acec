//! Declared and computed content digests.

use std::fmt;

use crate::error::{Result, VerifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    pub fn digest_length(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A digest value tagged with the algorithm that produced it.
///
/// Two digests are equal only when both algorithm and bytes agree, so a
/// comparison can never silently cross algorithms.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    bytes:     Vec<u8>,
}

impl Digest {
    pub fn new(algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Self { Self { algorithm, bytes } }

    /// Parse a hex digest, validating its length for the algorithm.
    pub fn from_hex(algorithm: DigestAlgorithm, hex_digest: &str) -> Result<Self> {
        let trimmed = hex_digest.trim();
        let invalid = || VerifyError::InvalidDigest {
            algorithm: algorithm.as_str(),
            value:     trimmed.to_string(),
        };

        if trimmed.len() != algorithm.digest_length() * 2 {
            return Err(invalid());
        }
        let bytes = hex::decode(trimmed.to_ascii_lowercase()).map_err(|_| invalid())?;
        Ok(Self { algorithm, bytes })
    }

    pub fn algorithm(&self) -> DigestAlgorithm { self.algorithm }

    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    pub fn to_hex(&self) -> String { hex::encode(&self.bytes) }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn from_hex_accepts_uppercase() {
        let digest = Digest::from_hex(DigestAlgorithm::Sha256, &HELLO.to_uppercase()).unwrap();
        assert_eq!(digest.to_hex(), HELLO);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Digest::from_hex(DigestAlgorithm::Sha256, "abc123").unwrap_err();
        assert!(matches!(err, VerifyError::InvalidDigest { algorithm: "sha256", .. }));
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        let bad = "z".repeat(64);
        assert!(Digest::from_hex(DigestAlgorithm::Sha256, &bad).is_err());
    }

    #[test]
    fn display_names_the_algorithm() {
        let digest = Digest::from_hex(DigestAlgorithm::Sha256, HELLO).unwrap();
        assert_eq!(digest.to_string(), format!("sha256={HELLO}"));
        assert_eq!(format!("{digest:?}"), format!("Digest(sha256:{HELLO})"));
    }
}
