//! Content verification for mirrored artifacts.
//!
//! Digests are always computed by streaming fixed-size chunks, so memory use
//! does not grow with artifact size. Async callers use [`HashPool`], which
//! keeps hashing off the network event loop.
//!
//! # Example
//!
//! ```
//! use pymirror_verify::{Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(b"hello world");
//!
//! let reader = VerifiedReader::new(&data[..], Sha256Hasher::new());
//! let (digest, len) = reader.drain(4).unwrap();
//! assert_eq!(digest, expected);
//! assert_eq!(len, 11);
//! ```

pub use self::digest::{Digest, DigestAlgorithm};
pub use self::error::{Result, VerifyError};
pub use self::file::{CHUNK_SIZE, digest_of, is_valid};
pub use self::hasher::{AnyHasher, Hasher, Sha256Hasher};
pub use self::pool::HashPool;
pub use self::reader::VerifiedReader;

mod digest;
mod error;
mod file;
mod hasher;
mod pool;
mod reader;
