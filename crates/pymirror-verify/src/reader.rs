use std::io::{self, Read};

use crate::digest::Digest;
use crate::hasher::Hasher;

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    bytes:  u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            bytes: 0,
        }
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Drain the inner reader through a fixed-size buffer and return the digest.
    ///
    /// Memory use is bounded by `chunk_size` regardless of input length.
    pub fn drain(mut self, chunk_size: usize) -> io::Result<(Digest, u64)> {
        let mut buf = vec![0u8; chunk_size.max(1)];
        loop {
            match self.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let bytes = self.bytes;
        Ok((self.hasher.finalize(), bytes))
    }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes += n as u64;
        }
        Ok(n)
    }
}
