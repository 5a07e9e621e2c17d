use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use docstash_types::{DigestAlgorithm, DigestSet};
use tracing::debug;

use crate::error::{DigestError, DigestResult};
use crate::hasher::MultiHasher;

/// Default read chunk: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Computes several digests of a byte source in a single read pass.
///
/// The configuration is validated up front: an engine that exists can always
/// hash, so configuration errors never surface after bytes were read.
#[derive(Clone, Debug)]
pub struct DigestEngine {
    algorithms: Vec<DigestAlgorithm>,
    chunk_size: usize,
}

impl DigestEngine {
    /// Create an engine for the given algorithms.
    pub fn new(algorithms: &[DigestAlgorithm]) -> DigestResult<Self> {
        if algorithms.is_empty() {
            return Err(DigestError::NoAlgorithms);
        }
        let mut unique: Vec<DigestAlgorithm> = Vec::with_capacity(algorithms.len());
        for algorithm in algorithms {
            if !unique.contains(algorithm) {
                unique.push(*algorithm);
            }
        }
        Ok(Self {
            algorithms: unique,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Create an engine from algorithm names such as `"sha256"`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> DigestResult<Self> {
        let algorithms = names
            .iter()
            .map(|name| {
                name.as_ref()
                    .parse::<DigestAlgorithm>()
                    .map_err(|_| DigestError::UnknownAlgorithm(name.as_ref().to_string()))
            })
            .collect::<DigestResult<Vec<_>>>()?;
        Self::new(&algorithms)
    }

    /// Override the read chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> DigestResult<Self> {
        if chunk_size == 0 {
            return Err(DigestError::ZeroChunkSize);
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn algorithms(&self) -> &[DigestAlgorithm] {
        &self.algorithms
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read `reader` to exhaustion and return every configured digest.
    pub fn compute<R: Read + ?Sized>(&self, reader: &mut R) -> DigestResult<DigestSet> {
        let mut hasher = MultiHasher::new(&self.algorithms);
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DigestError::Read(e)),
            };
            hasher.update(&buf[..n]);
        }
        debug!(
            bytes = hasher.bytes_hashed(),
            algorithms = self.algorithms.len(),
            "computed digests"
        );
        Ok(hasher.finalize())
    }

    /// Open `path` and digest its contents.
    pub fn compute_path(&self, path: &Path) -> DigestResult<DigestSet> {
        let mut file = File::open(path).map_err(|source| DigestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.compute(&mut file)
    }
}
