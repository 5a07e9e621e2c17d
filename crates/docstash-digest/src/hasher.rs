use docstash_types::{DigestAlgorithm, DigestSet};
use sha2::Digest;

/// Running state of one algorithm.
enum HashState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl HashState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            DigestAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// A set of hashers updated in lock-step.
///
/// Every call to [`update`](Self::update) feeds the same bytes to every
/// algorithm, so the finished [`DigestSet`] describes one byte sequence.
pub struct MultiHasher {
    states: Vec<(DigestAlgorithm, HashState)>,
    bytes: u64,
}

impl MultiHasher {
    /// Create a hasher for the given algorithms. Duplicates are ignored.
    pub fn new(algorithms: &[DigestAlgorithm]) -> Self {
        let mut states: Vec<(DigestAlgorithm, HashState)> = Vec::with_capacity(algorithms.len());
        for algorithm in algorithms {
            if !states.iter().any(|(a, _)| a == algorithm) {
                states.push((*algorithm, HashState::new(*algorithm)));
            }
        }
        Self { states, bytes: 0 }
    }

    /// Feed a chunk to every algorithm.
    pub fn update(&mut self, data: &[u8]) {
        for (_, state) in &mut self.states {
            state.update(data);
        }
        self.bytes += data.len() as u64;
    }

    /// Total bytes fed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Finish every computation and return the hex digests.
    pub fn finalize(self) -> DigestSet {
        self.states
            .into_iter()
            .map(|(algorithm, state)| (algorithm, state.finalize_hex()))
            .collect()
    }

    /// One-shot digest of an in-memory buffer.
    pub fn digest(algorithms: &[DigestAlgorithm], data: &[u8]) -> DigestSet {
        let mut hasher = Self::new(algorithms);
        hasher.update(data);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors_for_abc() {
        let set = MultiHasher::digest(&DigestAlgorithm::ALL, b"abc");
        assert_eq!(set.get(DigestAlgorithm::Md5), Some("900150983cd24fb0d6963f7d28e17f72"));
        assert_eq!(
            set.get(DigestAlgorithm::Sha1),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
        assert_eq!(
            set.get(DigestAlgorithm::Sha256),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(
            set.get(DigestAlgorithm::Sha512),
            Some(
                "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                 2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
            )
        );
        assert_eq!(
            set.get(DigestAlgorithm::Blake3),
            Some(blake3::hash(b"abc").to_hex().as_str())
        );
    }

    #[test]
    fn empty_input_vectors() {
        let set = MultiHasher::digest(&[DigestAlgorithm::Md5, DigestAlgorithm::Sha1], b"");
        assert_eq!(set.get(DigestAlgorithm::Md5), Some("d41d8cd98f00b204e9800998ecf8427e"));
        assert_eq!(
            set.get(DigestAlgorithm::Sha1),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[test]
    fn hex_lengths_match_algorithm() {
        let set = MultiHasher::digest(&DigestAlgorithm::ALL, b"length check");
        for (algorithm, hex) in set.iter() {
            assert_eq!(hex.len(), algorithm.hex_len(), "{algorithm}");
        }
    }

    #[test]
    fn split_updates_match_single_update() {
        let mut split = MultiHasher::new(&DigestAlgorithm::ALL);
        split.update(b"hello ");
        split.update(b"world");
        assert_eq!(split.bytes_hashed(), 11);
        assert_eq!(
            split.finalize(),
            MultiHasher::digest(&DigestAlgorithm::ALL, b"hello world")
        );
    }

    #[test]
    fn duplicate_algorithms_are_collapsed() {
        let set = MultiHasher::digest(&[DigestAlgorithm::Sha256, DigestAlgorithm::Sha256], b"x");
        assert_eq!(set.len(), 1);
    }
}
