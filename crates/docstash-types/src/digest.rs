use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::ObjectId;

/// Hash algorithms the digest engine can compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in canonical order.
    pub const ALL: [DigestAlgorithm; 5] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Blake3,
    ];

    /// Lowercase name used in configuration and in the metadata index.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha1 => 40,
            DigestAlgorithm::Sha256 | DigestAlgorithm::Blake3 => 64,
            DigestAlgorithm::Sha512 => 128,
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            _ => Err(TypeError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Hex digests of one byte sequence under several algorithms.
///
/// Every entry was computed over exactly the same bytes, so two sets built
/// from identical content are equal regardless of where the bytes came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestSet(BTreeMap<DigestAlgorithm, String>);

impl DigestSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, algorithm: DigestAlgorithm, hex: String) {
        self.0.insert(algorithm, hex);
    }

    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<&str> {
        self.0.get(&algorithm).map(String::as_str)
    }

    /// The digest under `algorithm` as an [`ObjectId`].
    pub fn object_id(&self, algorithm: DigestAlgorithm) -> Option<ObjectId> {
        self.get(algorithm).and_then(|hex| ObjectId::from_hex(hex).ok())
    }

    /// All digests except the one for `primary`.
    pub fn secondary(&self, primary: DigestAlgorithm) -> BTreeMap<DigestAlgorithm, String> {
        self.0
            .iter()
            .filter(|(algorithm, _)| **algorithm != primary)
            .map(|(algorithm, hex)| (*algorithm, hex.clone()))
            .collect()
    }

    pub fn algorithms(&self) -> impl Iterator<Item = DigestAlgorithm> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DigestAlgorithm, &str)> {
        self.0.iter().map(|(a, h)| (*a, h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(DigestAlgorithm, String)> for DigestSet {
    fn from_iter<T: IntoIterator<Item = (DigestAlgorithm, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_through_from_str() {
        for algorithm in DigestAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<DigestAlgorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("SHA256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!(" md5 ".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Md5);
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        assert_eq!(
            "crc32".parse::<DigestAlgorithm>(),
            Err(TypeError::UnknownAlgorithm("crc32".into()))
        );
    }

    #[test]
    fn default_is_sha256() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha256);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DigestAlgorithm::Blake3).unwrap();
        assert_eq!(json, "\"blake3\"");
    }

    #[test]
    fn secondary_excludes_primary() {
        let set: DigestSet = [
            (DigestAlgorithm::Md5, "aa".to_string()),
            (DigestAlgorithm::Sha256, "bb".to_string()),
        ]
        .into_iter()
        .collect();
        let secondary = set.secondary(DigestAlgorithm::Sha256);
        assert_eq!(secondary.len(), 1);
        assert_eq!(secondary.get(&DigestAlgorithm::Md5).map(String::as_str), Some("aa"));
        assert_eq!(set.object_id(DigestAlgorithm::Sha256).unwrap().as_str(), "bb");
        assert!(set.object_id(DigestAlgorithm::Sha1).is_none());
    }

    #[test]
    fn digest_set_serialises_as_map() {
        let mut set = DigestSet::new();
        set.insert(DigestAlgorithm::Sha1, "01".into());
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"sha1":"01"}"#);
    }
}
