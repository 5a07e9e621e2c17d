use std::path::{Path, PathBuf};

use docstash_digest::DEFAULT_CHUNK_SIZE;
use docstash_gate::AdmissionConfig;
use docstash_index::ConnectionString;
use docstash_store::ShardLayout;
use docstash_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Everything needed to open a [`StorageEngine`](crate::StorageEngine).
///
/// Loadable from TOML; every field except the two locations has a default:
///
/// ```toml
/// storage_root = "/srv/docstash/objects"
/// connection = "sqlite:////srv/docstash/files.sqlite"
/// primary_algorithm = "sha256"
/// algorithms = ["md5", "sha1", "sha256"]
///
/// [layout]
/// depth = 3
/// width = 2
///
/// [admission]
/// file_bin = "/usr/bin/file"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory of the content store.
    pub storage_root: PathBuf,
    /// Metadata index location.
    pub connection: ConnectionString,
    /// Algorithm whose digest identifies and places objects.
    #[serde(default)]
    pub primary_algorithm: DigestAlgorithm,
    /// Algorithms computed for every object. The primary algorithm is always
    /// computed, listed here or not.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<DigestAlgorithm>,
    /// Read buffer size for hashing, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub layout: ShardLayout,
    #[serde(default)]
    pub admission: AdmissionConfig,
}

fn default_algorithms() -> Vec<DigestAlgorithm> {
    vec![
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
    ]
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl EngineConfig {
    /// Defaults for everything but the two locations. Tool paths honour the
    /// `FILETYPE_FPATH` and `XDGMIME_FPATH` overrides.
    pub fn new(storage_root: impl Into<PathBuf>, connection: ConnectionString) -> Self {
        Self {
            storage_root: storage_root.into(),
            connection,
            primary_algorithm: DigestAlgorithm::default(),
            algorithms: default_algorithms(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            layout: ShardLayout::default(),
            admission: AdmissionConfig::from_env(),
        }
    }

    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| EngineError::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| EngineError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.layout.validate()?;
        if self.chunk_size == 0 {
            return Err(EngineError::Config("chunk_size must be at least 1".into()));
        }
        if self.layout.prefix_len() >= self.primary_algorithm.hex_len() {
            return Err(EngineError::Config(format!(
                "layout {}x{} leaves no file name for {} digests",
                self.layout.depth, self.layout.width, self.primary_algorithm
            )));
        }
        Ok(())
    }

    /// The configured algorithms plus the primary one, without repeats.
    pub fn digest_algorithms(&self) -> Vec<DigestAlgorithm> {
        let mut algorithms = self.algorithms.clone();
        if !algorithms.contains(&self.primary_algorithm) {
            algorithms.push(self.primary_algorithm);
        }
        algorithms.sort();
        algorithms.dedup();
        algorithms
    }
}
