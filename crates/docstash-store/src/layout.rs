use std::path::{Component, Path, PathBuf};

use docstash_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// How a digest is split into nested directories.
///
/// The first `depth * width` hex characters of the digest become `depth`
/// directory names of `width` characters each; the remaining characters form
/// the file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardLayout {
    pub depth: usize,
    pub width: usize,
}

impl Default for ShardLayout {
    fn default() -> Self {
        Self { depth: 3, width: 2 }
    }
}

impl ShardLayout {
    /// Create a validated layout.
    pub fn new(depth: usize, width: usize) -> StoreResult<Self> {
        let layout = Self { depth, width };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.depth == 0 {
            return Err(StoreError::InvalidLayout("depth must be at least 1".into()));
        }
        if self.width == 0 {
            return Err(StoreError::InvalidLayout("width must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of leading hex characters consumed by directories.
    pub fn prefix_len(&self) -> usize {
        self.depth * self.width
    }

    fn check_len(&self, id: &ObjectId) -> StoreResult<()> {
        self.validate()?;
        if id.len() <= self.prefix_len() {
            return Err(StoreError::DigestTooShort {
                id: id.clone(),
                required: self.prefix_len(),
            });
        }
        Ok(())
    }

    /// Directory holding the object, relative to the store root.
    pub fn shard_dir(&self, id: &ObjectId) -> StoreResult<PathBuf> {
        self.check_len(id)?;
        let hex = id.as_str();
        Ok((0..self.depth)
            .map(|level| &hex[level * self.width..(level + 1) * self.width])
            .collect())
    }

    /// File name of the object without extension.
    pub fn file_stem<'a>(&self, id: &'a ObjectId) -> StoreResult<&'a str> {
        self.check_len(id)?;
        Ok(&id.as_str()[self.prefix_len()..])
    }

    /// Full relative path of the object, with an optional extension.
    pub fn relative_path(&self, id: &ObjectId, extension: Option<&str>) -> StoreResult<PathBuf> {
        let mut name = self.file_stem(id)?.to_string();
        if let Some(ext) = normalize_extension(extension)? {
            name.push('.');
            name.push_str(&ext);
        }
        Ok(self.shard_dir(id)?.join(name))
    }

    /// Recover the digest from a relative object path.
    ///
    /// Returns `None` for anything that is not an object path under this
    /// layout (temporary files, stray files at the wrong depth).
    pub fn id_from_relative(&self, relative: &Path) -> Option<ObjectId> {
        let parts: Vec<&str> = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<_>>()?;
        if parts.len() != self.depth + 1 {
            return None;
        }
        let (dirs, file) = parts.split_at(self.depth);
        if dirs.iter().any(|d| d.len() != self.width) {
            return None;
        }
        let stem = file[0].split('.').next().unwrap_or_default();
        if stem.is_empty() {
            return None;
        }
        let mut hex = dirs.concat();
        hex.push_str(stem);
        let id = ObjectId::from_hex(&hex).ok()?;
        // Reject upper-case names that only parse after normalisation.
        (id.as_str() == hex).then_some(id)
    }
}

/// Strip a leading dot and reject extensions that would escape the file name.
pub fn normalize_extension(extension: Option<&str>) -> StoreResult<Option<String>> {
    let Some(ext) = extension else {
        return Ok(None);
    };
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        return Ok(None);
    }
    if ext.contains(['/', '\\']) || ext == "." || ext == ".." {
        return Err(StoreError::InvalidExtension(ext.to_string()));
    }
    Ok(Some(ext.to_string()))
}
