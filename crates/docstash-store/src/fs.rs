use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use docstash_types::{ObjectId, PlacementResult};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::layout::ShardLayout;
use crate::traits::ContentStore;

/// Filesystem-backed content store.
///
/// Objects live under `root` at the path derived by the [`ShardLayout`]:
///
/// ```text
/// /srv/docstash/
/// ├── 3a/
/// │   └── 7f/
/// │       └── 09/
/// │           └── c2e1...      (object, no extension)
/// └── e3/
///     └── b0/
///         └── c4/
///             └── 4298...pdf   (object stored with extension "pdf")
/// ```
pub struct FsContentStore {
    root: PathBuf,
    layout: ShardLayout,
}

impl FsContentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, layout: ShardLayout) -> StoreResult<Self> {
        layout.validate()?;
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        debug!(root = %root.display(), depth = layout.depth, width = layout.width, "opened content store");
        Ok(Self { root, layout })
    }

    /// Absolute path of the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> ShardLayout {
        self.layout
    }

    fn placement(&self, id: &ObjectId, absolute: PathBuf, is_duplicate: bool) -> PlacementResult {
        let relative = absolute
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| absolute.clone());
        PlacementResult {
            id: id.clone(),
            relative_path: relative,
            absolute_path: absolute,
            is_duplicate,
        }
    }

    /// Remove empty shard directories from `dir` up to (not including) the root.
    fn prune_empty_dirs(&self, mut dir: &Path) {
        while dir != self.root && dir.starts_with(&self.root) {
            if fs::remove_dir(dir).is_err() {
                break;
            }
            debug!(dir = %dir.display(), "pruned empty shard directory");
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    fn walk_ids(&self) -> impl Iterator<Item = StoreResult<ObjectId>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let relative = entry.path().strip_prefix(&self.root).ok()?;
                    self.layout.id_from_relative(relative).map(Ok)
                }
                Ok(_) => None,
                Err(e) => Some(Err(StoreError::Walk(e))),
            })
    }
}

impl ContentStore for FsContentStore {
    fn put(
        &self,
        reader: &mut dyn Read,
        id: &ObjectId,
        extension: Option<&str>,
    ) -> StoreResult<PlacementResult> {
        let relative = self.layout.relative_path(id, extension)?;

        if let Some(existing) = self.locate(id)? {
            debug!(id = %id, path = %existing.display(), "object already stored");
            return Ok(self.placement(id, existing, true));
        }

        let absolute = self.root.join(&relative);
        let dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)?;

        // Stage in the target directory so the final rename stays on one
        // filesystem; the temp file is removed on drop if anything fails.
        let mut staged = NamedTempFile::new_in(&dir)?;
        let bytes = io::copy(reader, &mut staged)?;
        staged.flush()?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&absolute) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %id, "lost placement race, object already stored");
                return Ok(self.placement(id, absolute, true));
            }
            Err(e) => return Err(StoreError::Io(e.error)),
        }

        debug!(id = %id, path = %relative.display(), bytes, "wrote object");
        Ok(self.placement(id, absolute, false))
    }

    fn locate(&self, id: &ObjectId) -> StoreResult<Option<PathBuf>> {
        let dir = self.root.join(self.layout.shard_dir(id)?);
        let stem = self.layout.file_stem(id)?;

        let exact = dir.join(stem);
        if exact.is_file() {
            return Ok(Some(exact));
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let with_ext = format!("{stem}.");
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(&with_ext) && entry.file_type()?.is_file() {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    fn open(&self, id: &ObjectId) -> StoreResult<Box<dyn Read + Send>> {
        let path = self
            .locate(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(Box::new(File::open(path)?))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        let path = self
            .locate(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        if let Some(dir) = path.parent() {
            self.prune_empty_dirs(dir);
        }
        debug!(id = %id, "removed object file");
        Ok(())
    }

    fn count(&self) -> StoreResult<u64> {
        let mut count = 0u64;
        for id in self.walk_ids() {
            id?;
            count += 1;
        }
        Ok(count)
    }

    fn ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = self.walk_ids().collect::<StoreResult<Vec<_>>>()?;
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for FsContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContentStore")
            .field("root", &self.root)
            .field("layout", &self.layout)
            .finish()
    }
}
