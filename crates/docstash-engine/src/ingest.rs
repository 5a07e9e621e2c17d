use std::path::{Path, PathBuf};

use docstash_gate::Admission;
use docstash_types::PlacementResult;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::engine::StorageEngine;
use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::outcome::PutOutcome;

/// What to do when one file of a batch fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next file.
    #[default]
    Continue,
    /// Stop at the first failure.
    Abort,
}

#[derive(Clone, Debug, Default)]
pub struct IngestOptions {
    pub policy: FailurePolicy,
    /// Extension given to every newly stored object.
    pub extension: Option<String>,
}

/// Per-file result of a batch ingest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestStatus {
    Stored { placement: PlacementResult },
    Duplicate { placement: PlacementResult },
    Skipped { admission: Admission },
    Failed { kind: ErrorKind, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEntry {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: IngestStatus,
}

/// Aggregate result of [`add_files`].
///
/// Only counters and failed entries are kept; every entry is handed to the
/// caller's callback as it is produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub stored: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    /// `true` if [`FailurePolicy::Abort`] cut the walk short.
    pub aborted: bool,
    pub failures: Vec<IngestEntry>,
}

impl IngestSummary {
    fn record(&mut self, entry: &IngestEntry) {
        match &entry.status {
            IngestStatus::Stored { .. } => self.stored += 1,
            IngestStatus::Duplicate { .. } => self.duplicates += 1,
            IngestStatus::Skipped { .. } => self.skipped += 1,
            IngestStatus::Failed { .. } => {
                self.failed += 1;
                self.failures.push(entry.clone());
            }
        }
    }

    pub fn total(&self) -> usize {
        self.stored + self.duplicates + self.skipped + self.failed
    }
}

fn status_of(result: EngineResult<PutOutcome>) -> IngestStatus {
    match result {
        Ok(PutOutcome::Stored(placement)) if placement.is_duplicate => {
            IngestStatus::Duplicate { placement }
        }
        Ok(PutOutcome::Stored(placement)) => IngestStatus::Stored { placement },
        Ok(PutOutcome::Skipped { admission }) => IngestStatus::Skipped { admission },
        Err(e) => IngestStatus::Failed {
            kind: e.kind(),
            message: e.to_string(),
        },
    }
}

/// Walk `input_dir` and `put` every regular file found, in file-name order.
///
/// Directories are descended, never classified. Symbolic links are followed;
/// dangling links and link cycles are reported as failed entries. Admission
/// rejections are counted as skipped, not failed. `on_entry` sees each entry
/// as soon as its file has been processed.
///
/// Fails outright only if `input_dir` itself is not a readable directory;
/// everything after that is reported per file.
pub fn add_files(
    engine: &StorageEngine,
    input_dir: &Path,
    options: &IngestOptions,
    mut on_entry: impl FnMut(&IngestEntry),
) -> EngineResult<IngestSummary> {
    let meta = std::fs::metadata(input_dir).map_err(|source| EngineError::Source {
        path: input_dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(EngineError::Source {
            path: input_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut summary = IngestSummary::default();
    let walker = WalkDir::new(input_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.into_path();
                let status = status_of(engine.put(&path, options.extension.as_deref()));
                IngestEntry { path, status }
            }
            Ok(_) => continue,
            Err(e) => IngestEntry {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| input_dir.to_path_buf()),
                status: IngestStatus::Failed {
                    kind: ErrorKind::UnreadableSource,
                    message: e.to_string(),
                },
            },
        };

        let failed = matches!(entry.status, IngestStatus::Failed { .. });
        if let IngestStatus::Failed { message, .. } = &entry.status {
            warn!(path = %entry.path.display(), error = %message, "ingest failed");
        }
        summary.record(&entry);
        on_entry(&entry);

        if failed && options.policy == FailurePolicy::Abort {
            summary.aborted = true;
            break;
        }
    }

    info!(
        input = %input_dir.display(),
        stored = summary.stored,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        failed = summary.failed,
        "ingest finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::Fixture;

    fn populate(fx: &Fixture) -> PathBuf {
        fx.write("a.pdf", b"%PDF alpha");
        fx.write("b.txt", b"plain words");
        fx.write("c/d.pdf", b"%PDF alpha");
        fx.write("c/e/f.doc", b"MSO legacy");
        fx.dir.path().join("input")
    }

    /// Run [`add_files`] and keep every entry the callback saw.
    fn ingest(
        fx: &Fixture,
        input: &Path,
        options: &IngestOptions,
    ) -> (IngestSummary, Vec<IngestEntry>) {
        let mut seen = Vec::new();
        let summary = add_files(&fx.engine, input, options, |e| seen.push(e.clone())).unwrap();
        (summary, seen)
    }

    fn relative(entries: &[IngestEntry], input: &Path) -> Vec<PathBuf> {
        entries
            .iter()
            .map(|e| e.path.strip_prefix(input).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn walks_tree_and_counts_outcomes() {
        let fx = Fixture::new();
        let input = populate(&fx);

        let (summary, seen) = ingest(&fx, &input, &IngestOptions::default());

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert!(summary.failures.is_empty());
        assert!(!summary.aborted);
        assert_eq!(fx.engine.check_consistency().unwrap().store_count, 2);

        assert_eq!(
            relative(&seen, &input),
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("b.txt"),
                PathBuf::from("c/d.pdf"),
                PathBuf::from("c/e/f.doc"),
            ]
        );
    }

    #[test]
    fn callback_sees_entries_before_the_walk_ends() {
        let fx = Fixture::new();
        let input = populate(&fx);

        let mut counts_at_callback = Vec::new();
        add_files(&fx.engine, &input, &IngestOptions::default(), |_| {
            counts_at_callback.push(fx.engine.index_count().unwrap());
        })
        .unwrap();
        assert_eq!(counts_at_callback, vec![1, 1, 1, 2]);
    }

    #[test]
    fn continue_policy_records_failures() {
        let fx = Fixture::new();
        fx.write("1.bin", b"FAIL first");
        fx.write("2.pdf", b"%PDF second");
        let input = fx.dir.path().join("input");

        let (summary, seen) = ingest(&fx, &input, &IngestOptions::default());
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.stored, 1);
        assert_eq!(seen.len(), 2);
        assert!(!summary.aborted);

        let failure = &summary.failures[0];
        assert!(failure.path.ends_with("1.bin"));
        assert!(matches!(
            failure.status,
            IngestStatus::Failed {
                kind: ErrorKind::ClassificationFailure,
                ..
            }
        ));
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let fx = Fixture::new();
        fx.write("1.bin", b"FAIL first");
        fx.write("2.pdf", b"%PDF second");
        let input = fx.dir.path().join("input");

        let options = IngestOptions {
            policy: FailurePolicy::Abort,
            extension: None,
        };
        let (summary, seen) = ingest(&fx, &input, &options);
        assert!(summary.aborted);
        assert_eq!(summary.total(), 1);
        assert_eq!(seen.len(), 1);
        assert_eq!(summary.stored, 0);
        assert_eq!(fx.engine.store_count().unwrap(), 0);
    }

    #[test]
    fn extension_applies_to_stored_objects() {
        let fx = Fixture::new();
        fx.write("x.pdf", b"%PDF with ext");
        let input = fx.dir.path().join("input");

        let options = IngestOptions {
            extension: Some("pdf".into()),
            ..Default::default()
        };
        let (_, seen) = ingest(&fx, &input, &options);
        match &seen[0].status {
            IngestStatus::Stored { placement } => {
                assert_eq!(
                    placement.relative_path.extension().and_then(|e| e.to_str()),
                    Some("pdf")
                )
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_followed_and_reported() {
        use std::os::unix::fs::symlink;

        let fx = Fixture::new();
        let a = fx.write("a.pdf", b"%PDF alpha");
        let input = fx.dir.path().join("input");
        let outside = fx.dir.path().join("outside.pdf");
        std::fs::write(&outside, b"%PDF outside the tree").unwrap();
        symlink(&outside, input.join("link.pdf")).unwrap();
        symlink(&a, input.join("same.pdf")).unwrap();
        symlink(fx.dir.path().join("missing.pdf"), input.join("dangling.pdf")).unwrap();

        let (summary, seen) = ingest(&fx, &input, &IngestOptions::default());

        assert_eq!(
            relative(&seen, &input),
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("dangling.pdf"),
                PathBuf::from("link.pdf"),
                PathBuf::from("same.pdf"),
            ]
        );
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].path.ends_with("dangling.pdf"));
        assert_eq!(fx.engine.store_count().unwrap(), 2);
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let fx = Fixture::new();
        let err = add_files(
            &fx.engine,
            &fx.dir.path().join("absent"),
            &IngestOptions::default(),
            |_| {},
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreadableSource);
    }

    #[test]
    fn entries_serialize_flat() {
        let fx = Fixture::new();
        fx.write("t.txt", b"text");
        let (summary, seen) = ingest(&fx, &fx.dir.path().join("input"), &IngestOptions::default());

        let json = serde_json::to_value(&seen[0]).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["admission"]["decision"], "rejected");
        assert!(json["path"].as_str().unwrap().ends_with("t.txt"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["failures"], serde_json::json!([]));
    }
}
