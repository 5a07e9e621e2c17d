use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::AdmissionConfig;
use crate::error::{GateError, GateResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Source of type information for a candidate file.
///
/// The admission policy only depends on these two answers, so it can be
/// exercised with stub classifiers instead of real system tools.
pub trait TypeClassifier: Send + Sync {
    /// Free-text description of the file's type (e.g. `"PDF document, version 1.4"`).
    fn describe(&self, path: &Path) -> GateResult<String>;

    /// MIME type of the file (e.g. `"application/pdf"`).
    fn mime_type(&self, path: &Path) -> GateResult<String>;
}

/// Classifier backed by the `file` and `xdg-mime` command-line tools.
#[derive(Clone, Debug)]
pub struct ExternalClassifier {
    file_bin: PathBuf,
    mime_bin: PathBuf,
    timeout: Duration,
}

impl ExternalClassifier {
    pub fn new(file_bin: impl Into<PathBuf>, mime_bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            file_bin: file_bin.into(),
            mime_bin: mime_bin.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(&config.file_bin, &config.mime_bin, config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self, tool: &Path) -> GateError {
        GateError::Timeout {
            tool: tool.to_path_buf(),
            duration: self.timeout,
        }
    }

    fn run(&self, tool: &Path, args: &[&OsStr]) -> GateResult<String> {
        debug!(tool = %tool.display(), ?args, "running classifier");
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GateError::Spawn {
                tool: tool.to_path_buf(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(tool = %tool.display(), timeout = ?self.timeout, "classifier timed out");
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timed_out(tool));
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(GateError::Wait {
                    tool: tool.to_path_buf(),
                    source,
                });
            }
        };

        // A background process started by the tool can keep the pipes open
        // after the tool itself has exited.
        let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline), collect(&stderr, deadline))
        else {
            warn!(tool = %tool.display(), timeout = ?self.timeout, "classifier output still open");
            return Err(self.timed_out(tool));
        };

        if !status.success() {
            return Err(GateError::ExitStatus {
                tool: tool.to_path_buf(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(stdout).map_err(|_| GateError::InvalidOutput {
            tool: tool.to_path_buf(),
            reason: "output is not valid UTF-8".into(),
        })?;
        Ok(text.trim().to_string())
    }
}

impl TypeClassifier for ExternalClassifier {
    fn describe(&self, path: &Path) -> GateResult<String> {
        self.run(&self.file_bin, &[OsStr::new("--brief"), path.as_os_str()])
    }

    fn mime_type(&self, path: &Path) -> GateResult<String> {
        let mime = self.run(
            &self.mime_bin,
            &[OsStr::new("query"), OsStr::new("filetype"), path.as_os_str()],
        )?;
        if mime.is_empty() {
            return Err(GateError::InvalidOutput {
                tool: self.mime_bin.clone(),
                reason: "empty MIME type".into(),
            });
        }
        Ok(mime)
    }
}

/// Read a child pipe to the end on a helper thread so a chatty child never
/// blocks on a full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = tx.send(buf);
            });
        }
        None => {
            let _ = tx.send(Vec::new());
        }
    }
    rx
}

/// `None` means the pipe was still open at the deadline.
fn collect(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
    }
}

/// `Ok(None)` means the deadline passed with the child still running.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for a system tool.
    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn passes_arguments_and_trims_output() {
        let dir = TempDir::new().unwrap();
        let file_bin = script(&dir, "file", r#"echo "  $1 $2  ""#);
        let mime_bin = script(&dir, "xdg-mime", r#"echo "$1 $2 $3""#);
        let classifier = ExternalClassifier::new(file_bin, mime_bin, Duration::from_secs(10));

        let target = Path::new("/data/report.doc");
        assert_eq!(classifier.describe(target).unwrap(), "--brief /data/report.doc");
        assert_eq!(
            classifier.mime_type(target).unwrap(),
            "query filetype /data/report.doc"
        );
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bad = script(&dir, "file", "echo boom >&2; exit 3");
        let classifier = ExternalClassifier::new(&bad, &bad, Duration::from_secs(10));

        match classifier.describe(Path::new("x")).unwrap_err() {
            GateError::ExitStatus { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_mime_is_an_error() {
        let dir = TempDir::new().unwrap();
        let silent = script(&dir, "xdg-mime", "exit 0");
        let classifier = ExternalClassifier::new(&silent, &silent, Duration::from_secs(10));

        assert!(matches!(
            classifier.mime_type(Path::new("x")),
            Err(GateError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-tool");
        let classifier = ExternalClassifier::new(&missing, &missing, Duration::from_secs(10));

        assert!(matches!(
            classifier.describe(Path::new("x")),
            Err(GateError::Spawn { .. })
        ));
    }

    #[test]
    fn slow_tool_times_out() {
        let dir = TempDir::new().unwrap();
        let slow = script(&dir, "file", "exec sleep 30");
        let classifier = ExternalClassifier::new(&slow, &slow, Duration::from_millis(200));

        let started = Instant::now();
        let err = classifier.describe(Path::new("x")).unwrap_err();
        assert!(matches!(err, GateError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn lingering_background_output_times_out() {
        let dir = TempDir::new().unwrap();
        // The tool exits at once but a background child keeps stdout open.
        let leaky = script(&dir, "xdg-mime", "sleep 5 &\necho application/pdf");
        let classifier = ExternalClassifier::new(&leaky, &leaky, Duration::from_millis(200));

        let started = Instant::now();
        let err = classifier.mime_type(Path::new("x")).unwrap_err();
        assert!(matches!(err, GateError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
