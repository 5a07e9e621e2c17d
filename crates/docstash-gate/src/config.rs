use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the coarse type detector binary.
pub const FILE_BIN_ENV: &str = "FILETYPE_FPATH";
/// Environment variable overriding the MIME resolver binary.
pub const MIME_BIN_ENV: &str = "XDGMIME_FPATH";

pub const DEFAULT_FILE_BIN: &str = "/usr/bin/file";
pub const DEFAULT_MIME_BIN: &str = "/usr/bin/xdg-mime";
pub const DEFAULT_LEGACY_PREFIX: &str = "Microsoft ";

/// MIME types admitted by default: office suites and common document formats.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/pdf",
    "application/vnd.ms-access",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.addin.macroEnabled.12",
    "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
    "application/vnd.ms-excel.sheet.macroEnabled.12",
    "application/vnd.ms-excel.template.macroEnabled.12",
    "application/vnd.ms-powerpoint",
    "application/vnd.ms-powerpoint.addin.macroEnabled.12",
    "application/vnd.ms-powerpoint.presentation.macroEnabled.12",
    "application/vnd.ms-powerpoint.slideshow.macroEnabled.12",
    "application/vnd.ms-powerpoint.template.macroEnabled.12",
    "application/vnd.ms-word.document.macroEnabled.12",
    "application/vnd.ms-word.template.macroEnabled.12",
    "application/vnd.oasis.opendocument.chart",
    "application/vnd.oasis.opendocument.database",
    "application/vnd.oasis.opendocument.formula",
    "application/vnd.oasis.opendocument.graphics",
    "application/vnd.oasis.opendocument.graphics-template",
    "application/vnd.oasis.opendocument.image",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.oasis.opendocument.presentation-template",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.spreadsheet-template",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.text-master",
    "application/vnd.oasis.opendocument.text-template",
    "application/vnd.oasis.opendocument.text-web",
    "application/vnd.openofficeorg.extension",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.presentationml.slideshow",
    "application/vnd.openxmlformats-officedocument.presentationml.template",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
];

/// Configuration for the admission filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Coarse type detector, invoked as `<file_bin> --brief <path>`.
    pub file_bin: PathBuf,
    /// MIME resolver, invoked as `<mime_bin> query filetype <path>`.
    pub mime_bin: PathBuf,
    /// Detector output starting with this prefix is admitted without a MIME
    /// lookup. Legacy office binaries are often reported as zip or
    /// octet-stream by MIME resolvers.
    pub legacy_prefix: String,
    /// Exact MIME strings admitted by the resolver stage.
    pub allowed_mime_types: BTreeSet<String>,
    /// When `true`, every candidate is admitted and no process is spawned.
    pub permissive: bool,
    /// Wall-clock limit for a single external invocation.
    pub timeout: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            file_bin: PathBuf::from(DEFAULT_FILE_BIN),
            mime_bin: PathBuf::from(DEFAULT_MIME_BIN),
            legacy_prefix: DEFAULT_LEGACY_PREFIX.to_string(),
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            permissive: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl AdmissionConfig {
    /// Defaults, with the tool paths taken from `FILETYPE_FPATH` and
    /// `XDGMIME_FPATH` when set.
    pub fn from_env() -> Self {
        Self::default().with_env_defaults()
    }

    /// Take tool paths from the environment where they still hold the
    /// built-in defaults. Paths set explicitly (e.g. in a config file) win.
    pub fn with_env_defaults(mut self) -> Self {
        if self.file_bin == Path::new(DEFAULT_FILE_BIN) {
            if let Some(path) = env_path(FILE_BIN_ENV) {
                self.file_bin = path;
            }
        }
        if self.mime_bin == Path::new(DEFAULT_MIME_BIN) {
            if let Some(path) = env_path(MIME_BIN_ENV) {
                self.mime_bin = path;
            }
        }
        self
    }

    /// Admit everything without consulting external tools.
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Default::default()
        }
    }

    /// Whether `mime_type` is on the allow-list.
    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(mime_type)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
