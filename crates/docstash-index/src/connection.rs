use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Location of the SQLite database backing the index.
///
/// Accepted forms:
///
/// - `sqlite:///files.sqlite` -- path relative to the working directory
/// - `sqlite:////var/lib/docstash/files.sqlite` -- absolute path
/// - `/var/lib/docstash/files.sqlite` -- plain filesystem path
///
/// In-memory databases are not accepted: every index call opens its own
/// connection, so an in-memory database would vanish between calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionString {
    path: PathBuf,
}

impl ConnectionString {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FromStr for ConnectionString {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| IndexError::InvalidConnectionString(format!("{s:?}: {reason}"));

        let path = if let Some(rest) = s.strip_prefix("sqlite://") {
            let path = rest
                .strip_prefix('/')
                .ok_or_else(|| invalid("expected sqlite:///<path>"))?;
            if path.is_empty() || path == ":memory:" {
                return Err(invalid("in-memory databases are not supported"));
            }
            path
        } else if s.contains("://") {
            return Err(invalid("only sqlite connections are supported"));
        } else {
            s
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        Ok(Self::from_path(path))
    }
}

impl TryFrom<String> for ConnectionString {
    type Error = IndexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ConnectionString> for String {
    fn from(conn: ConnectionString) -> Self {
        conn.to_string()
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sqlite:///{}", self.path.display())
    }
}
