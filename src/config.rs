//! Loading of the search path from the shell's configuration file.
//!
//! The configuration file is tiny and has a single recognised key:
//!
//! ```text
//! PATH=/usr/local/bin:/usr/bin:/bin
//! ```
//!
//! Everything else in the file is ignored. Directories are not checked for
//! existence here; that happens when a command is resolved.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/.myshell";

/// Upper bound on the number of bytes read from the configuration file.
pub const MAX_CONFIG_BYTES: u64 = 511;

/// Upper bound on the number of directories kept from the `PATH=` value.
pub const MAX_SEARCH_DIRS: usize = 256;

const PATH_PREFIX: &str = "PATH=";

/// Errors that make it impossible to start a session.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be opened or read.
    #[error("failed to read: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The content carries no `PATH=` entry.
    #[error("invalid format: no PATH= entry")]
    Malformed,
    /// Storage for the directory list could not be allocated.
    #[error("failed to allocate memory for the search path")]
    OutOfMemory,
}

impl ConfigError {
    /// Process exit status used when this error aborts startup.
    ///
    /// Every kind maps to its own status so scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Unavailable { .. } => 255,
            ConfigError::Malformed => 254,
            ConfigError::OutOfMemory => 253,
        }
    }
}

/// Ordered list of directories consulted when resolving external commands.
///
/// Entries are never empty. The list is built once at startup and only read
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<String>,
}

impl SearchPath {
    /// Parse the contents of a configuration file.
    ///
    /// The first occurrence of `PATH=` wins; its value runs to the end of that
    /// line and is split on `:`. Empty segments are dropped and at most
    /// [`MAX_SEARCH_DIRS`] entries are kept.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let start = content
            .find(PATH_PREFIX)
            .ok_or(ConfigError::Malformed)?
            + PATH_PREFIX.len();
        let value = content[start..].lines().next().unwrap_or("");

        let mut dirs: Vec<String> = Vec::new();
        for dir in value.split(':').filter(|d| !d.is_empty()).take(MAX_SEARCH_DIRS) {
            if dirs.try_reserve(1).is_err() {
                return Err(ConfigError::OutOfMemory);
            }
            dirs.push(dir.to_owned());
        }
        Ok(Self { dirs })
    }

    /// Directories in lookup order.
    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a SearchPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.iter()
    }
}

/// Read the configuration file at `path` and build the search path from it.
///
/// Reads at most [`MAX_CONFIG_BYTES`]. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, so a stray byte elsewhere in the file does
/// not hide the `PATH=` line.
pub fn load_search_path(path: impl AsRef<Path>) -> Result<SearchPath, ConfigError> {
    let path = path.as_ref();
    let unavailable = |source| ConfigError::Unavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    let mut buf = Vec::new();
    file.take(MAX_CONFIG_BYTES)
        .read_to_end(&mut buf)
        .map_err(unavailable)?;

    let content = String::from_utf8_lossy(&buf);
    let search_path = SearchPath::parse(&content)?;

    debug!(path = %path.display(), dirs = ?search_path.dirs(), "search path loaded");
    Ok(search_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("create temp config");
        f.write_all(content.as_bytes()).expect("write temp config");
        f
    }

    #[test]
    fn test_parse_keeps_order() {
        let sp = SearchPath::parse("PATH=a:b:c").unwrap();
        assert_eq!(sp.dirs(), ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let sp = SearchPath::parse("PATH=a::b:").unwrap();
        assert_eq!(sp.dirs(), ["a", "b"]);

        let sp = SearchPath::parse("PATH=:::").unwrap();
        assert!(sp.is_empty());
    }

    #[test]
    fn test_parse_stops_at_end_of_line() {
        let sp = SearchPath::parse("# shell config\nPATH=/usr/bin:/bin\r\nHOME=/root\n").unwrap();
        assert_eq!(sp.dirs(), ["/usr/bin", "/bin"]);
    }

    #[test]
    fn test_parse_without_prefix() {
        for content in ["HOME=/root\n", "", "path=/bin"] {
            let err = SearchPath::parse(content).unwrap_err();
            assert!(matches!(err, ConfigError::Malformed), "{content:?}");
        }
    }

    #[test]
    fn test_parse_caps_entry_count() {
        let value: Vec<String> = (0..MAX_SEARCH_DIRS + 10).map(|i| format!("d{i}")).collect();
        let sp = SearchPath::parse(&format!("PATH={}", value.join(":"))).unwrap();
        assert_eq!(sp.len(), MAX_SEARCH_DIRS);
        assert_eq!(sp.dirs()[0], "d0");
    }

    #[test]
    fn test_load_from_file() {
        let f = config_file("PATH=/usr/bin:/bin\n");
        let sp = load_search_path(f.path()).unwrap();
        assert_eq!(sp.iter().collect::<Vec<_>>(), vec!["/usr/bin", "/bin"]);
    }

    #[test]
    fn test_load_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_search_path(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::Unavailable { .. }));
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn test_load_without_path_is_malformed() {
        let f = config_file("HOME=/root\n");
        let err = load_search_path(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed));
        assert_eq!(err.exit_code(), 254);
    }

    #[test]
    fn test_load_reads_bounded_prefix() {
        // PATH= lies beyond the byte limit, so it is never seen.
        let padding = "#".repeat(MAX_CONFIG_BYTES as usize);
        let f = config_file(&format!("{padding}\nPATH=/bin\n"));
        let err = load_search_path(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ConfigError::Unavailable {
                path: PathBuf::from("x"),
                source: io::Error::from(io::ErrorKind::NotFound),
            }
            .exit_code(),
            ConfigError::Malformed.exit_code(),
            ConfigError::OutOfMemory.exit_code(),
        ];
        assert!(codes.iter().all(|&c| c != 0));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }
}
