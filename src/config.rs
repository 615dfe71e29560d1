//! Configuration: an optional TOML file, overridden by command-line flags.
//!
//! ```toml
//! origin = "https://quiz.example.com"
//! color = true
//! log = "quiz_session=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Args;
use crate::error::SessionError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "quiz-session.toml";
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Contents of the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub origin: Option<String>,
    pub color: Option<bool>,
    pub log: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub origin: String,
    pub color: bool,
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            origin: DEFAULT_ORIGIN.to_string(),
            color: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

pub fn load_file(path: &Path) -> Result<FileConfig, SessionError> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|source| SessionError::Config {
        path: path.to_path_buf(),
        source,
    })
}

impl SessionConfig {
    /// Merge defaults, the config file and the flags, in increasing priority.
    ///
    /// An explicit `--config` path must exist; the default file is only read
    /// when present.
    pub fn resolve(args: &Args) -> Result<Self, SessionError> {
        let file = match &args.config {
            Some(path) => load_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    load_file(&default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Ok(Self::merge(file, args))
    }

    fn merge(file: FileConfig, args: &Args) -> Self {
        let defaults = SessionConfig::default();
        SessionConfig {
            origin: args.origin.clone().or(file.origin).unwrap_or(defaults.origin),
            color: !args.no_color && file.color.unwrap_or(defaults.color),
            log_filter: args.log.clone().or(file.log).unwrap_or(defaults.log_filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["quiz-session"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let cfg = SessionConfig::merge(FileConfig::default(), &args(&[]));
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(cfg.origin, "http://127.0.0.1:8000");
        assert!(cfg.color);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn test_file_values_apply() {
        let file = config_file("origin = \"https://quiz.example.com\"\ncolor = false\nlog = \"debug\"\n");
        let path = file.path().to_str().unwrap().to_string();
        let cfg = SessionConfig::resolve(&args(&["--config", &path])).unwrap();
        assert_eq!(cfg.origin, "https://quiz.example.com");
        assert!(!cfg.color);
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn test_flags_override_file() {
        let file = config_file("origin = \"https://quiz.example.com\"\nlog = \"debug\"\n");
        let path = file.path().to_str().unwrap().to_string();
        let cfg = SessionConfig::resolve(&args(&[
            "--config",
            &path,
            "--origin",
            "http://localhost:9000",
            "--log",
            "trace",
            "--no-color",
        ]))
        .unwrap();
        assert_eq!(cfg.origin, "http://localhost:9000");
        assert_eq!(cfg.log_filter, "trace");
        assert!(!cfg.color);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = config_file("color = false\n");
        let loaded = load_file(file.path()).unwrap();
        assert_eq!(loaded.origin, None);
        assert_eq!(loaded.color, Some(false));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let file = config_file("colour = true\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, SessionError::Config { .. }));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let file = config_file("origin = \n");
        assert!(matches!(load_file(file.path()), Err(SessionError::Config { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = SessionConfig::resolve(&args(&["--config", missing.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }
}
