//! Errors raised by the rc file store.

use std::path::PathBuf;

/// Failure reading or writing the rc file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home directory to keep the rc file in.
    #[error("Failed to determine home directory")]
    NoHomeDir,

    /// The rc file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The rc file or its directory could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The rc file is not valid settings TOML.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}
