//! Domain-specific error types for the engine tweaks startup core.
//!
//! Internal modules return typed errors built with [`thiserror`]; the
//! binary converts them to [`anyhow::Error`] at the command boundary via
//! the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! StartupError              fatal, aborts process initialisation
//! ├── UnrecognizedHost      neither product name nor file name matched
//! ├── UnknownVersion        host version could not be determined
//! ├── UnsupportedVersion    host version differs from the supported one
//! └── Logging(LoggingError)
//! SettingsError             recoverable, never escapes the settings store
//! ResourceError             malformed PE / version resource, absorbed by the validator
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::host::FileVersion;

/// Fatal startup failure.
///
/// Every variant aborts the bootstrap sequence. None of them are retried;
/// the embedding process is expected to terminate.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The executable is not the supported host.
    #[error("Not {expected}: {}", executable.display())]
    UnrecognizedHost {
        /// Path of the executable that was inspected.
        executable: PathBuf,
        /// Expected host file name.
        expected: String,
    },

    /// The host's version resource did not yield a usable version.
    #[error("Unknown version of {}", executable.display())]
    UnknownVersion {
        /// Path of the executable that was inspected.
        executable: PathBuf,
    },

    /// The host's version differs from the one this build supports.
    #[error("Unsupported version {found}, expected {supported}")]
    UnsupportedVersion {
        /// Version read from the host.
        found: FileVersion,
        /// Version compiled into this build.
        supported: FileVersion,
    },

    /// The log file could not be set up.
    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),
}

/// Errors that arise from writing the settings document.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The path collaborator could not produce a writable path.
    #[error("Cannot resolve settings path {}", path.display())]
    Unresolved {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The document could not be written.
    #[error("IO error writing settings file {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while constructing the logger.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The path collaborator could not produce a writable log path.
    #[error("Cannot resolve log path {}", path.display())]
    Unresolved {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// The log file could not be created or opened.
    #[error("IO error opening log file {}: {source}", path.display())]
    Io {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A global subscriber was already installed by the embedding process.
    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Errors that arise while reading a PE image or its version resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A structure extends past the end of the buffer.
    #[error("Truncated {what} at offset {offset:#x}")]
    Truncated {
        /// Name of the structure being read.
        what: &'static str,
        /// Offset at which the read was attempted.
        offset: usize,
    },

    /// A magic value did not match.
    #[error("Bad {what} signature")]
    BadSignature {
        /// Name of the structure whose signature was checked.
        what: &'static str,
    },

    /// The data is structurally inconsistent.
    #[error("Malformed resource: {0}")]
    Malformed(String),
}
