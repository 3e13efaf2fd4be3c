//! Error types for testflux.

use std::path::PathBuf;

use thiserror::Error;

use crate::assembler::render_diagnostics;
use crate::types::knowledge::BuildDiagnostic;

/// Default result type for testflux.
pub type TestfluxResult<T> = Result<T, TestfluxError>;

/// Errors raised while building or injecting a knowledge base.
#[derive(Error, Debug)]
pub enum TestfluxError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Resolution error: {kind}: {}", .path.display())]
    Resolution {
        kind: ResolutionErrorKind,
        path: PathBuf,
    },

    #[error("{}", render_diagnostics(.0))]
    Build(Vec<BuildDiagnostic>),

    #[error("Failed to add {} to knowledge base: {source}", .path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error injecting knowledge base into {class}.{slot}: {reason}")]
    Injection {
        class: String,
        slot: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out building '{0}'")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl TestfluxError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a resolution error for an absolute path.
    pub fn resolution(kind: ResolutionErrorKind, path: impl Into<PathBuf>) -> Self {
        Self::Resolution {
            kind,
            path: path.into(),
        }
    }

    /// Whether the host runner must report this as a setup failure rather
    /// than an assertion failure inside the test body.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Resolution { .. }
                | Self::Build(_)
                | Self::Compile { .. }
                | Self::Injection { .. }
        )
    }
}

/// Why a declared rule source could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// The declared directory does not exist.
    DirectoryMissing,
    /// The declared directory exists but is something else.
    NotADirectory,
    /// The declared file does not exist.
    FileNotFound,
    /// The declared file exists but is not a regular file.
    NotARegularFile,
}

impl std::fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionErrorKind::DirectoryMissing => write!(f, "directory missing"),
            ResolutionErrorKind::NotADirectory => write!(f, "not a directory"),
            ResolutionErrorKind::FileNotFound => write!(f, "file not found"),
            ResolutionErrorKind::NotARegularFile => write!(f, "not a regular file"),
        }
    }
}
