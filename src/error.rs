//! Error types for harness operations
//!
//! Per-test failures are never errors; they are recorded as
//! [`crate::models::Outcome`] values. Everything here aborts a run.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The simulator build returned non-zero; `output` is what it printed
    #[error("build failed with return code {code}")]
    BuildFailed { code: i32, output: String },

    /// An external gate other than the build (e.g. the RISCOF script) failed
    #[error("{name} failed with return code {code}")]
    GateFailed {
        name: String,
        code: i32,
        output: String,
    },

    #[error("invalid test pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("unknown preset '{0}' (expected one of: isa, isa-p, am)")]
    UnknownPreset(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HarnessError::Io {
            context: context.into(),
            source,
        }
    }

    /// Captured output of a failed gate, if this error carries one
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            HarnessError::BuildFailed { output, .. } | HarnessError::GateFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
