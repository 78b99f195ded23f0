//! Resolution failures.
//!
//! Every variant is user-facing: call paths hand the rendered message to
//! `Host::notify` and then return the same value to the caller.
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolutionError>;

#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The open script has no path yet.
    #[error("Please save the Nuke script first so I can infer the shot path.")]
    Unsaved,

    /// Landmark segments are absent or too short.
    #[error("{0}")]
    Context(String),

    /// An expected root, category, or version folder does not exist.
    #[error("{label}:\n{}", path.display())]
    MissingRoot { label: String, path: PathBuf },

    /// The root exists but scanning produced no candidate.
    #[error("{label}:\n{}", path.display())]
    NoMatch { label: String, path: PathBuf },

    /// The operator dismissed a disambiguation prompt.
    #[error("{0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolutionError {
    pub fn missing_root(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingRoot {
            label: label.into(),
            path: path.into(),
        }
    }

    pub fn no_match(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NoMatch {
            label: label.into(),
            path: path.into(),
        }
    }

    /// Adapter for `map_err` on filesystem calls against `path`.
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { path, source }
    }

    /// Stable machine-readable tag used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unsaved | Self::Context(_) => "unresolvable_context",
            Self::MissingRoot { .. } => "missing_root",
            Self::NoMatch { .. } => "no_match",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
            Self::Io { .. } => "io",
        }
    }
}
