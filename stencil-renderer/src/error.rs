//! Error types for stencil-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors during placeholder resolution.
///
/// Unresolvable placeholders and unknown function names are diagnostics, not
/// errors; the only fatal conditions here involve the external team
/// directory.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The team directory file could not be read.
    #[error("team directory io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The team directory file could not be parsed.
    #[error("failed to parse team directory at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A lookup function ran without a configured team directory.
    #[error("no team directory configured; pass --teams or configure one")]
    TeamDirectoryMissing,
}
