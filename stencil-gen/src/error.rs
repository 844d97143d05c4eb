//! Error types for stencil-gen.

use std::path::PathBuf;

use thiserror::Error;

use stencil_core::error::CoreError;
use stencil_renderer::RenderError;

/// All errors that can arise from walking and writing.
#[derive(Debug, Error)]
pub enum GenError {
    /// An error from the placeholder resolver.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from source loading / merging.
    #[error("source error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file failed to parse.
    #[error("failed to parse template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error while writing an output document.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An emitted document carried no `kind` field to derive a filename from.
    #[error("emitted document has no 'kind' field")]
    MissingKind,
}

/// Convenience constructor for [`GenError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenError {
    GenError::Io {
        path: path.into(),
        source,
    }
}
