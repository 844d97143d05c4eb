//! Error types for stencil-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading and merging source documents.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The same top-level key appeared in more than one merged document.
    #[error("duplicate key '{key}' found in {path}")]
    DuplicateKey { key: String, path: PathBuf },

    /// An input path was neither a `.yaml` file nor a directory.
    #[error("invalid path or no YAML files found: {path}")]
    InvalidInput { path: PathBuf },

    /// No `.yaml` files were found across the given input paths.
    #[error("no YAML files found in specified paths")]
    NoInputs,

    /// A source document's top level was not a mapping.
    #[error("top level of {path} is not a mapping")]
    NotAMapping { path: PathBuf },
}
