//! # stencil-gen
//!
//! Tree walker and output writer: drives traversal of the merged source
//! document, renders a template at every registered structural position, and
//! appends the results to per-kind YAML stream files.
//!
//! Call [`pipeline::run`] for the full merge → reset → walk → write flow.

pub mod error;
pub mod pipeline;
pub mod walker;
pub mod writer;

pub use error::GenError;
pub use pipeline::{run, GenReport, RunOptions};
pub use walker::Walker;
pub use writer::{OutputWriter, WriteResult};
