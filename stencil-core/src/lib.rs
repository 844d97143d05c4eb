//! Stencil core library — domain types, selection tables, source loading.
//!
//! Public API surface:
//! - [`types`] — [`Kind`] and [`KeyPath`]
//! - [`tables`] — static path-to-template and key-to-kind tables
//! - [`source`] — load / validate / merge of source documents
//! - [`error`] — [`CoreError`]

pub mod error;
pub mod source;
pub mod tables;
pub mod types;

pub use error::CoreError;
pub use tables::{kind_for_key, template_for};
pub use types::{KeyPath, Kind};
