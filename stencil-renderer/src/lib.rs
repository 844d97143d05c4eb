//! # stencil-renderer
//!
//! Placeholder resolution engine: walks a template document and substitutes
//! placeholders against position-scoped source values.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_yaml::Value;
//! use stencil_renderer::{render, FunctionRegistry, RenderContext};
//!
//! fn render_one(template: &Value, source: Value) {
//!     let funcs = FunctionRegistry::new(None);
//!     let ctx = RenderContext::for_template(template, source.clone());
//!     if let Ok(doc) = render(template, &ctx, &source, &funcs) {
//!         println!("{} top-level keys", doc.as_mapping().map_or(0, |m| m.len()));
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod functions;
pub mod path;
pub mod resolver;

pub use context::{ListIndex, RenderContext};
pub use error::RenderError;
pub use functions::{FuncResult, FunctionRegistry, TeamDirectory};
pub use path::{resolve_path, slug, PathError};
pub use resolver::render;
