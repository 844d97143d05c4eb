//! Position context — the value object threaded through traversal and
//! resolution.
//!
//! A context is always passed by value: every descent clones and amends its
//! own copy, so index pops and path extensions never leak into sibling
//! branches.

use std::fmt;

use serde_yaml::Value;

use stencil_core::types::{KeyPath, Kind};

// ---------------------------------------------------------------------------
// ListIndex
// ---------------------------------------------------------------------------

/// A resolved list position: one concrete element, or the whole array.
///
/// `All` is the wildcard used when a template consumes an entire list as a
/// single unit (the access-control-list case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIndex {
    At(usize),
    All,
}

impl fmt::Display for ListIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListIndex::At(i) => write!(f, "{i}"),
            ListIndex::All => f.write_str("*"),
        }
    }
}

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Structural position during traversal and placeholder resolution.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Dot-joined path from the document root, `[]` marking list depth.
    pub key_path: KeyPath,
    /// Path accumulated while descending the template itself.
    pub template_key_path: String,
    /// The logical kind of the template in scope.
    pub kind: Option<Kind>,
    /// One entry per `[]` segment in `key_path`, consumed left-to-right
    /// by path resolution.
    pub list_index: Vec<ListIndex>,
    /// The subtree of the source document visible at this position.
    pub values: Value,
}

impl RenderContext {
    /// Context at the traversal root.
    pub fn root(values: Value) -> Self {
        RenderContext {
            key_path: KeyPath::root(),
            template_key_path: String::new(),
            kind: None,
            list_index: Vec::new(),
            values,
        }
    }

    /// Context seeded from a template's top-level `kind` field, for
    /// rendering a document outside a traversal.
    pub fn for_template(template: &Value, values: Value) -> Self {
        let kind = template
            .get("kind")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        RenderContext {
            kind,
            ..RenderContext::root(values)
        }
    }

    /// A copy positioned at `key_path`, with `values` narrowed accordingly.
    pub fn at(&self, key_path: KeyPath, values: Value) -> Self {
        RenderContext {
            key_path,
            values,
            ..self.clone()
        }
    }

    /// A copy with one more resolved list position and `values` narrowed to
    /// the selected element (or the whole array for [`ListIndex::All`]).
    pub fn with_index(&self, index: ListIndex, values: Value) -> Self {
        let mut ctx = self.clone();
        ctx.list_index.push(index);
        ctx.values = values;
        ctx
    }

    /// Indices still applicable to resolution relative to `values`.
    ///
    /// Narrowing to a concrete element consumes its index; the wildcard
    /// leaves the whole array in `values`, so its entry stays pending.
    pub fn pending_indices(&self) -> &[ListIndex] {
        let mut start = self.list_index.len();
        while start > 0 && self.list_index[start - 1] == ListIndex::All {
            start -= 1;
        }
        &self.list_index[start..]
    }

    /// A copy with the kind in scope replaced.
    pub fn with_kind(&self, kind: Option<Kind>) -> Self {
        RenderContext {
            kind,
            ..self.clone()
        }
    }

    /// A copy whose `template_key_path` gains one segment.
    pub fn descend_template_key(&self, key: &str) -> Self {
        let mut ctx = self.clone();
        ctx.template_key_path = if ctx.template_key_path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", ctx.template_key_path)
        };
        ctx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
