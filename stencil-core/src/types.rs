//! Domain types shared across the stencil workspace.
//!
//! A [`KeyPath`] is always structural: list positions appear as the literal
//! `[]` marker, never as concrete indices. Concrete indices travel separately
//! in the render context's index stack.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The logical document type a template or source node represents.
///
/// Drives template `kind` seeding and output file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Product,
    Asset,
    AssetMapping,
    ReleaseTag,
    AccessControlList,
    ProductPlan,
    Quota,
    PublishedProduct,
}

impl Kind {
    /// All kind variants in a stable order.
    pub fn all() -> &'static [Kind] {
        &[
            Kind::Product,
            Kind::Asset,
            Kind::AssetMapping,
            Kind::ReleaseTag,
            Kind::AccessControlList,
            Kind::ProductPlan,
            Kind::Quota,
            Kind::PublishedProduct,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Product => "Product",
            Kind::Asset => "Asset",
            Kind::AssetMapping => "AssetMapping",
            Kind::ReleaseTag => "ReleaseTag",
            Kind::AccessControlList => "AccessControlList",
            Kind::ProductPlan => "ProductPlan",
            Kind::Quota => "Quota",
            Kind::PublishedProduct => "PublishedProduct",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Product" => Ok(Kind::Product),
            "Asset" => Ok(Kind::Asset),
            "AssetMapping" => Ok(Kind::AssetMapping),
            "ReleaseTag" => Ok(Kind::ReleaseTag),
            "AccessControlList" => Ok(Kind::AccessControlList),
            "ProductPlan" => Ok(Kind::ProductPlan),
            "Quota" => Ok(Kind::Quota),
            "PublishedProduct" => Ok(Kind::PublishedProduct),
            other => Err(format!("unknown kind '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyPath
// ---------------------------------------------------------------------------

/// A dot-joined structural path into the source document.
///
/// List positions are abstracted as the reserved `[]` segment, e.g.
/// `assets.[].services.[]`. The empty path is the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct KeyPath(pub String);

impl KeyPath {
    /// The document root (empty path).
    pub fn root() -> Self {
        KeyPath(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the path by one key, appending the `[]` marker when the value
    /// at that key is a sequence.
    pub fn child(&self, key: &str, is_sequence: bool) -> KeyPath {
        let mut path = if self.0.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.0, key)
        };
        if is_sequence {
            path.push_str(".[]");
        }
        KeyPath(path)
    }

    /// The structural path with all `[]` markers erased — the key used for
    /// template selection.
    pub fn template_key(&self) -> String {
        self.0.replace(".[]", "")
    }

    /// The path split into segments (including `[]` markers).
    pub fn segments(&self) -> Vec<&str> {
        if self.0.is_empty() {
            vec![]
        } else {
            self.0.split('.').collect()
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        KeyPath(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
