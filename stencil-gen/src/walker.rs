//! Tree walker — depth-first traversal of the merged source document.
//!
//! At every `(key, value)` pair the walker forms the structural key-path
//! (list values gain a `[]` marker), consults the template table, and — when
//! a template is registered and present on disk — renders and emits a
//! document per position:
//!
//! - mapping values render once, emit, then recurse for nested templates;
//! - sequence values render once per item, pushing the item index for the
//!   duration of that item's render and recursion;
//! - the `accessControlList` key renders once against its *entire* array
//!   under the wildcard index.
//!
//! Unmatched mappings are descended into silently; unmatched sequences are
//! structural noise and are skipped. Emission order is document order,
//! depth-first.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use stencil_core::source::collect_distinct_by_path;
use stencil_core::tables::template_for;
use stencil_core::types::{KeyPath, Kind};
use stencil_renderer::{render, FunctionRegistry, ListIndex, RenderContext};

use crate::error::GenError;
use crate::writer::OutputWriter;

/// Depth-first walker over one merged source document.
pub struct Walker<'a> {
    template_dir: &'a Path,
    funcs: &'a FunctionRegistry,
    root: &'a Value,
}

impl<'a> Walker<'a> {
    pub fn new(template_dir: &'a Path, funcs: &'a FunctionRegistry, root: &'a Value) -> Self {
        Walker {
            template_dir,
            funcs,
            root,
        }
    }

    /// Walk `values` located at `parent`, emitting into `writer`.
    ///
    /// `base` must be the context whose `key_path` is `parent` and whose
    /// `values` is the mapping being walked.
    pub fn walk(
        &self,
        values: &Mapping,
        parent: &KeyPath,
        base: &RenderContext,
        writer: &mut OutputWriter,
    ) -> Result<(), GenError> {
        for (key, value) in values {
            let Some(key_str) = key.as_str() else {
                continue;
            };
            let current = parent.child(key_str, value.is_sequence());
            let mut key_ctx = base.at(current.clone(), value.clone());

            if let Some(template_path) = self.registered_template(&current) {
                let template = load_template(&template_path)?;
                let kind: Option<Kind> = template
                    .get("kind")
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse().ok());
                key_ctx.kind = kind;
                tracing::info!(
                    "processing key '{current}' with template {}",
                    template_path.display()
                );

                match value {
                    Value::Sequence(items) => {
                        if key_str == "accessControlList" {
                            let acl_ctx = key_ctx.with_index(ListIndex::All, value.clone());
                            let doc = render(&template, &acl_ctx, self.root, self.funcs)?;
                            writer.write(&doc)?;
                            continue;
                        }
                        for (index, item) in items.iter().enumerate() {
                            tracing::info!("processing key '{current}' item {}", index + 1);
                            let item_ctx =
                                key_ctx.with_index(ListIndex::At(index), item.clone());
                            let mut doc = render(&template, &item_ctx, self.root, self.funcs)?;
                            attach_passthrough(&mut doc, item);
                            writer.write(&doc)?;
                            if let Value::Mapping(child) = item {
                                self.walk(child, &current, &item_ctx, writer)?;
                            }
                            // item_ctx (and its pushed index) is dropped here;
                            // the next sibling starts from key_ctx again.
                        }
                    }
                    Value::Mapping(_) => {
                        let mut doc = render(&template, &key_ctx, self.root, self.funcs)?;
                        self.attach_enriched_tags(&mut doc, value);
                        writer.write(&doc)?;
                        // Nested templates are found by the recursion below.
                    }
                    _ => {}
                }
            }

            if let Value::Mapping(child) = value {
                self.walk(child, &current, &key_ctx, writer)?;
            }
        }
        Ok(())
    }

    /// The on-disk template for this structural position, if one is both
    /// registered and present.
    fn registered_template(&self, current: &KeyPath) -> Option<PathBuf> {
        let file = template_for(&current.template_key())?;
        let path = self.template_dir.join(file);
        if path.exists() {
            Some(path)
        } else {
            tracing::debug!("template {file} registered for '{current}' but not present");
            None
        }
    }

    /// Pass through `tags`/`attributes`, extending the tags with one
    /// `env:`/`region:` pair per distinct service environment in the source.
    fn attach_enriched_tags(&self, doc: &mut Value, source: &Value) {
        if source.get("tags").is_none() && source.get("attributes").is_none() {
            return;
        }
        let mut tags = source
            .get("tags")
            .and_then(Value::as_sequence)
            .cloned()
            .unwrap_or_default();
        for env in collect_distinct_by_path(self.root, "assets.services.environment") {
            let parts: Vec<&str> = env.split('-').collect();
            let region = parts[parts.len().saturating_sub(3)..].join("-");
            tags.push(Value::from(format!("env:{env}")));
            tags.push(Value::from(format!("region:{region}")));
        }
        set_field(doc, "tags", Value::Sequence(tags));
        set_field(
            doc,
            "attributes",
            source
                .get("attributes")
                .cloned()
                .unwrap_or(Value::Mapping(Mapping::new())),
        );
    }
}

/// Pass through `tags`/`attributes` from a source list item, when present.
fn attach_passthrough(doc: &mut Value, source: &Value) {
    if source.get("tags").is_none() && source.get("attributes").is_none() {
        return;
    }
    set_field(
        doc,
        "tags",
        source.get("tags").cloned().unwrap_or(Value::Sequence(Vec::new())),
    );
    set_field(
        doc,
        "attributes",
        source
            .get("attributes")
            .cloned()
            .unwrap_or(Value::Mapping(Mapping::new())),
    );
}

fn set_field(doc: &mut Value, field: &str, value: Value) {
    if let Value::Mapping(map) = doc {
        map.insert(Value::from(field), value);
    }
}

fn load_template(path: &Path) -> Result<Value, GenError> {
    let contents = std::fs::read_to_string(path).map_err(|e| crate::error::io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| GenError::Template {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
