//! Source document loading, validation, and merging.
//!
//! Inputs may be `.yaml` files or directories (every `*.yaml` inside a
//! directory contributes, in sorted order). Files may be multi-document
//! streams. All top-level keys are combined into one insertion-ordered
//! mapping; a key defined twice across the merged inputs is a fatal
//! [`CoreError::DuplicateKey`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// 1. File collection
// ---------------------------------------------------------------------------

/// Expand the given paths into an ordered list of `.yaml` files.
///
/// Directories are scanned non-recursively and their entries sorted for
/// deterministic combination order.
pub fn collect_yaml_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CoreError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() && has_yaml_ext(input) {
            files.push(input.clone());
        } else if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && has_yaml_ext(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            return Err(CoreError::InvalidInput { path: input.clone() });
        }
    }
    if files.is_empty() {
        return Err(CoreError::NoInputs);
    }
    Ok(files)
}

fn has_yaml_ext(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("yaml")
}

// ---------------------------------------------------------------------------
// 2. Load + validate
// ---------------------------------------------------------------------------

/// Load every document from the given inputs and combine their top-level
/// keys into a single mapping.
///
/// Duplicate keys inside a single mapping are rejected by the YAML parser and
/// surface as [`CoreError::Parse`]; the same top-level key appearing across
/// documents is [`CoreError::DuplicateKey`] with the offending file.
pub fn load_and_validate(inputs: &[PathBuf]) -> Result<Mapping, CoreError> {
    let files = collect_yaml_files(inputs)?;

    let mut combined = Mapping::new();
    for path in &files {
        let contents = std::fs::read_to_string(path)?;
        for document in serde_yaml::Deserializer::from_str(&contents) {
            let value = Value::deserialize(document).map_err(|e| CoreError::Parse {
                path: path.clone(),
                source: e,
            })?;
            if value.is_null() {
                continue; // empty document in the stream
            }
            let Value::Mapping(doc) = value else {
                return Err(CoreError::NotAMapping { path: path.clone() });
            };
            for (key, val) in doc {
                if combined.contains_key(&key) {
                    return Err(CoreError::DuplicateKey {
                        key: key_display(&key),
                        path: path.clone(),
                    });
                }
                combined.insert(key, val);
            }
        }
    }
    Ok(combined)
}

fn key_display(key: &Value) -> String {
    match key.as_str() {
        Some(s) => s.to_owned(),
        None => format!("{key:?}"),
    }
}

// ---------------------------------------------------------------------------
// 3. Deep merge
// ---------------------------------------------------------------------------

/// Merge `source` (defaults) underneath `destination` (overrides).
///
/// Mappings merge recursively with destination keys winning and new source
/// keys appended; sequences merge index-wise (destination element wins,
/// source fills the tail); for scalars the destination wins unless null.
pub fn deep_merge(source: &Value, destination: Value) -> Value {
    match (source, destination) {
        (Value::Mapping(src), Value::Mapping(mut dst)) => {
            for (key, sv) in src {
                match dst.get_mut(key) {
                    Some(slot) => {
                        let old = std::mem::replace(slot, Value::Null);
                        *slot = deep_merge(sv, old);
                    }
                    None => {
                        dst.insert(key.clone(), sv.clone());
                    }
                }
            }
            Value::Mapping(dst)
        }
        (Value::Sequence(src), Value::Sequence(dst)) => {
            let mut merged = Vec::with_capacity(src.len().max(dst.len()));
            let mut dst_iter = dst.into_iter();
            let mut i = 0;
            loop {
                match (src.get(i), dst_iter.next()) {
                    (Some(sv), Some(dv)) => merged.push(match dv {
                        Value::Mapping(_) | Value::Sequence(_) => deep_merge(sv, dv),
                        scalar => scalar,
                    }),
                    (Some(sv), None) => merged.push(sv.clone()),
                    (None, Some(dv)) => merged.push(dv),
                    (None, None) => break,
                }
                i += 1;
            }
            Value::Sequence(merged)
        }
        (source, Value::Null) => source.clone(),
        (_, destination) => destination,
    }
}

// ---------------------------------------------------------------------------
// 4. Path-scan helpers
// ---------------------------------------------------------------------------

/// Collect the distinct scalar values found at `path` anywhere under
/// `values`, descending through sequences implicitly. First-seen order is
/// preserved.
pub fn collect_distinct_by_path(values: &Value, path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect_into(values, &segments, &mut out);
    out
}

fn collect_into(value: &Value, segments: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Sequence(items) => {
            for item in items {
                collect_into(item, segments, out);
            }
        }
        Value::Mapping(map) => {
            let Some((head, rest)) = segments.split_first() else {
                return;
            };
            let Some(next) = map.get(*head) else {
                return;
            };
            if rest.is_empty() {
                match next {
                    Value::String(s) => push_distinct(out, s.clone()),
                    Value::Sequence(items) => {
                        for item in items {
                            if let Some(s) = item.as_str() {
                                push_distinct(out, s.to_owned());
                            }
                        }
                    }
                    _ => {}
                }
            } else {
                collect_into(next, rest, out);
            }
        }
        _ => {}
    }
}

fn push_distinct(out: &mut Vec<String>, value: String) {
    if !out.contains(&value) {
        out.push(value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
