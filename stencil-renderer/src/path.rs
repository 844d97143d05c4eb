//! Dotted-path interpreter over YAML values.
//!
//! A path is a dot-joined sequence of mapping keys and `[]` list markers.
//! Each `[]` consumes the next entry from the supplied index stack,
//! left-to-right; the [`ListIndex::All`](crate::context::ListIndex::All)
//! wildcard keeps the whole sequence in the cursor instead of selecting one
//! element.
//!
//! Name-like fields follow one uniform policy: a path whose final segment is
//! `name` yields the [`slug`]ged form of the value.

use thiserror::Error;

use serde_yaml::Value;

use crate::context::ListIndex;

/// Why a path failed to resolve. All variants are recoverable from the
/// resolver's point of view (diagnostic + empty substitution).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("list index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("a '[]' segment had no resolved index left to consume")]
    IndexExhausted,

    #[error("segment '{segment}' applied to a non-container value")]
    TypeMismatch { segment: String },
}

/// Lower-case a name-like value and replace spaces with hyphens.
pub fn slug(s: &str) -> String {
    s.to_lowercase().replace(' ', "-")
}

/// Resolve a dotted path against `values`, consuming `indices` for `[]`
/// segments. Returns an owned copy of the resolved value.
pub fn resolve_path(
    values: &Value,
    path: &str,
    indices: &[ListIndex],
) -> Result<Value, PathError> {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(values, &segments, indices)
}

/// Segment-level variant of [`resolve_path`], used by helper functions that
/// assemble their own key sequences.
pub fn resolve_segments(
    values: &Value,
    segments: &[&str],
    indices: &[ListIndex],
) -> Result<Value, PathError> {
    let mut cursor = values;
    let mut pos = 0;

    for segment in segments {
        match cursor {
            Value::Mapping(map) => {
                cursor = map.get(*segment).ok_or_else(|| PathError::KeyNotFound {
                    key: (*segment).to_owned(),
                })?;
            }
            Value::Sequence(items) if *segment == "[]" => {
                let index = indices.get(pos).ok_or(PathError::IndexExhausted)?;
                match index {
                    ListIndex::All => {
                        // The whole array stays in the cursor; the wildcard
                        // is not consumed.
                    }
                    ListIndex::At(i) => {
                        pos += 1;
                        cursor = items.get(*i).ok_or(PathError::IndexOutOfRange {
                            index: *i,
                            len: items.len(),
                        })?;
                    }
                }
            }
            _ => {
                return Err(PathError::TypeMismatch {
                    segment: (*segment).to_owned(),
                })
            }
        }
    }

    let resolved = cursor.clone();
    if segments.last() == Some(&"name") {
        if let Value::String(s) = &resolved {
            return Ok(Value::String(slug(s)));
        }
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Value {
        serde_yaml::from_str(
            r#"
assets:
  - name: First Asset
    services:
      - name: Svc One
        environment: eu-prod-west-1
      - name: Svc Two
  - name: Second Asset
owner:
  teamName: Platform Team
"#,
        )
        .unwrap()
    }

    #[test]
    fn resolves_nested_keys() {
        let v = resolve_path(&doc(), "owner.teamName", &[]).unwrap();
        assert_eq!(v, Value::from("Platform Team"));
    }

    #[test]
    fn list_segments_consume_indices_left_to_right() {
        let indices = [ListIndex::At(0), ListIndex::At(1)];
        let v = resolve_path(&doc(), "assets.[].services.[].name", &indices).unwrap();
        assert_eq!(v, Value::from("svc-two"));
    }

    #[test]
    fn name_segments_are_slugged() {
        let v = resolve_path(&doc(), "assets.[].name", &[ListIndex::At(1)]).unwrap();
        assert_eq!(v, Value::from("second-asset"));
    }

    #[test]
    fn non_name_fields_keep_case() {
        let v = resolve_path(&doc(), "owner.teamName", &[]).unwrap();
        assert_eq!(v.as_str(), Some("Platform Team"));
    }

    #[test]
    fn wildcard_keeps_whole_sequence() {
        let v = resolve_path(&doc(), "assets.[]", &[ListIndex::All]).unwrap();
        assert_eq!(v.as_sequence().map(Vec::len), Some(2));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = resolve_path(&doc(), "assets.[].nope", &[ListIndex::At(0)]).unwrap_err();
        assert_eq!(err, PathError::KeyNotFound { key: "nope".into() });
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = resolve_path(&doc(), "assets.[]", &[ListIndex::At(5)]).unwrap_err();
        assert_eq!(err, PathError::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn exhausted_index_stack_is_an_error() {
        let err = resolve_path(&doc(), "assets.[]", &[]).unwrap_err();
        assert_eq!(err, PathError::IndexExhausted);
    }

    #[test]
    fn scalar_traversal_is_a_type_mismatch() {
        let err = resolve_path(&doc(), "owner.teamName.inner", &[]).unwrap_err();
        assert_eq!(
            err,
            PathError::TypeMismatch { segment: "inner".into() }
        );
    }

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slug("My Asset"), "my-asset");
        assert_eq!(slug("already-kebab"), "already-kebab");
    }
}
