//! Placeholder resolver — walks a template document and substitutes
//! placeholders against the position context.
//!
//! # Grammar (scalar strings only)
//!
//! | Form                          | Result                                        |
//! |-------------------------------|-----------------------------------------------|
//! | `{{path}}`                    | scalar substitution; a mapping/sequence value replaces the whole template node |
//! | `{{{path}}}`                  | the dumped YAML representation, inserted inline |
//! | `{{func.name}}` / `{{func.name(a, b)}}` | registered function call; parameters are dotted paths, optionally quoted |
//!
//! Recursion follows the *template* structure, not the source. Function
//! tokens resolve left-to-right before ordinary path substitution on the
//! residual string. Unresolvable paths substitute empty (the owning key is
//! then dropped); unknown function names keep their literal token. Malformed
//! tokens (unbalanced braces or parentheses) are left as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::functions::{FuncResult, FunctionRegistry};
use crate::path::resolve_path;

static FUNC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{func\.([^()}]+?)(?:\((.*?)\))?\}\}").expect("valid pattern"));

/// Render one template node against the given position context.
///
/// `root` is the full merged source document, consulted by registered
/// functions; direct `{{path}}` lookups resolve against `ctx.values`.
pub fn render(
    template: &Value,
    ctx: &RenderContext,
    root: &Value,
    funcs: &FunctionRegistry,
) -> Result<Value, RenderError> {
    match template {
        Value::Mapping(map) => render_mapping(map, ctx, root, funcs),
        Value::Sequence(items) => render_sequence(items, ctx, root, funcs),
        Value::String(text) => render_scalar(text, ctx, root, funcs),
        other => Ok(other.clone()),
    }
}

// ---------------------------------------------------------------------------
// Mapping nodes
// ---------------------------------------------------------------------------

fn render_mapping(
    map: &Mapping,
    ctx: &RenderContext,
    root: &Value,
    funcs: &FunctionRegistry,
) -> Result<Value, RenderError> {
    let mut out = Mapping::new();
    for (key, child) in map {
        let key_str = key.as_str().unwrap_or_default();
        let child_ctx = ctx.descend_template_key(key_str);
        let sub = render(child, &child_ctx, root, funcs)?;
        match sub {
            Value::Sequence(items) => {
                // Generated list entries accumulate onto an existing value
                // rather than replacing it.
                if let Some(Value::Sequence(existing)) = out.get_mut(key) {
                    existing.extend(items);
                } else {
                    out.insert(key.clone(), Value::Sequence(items));
                }
            }
            Value::Mapping(m) => {
                out.insert(key.clone(), Value::Mapping(m));
            }
            Value::String(s) => {
                if s.is_empty() {
                    tracing::debug!("dropping '{key_str}' — empty after substitution");
                } else if s.chars().all(|c| c.is_ascii_digit()) {
                    match s.parse::<u64>() {
                        Ok(n) => {
                            out.insert(key.clone(), Value::from(n));
                        }
                        Err(_) => {
                            out.insert(key.clone(), Value::String(s));
                        }
                    }
                } else {
                    out.insert(key.clone(), Value::String(s));
                }
            }
            Value::Null => {
                tracing::debug!("dropping '{key_str}' — no value");
            }
            other => {
                out.insert(key.clone(), other);
            }
        }
    }
    Ok(Value::Mapping(out))
}

// ---------------------------------------------------------------------------
// Sequence nodes
// ---------------------------------------------------------------------------

/// Template lists are rendered once, from the first item's shape. When that
/// item resolves to a whole sequence (node replacement), the sequence IS the
/// result.
fn render_sequence(
    items: &[Value],
    ctx: &RenderContext,
    root: &Value,
    funcs: &FunctionRegistry,
) -> Result<Value, RenderError> {
    let Some(first) = items.first() else {
        return Ok(Value::Sequence(Vec::new()));
    };
    let rendered = render(first, ctx, root, funcs)?;
    match rendered {
        Value::Sequence(_) => Ok(rendered),
        other => Ok(Value::Sequence(vec![other])),
    }
}

// ---------------------------------------------------------------------------
// Scalar nodes
// ---------------------------------------------------------------------------

fn render_scalar(
    text: &str,
    ctx: &RenderContext,
    root: &Value,
    funcs: &FunctionRegistry,
) -> Result<Value, RenderError> {
    let mut out = text.to_owned();

    // Phase 1: function tokens, left to right.
    if out.contains("{{func.") {
        let calls: Vec<(String, String, Option<String>)> = FUNC_RE
            .captures_iter(&out)
            .map(|c| {
                (
                    c[0].to_owned(),
                    c[1].to_owned(),
                    c.get(2).map(|m| m.as_str().to_owned()),
                )
            })
            .collect();
        if calls.len() > 1 {
            tracing::debug!("multiple function placeholders in one scalar");
        }
        for (token, name, params_str) in calls {
            let params = match &params_str {
                Some(raw) => resolve_params(raw, ctx),
                None => Vec::new(),
            };
            match funcs.invoke(&name, ctx, root, &params)? {
                FuncResult::Unknown => {
                    tracing::warn!("function '{name}' does not exist; leaving placeholder");
                }
                FuncResult::Value(value @ (Value::Mapping(_) | Value::Sequence(_))) => {
                    tracing::info!("function '{name}' replaced the template node");
                    return Ok(value);
                }
                FuncResult::Value(value) => {
                    let substituted = scalar_string(&value);
                    tracing::info!("function '{name}' -> '{substituted}'");
                    out = out.replace(&token, &substituted);
                }
            }
        }
    }

    // Phase 2: path tokens on the residual string. Unknown-function tokens
    // left by phase 1 are stepped over, not consumed.
    let mut search_from = 0;
    while let Some(rel) = out[search_from..].find("{{") {
        let start = search_from + rel;
        let raw = out[start..].starts_with("{{{");
        let (open_len, close_pat) = if raw { (3, "}}}") } else { (2, "}}") };
        let Some(close_rel) = out[start + open_len..].find(close_pat) else {
            break; // unbalanced braces: leave the literal text
        };
        let close = start + open_len + close_rel;
        let token_end = close + close_pat.len();
        let path = out[start + open_len..close].trim().to_owned();

        if path.is_empty() || path.starts_with("func.") {
            search_from = token_end;
            continue;
        }

        let replacement = match resolve_path(&ctx.values, &path, ctx.pending_indices()) {
            Ok(value @ (Value::Mapping(_) | Value::Sequence(_))) => {
                if raw {
                    dump_block(&value)
                } else {
                    tracing::info!("placeholder '{path}' resolved to a structure; replacing node");
                    return Ok(value);
                }
            }
            Ok(value) => {
                tracing::info!("placeholder '{path}' -> '{}'", scalar_string(&value));
                if raw {
                    dump_block(&value)
                } else {
                    scalar_string(&value)
                }
            }
            Err(e) => {
                tracing::warn!("placeholder '{path}' has no matching value: {e}");
                String::new()
            }
        };
        out.replace_range(start..token_end, &replacement);
        // Values are substituted verbatim: scanning resumes past the
        // replacement, so resolved text is never re-resolved.
        search_from = start + replacement.len();
    }

    Ok(Value::String(out))
}

/// Resolve comma-separated call parameters: dotted paths, optionally quoted.
fn resolve_params(raw: &str, ctx: &RenderContext) -> Vec<Value> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let p = p.trim_matches(|c| c == '"' || c == '\'');
            match resolve_path(&ctx.values, p, ctx.pending_indices()) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("parameter '{p}' has no matching value: {e}");
                    Value::Null
                }
            }
        })
        .collect()
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => dump_block(other),
    }
}

fn dump_block(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
