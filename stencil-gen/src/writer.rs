//! Output writer — append-stream YAML files named by document kind.
//!
//! ## Naming
//!
//! | Kind                | File name                                   |
//! |---------------------|---------------------------------------------|
//! | (default)           | `<Kind>.yaml`                               |
//! | `ReleaseTag`        | `ReleaseTag-<scope.kind>-<scope.name>.yaml` |
//! | `AccessControlList` | `AccessControlList-<scope.kind>.yaml`       |
//!
//! The first document for a name creates the file; subsequent documents are
//! appended after a `---` stream separator. `Product` and `Asset` documents
//! get their icon embedded as a base64 data URI before serialization.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_yaml::{Mapping, Value};

use stencil_core::types::Kind;

use crate::error::{io_err, GenError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of emitting an individual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The document created its output file.
    Created { path: PathBuf },
    /// The document was appended to a file created earlier in this run.
    Appended { path: PathBuf },
    /// `--dry-run` mode: the document *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Created { path }
            | WriteResult::Appended { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputWriter
// ---------------------------------------------------------------------------

/// Stateful writer for one run. Tracks which files this run has produced so
/// the append-or-create decision does not depend on leftover filesystem
/// state.
pub struct OutputWriter {
    out_dir: PathBuf,
    icon_dir: PathBuf,
    dry_run: bool,
    written: BTreeSet<PathBuf>,
    results: Vec<WriteResult>,
}

impl OutputWriter {
    pub fn new(out_dir: PathBuf, icon_dir: PathBuf, dry_run: bool) -> Self {
        OutputWriter {
            out_dir,
            icon_dir,
            dry_run,
            written: BTreeSet::new(),
            results: Vec::new(),
        }
    }

    /// Delete and recreate the output directory. Called exactly once, before
    /// any document is written. A dry run leaves the filesystem untouched.
    pub fn reset(&mut self) -> Result<(), GenError> {
        self.written.clear();
        self.results.clear();
        if self.dry_run {
            return Ok(());
        }
        if self.out_dir.exists() {
            std::fs::remove_dir_all(&self.out_dir).map_err(|e| io_err(&self.out_dir, e))?;
        }
        std::fs::create_dir_all(&self.out_dir).map_err(|e| io_err(&self.out_dir, e))?;
        Ok(())
    }

    /// Emit one resolved document.
    pub fn write(&mut self, doc: &Value) -> Result<WriteResult, GenError> {
        let kind_str = doc
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(GenError::MissingKind)?
            .to_owned();
        let kind: Option<Kind> = kind_str.parse().ok();

        let mut doc = doc.clone();
        match kind {
            Some(Kind::Product) => self.inject_icon(&mut doc, "api-icon.png"),
            Some(Kind::Asset) => self.inject_icon(&mut doc, "api-asset-icon.png"),
            _ => {}
        }

        let path = self.out_dir.join(self.file_name(&kind_str, kind, &doc));
        let first = self.written.insert(path.clone());

        let mut text = serde_yaml::to_string(&doc)?;
        text = fold_support_contact_url(text);

        let result = if self.dry_run {
            tracing::info!("[dry-run] would write: {}", path.display());
            WriteResult::WouldWrite { path }
        } else if first {
            std::fs::write(&path, &text).map_err(|e| io_err(&path, e))?;
            tracing::info!("wrote: {}", path.display());
            WriteResult::Created { path }
        } else {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&path)
                .map_err(|e| io_err(&path, e))?;
            file.write_all(b"\n---\n").map_err(|e| io_err(&path, e))?;
            file.write_all(text.as_bytes()).map_err(|e| io_err(&path, e))?;
            tracing::info!("appended: {}", path.display());
            WriteResult::Appended { path }
        };
        self.results.push(result.clone());
        Ok(result)
    }

    /// Everything written (or skipped) since the last [`reset`](Self::reset).
    pub fn results(&self) -> &[WriteResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<WriteResult> {
        self.results
    }

    fn file_name(&self, kind_str: &str, kind: Option<Kind>, doc: &Value) -> String {
        let scope = |field: &str| {
            doc.get("metadata")
                .and_then(|m| m.get("scope"))
                .and_then(|s| s.get(field))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        match kind {
            Some(Kind::ReleaseTag) => match (scope("kind"), scope("name")) {
                (Some(scope_kind), Some(scope_name)) => {
                    format!("{kind_str}-{scope_kind}-{scope_name}.yaml")
                }
                _ => {
                    tracing::warn!("ReleaseTag document has no metadata.scope; using plain name");
                    format!("{kind_str}.yaml")
                }
            },
            Some(Kind::AccessControlList) => match scope("kind") {
                Some(scope_kind) => format!("{kind_str}-{scope_kind}.yaml"),
                None => {
                    tracing::warn!(
                        "AccessControlList document has no metadata.scope; using plain name"
                    );
                    format!("{kind_str}.yaml")
                }
            },
            _ => format!("{kind_str}.yaml"),
        }
    }

    /// Embed the named icon under `spec.icon` as a data URI. A missing icon
    /// file is a diagnostic, not a failure.
    fn inject_icon(&self, doc: &mut Value, icon_file: &str) {
        let icon_path = self.icon_dir.join(icon_file);
        let bytes = match std::fs::read(&icon_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("icon {} not embedded: {e}", icon_path.display());
                return;
            }
        };
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(bytes));
        let Value::Mapping(map) = doc else {
            return;
        };
        let spec_key = Value::from("spec");
        if !matches!(map.get(&spec_key), Some(Value::Mapping(_))) {
            map.insert(spec_key.clone(), Value::Mapping(Mapping::new()));
        }
        if let Some(Value::Mapping(spec)) = map.get_mut(&spec_key) {
            spec.insert(Value::from("icon"), Value::from(uri));
        }
    }
}

// ---------------------------------------------------------------------------
// Folded support-contact URL
// ---------------------------------------------------------------------------

/// Rewrite the `url` child of any `microsoftTeams:` block as a folded block
/// scalar. Style tagging is not representable on the value tree, so the
/// serialized text is adjusted instead.
fn fold_support_contact_url(yaml: String) -> String {
    let mut out = Vec::with_capacity(yaml.lines().count());
    let mut teams_indent: Option<usize> = None;

    for line in yaml.lines() {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim_start();

        if let Some(parent) = teams_indent {
            if indent > parent {
                if let Some(value) = trimmed.strip_prefix("url: ") {
                    let value = value
                        .trim()
                        .trim_matches(|c| c == '"' || c == '\'');
                    out.push(format!("{}url: >-", " ".repeat(indent)));
                    out.push(format!("{}{value}", " ".repeat(indent + 2)));
                    continue;
                }
            } else {
                teams_indent = None;
            }
        }
        if trimmed == "microsoftTeams:" {
            teams_indent = Some(indent);
        }
        out.push(line.to_owned());
    }

    let mut folded = out.join("\n");
    if yaml.ends_with('\n') {
        folded.push('\n');
    }
    folded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
