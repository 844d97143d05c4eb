//! Built-in placeholder functions and the registry that dispatches them.
//!
//! The registry is assembled statically — a fixed name → handler dispatch —
//! rather than discovered at runtime. Every handler receives the current
//! [`RenderContext`], the full source document, and the already-resolved
//! call parameters, and returns a YAML value: a scalar substitutes into the
//! enclosing text, a mapping or sequence replaces the enclosing template
//! node, and null drops the owning key.
//!
//! The team directory is the one sanctioned external lookup table: loaded
//! lazily on first use, memoized for the rest of the process.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use stencil_core::tables::kind_for_key;
use stencil_core::types::Kind;

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::path::{resolve_segments, slug};

// ---------------------------------------------------------------------------
// Team directory
// ---------------------------------------------------------------------------

/// One entry of the external team directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TeamFile {
    #[serde(default)]
    teams: Vec<Team>,
}

/// Lazily-loaded, memoized view of the team directory file.
///
/// The file is read at most once per process; callers see a stale view if
/// the file changes mid-run.
#[derive(Debug)]
pub struct TeamDirectory {
    path: PathBuf,
    cell: OnceCell<Vec<Team>>,
}

impl TeamDirectory {
    pub fn new(path: PathBuf) -> Self {
        TeamDirectory {
            path,
            cell: OnceCell::new(),
        }
    }

    /// The loaded team list, reading the file on first call.
    pub fn teams(&self) -> Result<&[Team], RenderError> {
        let teams = self.cell.get_or_try_init(|| {
            let contents = std::fs::read_to_string(&self.path).map_err(|e| RenderError::Io {
                path: self.path.clone(),
                source: e,
            })?;
            let file: TeamFile =
                serde_yaml::from_str(&contents).map_err(|e| RenderError::Parse {
                    path: self.path.clone(),
                    source: e,
                })?;
            Ok(file.teams)
        })?;
        Ok(teams)
    }

    fn id_for(&self, name: &str) -> Result<Option<String>, RenderError> {
        Ok(self
            .teams()?
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Outcome of a function invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum FuncResult {
    /// No function registered under the requested name.
    Unknown,
    /// The function ran and produced this value.
    Value(Value),
}

/// All registered function names, in dispatch order.
pub const FUNCTION_NAMES: &[&str] = &[
    "generate_name",
    "generate_asset_name",
    "format_name",
    "get_parent_name",
    "get_parent_kind",
    "lookup_team_id",
    "lookup_teams_ids",
    "get_asset_name_list",
    "get_asset_resources",
];

/// Static name → handler registry for `{{func.*}}` placeholders.
pub struct FunctionRegistry {
    teams: Option<TeamDirectory>,
}

impl FunctionRegistry {
    /// Build the registry. `team_file` backs the two `lookup_*` functions;
    /// when absent, invoking them is a fatal configuration error.
    pub fn new(team_file: Option<PathBuf>) -> Self {
        FunctionRegistry {
            teams: team_file.map(TeamDirectory::new),
        }
    }

    /// Invoke a function by name.
    ///
    /// An unregistered name yields [`FuncResult::Unknown`] — the caller
    /// leaves the placeholder token intact and logs a diagnostic.
    pub fn invoke(
        &self,
        name: &str,
        ctx: &RenderContext,
        root: &Value,
        params: &[Value],
    ) -> Result<FuncResult, RenderError> {
        let value = match name {
            "generate_name" => generate_name(ctx, root),
            "generate_asset_name" => generate_name(&ctx.with_kind(Some(Kind::Asset)), root),
            "format_name" => format_name(params),
            "get_parent_name" => get_parent_name(ctx, root),
            "get_parent_kind" => get_parent_kind(ctx),
            "lookup_team_id" => self.lookup_team_id(ctx, root)?,
            "lookup_teams_ids" => self.lookup_teams_ids(ctx, root)?,
            "get_asset_name_list" => get_asset_name_list(ctx, root),
            "get_asset_resources" => get_asset_resources(ctx, root),
            _ => return Ok(FuncResult::Unknown),
        };
        Ok(FuncResult::Value(value))
    }

    fn directory(&self) -> Result<&TeamDirectory, RenderError> {
        self.teams.as_ref().ok_or(RenderError::TeamDirectoryMissing)
    }

    /// Resolve the owning team's name for the current position and return
    /// its directory id, or null when no team matches.
    fn lookup_team_id(&self, ctx: &RenderContext, root: &Value) -> Result<Value, RenderError> {
        let mut keys = ctx.key_path.segments();
        match ctx.kind {
            Some(Kind::Asset) | Some(Kind::Product) => {
                keys.extend(["owner", "teamName"]);
            }
            Some(Kind::ProductPlan) => {
                keys.truncate(keys.len().saturating_sub(2));
                keys.extend(["owner", "teamName"]);
            }
            _ => {}
        }
        let team_name = match resolve_segments(root, &keys, &ctx.list_index) {
            Ok(Value::String(s)) => s,
            _ => return Ok(Value::Null),
        };
        Ok(self
            .directory()?
            .id_for(&team_name)?
            .map_or(Value::Null, Value::String))
    }

    /// For an access-control list: map each entry's `teamName` to a
    /// `{id, type: team}` subject via the directory.
    fn lookup_teams_ids(&self, ctx: &RenderContext, root: &Value) -> Result<Value, RenderError> {
        let mut subjects = Vec::new();
        if ctx.kind == Some(Kind::AccessControlList) {
            let keys = ctx.key_path.segments();
            let entries = match resolve_segments(root, &keys, &ctx.list_index) {
                Ok(Value::Sequence(entries)) => entries,
                _ => Vec::new(),
            };
            for entry in &entries {
                let Some(team_name) = entry.get("teamName").and_then(Value::as_str) else {
                    continue;
                };
                if let Some(id) = self.directory()?.id_for(team_name)? {
                    let mut subject = Mapping::new();
                    subject.insert(Value::from("id"), Value::from(id));
                    subject.insert(Value::from("type"), Value::from("team"));
                    subjects.push(Value::Mapping(subject));
                }
            }
        }
        Ok(Value::Sequence(subjects))
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// The slugged `name` of the value at the current position.
fn generate_name(ctx: &RenderContext, root: &Value) -> Value {
    let mut keys = ctx.key_path.segments();
    keys.push("name");
    match resolve_segments(root, &keys, &ctx.list_index) {
        Ok(Value::String(s)) => Value::String(s),
        _ => Value::Null,
    }
}

/// Slug an arbitrary already-resolved parameter.
fn format_name(params: &[Value]) -> Value {
    match params.first() {
        Some(Value::String(s)) => Value::String(slug(s)),
        _ => Value::Null,
    }
}

/// The slugged name of the enclosing scope (asset, product, or plan),
/// selected by the kind in scope.
fn get_parent_name(ctx: &RenderContext, root: &Value) -> Value {
    let mut keys = ctx.key_path.segments();
    match ctx.kind {
        Some(Kind::ReleaseTag) | Some(Kind::AssetMapping) | Some(Kind::AccessControlList)
            if keys.first() == Some(&"assets") =>
        {
            keys.truncate(2);
            keys.push("name");
        }
        Some(Kind::ReleaseTag) if keys.first() == Some(&"product") => {
            keys.truncate(1);
            keys.push("name");
        }
        Some(Kind::ProductPlan) => {
            keys.truncate(1);
            keys.push("name");
        }
        Some(Kind::Quota) => {
            keys.truncate(3);
            keys.push("name");
        }
        _ => return Value::Null,
    }
    match resolve_segments(root, &keys, &ctx.list_index) {
        Ok(Value::String(s)) => Value::String(s),
        _ => Value::Null,
    }
}

/// The kind of the enclosing scope, read off the first key-path segment.
fn get_parent_kind(ctx: &RenderContext) -> Value {
    match ctx.kind {
        Some(Kind::ReleaseTag) | Some(Kind::AssetMapping) | Some(Kind::AccessControlList) => {
            let segments = ctx.key_path.segments();
            segments
                .first()
                .and_then(|key| kind_for_key(key))
                .map_or(Value::Null, |kind| Value::from(kind.as_str()))
        }
        _ => Value::Null,
    }
}

/// For a product: the slugged names of its assets that also exist as
/// top-level asset definitions.
fn get_asset_name_list(ctx: &RenderContext, root: &Value) -> Value {
    let mut names = Vec::new();
    if ctx.kind == Some(Kind::Product) {
        let declared = seq_at(root, &["product", "assets"]);
        let defined = seq_at(root, &["assets"]);
        for asset in &declared {
            let Some(name) = asset.get("name").and_then(Value::as_str) else {
                continue;
            };
            if defined
                .iter()
                .any(|d| d.get("name").and_then(Value::as_str) == Some(name))
            {
                let mut entry = Mapping::new();
                entry.insert(Value::from("name"), Value::from(slug(name)));
                names.push(Value::Mapping(entry));
            }
        }
    }
    Value::Sequence(names)
}

/// For a quota: one `{kind: AssetResource, name: asset/service}` entry per
/// service reference, preferring the service's title when one is declared.
fn get_asset_resources(ctx: &RenderContext, root: &Value) -> Value {
    let mut resources = Vec::new();
    if ctx.kind == Some(Kind::Quota) {
        let keys = ctx.key_path.segments();
        let services = match resolve_segments(root, &keys, &ctx.list_index) {
            Ok(Value::Mapping(quota)) => quota
                .get("services")
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        for service_ref in &services {
            let Some(service) = service_ref.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(asset) = service_ref.get("asset").and_then(Value::as_str) else {
                continue;
            };
            let service = find_asset_title(root, service).unwrap_or_else(|| service.to_owned());
            let mut entry = Mapping::new();
            entry.insert(Value::from("kind"), Value::from("AssetResource"));
            entry.insert(
                Value::from("name"),
                Value::from(format!("{}/{service}", slug(asset))),
            );
            resources.push(Value::Mapping(entry));
        }
    }
    Value::Sequence(resources)
}

/// The slugged `title` of the service named `name` anywhere under
/// `assets.[].services.[]`, if declared.
fn find_asset_title(root: &Value, name: &str) -> Option<String> {
    let assets = seq_at(root, &["assets"]);
    for asset in &assets {
        let Some(services) = asset.get("services").and_then(Value::as_sequence) else {
            continue;
        };
        for service in services {
            if service.get("name").and_then(Value::as_str) == Some(name) {
                if let Some(title) = service.get("title").and_then(Value::as_str) {
                    return Some(slug(title));
                }
            }
        }
    }
    None
}

fn seq_at(root: &Value, keys: &[&str]) -> Vec<Value> {
    let mut cursor = root;
    for key in keys {
        match cursor.get(*key) {
            Some(next) => cursor = next,
            None => return Vec::new(),
        }
    }
    cursor.as_sequence().cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use stencil_core::types::KeyPath;

    use crate::context::ListIndex;

    use super::*;

    fn root_doc() -> Value {
        serde_yaml::from_str(
            r#"
product:
  name: My Product
  owner:
    teamName: Platform Team
  assets:
    - name: First Asset
  plans:
    - name: Gold Plan
      quotas:
        - name: Burst Quota
          services:
            - name: svc-one
              asset: First Asset
assets:
  - name: First Asset
    owner:
      teamName: Platform Team
    services:
      - name: svc-one
        title: Service One
    accessControlList:
      - teamName: Platform Team
      - teamName: Ghost Team
"#,
        )
        .unwrap()
    }

    fn team_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("central-teams.yaml");
        fs::write(
            &path,
            "teams:\n  - id: t-123\n    name: Platform Team\n  - id: t-456\n    name: Other Team\n",
        )
        .unwrap();
        path
    }

    fn ctx_at(kind: Kind, key_path: &str, indices: &[ListIndex]) -> RenderContext {
        let mut ctx = RenderContext::root(Value::Null);
        ctx.kind = Some(kind);
        ctx.key_path = KeyPath::from(key_path);
        ctx.list_index = indices.to_vec();
        ctx
    }

    #[test]
    fn generate_name_slugs_the_positional_name() {
        let root = root_doc();
        let registry = FunctionRegistry::new(None);
        let ctx = ctx_at(Kind::Asset, "assets.[]", &[ListIndex::At(0)]);
        let result = registry.invoke("generate_name", &ctx, &root, &[]).unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("first-asset")));
    }

    #[test]
    fn format_name_slugs_its_parameter() {
        let registry = FunctionRegistry::new(None);
        let ctx = ctx_at(Kind::Asset, "assets.[]", &[]);
        let result = registry
            .invoke("format_name", &ctx, &Value::Null, &[Value::from("Big Title")])
            .unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("big-title")));
    }

    #[test]
    fn parent_name_for_asset_mapping_is_the_asset() {
        let root = root_doc();
        let registry = FunctionRegistry::new(None);
        let ctx = ctx_at(
            Kind::AssetMapping,
            "assets.[].services.[]",
            &[ListIndex::At(0), ListIndex::At(0)],
        );
        let result = registry.invoke("get_parent_name", &ctx, &root, &[]).unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("first-asset")));
    }

    #[test]
    fn parent_name_for_quota_is_the_plan() {
        let root = root_doc();
        let registry = FunctionRegistry::new(None);
        let ctx = ctx_at(
            Kind::Quota,
            "product.plans.[].quotas.[]",
            &[ListIndex::At(0), ListIndex::At(0)],
        );
        let result = registry.invoke("get_parent_name", &ctx, &root, &[]).unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("gold-plan")));
    }

    #[test]
    fn parent_kind_reads_the_first_segment() {
        let ctx = ctx_at(Kind::ReleaseTag, "product.activate.[]", &[ListIndex::At(0)]);
        let registry = FunctionRegistry::new(None);
        let result = registry.invoke("get_parent_kind", &ctx, &Value::Null, &[]).unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("Product")));
    }

    #[test]
    fn lookup_team_id_resolves_owner() {
        let dir = TempDir::new().unwrap();
        let registry = FunctionRegistry::new(Some(team_file(&dir)));
        let root = root_doc();
        let ctx = ctx_at(Kind::Asset, "assets.[]", &[ListIndex::At(0)]);
        let result = registry.invoke("lookup_team_id", &ctx, &root, &[]).unwrap();
        assert_eq!(result, FuncResult::Value(Value::from("t-123")));
    }

    #[test]
    fn lookup_team_id_without_directory_is_fatal() {
        let registry = FunctionRegistry::new(None);
        let root = root_doc();
        let ctx = ctx_at(Kind::Asset, "assets.[]", &[ListIndex::At(0)]);
        let err = registry.invoke("lookup_team_id", &ctx, &root, &[]).unwrap_err();
        assert!(matches!(err, RenderError::TeamDirectoryMissing));
    }

    #[test]
    fn lookup_teams_ids_maps_known_teams_only() {
        let dir = TempDir::new().unwrap();
        let registry = FunctionRegistry::new(Some(team_file(&dir)));
        let root = root_doc();
        let ctx = ctx_at(
            Kind::AccessControlList,
            "assets.[].accessControlList.[]",
            &[ListIndex::At(0), ListIndex::All],
        );
        let result = registry.invoke("lookup_teams_ids", &ctx, &root, &[]).unwrap();
        let FuncResult::Value(Value::Sequence(subjects)) = result else {
            panic!("expected a sequence result");
        };
        // Ghost Team is not in the directory and is skipped.
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].get("id"), Some(&Value::from("t-123")));
        assert_eq!(subjects[0].get("type"), Some(&Value::from("team")));
    }

    #[test]
    fn asset_name_list_intersects_declared_and_defined() {
        let registry = FunctionRegistry::new(None);
        let root = root_doc();
        let ctx = ctx_at(Kind::Product, "product", &[]);
        let result = registry.invoke("get_asset_name_list", &ctx, &root, &[]).unwrap();
        let FuncResult::Value(Value::Sequence(names)) = result else {
            panic!("expected a sequence result");
        };
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].get("name"), Some(&Value::from("first-asset")));
    }

    #[test]
    fn asset_resources_prefer_declared_titles() {
        let registry = FunctionRegistry::new(None);
        let root = root_doc();
        let ctx = ctx_at(
            Kind::Quota,
            "product.plans.[].quotas.[]",
            &[ListIndex::At(0), ListIndex::At(0)],
        );
        let result = registry.invoke("get_asset_resources", &ctx, &root, &[]).unwrap();
        let FuncResult::Value(Value::Sequence(resources)) = result else {
            panic!("expected a sequence result");
        };
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].get("kind"), Some(&Value::from("AssetResource")));
        assert_eq!(
            resources[0].get("name"),
            Some(&Value::from("first-asset/service-one"))
        );
    }

    #[test]
    fn unknown_function_reports_unknown() {
        let registry = FunctionRegistry::new(None);
        let ctx = RenderContext::root(Value::Null);
        let result = registry.invoke("doesNotExist", &ctx, &Value::Null, &[]).unwrap();
        assert_eq!(result, FuncResult::Unknown);
    }

    #[test]
    fn team_directory_loads_once() {
        let dir = TempDir::new().unwrap();
        let path = team_file(&dir);
        let directory = TeamDirectory::new(path.clone());
        assert_eq!(directory.teams().unwrap().len(), 2);
        // Replace the file; the memoized view must not change.
        fs::write(&path, "teams: []\n").unwrap();
        assert_eq!(directory.teams().unwrap().len(), 2);
    }
}
