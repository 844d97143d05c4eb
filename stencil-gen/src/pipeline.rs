//! Run pipeline — the canonical merge → reset → walk → write entrypoint
//! shared by the CLI and by embedding callers.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_yaml::Value;

use stencil_core::source;
use stencil_core::types::KeyPath;
use stencil_renderer::{FunctionRegistry, RenderContext};

use crate::error::GenError;
use crate::walker::Walker;
use crate::writer::{OutputWriter, WriteResult};

/// Configuration for one generation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source YAML files and/or directories.
    pub inputs: Vec<PathBuf>,
    /// Output directory — deleted and recreated at the start of the run.
    pub output: PathBuf,
    /// Directory holding the registered template files.
    pub templates: PathBuf,
    /// Optional defaults document merged underneath the inputs.
    pub defaults: Option<PathBuf>,
    /// Optional team directory file backing the `lookup_*` functions.
    pub teams: Option<PathBuf>,
    /// Directory holding icon assets for `Product`/`Asset` documents.
    pub icons: PathBuf,
    /// Report what would be written without touching the filesystem.
    pub dry_run: bool,
}

/// Summary of one generation run.
#[derive(Debug)]
pub struct GenReport {
    pub started_at: DateTime<Utc>,
    pub writes: Vec<WriteResult>,
}

/// Run the full pipeline: load and validate the inputs, overlay defaults,
/// reset the output directory, then walk the merged document emitting one
/// output document per matched position.
pub fn run(opts: &RunOptions) -> Result<GenReport, GenError> {
    let started_at = Utc::now();

    let mut combined = source::load_and_validate(&opts.inputs)?;
    if let Some(defaults_path) = &opts.defaults {
        let defaults = source::load_and_validate(&[defaults_path.clone()])?;
        tracing::info!("applying defaults from {}", defaults_path.display());
        let merged = source::deep_merge(
            &Value::Mapping(defaults),
            Value::Mapping(combined),
        );
        combined = merged.as_mapping().cloned().unwrap_or_default();
    }

    let root = Value::Mapping(combined.clone());
    let funcs = FunctionRegistry::new(opts.teams.clone());
    let mut writer = OutputWriter::new(opts.output.clone(), opts.icons.clone(), opts.dry_run);
    writer.reset()?;

    let walker = Walker::new(&opts.templates, &funcs, &root);
    let ctx = RenderContext::root(root.clone());
    walker.walk(&combined, &KeyPath::root(), &ctx, &mut writer)?;

    tracing::info!("all documents written to '{}'", opts.output.display());
    Ok(GenReport {
        started_at,
        writes: writer.into_results(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_yaml::Value;
    use tempfile::TempDir;

    use stencil_core::error::CoreError;

    use super::*;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let dir = TempDir::new().expect("tempdir");
            fs::create_dir_all(dir.path().join("templates")).unwrap();
            fs::create_dir_all(dir.path().join("sources")).unwrap();
            Fixture { dir }
        }

        fn template(&self, name: &str, contents: &str) {
            fs::write(self.dir.path().join("templates").join(name), contents).unwrap();
        }

        fn source(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join("sources").join(name);
            fs::write(&path, contents).unwrap();
            path
        }

        fn options(&self, inputs: Vec<PathBuf>) -> RunOptions {
            RunOptions {
                inputs,
                output: self.dir.path().join("out"),
                templates: self.dir.path().join("templates"),
                defaults: None,
                teams: None,
                icons: self.dir.path().join("icons"),
                dry_run: false,
            }
        }

        fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }
    }

    fn read_docs(path: &Path) -> Vec<Value> {
        let contents = fs::read_to_string(path).expect("output file");
        serde_yaml::Deserializer::from_str(&contents)
            .map(|d| serde::Deserialize::deserialize(d).expect("doc"))
            .collect()
    }

    #[test]
    fn asset_names_come_out_kebab_cased() {
        // Scenario A: a named asset routed through a template containing
        // `{{name}}` yields the slugged name.
        let fx = Fixture::new();
        fx.template("asset.yaml", "kind: Asset\nmetadata:\n  name: '{{name}}'\n");
        let input = fx.source("account.yaml", "assets:\n  - name: My Asset\n");
        let report = run(&fx.options(vec![input])).expect("run");
        assert_eq!(report.writes.len(), 1);
        let docs = read_docs(&fx.out().join("Asset.yaml"));
        assert_eq!(
            docs[0].get("metadata").unwrap().get("name"),
            Some(&Value::from("my-asset"))
        );
    }

    #[test]
    fn list_items_emit_depth_first() {
        // Scenario B: two items produce two documents, each item's children
        // recursed into before the next item begins.
        let fx = Fixture::new();
        fx.template("asset.yaml", "kind: Asset\nmetadata:\n  name: '{{name}}'\n");
        fx.template(
            "release-tag-asset.yaml",
            "kind: ReleaseTag\nmetadata:\n  scope:\n    kind: Asset\n    name: '{{func.get_parent_name}}'\n",
        );
        let input = fx.source(
            "account.yaml",
            "assets:\n  - name: One\n    activate:\n      - version: '1.0'\n  - name: Two\n    activate:\n      - version: '2.0'\n",
        );
        let report = run(&fx.options(vec![input])).expect("run");
        let names: Vec<String> = report
            .writes
            .iter()
            .map(|w| w.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Asset.yaml",
                "ReleaseTag-Asset-one.yaml",
                "Asset.yaml",
                "ReleaseTag-Asset-two.yaml",
            ]
        );
    }

    #[test]
    fn duplicate_top_level_key_aborts_with_no_output() {
        // Scenario C: the duplicate is fatal and nothing is written.
        let fx = Fixture::new();
        fx.template("asset.yaml", "kind: Asset\nmetadata: {}\n");
        let a = fx.source("a.yaml", "assets:\n  - name: One\n");
        let b = fx.source("b.yaml", "assets:\n  - name: Two\n");
        let err = run(&fx.options(vec![a, b])).unwrap_err();
        assert!(matches!(
            err,
            GenError::Core(CoreError::DuplicateKey { .. })
        ));
        assert!(!fx.out().exists(), "no output may exist after a validation failure");
    }

    #[test]
    fn unknown_function_token_survives_to_the_output() {
        // Scenario D: the literal token is preserved and the run succeeds.
        let fx = Fixture::new();
        fx.template(
            "asset.yaml",
            "kind: Asset\nmetadata:\n  name: '{{name}}'\n  owner: '{{func.doesNotExist}}'\n",
        );
        let input = fx.source("account.yaml", "assets:\n  - name: My Asset\n");
        run(&fx.options(vec![input])).expect("run must complete");
        let docs = read_docs(&fx.out().join("Asset.yaml"));
        assert_eq!(
            docs[0].get("metadata").unwrap().get("owner"),
            Some(&Value::from("{{func.doesNotExist}}"))
        );
    }

    #[test]
    fn defaults_merge_underneath_the_inputs() {
        let fx = Fixture::new();
        fx.template(
            "product.yaml",
            "kind: Product\nspec:\n  title: '{{title}}'\n  tier: '{{tier}}'\n",
        );
        let defaults = fx.source("defaults.yaml", "product:\n  tier: standard\n");
        let input = fx.source("account.yaml", "product:\n  title: P\n");
        let mut opts = fx.options(vec![input]);
        opts.defaults = Some(defaults);
        run(&opts).expect("run");
        let docs = read_docs(&fx.out().join("Product.yaml"));
        assert_eq!(
            docs[0].get("spec").unwrap().get("tier"),
            Some(&Value::from("standard"))
        );
    }

    #[test]
    fn rerun_resets_previous_output() {
        let fx = Fixture::new();
        fx.template("asset.yaml", "kind: Asset\nmetadata:\n  name: '{{name}}'\n");
        let input = fx.source("account.yaml", "assets:\n  - name: Only\n");
        run(&fx.options(vec![input.clone()])).expect("first run");
        run(&fx.options(vec![input])).expect("second run");
        let docs = read_docs(&fx.out().join("Asset.yaml"));
        assert_eq!(docs.len(), 1, "output must be reset, not appended across runs");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let fx = Fixture::new();
        fx.template("asset.yaml", "kind: Asset\nmetadata:\n  name: '{{name}}'\n");
        let input = fx.source("account.yaml", "assets:\n  - name: One\n  - name: Two\n");
        let mut opts = fx.options(vec![input]);
        opts.dry_run = true;
        let report = run(&opts).expect("dry run");
        assert_eq!(report.writes.len(), 2);
        assert!(report
            .writes
            .iter()
            .all(|w| matches!(w, crate::writer::WriteResult::WouldWrite { .. })));
        assert!(!fx.out().exists(), "dry-run must not create files");
    }

    #[test]
    fn team_lookup_flows_through_the_pipeline() {
        let fx = Fixture::new();
        fx.template(
            "asset.yaml",
            "kind: Asset\nmetadata:\n  name: '{{name}}'\nspec:\n  owner: '{{func.lookup_team_id}}'\n",
        );
        let teams = fx.source(
            "central-teams.yaml",
            "teams:\n  - id: t-1\n    name: Core Team\n",
        );
        let input = fx.source(
            "account.yaml",
            "assets:\n  - name: A\n    owner:\n      teamName: Core Team\n",
        );
        let mut opts = fx.options(vec![input]);
        opts.teams = Some(teams);
        run(&opts).expect("run");
        let docs = read_docs(&fx.out().join("Asset.yaml"));
        assert_eq!(
            docs[0].get("spec").unwrap().get("owner"),
            Some(&Value::from("t-1"))
        );
    }
}
