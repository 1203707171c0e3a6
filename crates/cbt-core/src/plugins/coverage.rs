//! Built-in coverage plugin
//!
//! The on-disk part lives in the crate's `plugins/coverage/` directory and
//! supplies the coverage tool defaults. The in-process part below supplies
//! the structured `coverage` section defaults and computes the flattened
//! overrides that send test output to a separate build tree.

use crate::config::Configurator;
use crate::config::project::anchor;
use crate::config::registry::FlatConfig;
use crate::{Error, Result};
use cbt_fs::{NormalizedPath, collect_paths};
use indexmap::IndexMap;
use serde_yaml::Value;

pub const NAME: &str = "coverage";

/// Symbol defined for every test compilation of a coverage build.
pub const COVERAGE_DEFINE: &str = "CODE_COVERAGE";

const STRUCTURED_DEFAULTS: &str = r#"
coverage:
  uncovered_ignore_list: []
  abort_on_uncovered: false
  html_report_filter: ""
"#;

/// Defaults for the `coverage` section.
pub fn structured_defaults() -> Result<Value> {
    Ok(serde_yaml::from_str(STRUCTURED_DEFAULTS)?)
}

/// Flattened overrides for coverage builds.
#[derive(Debug, Clone, PartialEq)]
pub struct CoveragePlugin {
    root: NormalizedPath,
}

impl CoveragePlugin {
    /// Plugin rooted at `<build_root>/coverage`.
    pub fn new(config: &FlatConfig) -> Result<Self> {
        let build_root = config
            .project_build_root()
            .ok_or_else(|| Error::UnknownKey {
                key: "project_build_root".into(),
            })?;
        Ok(Self {
            root: NormalizedPath::new(build_root).join(NAME),
        })
    }

    /// Root of the coverage build tree.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Entries replacing the regular test build locations.
    ///
    /// Test output, results and dependency paths move below the coverage
    /// root, and `CODE_COVERAGE` joins the test defines (the wildcard
    /// selector of a selector map).
    pub fn overrides(&self, config: &FlatConfig) -> IndexMap<String, Value> {
        let output = Value::from(self.root.join("out").as_str());
        let mut overrides = IndexMap::new();
        overrides.insert("project_test_build_output_path".to_string(), output.clone());
        overrides.insert("project_test_build_output_c_path".to_string(), output);
        overrides.insert(
            "project_test_results_path".to_string(),
            Value::from(self.root.join("results").as_str()),
        );
        overrides.insert(
            "project_test_dependencies_path".to_string(),
            Value::from(self.root.join("dependencies").as_str()),
        );
        overrides.insert(
            "defines_test".to_string(),
            with_coverage_define(config.get("defines_test")),
        );
        overrides
    }

    /// Redirect the configurator's flattened test build locations.
    pub fn apply(&self, configurator: &mut Configurator) {
        let overrides = self.overrides(configurator.config());
        tracing::debug!(
            root = %self.root,
            entries = overrides.len(),
            "Applying coverage overrides"
        );
        configurator.replace_flattened(overrides);
    }

    /// Directories excluded from the uncovered-file report.
    pub fn uncovered_ignore_paths(
        config: &FlatConfig,
        root: &NormalizedPath,
    ) -> Result<Vec<String>> {
        let specs: Vec<String> = config
            .get_list("coverage_uncovered_ignore_list")
            .iter()
            .map(|spec| anchor(root, spec))
            .collect();
        Ok(collect_paths(&specs)?)
    }
}

fn with_coverage_define(defines: Option<&Value>) -> Value {
    let define = Value::from(COVERAGE_DEFINE);
    match defines {
        Some(Value::Sequence(symbols)) => {
            let mut symbols = symbols.clone();
            symbols.push(define);
            Value::Sequence(symbols)
        }
        Some(Value::Mapping(selectors)) => {
            let mut selectors = selectors.clone();
            match selectors.get_mut("*") {
                Some(Value::Sequence(symbols)) => symbols.push(define),
                Some(Value::String(symbol)) => {
                    let existing = Value::from(symbol.as_str());
                    selectors.insert("*".into(), Value::Sequence(vec![existing, define]));
                }
                _ => {
                    selectors.insert("*".into(), Value::Sequence(vec![define]));
                }
            }
            Value::Mapping(selectors)
        }
        Some(Value::String(symbol)) => {
            Value::Sequence(vec![Value::from(symbol.as_str()), define])
        }
        _ => Value::Sequence(vec![define]),
    }
}
