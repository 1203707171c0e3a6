//! Configuration resolution engine
//!
//! The [`Configurator`] owns one resolution pass over a project tree. Each
//! step takes the tree explicitly and mutates it in place; the final
//! [`Configurator::build`] flattens the tree into the [`FlatConfig`] that
//! the rest of a run reads from.

use crate::expression::ExpressionContext;
use crate::plugins::PluginCoordinator;
use crate::verbosity::{RunFlags, Verbosity};
use crate::{Error, Result};
use cbt_fs::{ConfigStore, NormalizedPath};
use serde_yaml::{Mapping, Value};

use super::defaults::DefaultSet;
use super::environment::{self, EnvironmentSink};
use super::flatten::flatten;
use super::generators;
use super::project::{anchor, build_collections, derive_build_paths};
use super::registry::FlatConfig;
use super::tree::{deep_merge, fill_defaults, flag, kind, load_fragment, lookup};
use super::validation::Validator;
use super::{paths, tools};

const IMPORT_KEY: &str = "import";

/// Resolves a project tree into a flattened configuration.
#[derive(Debug, Clone)]
pub struct Configurator {
    project_root: NormalizedPath,
    context: ExpressionContext,
    store: ConfigStore,
    flags: RunFlags,
    check_executables: bool,
    defaults: DefaultSet,
    config: FlatConfig,
    backup: Option<FlatConfig>,
    project_debug: bool,
    runner_config: Mapping,
    cmock_config: Mapping,
    rule_plugins: Vec<String>,
    script_plugins: Vec<String>,
    loaded_plugins: Vec<String>,
}

impl Configurator {
    /// Create a configurator for the project rooted at `project_root`.
    ///
    /// The expression context snapshots the process environment; use
    /// [`Configurator::with_context`] to supply a fixed one.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in default documents fail to parse.
    pub fn new(project_root: impl Into<NormalizedPath>, flags: RunFlags) -> Result<Self> {
        Ok(Self {
            project_root: project_root.into(),
            context: ExpressionContext::from_process(),
            store: ConfigStore::new(),
            flags,
            check_executables: true,
            defaults: DefaultSet::builtin()?,
            config: FlatConfig::default(),
            backup: None,
            project_debug: flags.debug,
            runner_config: Mapping::new(),
            cmock_config: Mapping::new(),
            rule_plugins: Vec::new(),
            script_plugins: Vec::new(),
            loaded_plugins: Vec::new(),
        })
    }

    pub fn with_context(mut self, context: ExpressionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_defaults(mut self, defaults: DefaultSet) -> Self {
        self.defaults = defaults;
        self
    }

    /// Enable or disable the lookup of tool executables during validation.
    pub fn with_executable_checks(mut self, enabled: bool) -> Self {
        self.check_executables = enabled;
        self
    }

    /// The flattened configuration of the last `build`.
    pub fn config(&self) -> &FlatConfig {
        &self.config
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    pub fn project_root(&self) -> &NormalizedPath {
        &self.project_root
    }

    pub fn project_debug(&self) -> bool {
        self.project_debug
    }

    /// Effective verbosity; project debug mode raises it to `Debug`.
    pub fn verbosity(&self) -> Verbosity {
        if self.project_debug {
            Verbosity::Debug
        } else {
            self.flags.verbosity
        }
    }

    /// Names of the discovered plugins with a script entry point.
    pub fn script_plugins(&self) -> &[String] {
        &self.script_plugins
    }

    /// Build-rule files of the discovered plugins.
    pub fn rule_plugins(&self) -> &[String] {
        &self.rule_plugins
    }

    // ------------------------------------------------------------------
    // Tree passes
    // ------------------------------------------------------------------

    /// Apply the engine defaults underneath `tree`.
    ///
    /// The baseline is deep-merged beneath the project's values, then the
    /// tool layers fill gaps in a fixed order. Each layer's condition is
    /// read from the tree as it stands after the layers before it.
    pub fn populate_defaults(&self, tree: &mut Value) {
        let mut merged = self.defaults.baseline.clone();
        deep_merge(&mut merged, tree);
        *tree = merged;

        fill_defaults(tree, &self.defaults.test_tools);
        if flag(tree, &["project", "use_test_preprocessor"]) {
            fill_defaults(tree, &self.defaults.test_preprocessors);
        }
        if flag(tree, &["test_build", "use_assembly"]) {
            fill_defaults(tree, &self.defaults.test_assembler);
        }
        if flag(tree, &["project", "release_build"]) {
            fill_defaults(tree, &self.defaults.release_tools);
            if flag(tree, &["release_build", "use_assembly"]) {
                fill_defaults(tree, &self.defaults.release_assembler);
            }
        }
    }

    /// Merge every file listed under `import`, in declared order.
    ///
    /// `import` may be a list of paths or a mapping of named paths; null
    /// entries are skipped. Relative paths are taken from the project root.
    pub fn resolve_imports(&self, tree: &mut Value) -> Result<()> {
        let Some(imports) = tree
            .as_mapping_mut()
            .and_then(|map| map.shift_remove(IMPORT_KEY))
        else {
            return Ok(());
        };

        let entries: Vec<&Value> = match &imports {
            Value::Null => Vec::new(),
            Value::Sequence(items) => items.iter().collect(),
            Value::Mapping(named) => named.values().collect(),
            other => {
                return Err(Error::MalformedFragment {
                    origin: IMPORT_KEY.into(),
                    message: format!("expected a list or mapping but found a {}", kind(other)),
                });
            }
        };

        for entry in entries {
            let raw = match entry {
                Value::Null => continue,
                Value::String(path) => path.as_str(),
                other => {
                    return Err(Error::MalformedFragment {
                        origin: IMPORT_KEY.into(),
                        message: format!("import path must be a string, found a {}", kind(other)),
                    });
                }
            };
            let evaluated = self.context.substitute(raw)?;
            let path = NormalizedPath::new(anchor(&self.project_root, &evaluated));
            let fragment = load_fragment(&self.store, &path)?;
            deep_merge(tree, &fragment);
            tracing::debug!(import = %path, "Merged imported configuration");
        }

        if let Some(map) = tree.as_mapping_mut() {
            if map.shift_remove(IMPORT_KEY).is_some() {
                tracing::warn!("Nested imports are not followed");
            }
        }
        Ok(())
    }

    /// Record the debug state: the inbound signal or `project.debug`.
    pub fn set_verbosity(&mut self, tree: &Value) {
        self.project_debug = self.flags.debug || flag(tree, &["project", "debug"]);
        tracing::debug!(
            verbosity = %self.verbosity(),
            debug = self.project_debug,
            "Verbosity set"
        );
    }

    /// Snapshot the `unity` and `test_runner` settings for runner generation.
    pub fn populate_unity_defaults(&mut self, tree: &Value) {
        self.runner_config = generators::runner_defaults(tree);
    }

    /// Complete the `cmock` section and snapshot it for mock generation.
    pub fn populate_cmock_defaults(&mut self, tree: &mut Value) {
        let cmock = generators::cmock_defaults(tree, self.verbosity());
        if let Some(map) = tree.as_mapping_mut() {
            map.insert("cmock".into(), Value::Mapping(cmock.clone()));
        }
        self.cmock_config = cmock;
    }

    /// Merge the enabled plugins' configuration into `tree`.
    pub fn merge_plugins(
        &mut self,
        tree: &mut Value,
        coordinator: &mut PluginCoordinator,
    ) -> Result<()> {
        coordinator.merge(tree, &self.context, &self.project_root)?;
        self.rule_plugins = coordinator.rule_files();
        self.script_plugins = coordinator.script_plugins();
        self.loaded_plugins = coordinator.loaded_plugins();
        tracing::info!(
            loaded = self.loaded_plugins.len(),
            rules = self.rule_plugins.len(),
            "Plugins merged"
        );
        Ok(())
    }

    pub fn tools_setup(&self, tree: &mut Value) -> Result<()> {
        tools::setup(tree, &self.context)
    }

    /// Evaluate `environment` and export each variable through `sink`.
    pub fn evaluate_environment(
        &mut self,
        tree: &mut Value,
        sink: &mut dyn EnvironmentSink,
    ) -> Result<()> {
        environment::evaluate(tree, &mut self.context, sink)
    }

    pub fn evaluate_paths(&self, tree: &mut Value) -> Result<()> {
        paths::evaluate(tree, &self.context)
    }

    pub fn standardize_paths(&self, tree: &mut Value) -> Result<()> {
        paths::standardize_all(tree)
    }

    /// Validate the merged tree, reporting every failure at once.
    pub fn validate(&self, tree: &Value) -> Result<()> {
        Validator::new(&self.project_root, &self.loaded_plugins)
            .with_executable_checks(self.check_executables)
            .validate(tree)
    }

    /// Remove the engine's default tools from `tree`.
    pub fn reset_defaults(&self, tree: &mut Value) {
        tools::reset_defaults(tree);
    }

    // ------------------------------------------------------------------
    // Flattened configuration
    // ------------------------------------------------------------------

    /// Flatten `tree` into the registry.
    ///
    /// Derived build paths and collections are added, a restore point is
    /// stored, and the top-level sections named in `extra_keys` are
    /// re-exposed whole.
    pub fn build(&mut self, tree: &Value, extra_keys: &[&str]) -> Result<()> {
        let mut values = flatten(tree);
        values.insert("project_debug".into(), Value::Bool(self.project_debug));
        values.insert(
            "project_verbosity".into(),
            Value::from(u64::from(self.verbosity().level())),
        );
        derive_build_paths(&mut values, tree)?;
        let collections = build_collections(&mut values, tree, &self.project_root)?;

        let mut config = FlatConfig::new(values, collections);
        for key in extra_keys {
            if let Some(section) = lookup(tree, &[*key]) {
                config.expose_section(key, section.clone());
            }
        }

        tracing::info!(entries = config.len(), "Configuration built");
        self.config = config;
        self.store();
        Ok(())
    }

    /// Change an existing flattened entry and refresh the restore point.
    pub fn redefine(&mut self, key: &str, value: Value) -> Result<()> {
        if !self.config.contains_key(key) {
            return Err(Error::UnknownKey { key: key.into() });
        }
        self.config.set(key, value);
        self.store();
        Ok(())
    }

    /// Merge `more` into both `base` and the flattened configuration.
    ///
    /// Only `more` is flattened; its entries deep-merge into existing ones.
    /// Every top-level section of `more` is re-exposed from the merged base.
    pub fn supplement(&mut self, base: &mut Value, more: &Value) -> Result<()> {
        deep_merge(base, more);

        let values = self.config.values_mut();
        for (key, value) in flatten(more) {
            match values.get_mut(&key) {
                Some(existing) => deep_merge(existing, &value),
                None => {
                    values.insert(key, value);
                }
            }
        }

        if let Some(sections) = more.as_mapping() {
            for name in sections.keys().filter_map(Value::as_str) {
                if let Some(section) = lookup(base, &[name]) {
                    self.config.expose_section(name, section.clone());
                }
            }
        }

        self.store();
        Ok(())
    }

    /// Overwrite flattened entries without touching the restore point.
    pub fn replace_flattened(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        for (key, value) in entries {
            self.config.set(key, value);
        }
    }

    /// Remember the current flattened configuration.
    pub fn store(&mut self) {
        self.backup = Some(self.config.clone());
    }

    /// Return to the last stored flattened configuration.
    pub fn restore(&mut self) {
        if let Some(backup) = &self.backup {
            self.config = backup.clone();
        }
    }

    /// Append `tools_<name>.arguments` lists to the built tools and refresh
    /// the restore point.
    pub fn tools_supplement_arguments(&mut self, tree: &Value) -> Result<()> {
        tools::supplement_arguments(tree, self.config.values_mut())?;
        self.store();
        Ok(())
    }

    /// Add the discovered plugin rule files to the build rule components and
    /// refresh the restore point.
    pub fn insert_rule_plugins(&mut self) {
        let mut files = self.config.project_rule_component_files();
        for rules in &self.rule_plugins {
            if !files.contains(rules) {
                files.push(rules.clone());
            }
        }
        self.config.set(
            "project_rule_component_files",
            Value::Sequence(files.into_iter().map(Value::String).collect()),
        );
        self.store();
    }

    /// Resolve every file collection now.
    ///
    /// Collections resolve only once, so files created afterwards are not
    /// picked up.
    pub fn resolve_collections(&self) -> usize {
        let mut total = 0;
        for (name, list) in self.config.collections() {
            let files = list.resolve();
            tracing::debug!(collection = name, files = files.len(), "Collection resolved");
            total += files.len();
        }
        total
    }

    /// Settings for the test-runner generator.
    pub fn get_runner_config(&self) -> Mapping {
        generators::merge_runner(&self.cmock_config, &self.runner_config)
    }

    /// Settings for the mock generator.
    pub fn get_cmock_config(&self) -> Mapping {
        self.cmock_config.clone()
    }
}
