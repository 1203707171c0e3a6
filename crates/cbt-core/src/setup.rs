//! Project setup pipeline
//!
//! [`ProjectSetup`] runs every resolution step over a project file in the
//! order the steps depend on each other and hands back a
//! [`ResolvedProject`] only when all of them succeeded.

use crate::Result;
use crate::config::tree::load_fragment;
use crate::config::{Configurator, EnvironmentSink, FlatConfig};
use crate::expression::ExpressionContext;
use crate::plugins::PluginCoordinator;
use crate::verbosity::RunFlags;
use cbt_fs::{ConfigStore, NormalizedPath};
use serde_yaml::Value;

/// Sections re-exposed whole after flattening.
const EXPOSED_SECTIONS: &[&str] = &["environment"];

/// Builder for one resolution run over a project file.
#[derive(Debug)]
pub struct ProjectSetup {
    project_file: NormalizedPath,
    flags: RunFlags,
    context: Option<ExpressionContext>,
    check_executables: bool,
    coordinator: Option<PluginCoordinator>,
}

impl ProjectSetup {
    /// Set up the project described by `project_file`.
    ///
    /// The project root is the directory holding the file.
    pub fn new(project_file: impl Into<NormalizedPath>) -> Self {
        Self {
            project_file: project_file.into(),
            flags: RunFlags::default(),
            context: None,
            check_executables: true,
            coordinator: None,
        }
    }

    pub fn with_flags(mut self, flags: RunFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Evaluate expressions against `context` instead of the process state.
    pub fn with_context(mut self, context: ExpressionContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_executable_checks(mut self, enabled: bool) -> Self {
        self.check_executables = enabled;
        self
    }

    pub fn with_coordinator(mut self, coordinator: PluginCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Run the pipeline, exporting `environment` entries through `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Validation failures arrive
    /// together as one [`crate::Error::Validation`].
    pub fn run(self, sink: &mut dyn EnvironmentSink) -> Result<ResolvedProject> {
        let root = self
            .project_file
            .parent()
            .unwrap_or_else(|| NormalizedPath::new("."));
        tracing::info!(project = %self.project_file, root = %root, "Resolving project configuration");

        let mut configurator = Configurator::new(root, self.flags)?
            .with_executable_checks(self.check_executables);
        if let Some(context) = self.context {
            configurator = configurator.with_context(context);
        }
        let mut coordinator = match self.coordinator {
            Some(coordinator) => coordinator,
            None => PluginCoordinator::new()?,
        };

        let mut tree = load_fragment(&ConfigStore::new(), &self.project_file)?;

        configurator.resolve_imports(&mut tree)?;
        configurator.set_verbosity(&tree);
        configurator.populate_defaults(&mut tree);
        configurator.populate_unity_defaults(&tree);
        configurator.populate_cmock_defaults(&mut tree);
        configurator.merge_plugins(&mut tree, &mut coordinator)?;
        configurator.tools_setup(&mut tree)?;
        configurator.evaluate_environment(&mut tree, sink)?;
        configurator.evaluate_paths(&mut tree)?;
        configurator.standardize_paths(&mut tree)?;
        configurator.validate(&tree)?;
        configurator.build(&tree, EXPOSED_SECTIONS)?;
        configurator.insert_rule_plugins();
        configurator.tools_supplement_arguments(&tree)?;

        tracing::info!(
            entries = configurator.config().len(),
            plugins = coordinator.discovered().len(),
            "Project configuration resolved"
        );

        Ok(ResolvedProject {
            configurator,
            tree,
            coordinator,
        })
    }
}

/// Outcome of a successful [`ProjectSetup::run`].
#[derive(Debug)]
pub struct ResolvedProject {
    configurator: Configurator,
    tree: Value,
    coordinator: PluginCoordinator,
}

impl ResolvedProject {
    pub fn config(&self) -> &FlatConfig {
        self.configurator.config()
    }

    /// The merged and evaluated tree the configuration was built from.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn coordinator(&self) -> &PluginCoordinator {
        &self.coordinator
    }

    pub fn configurator(&self) -> &Configurator {
        &self.configurator
    }

    /// For later passes such as `supplement`, `redefine` or coverage overrides.
    pub fn configurator_mut(&mut self) -> &mut Configurator {
        &mut self.configurator
    }

    /// Split into the configurator and the merged tree.
    pub fn into_parts(self) -> (Configurator, Value) {
        (self.configurator, self.tree)
    }
}
