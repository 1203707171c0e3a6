//! Configuration resolution engine for the cbt C build and test orchestrator
//!
//! This crate turns a project's YAML configuration into the flattened,
//! validated settings that a build run consumes:
//!
//! - **Resolution**: imports, layered defaults, plugin fragments, tool setup,
//!   environment export and path evaluation over one configuration tree
//! - **Validation**: every problem of a pass is collected and reported at once
//! - **Registry**: the tree is flattened into [`FlatConfig`] with derived
//!   build paths and lazily resolved file collections
//! - **Matchers**: per-file preprocessor defines and tool flags
//! - **Plugins**: discovery on load paths and the built-in coverage plugin
//!
//! # Architecture
//!
//! ```text
//!                  ProjectSetup
//!                       |
//!                  Configurator
//!                       |
//!     +--------+--------+---------+-----------+
//!     |        |        |         |           |
//!  defaults  plugins  expression  validation  registry
//!                       |
//!                    cbt-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cbt_core::{ProcessEnvironment, ProjectSetup, RunFlags};
//!
//! let resolved = ProjectSetup::new("project.yml")
//!     .with_flags(RunFlags::from_env())
//!     .run(&mut ProcessEnvironment)?;
//! let tests = resolved.config().collection_all_tests();
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod logging;
pub mod matcher;
pub mod plugins;
pub mod setup;
pub mod verbosity;

pub use config::{
    Configurator, DefaultSet, EnvironmentSink, FlatConfig, ProcessEnvironment,
    RecordedEnvironment, StdErrRedirect, ToolDefinition, Validator,
};
pub use error::{Error, Result};
pub use expression::ExpressionContext;
pub use matcher::{DefineMatcher, FlagMatcher, MatcherSpec, Selector};
pub use plugins::{CoveragePlugin, PluginContribution, PluginCoordinator};
pub use setup::{ProjectSetup, ResolvedProject};
pub use verbosity::{RunFlags, Verbosity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_failure() {
        let error = Error::Validation {
            failures: vec!["first problem".into(), "second problem".into()],
        };
        let display = error.to_string();
        assert!(display.contains("2 problem(s)"), "got: {display}");
        assert!(display.contains("  - first problem"), "got: {display}");
        assert!(display.contains("  - second problem"), "got: {display}");
    }

    #[test]
    fn missing_sections_are_named() {
        let error = Error::RequiredSectionMissing {
            sections: vec!["project".into(), "paths".into()],
        };
        assert_eq!(
            error.to_string(),
            "Required configuration section(s) missing: project, paths"
        );
    }
}
