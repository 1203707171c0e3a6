//! Plugin discovery and configuration merging

pub mod coordinator;
pub mod coverage;
pub mod discovery;

pub use coordinator::{BUILTIN_PLUGIN_PATH, PLUGIN_PATH_TOKEN, PluginCoordinator};
pub use coverage::CoveragePlugin;
pub use discovery::PluginContribution;
