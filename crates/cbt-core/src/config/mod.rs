//! Configuration resolution
//!
//! A project tree passes through these stages before anything reads it:
//!
//! 1. **Imports** - files listed under `import` are merged in order
//! 2. **Defaults** - the baseline is merged underneath, tool layers fill gaps
//! 3. **Plugins** - enabled plugins contribute fragments and defaults
//! 4. **Evaluation** - tools are completed, `environment` is exported,
//!    path-bearing values are substituted and normalized
//! 5. **Validation** - every problem is collected and reported together
//! 6. **Build** - the tree is flattened into a [`FlatConfig`]
//!
//! # Example
//!
//! ```ignore
//! use cbt_core::config::{Configurator, RecordedEnvironment};
//! use cbt_core::RunFlags;
//!
//! let mut configurator = Configurator::new("/path/to/project", RunFlags::default())?;
//! let mut tree = serde_yaml::from_str(project_yml)?;
//! configurator.populate_defaults(&mut tree);
//! configurator.build(&tree, &["environment"])?;
//! let output = configurator.config().project_test_build_output_path();
//! ```

pub mod configurator;
pub mod defaults;
pub mod environment;
pub mod flatten;
pub mod generators;
pub mod paths;
pub mod project;
pub mod registry;
pub mod tools;
pub mod tree;
pub mod validation;

pub use configurator::Configurator;
pub use defaults::DefaultSet;
pub use environment::{EnvironmentSink, ProcessEnvironment, RecordedEnvironment};
pub use registry::FlatConfig;
pub use tools::{StdErrRedirect, ToolDefinition};
pub use validation::Validator;
