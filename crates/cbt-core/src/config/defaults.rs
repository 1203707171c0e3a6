//! Built-in default configuration
//!
//! The baseline is merged underneath every project file. The tool layers
//! only fill gaps and are applied conditionally, always in the order
//! test tools, test preprocessors, test assembler, release tools, release
//! assembler.

use crate::Result;
use serde_yaml::Value;

const BASELINE: &str = r##"
project:
  use_exceptions: true
  use_mocks: true
  use_test_preprocessor: false
  use_deep_dependencies: false
  use_backtrace: false
  test_file_prefix: test_
  compile_threads: 1
  test_threads: 1
  release_build: false
  debug: false

test_build:
  use_assembly: false

release_build:
  output: project
  use_assembly: false
  artifacts: []

files:
  test: []
  source: []
  assembly: []
  support: []
  include: []

environment: []

defines: {}

flags: {}

libraries:
  flag: "-l${1}"
  path_flag: "-L ${1}"
  test: []
  release: []

plugins:
  load_paths: []
  enabled: []

extension:
  header: .h
  source: .c
  assembly: .s
  object: .o
  libraries: [.a, .so]
  testpass: .pass
  testfail: .fail
  dependencies: .d
  map: .map
  list: .lst

unity:
  use_param_tests: false

cmock:
  includes: []

test_runner:
  includes: []
"##;

const TEST_TOOLS: &str = r##"
tools:
  test_compiler:
    executable: "#{env:CC|gcc}"
    arguments:
      - -I"${5}"
      - -D"${6}"
      - -DGNU_COMPILER
      - -g
      - -c "${1}"
      - -o "${2}"
  test_linker:
    executable: "#{env:CCLD|gcc}"
    arguments:
      - "${1}"
      - "${5}"
      - -o "${2}"
      - "${4}"
  test_fixture:
    executable: "${1}"
    arguments: []
"##;

const TEST_PREPROCESSORS: &str = r##"
tools:
  test_shallow_includes_preprocessor:
    executable: "#{env:CC|gcc}"
    arguments:
      - -E
      - -MM
      - -MG
      - -I"${2}"
      - -D"${3}"
      - -nostdinc
      - -x c
      - "${1}"
  test_nested_includes_preprocessor:
    executable: "#{env:CC|gcc}"
    arguments:
      - -E
      - -MM
      - -MG
      - -H
      - -I"${2}"
      - -D"${3}"
      - -nostdinc
      - -x c
      - "${1}"
  test_file_preprocessor:
    executable: "#{env:CC|gcc}"
    arguments:
      - -E
      - -I"${4}"
      - -D"${3}"
      - -DGNU_COMPILER
      - -x c
      - "${1}"
      - -o "${2}"
  test_file_preprocessor_directives:
    executable: "#{env:CC|gcc}"
    arguments:
      - -E
      - -I"${4}"
      - -D"${3}"
      - -DGNU_COMPILER
      - -fdirectives-only
      - -x c
      - "${1}"
      - -o "${2}"
"##;

const TEST_ASSEMBLER: &str = r##"
tools:
  test_assembler:
    executable: "#{env:AS|as}"
    arguments:
      - -I"${3}"
      - "${1}"
      - -o "${2}"
"##;

const RELEASE_TOOLS: &str = r##"
tools:
  release_compiler:
    executable: "#{env:CC|gcc}"
    arguments:
      - -I"${5}"
      - -D"${6}"
      - -DGNU_COMPILER
      - -c "${1}"
      - -o "${2}"
  release_linker:
    executable: "#{env:CCLD|gcc}"
    arguments:
      - "${1}"
      - "${5}"
      - -o "${2}"
      - "${4}"
"##;

const RELEASE_ASSEMBLER: &str = r##"
tools:
  release_assembler:
    executable: "#{env:AS|as}"
    arguments:
      - -I"${3}"
      - "${1}"
      - -o "${2}"
"##;

/// Native executable suffix recorded under `extension.executable`.
pub const EXECUTABLE_EXTENSION: &str = if cfg!(windows) { ".exe" } else { ".out" };

/// The default trees applied by `populate_defaults`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultSet {
    pub baseline: Value,
    pub test_tools: Value,
    pub test_preprocessors: Value,
    pub test_assembler: Value,
    pub release_tools: Value,
    pub release_assembler: Value,
}

impl DefaultSet {
    /// Parse the built-in default documents.
    pub fn builtin() -> Result<Self> {
        let mut baseline: Value = serde_yaml::from_str(BASELINE)?;
        if let Some(extension) = super::tree::ensure_mapping(&mut baseline, "extension") {
            extension.insert("executable".into(), EXECUTABLE_EXTENSION.into());
        }

        Ok(Self {
            baseline,
            test_tools: serde_yaml::from_str(TEST_TOOLS)?,
            test_preprocessors: serde_yaml::from_str(TEST_PREPROCESSORS)?,
            test_assembler: serde_yaml::from_str(TEST_ASSEMBLER)?,
            release_tools: serde_yaml::from_str(RELEASE_TOOLS)?,
            release_assembler: serde_yaml::from_str(RELEASE_ASSEMBLER)?,
        })
    }

    /// Replace the baseline, keeping the built-in tool layers.
    pub fn with_baseline(mut self, baseline: Value) -> Self {
        self.baseline = baseline;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tree::lookup;

    #[test]
    fn builtin_documents_parse() {
        let defaults = DefaultSet::builtin().unwrap();
        assert!(lookup(&defaults.test_tools, &["tools", "test_compiler"]).is_some());
        assert_eq!(
            lookup(&defaults.baseline, &["extension", "executable"]),
            Some(&Value::from(EXECUTABLE_EXTENSION))
        );
    }

    #[test]
    fn tool_executables_keep_environment_expressions() {
        let defaults = DefaultSet::builtin().unwrap();
        assert_eq!(
            lookup(&defaults.test_tools, &["tools", "test_compiler", "executable"]),
            Some(&Value::from("#{env:CC|gcc}"))
        );
        assert_eq!(
            lookup(&defaults.test_assembler, &["tools", "test_assembler", "executable"]),
            Some(&Value::from("#{env:AS|as}"))
        );
    }

    #[test]
    fn baseline_leaves_required_values_to_the_project() {
        let defaults = DefaultSet::builtin().unwrap();
        assert!(lookup(&defaults.baseline, &["project", "build_root"]).is_none());
        assert!(lookup(&defaults.baseline, &["paths"]).is_none());
    }
}
