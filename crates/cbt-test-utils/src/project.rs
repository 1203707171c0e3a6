//! [`TestProject`] builder for configuration scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Project file name written by [`TestProject::write_project`].
pub const PROJECT_FILE: &str = "project.yml";

/// A temporary project directory with helpers for laying out sources,
/// plugins and project files.
///
/// # Example
///
/// ```rust,no_run
/// use cbt_test_utils::TestProject;
///
/// let project = TestProject::c_project();
/// project.write_file("src/extra.c", "int extra;");
/// let project_file = project.write_project("project: {build_root: build}");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A project with `src/`, `test/` and `test/support/` and a few files:
    ///
    /// ```text
    /// src/model.c  src/model.h  src/mocks/mock_skip.c
    /// test/test_model.c  test/test_other.c
    /// test/support/helper.c  test/support/helper.h
    /// ```
    pub fn c_project() -> Self {
        let project = Self::new();
        project.write_file("src/model.c", "#include \"model.h\"\n");
        project.write_file("src/model.h", "void model(void);\n");
        project.write_file("src/mocks/mock_skip.c", "");
        project.write_file("test/test_model.c", "#include \"unity.h\"\n");
        project.write_file("test/test_other.c", "#include \"unity.h\"\n");
        project.write_file("test/support/helper.c", "");
        project.write_file("test/support/helper.h", "");
        project
    }

    /// Root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` below the root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Root path as a forward-slash string, for embedding in YAML.
    pub fn root_str(&self) -> String {
        self.root().to_string_lossy().replace('\\', "/")
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn create_dir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Write the project file and return its path.
    pub fn write_project(&self, yaml: &str) -> PathBuf {
        self.write_file(PROJECT_FILE, yaml)
    }

    /// Create a plugin directory `<load_path>/<name>` and return it.
    ///
    /// Each optional part is written only when given: build rules, a
    /// script entry point, the merged fragment and the defaults fragment.
    pub fn create_plugin(&self, load_path: &str, name: &str, parts: PluginParts<'_>) -> PathBuf {
        let dir = self.create_dir(&format!("{load_path}/{name}"));
        let base = format!("{load_path}/{name}");
        if let Some(rules) = parts.rules {
            self.write_file(&format!("{base}/{name}.rules"), rules);
        }
        if let Some(script) = parts.script {
            self.write_file(&format!("{base}/lib/{name}.py"), script);
        }
        if let Some(config) = parts.config {
            self.write_file(&format!("{base}/config/{name}.yml"), config);
        }
        if let Some(defaults) = parts.defaults {
            self.write_file(&format!("{base}/config/defaults.yml"), defaults);
        }
        dir
    }

    /// Assert that `relative` exists below the root.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }
}

/// Optional contents of a plugin created by [`TestProject::create_plugin`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginParts<'a> {
    pub rules: Option<&'a str>,
    pub script: Option<&'a str>,
    pub config: Option<&'a str>,
    pub defaults: Option<&'a str>,
}
