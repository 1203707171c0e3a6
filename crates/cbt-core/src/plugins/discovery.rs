//! Plugin discovery
//!
//! A plugin is a directory named after it on one of the load paths:
//!
//! ```text
//! <load_path>/<name>/
//!     <name>.rules          build-graph rules
//!     lib/<name>.*          script entry point
//!     config/<name>.yml     configuration fragment (merged, overrides)
//!     config/defaults.yml   default fragment (fills gaps)
//! ```

use cbt_fs::NormalizedPath;
use serde_yaml::Value;

/// What a discovered plugin contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginContribution {
    pub name: String,
    pub dir: NormalizedPath,
    pub rules_file: Option<NormalizedPath>,
    pub script: Option<NormalizedPath>,
    pub config_fragment: Option<NormalizedPath>,
    pub yml_defaults: Option<NormalizedPath>,
    /// Structured defaults of an in-process built-in plugin.
    pub hash_defaults: Option<Value>,
}

impl PluginContribution {
    pub fn has_rules(&self) -> bool {
        self.rules_file.is_some()
    }

    /// Script plugins have a script file or are built into the engine.
    pub fn is_script(&self) -> bool {
        self.script.is_some() || self.hash_defaults.is_some()
    }
}

/// Find each enabled plugin on the load paths.
///
/// Plugins are returned in enabled-list order; for each, the first load
/// path holding a directory of that name wins. Plugins found nowhere are
/// reported and skipped.
pub fn discover(
    enabled: &[String],
    load_paths: &[NormalizedPath],
    builtin_defaults: impl Fn(&str) -> Option<Value>,
) -> Vec<PluginContribution> {
    let mut found = Vec::new();

    for name in enabled {
        let Some(dir) = load_paths
            .iter()
            .map(|load_path| load_path.join(name))
            .find(NormalizedPath::is_dir)
        else {
            tracing::warn!(plugin = %name, "Enabled plugin not found in any load path");
            continue;
        };

        let contribution = PluginContribution {
            name: name.clone(),
            rules_file: existing_file(dir.join(&format!("{name}.rules"))),
            script: find_script(&dir, name),
            config_fragment: existing_file(dir.join(&format!("config/{name}.yml"))),
            yml_defaults: existing_file(dir.join("config/defaults.yml")),
            hash_defaults: builtin_defaults(name.as_str()),
            dir,
        };
        tracing::debug!(
            plugin = %name,
            dir = %contribution.dir,
            rules = contribution.has_rules(),
            script = contribution.is_script(),
            "Discovered plugin"
        );
        found.push(contribution);
    }

    found
}

fn existing_file(path: NormalizedPath) -> Option<NormalizedPath> {
    path.is_file().then_some(path)
}

fn find_script(dir: &NormalizedPath, name: &str) -> Option<NormalizedPath> {
    let pattern = dir.join(&format!("lib/{}.*", glob::Pattern::escape(name)));
    let mut scripts: Vec<NormalizedPath> = glob::glob(pattern.as_str())
        .ok()?
        .flatten()
        .filter(|path| path.is_file())
        .map(NormalizedPath::from)
        .collect();
    scripts.sort();
    scripts.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_load_path_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        fs::create_dir_all(first.join("report/lib")).unwrap();
        fs::write(first.join("report/lib/report.py"), "").unwrap();
        fs::create_dir_all(second.join("report")).unwrap();
        fs::write(second.join("report/report.rules"), "").unwrap();

        let found = discover(
            &["report".to_string()],
            &[NormalizedPath::new(&first), NormalizedPath::new(&second)],
            |_| None,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dir, NormalizedPath::new(first.join("report")));
        assert!(found[0].is_script());
        assert!(!found[0].has_rules());
    }

    #[test]
    fn missing_plugins_are_skipped() {
        let temp = TempDir::new().unwrap();
        let found = discover(
            &["ghost".to_string()],
            &[NormalizedPath::new(temp.path())],
            |_| None,
        );
        assert!(found.is_empty());
    }
}
