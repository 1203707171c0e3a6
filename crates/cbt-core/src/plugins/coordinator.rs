//! Plugin merge coordination

use crate::Result;
use crate::config::project::anchor;
use crate::config::tree::{
    deep_merge, ensure_mapping, fill_defaults, load_fragment, lookup, to_string_list,
};
use crate::expression::{ExpressionContext, contains_expression};
use cbt_fs::{ConfigStore, NormalizedPath, standardize};
use indexmap::IndexMap;
use serde_yaml::Value;

use super::coverage;
use super::discovery::{PluginContribution, discover};

/// Token in a plugin fragment's `paths` values replaced by its directory.
pub const PLUGIN_PATH_TOKEN: &str = "$PLUGIN_PATH";

/// Directory holding the plugins shipped with the engine.
pub const BUILTIN_PLUGIN_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/plugins");

/// Discovers plugins and merges their contributions into a tree.
///
/// One coordinator is created per run and owns the table of discovered
/// plugins.
#[derive(Debug, Clone)]
pub struct PluginCoordinator {
    builtin_path: NormalizedPath,
    builtins: IndexMap<String, Value>,
    store: ConfigStore,
    discovered: Vec<PluginContribution>,
}

impl PluginCoordinator {
    /// A coordinator knowing the built-in plugins.
    pub fn new() -> Result<Self> {
        let mut builtins = IndexMap::new();
        builtins.insert(coverage::NAME.to_string(), coverage::structured_defaults()?);

        Ok(Self {
            builtin_path: NormalizedPath::new(BUILTIN_PLUGIN_PATH),
            builtins,
            store: ConfigStore::new(),
            discovered: Vec::new(),
        })
    }

    /// Use a different directory as the built-in load path.
    pub fn with_builtin_path(mut self, path: impl Into<NormalizedPath>) -> Self {
        self.builtin_path = path.into();
        self
    }

    /// Register structured defaults for an in-process plugin.
    pub fn with_builtin(mut self, name: &str, defaults: Value) -> Self {
        self.builtins.insert(name.to_string(), defaults);
        self
    }

    pub fn builtin_path(&self) -> &NormalizedPath {
        &self.builtin_path
    }

    pub fn discovered(&self) -> &[PluginContribution] {
        &self.discovered
    }

    /// Build-graph rule files of the discovered plugins.
    pub fn rule_files(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter_map(|p| p.rules_file.as_ref().map(|f| f.to_string()))
            .collect()
    }

    /// Names of the discovered plugins with a script entry point.
    pub fn script_plugins(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter(|p| p.is_script())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Names of the discovered plugins with rules or a script entry point.
    pub fn loaded_plugins(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter(|p| p.has_rules() || p.is_script())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Merge every enabled plugin's contributions into `tree`.
    ///
    /// Load paths are evaluated, standardized and extended by the built-in
    /// path; plugins are discovered; configuration fragments are merged
    /// (overriding, with `$PLUGIN_PATH` replaced in their `paths`); default
    /// fragments then fill gaps; finally each plugin's directory is recorded
    /// under `plugins.<name>`.
    ///
    /// Relative load paths are searched below `root`.
    pub fn merge(
        &mut self,
        tree: &mut Value,
        context: &ExpressionContext,
        root: &NormalizedPath,
    ) -> Result<()> {
        let load_paths = self.prepare_load_paths(tree, context, root)?;
        let enabled = lookup(tree, &["plugins", "enabled"])
            .map(to_string_list)
            .unwrap_or_default();

        let builtins = &self.builtins;
        self.discovered = discover(&enabled, &load_paths, |name| builtins.get(name).cloned());

        for plugin in &self.discovered {
            let Some(fragment_path) = &plugin.config_fragment else {
                continue;
            };
            let mut fragment = load_fragment(&self.store, fragment_path)?;
            substitute_plugin_path(&mut fragment, &plugin.dir);
            deep_merge(tree, &fragment);
            tracing::debug!(
                plugin = %plugin.name,
                fragment = %fragment_path,
                "Merged plugin configuration"
            );
        }

        for plugin in &self.discovered {
            if let Some(defaults_path) = &plugin.yml_defaults {
                let defaults = load_fragment(&self.store, defaults_path)?;
                fill_defaults(tree, &defaults);
            }
        }
        for plugin in &self.discovered {
            if let Some(defaults) = &plugin.hash_defaults {
                fill_defaults(tree, defaults);
            }
        }

        if let Some(plugins) = ensure_mapping(tree, "plugins") {
            if matches!(plugins.get("display_raw_test_results"), None | Some(Value::Null)) {
                plugins.insert("display_raw_test_results".into(), Value::Bool(true));
            }
            for plugin in &self.discovered {
                plugins.insert(
                    Value::from(plugin.name.as_str()),
                    Value::from(plugin.dir.as_str()),
                );
            }
        }

        Ok(())
    }

    fn prepare_load_paths(
        &self,
        tree: &mut Value,
        context: &ExpressionContext,
        root: &NormalizedPath,
    ) -> Result<Vec<NormalizedPath>> {
        let mut paths: Vec<String> = Vec::new();
        for raw in lookup(tree, &["plugins", "load_paths"])
            .map(to_string_list)
            .unwrap_or_default()
        {
            let evaluated = if contains_expression(&raw) {
                context.substitute(&raw)?
            } else {
                raw
            };
            paths.push(standardize(&evaluated));
        }
        paths.push(self.builtin_path.to_string());

        let mut unique: Vec<String> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }

        if let Some(plugins) = ensure_mapping(tree, "plugins") {
            plugins.insert(
                "load_paths".into(),
                Value::Sequence(unique.iter().map(|p| Value::from(p.as_str())).collect()),
            );
        }

        Ok(unique
            .iter()
            .map(|path| NormalizedPath::new(anchor(root, path)))
            .collect())
    }
}

fn substitute_plugin_path(fragment: &mut Value, dir: &NormalizedPath) {
    let Some(Value::Mapping(paths)) = fragment.get_mut("paths") else {
        return;
    };
    for (_, value) in paths.iter_mut() {
        replace_token(value, dir.as_str());
    }
}

fn replace_token(value: &mut Value, dir: &str) {
    match value {
        Value::String(s) if s.contains(PLUGIN_PATH_TOKEN) => {
            *s = s.replace(PLUGIN_PATH_TOKEN, dir);
        }
        Value::Sequence(items) => items.iter_mut().for_each(|item| replace_token(item, dir)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_path_token_is_replaced_in_paths_only() {
        let mut fragment: Value = serde_yaml::from_str(
            "paths: {foo: ['$PLUGIN_PATH/inc'], bar: $PLUGIN_PATH}\nnote: $PLUGIN_PATH",
        )
        .unwrap();
        substitute_plugin_path(&mut fragment, &NormalizedPath::new("/plugins/foo"));

        assert_eq!(fragment["paths"]["foo"][0], Value::from("/plugins/foo/inc"));
        assert_eq!(fragment["paths"]["bar"], Value::from("/plugins/foo"));
        assert_eq!(fragment["note"], Value::from("$PLUGIN_PATH"));
    }

    #[test]
    fn builtin_path_is_always_appended_once() {
        let coordinator = PluginCoordinator::new().unwrap().with_builtin_path("/builtin");
        let mut tree: Value =
            serde_yaml::from_str("plugins: {load_paths: ['/extra/', /builtin, /extra]}").unwrap();

        let paths = coordinator
            .prepare_load_paths(&mut tree, &ExpressionContext::empty(), &NormalizedPath::new("."))
            .unwrap();

        assert_eq!(
            paths,
            [NormalizedPath::new("/extra"), NormalizedPath::new("/builtin")]
        );
        assert_eq!(
            tree["plugins"]["load_paths"],
            serde_yaml::from_str::<Value>("[/extra, /builtin]").unwrap()
        );
    }
}
