//! Configuration snapshots for the test-runner and mock generators

use crate::verbosity::Verbosity;
use cbt_fs::NormalizedPath;
use serde_yaml::{Mapping, Value};

use super::tree::{lookup, to_string_list};

/// `unity` entries shallow-overridden by `test_runner` entries.
pub fn runner_defaults(tree: &Value) -> Mapping {
    let mut runner = section(tree, "unity");
    for (key, value) in section(tree, "test_runner") {
        runner.insert(key, value);
    }
    runner
}

/// Complete the `cmock` section with the values the build relies on.
///
/// Fills `mock_prefix`, `enforce_strict_ordering`, `mock_path` (below the
/// build root), `verbosity`, de-duplicates `plugins` and turns `unity_helper`
/// into `false` or a list whose base names are added to `includes`.
pub fn cmock_defaults(tree: &Value, verbosity: Verbosity) -> Mapping {
    let mut cmock = section(tree, "cmock");

    fill(&mut cmock, "mock_prefix", Value::from("Mock"));
    fill(&mut cmock, "enforce_strict_ordering", Value::Bool(true));

    let build_root = lookup(tree, &["project", "build_root"])
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mock_path = NormalizedPath::new(build_root).join("test/mocks");
    fill(&mut cmock, "mock_path", Value::from(mock_path.as_str()));
    fill(&mut cmock, "verbosity", Value::from(u64::from(verbosity.level())));

    let mut plugins: Vec<String> = Vec::new();
    for plugin in cmock.get("plugins").map(to_string_list).unwrap_or_default() {
        if !plugins.contains(&plugin) {
            plugins.push(plugin);
        }
    }
    cmock.insert("plugins".into(), strings(&plugins));

    let helpers = match cmock.get("unity_helper") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Vec::new(),
        Some(helper) => to_string_list(helper),
    };
    if helpers.is_empty() {
        cmock.insert("unity_helper".into(), Value::Bool(false));
    } else {
        let mut includes = cmock.get("includes").map(to_string_list).unwrap_or_default();
        for helper in &helpers {
            let base = NormalizedPath::new(helper)
                .file_name()
                .unwrap_or(helper.as_str())
                .to_string();
            if !includes.contains(&base) {
                includes.push(base);
            }
        }
        cmock.insert("unity_helper".into(), strings(&helpers));
        cmock.insert("includes".into(), strings(&includes));
    }

    cmock
}

/// Mock settings shallow-overridden by the runner settings.
pub fn merge_runner(cmock: &Mapping, runner: &Mapping) -> Mapping {
    let mut merged = cmock.clone();
    for (key, value) in runner {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn section(tree: &Value, name: &str) -> Mapping {
    lookup(tree, &[name])
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default()
}

fn fill(map: &mut Mapping, key: &str, value: Value) {
    if matches!(map.get(key), None | Some(Value::Null)) {
        map.insert(key.into(), value);
    }
}

fn strings(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::from(s.as_str())).collect())
}
