use crate::config::registry::FlatConfig;
use crate::config::tree::kind;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_yaml::Value;

use super::MatcherSpec;

const SECTION: &str = "flags";

/// Tool flags per build context and operation (`compile`, `link`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagMatcher {
    contexts: IndexMap<String, IndexMap<String, MatcherSpec>>,
}

impl FlagMatcher {
    /// Parse every `flags_<context>` entry of the flattened configuration.
    ///
    /// Each entry maps operation names to a flat list or a selector map.
    pub fn new(config: &FlatConfig) -> Result<Self> {
        let prefix = format!("{SECTION}_");
        let mut contexts = IndexMap::new();

        for key in config.keys() {
            let Some(context) = key.strip_prefix(&prefix) else {
                continue;
            };
            let operations = match config.get(key) {
                Some(Value::Mapping(operations)) => operations,
                None | Some(Value::Null) => continue,
                Some(other) => {
                    return Err(Error::InvalidMatcher {
                        section: SECTION.into(),
                        context: context.into(),
                        matcher: context.into(),
                        reason: format!("expected operations mapping but found a {}", kind(other)),
                    });
                }
            };

            let mut parsed = IndexMap::new();
            for (operation, value) in operations {
                let Some(operation) = operation.as_str() else {
                    continue;
                };
                let scope = format!("{context}.{operation}");
                parsed.insert(
                    operation.to_string(),
                    MatcherSpec::parse(Some(value), SECTION, &scope)?,
                );
            }
            contexts.insert(context.to_string(), parsed);
        }

        Ok(Self { contexts })
    }

    pub fn flags_defined(&self, context: &str, operation: &str) -> bool {
        self.spec(context, operation).is_defined()
    }

    /// Flags for `operation` on `filepath` in `context`.
    pub fn flags_for(&self, context: &str, operation: &str, filepath: &str) -> Vec<String> {
        self.spec(context, operation).symbols_for(filepath)
    }

    fn spec(&self, context: &str, operation: &str) -> &MatcherSpec {
        static ABSENT: MatcherSpec = MatcherSpec::Absent;
        self.contexts
            .get(context)
            .and_then(|operations| operations.get(operation))
            .unwrap_or(&ABSENT)
    }
}
