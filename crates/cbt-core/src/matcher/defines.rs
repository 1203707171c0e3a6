use crate::Result;
use crate::config::registry::FlatConfig;
use indexmap::IndexMap;

use super::MatcherSpec;

const SECTION: &str = "defines";

/// Preprocessor symbols per build context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefineMatcher {
    contexts: IndexMap<String, MatcherSpec>,
}

impl DefineMatcher {
    /// Parse every `defines_<context>` entry of the flattened configuration.
    pub fn new(config: &FlatConfig) -> Result<Self> {
        let prefix = format!("{SECTION}_");
        let mut contexts = IndexMap::new();
        for key in config.keys() {
            let Some(context) = key.strip_prefix(&prefix) else {
                continue;
            };
            contexts.insert(
                context.to_string(),
                MatcherSpec::parse(config.get(key), SECTION, context)?,
            );
        }
        Ok(Self { contexts })
    }

    pub fn has_defines(&self, context: &str) -> bool {
        self.spec(context).is_defined()
    }

    /// Symbols to define when compiling `filepath` in `context`.
    pub fn defines_for(&self, context: &str, filepath: &str) -> Vec<String> {
        self.spec(context).symbols_for(filepath)
    }

    pub fn spec(&self, context: &str) -> &MatcherSpec {
        static ABSENT: MatcherSpec = MatcherSpec::Absent;
        self.contexts.get(context).unwrap_or(&ABSENT)
    }
}
