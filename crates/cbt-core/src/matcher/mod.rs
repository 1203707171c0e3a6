//! Define and flag matchers
//!
//! Symbols and flags can be given per context in three shapes:
//!
//! ```yaml
//! defines:
//!   release: [COM=Serial]          # flat list, applies to every file
//!   test:                          # selector map
//!     '*': [TEST]                  #   wildcard, applies to every file
//!     Model: [PLATFORM_B]          #   files whose name contains "Model"
//! ```
//!
//! The shape is decided once, when a matcher is constructed.

mod defines;
mod flags;

pub use defines::DefineMatcher;
pub use flags::FlagMatcher;

use crate::{Error, Result};
use cbt_fs::NormalizedPath;
use serde_yaml::Value;

/// Key of the selector that applies to every file.
pub const WILDCARD: &str = "*";

/// Selector of one entry in a selector map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Wildcard,
    /// Matches when the text occurs in the file's base name.
    Substring(String),
}

impl Selector {
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Selector::Wildcard => true,
            Selector::Substring(text) => file_name.contains(text.as_str()),
        }
    }
}

/// Parsed shape of one matcher entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatcherSpec {
    #[default]
    Absent,
    FlatList(Vec<String>),
    SelectorMap(Vec<(Selector, Vec<String>)>),
}

impl MatcherSpec {
    /// Decide the shape of `value`, the entry `section.context`.
    pub fn parse(value: Option<&Value>, section: &str, context: &str) -> Result<Self> {
        let invalid = |matcher: &str, reason: String| Error::InvalidMatcher {
            section: section.to_string(),
            context: context.to_string(),
            matcher: matcher.to_string(),
            reason,
        };

        match value {
            None | Some(Value::Null) => Ok(Self::Absent),
            Some(Value::Mapping(selectors)) => {
                let mut entries = Vec::with_capacity(selectors.len());
                for (key, symbols) in selectors {
                    let selector = match key {
                        Value::String(key) if key == WILDCARD => Selector::Wildcard,
                        Value::String(key) if !key.trim().is_empty() => {
                            Selector::Substring(key.clone())
                        }
                        other => {
                            return Err(invalid(
                                &format!("{other:?}"),
                                "selector must be '*' or a non-empty string".into(),
                            ));
                        }
                    };
                    let label = match &selector {
                        Selector::Wildcard => WILDCARD,
                        Selector::Substring(text) => text.as_str(),
                    };
                    let symbols = symbol_list(symbols).map_err(|reason| invalid(label, reason))?;
                    entries.push((selector, symbols));
                }
                Ok(Self::SelectorMap(entries))
            }
            Some(other) => symbol_list(other)
                .map(Self::FlatList)
                .map_err(|reason| invalid(context, reason)),
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Symbols that apply to `filepath`.
    ///
    /// Wildcard symbols come first, then the symbols of every matching
    /// selector in declaration order. Duplicates are kept.
    pub fn symbols_for(&self, filepath: &str) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::FlatList(symbols) => symbols.clone(),
            Self::SelectorMap(entries) => {
                let path = NormalizedPath::new(filepath);
                let file_name = path.file_name().unwrap_or_default();

                let mut symbols: Vec<String> = entries
                    .iter()
                    .filter(|(selector, _)| *selector == Selector::Wildcard)
                    .flat_map(|(_, symbols)| symbols.iter().cloned())
                    .collect();
                symbols.extend(
                    entries
                        .iter()
                        .filter(|(selector, _)| {
                            matches!(selector, Selector::Substring(_)) && selector.matches(file_name)
                        })
                        .flat_map(|(_, symbols)| symbols.iter().cloned()),
                );
                symbols
            }
        }
    }
}

fn symbol_list(value: &Value) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::String(symbol) => Ok(vec![symbol.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(symbol) => Ok(symbol.clone()),
                other => Err(format!("symbol {other:?} is not a string")),
            })
            .collect(),
        other => Err(format!("expected a list of strings but found {other:?}")),
    }
}
