//! Embedded expression substitution
//!
//! String values in a project file may carry `#{...}` markers that are
//! replaced while the configuration is resolved. The evaluation context is
//! plain data (an environment snapshot, the working and home directories),
//! never the partially built configuration, so the outcome does not depend
//! on the order in which sections are processed.
//!
//! Supported expressions:
//!
//! | Expression            | Result                                              |
//! |-----------------------|-----------------------------------------------------|
//! | `env:NAME`            | value of `NAME`, error when unset                   |
//! | `env:NAME\|fallback`  | value of `NAME`, or `fallback` when unset           |
//! | `cwd`                 | working directory, forward slashes                  |
//! | `home`                | home directory, forward slashes                     |
//! | `os`                  | operating system name (`linux`, `macos`, `windows`) |
//! | `path_separator`      | separator of `PATH`-style lists                     |
//! | `exe_ext`             | native executable suffix                            |

use crate::{Error, Result};
use cbt_fs::standardize;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\{([^}]*)\}").unwrap());

/// Whether `text` contains an expression marker.
pub fn contains_expression(text: &str) -> bool {
    text.contains("#{")
}

/// Separator used when joining `PATH`-style lists on this platform.
pub fn path_list_separator() -> &'static str {
    if cfg!(windows) { ";" } else { ":" }
}

/// Data available to embedded expressions.
#[derive(Debug, Clone, Default)]
pub struct ExpressionContext {
    vars: BTreeMap<String, String>,
    cwd: Option<String>,
    home: Option<String>,
    permissive: bool,
}

impl ExpressionContext {
    /// Snapshot the process environment, working directory and home directory.
    pub fn from_process() -> Self {
        let cwd = std::env::current_dir()
            .ok()
            .map(|dir| standardize(&dunce::simplified(&dir).to_string_lossy()));
        let home = dirs::home_dir().map(|dir| standardize(&dir.to_string_lossy()));

        Self {
            vars: std::env::vars_os()
                .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
                .collect(),
            cwd,
            home,
            permissive: false,
        }
    }

    /// A context with no variables and no directories.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = Some(standardize(cwd));
        self
    }

    pub fn with_home(mut self, home: &str) -> Self {
        self.home = Some(standardize(home));
        self
    }

    /// In permissive mode a failing evaluation leaves the string unchanged.
    pub fn permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.permissive
    }

    /// Make a variable visible to later evaluations.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Replace every `#{...}` marker in `input` by its evaluation.
    pub fn substitute(&self, input: &str) -> Result<String> {
        match self.substitute_strict(input) {
            Ok(output) => Ok(output),
            Err(e) if self.permissive => {
                tracing::debug!(input, error = %e, "Leaving expression unevaluated");
                Ok(input.to_string())
            }
            Err(e) => Err(e),
        }
    }

    fn substitute_strict(&self, input: &str) -> Result<String> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for caps in EXPRESSION.captures_iter(input) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            output.push_str(&input[last..whole.start()]);
            output.push_str(&self.evaluate(inner.as_str().trim())?);
            last = whole.end();
        }

        let tail = &input[last..];
        if let Some(start) = tail.find("#{") {
            return Err(Error::Expression {
                expression: tail[start..].to_string(),
                reason: "unterminated marker".into(),
            });
        }
        output.push_str(tail);
        Ok(output)
    }

    fn evaluate(&self, expression: &str) -> Result<String> {
        let fail = |reason: &str| Error::Expression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        if let Some(spec) = expression.strip_prefix("env:") {
            let (name, fallback) = match spec.split_once('|') {
                Some((name, fallback)) => (name.trim(), Some(fallback)),
                None => (spec.trim(), None),
            };
            if name.is_empty() {
                return Err(fail("missing variable name"));
            }
            return match (self.var(name), fallback) {
                (Some(value), _) => Ok(value.to_string()),
                (None, Some(fallback)) => Ok(fallback.to_string()),
                (None, None) => Err(fail("variable is not set")),
            };
        }

        match expression {
            "cwd" => self.cwd.clone().ok_or_else(|| fail("working directory unknown")),
            "home" => self.home.clone().ok_or_else(|| fail("home directory unknown")),
            "os" => Ok(std::env::consts::OS.to_string()),
            "path_separator" => Ok(path_list_separator().to_string()),
            "exe_ext" => Ok(std::env::consts::EXE_SUFFIX.to_string()),
            _ => Err(fail("unknown expression")),
        }
    }
}
