//! Inbound run signals
//!
//! Verbosity and debug mode are decided by whoever launches the engine and
//! are read before resolution starts, so early failures can already be
//! reported at the requested level.

use std::fmt;

/// Environment variable carrying the verbosity level (name or `0`-`5`).
pub const VERBOSITY_VAR: &str = "CBT_VERBOSITY";

/// Environment variable enabling debug mode.
pub const DEBUG_VAR: &str = "CBT_DEBUG";

/// Output verbosity, ordered from quietest to noisiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Silent,
    Errors,
    Complain,
    #[default]
    Normal,
    Obnoxious,
    Debug,
}

impl Verbosity {
    const ALL: [Verbosity; 6] = [
        Verbosity::Silent,
        Verbosity::Errors,
        Verbosity::Complain,
        Verbosity::Normal,
        Verbosity::Obnoxious,
        Verbosity::Debug,
    ];

    /// Numeric level, `0` (silent) to `5` (debug).
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Silent => "silent",
            Verbosity::Errors => "errors",
            Verbosity::Complain => "complain",
            Verbosity::Normal => "normal",
            Verbosity::Obnoxious => "obnoxious",
            Verbosity::Debug => "debug",
        }
    }

    /// Parse a level given either by name or by number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(level) = text.parse::<u8>() {
            return Self::from_level(level);
        }
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(text))
    }

    /// `tracing` filter directive matching this verbosity.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Errors => "error",
            Verbosity::Complain => "warn",
            Verbosity::Normal => "info",
            Verbosity::Obnoxious => "debug",
            Verbosity::Debug => "trace",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals read from the environment before resolution begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunFlags {
    pub verbosity: Verbosity,
    pub debug: bool,
}

impl RunFlags {
    /// Read `CBT_VERBOSITY` and `CBT_DEBUG` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the signals through an arbitrary lookup function.
    ///
    /// Debug mode forces the debug verbosity. An unparsable verbosity is
    /// reported and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup(DEBUG_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let verbosity = match lookup(VERBOSITY_VAR) {
            Some(raw) => Verbosity::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Ignoring unrecognized {VERBOSITY_VAR}");
                Verbosity::default()
            }),
            None => Verbosity::default(),
        };

        Self {
            verbosity: if debug { Verbosity::Debug } else { verbosity },
            debug,
        }
    }
}
