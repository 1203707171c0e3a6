use crate::verbosity::RunFlags;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber for a resolution run.
///
/// `RUST_LOG` takes precedence; without it the level follows the inbound
/// verbosity signal (debug mode maps to `trace`).
pub fn init(flags: &RunFlags) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(flags.debug)
        .with_line_number(flags.debug)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(flags.verbosity.filter_directive()))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
