//! Tracing setup for the CLI.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

const LOG_ENV: &str = "FINCALC_LOG";
const DEFAULT_FILTER: &str = "fincalc=warn";

/// Install a stderr subscriber filtered by `FINCALC_LOG`
/// (e.g. `FINCALC_LOG=fincalc_core=debug`), falling back to `fincalc=warn`.
/// `verbose` forces debug output for every fincalc target.
///
/// Idempotent; only the first call has an effect.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let filter = if verbose {
            EnvFilter::new("fincalc=debug")
        } else {
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        };

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
