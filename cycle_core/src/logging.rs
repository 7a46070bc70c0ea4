//! Logging infrastructure for Cyclewise.
//!
//! Events go to stderr so that command output on stdout stays
//! machine-readable (`--json`). RUST_LOG always wins over the verbosity
//! chosen on the command line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events the verbosity level applies to
const OWN_TARGETS: [&str; 2] = ["cycle_core", "cyclewise"];

/// Level for a `-v` count: quiet by default, each flag one step louder
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives applying `level` to our crates and `warn` to dependencies
pub fn filter_directives(level: &str) -> String {
    let mut directives: Vec<String> = OWN_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initialize logging for the CLI from its `-v` count
pub fn init_for_cli(verbose: u8) {
    init_with_level(level_for_verbosity(verbose))
}

/// Initialize logging with a specific default level for our crates
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(filter_directives("debug")))
        .try_init();
}
