//! Logging setup
//!
//! Diagnostics go through the `log` facade to stderr; the report itself is
//! printed to stdout and never passes through the logger.

use log::LevelFilter;

/// Initialise the global logger. `RUST_LOG` wins over the verbosity flags.
pub fn init(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level).format_timestamp(None);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // A second init (tests, embedding) keeps the first logger
    let _ = builder.try_init();
}
