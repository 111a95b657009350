//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for command
//! output (including `--json`). `RUST_LOG` directives are honoured on top of
//! the default.

use tracing_subscriber::EnvFilter;

/// Default directive when `-v` is not given.
pub const DEFAULT_DIRECTIVE: &str = "beatpad=info";

/// Directive used with `-v`.
pub const VERBOSE_DIRECTIVE: &str = "beatpad=debug";

/// Builds the filter: `RUST_LOG` first, then the crate directive.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    };
    let filter = EnvFilter::from_default_env();
    match directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        assert!(DEFAULT_DIRECTIVE
            .parse::<tracing_subscriber::filter::Directive>()
            .is_ok());
        assert!(VERBOSE_DIRECTIVE
            .parse::<tracing_subscriber::filter::Directive>()
            .is_ok());
    }
}
