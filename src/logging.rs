//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "guide=info,guide_lib=info";

/// Build the filter: `RUST_LOG` if set and valid, else the defaults bumped to
/// `debug` when `verbose` is on.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("guide=debug,guide_lib=debug")
        } else {
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }
    })
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for JSON output. Safe to call more than once; later calls are no-ops.
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
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }

    #[test]
    fn filter_renders_default_directives() {
        // RUST_LOG replaces the defaults entirely.
        if std::env::var("RUST_LOG").is_err() {
            let quiet = env_filter(false).to_string();
            assert!(quiet.contains("guide=info"), "{quiet}");
            assert!(quiet.contains("guide_lib=info"), "{quiet}");

            let verbose = env_filter(true).to_string();
            assert!(verbose.contains("guide=debug"), "{verbose}");
            assert!(!verbose.contains("info"), "{verbose}");
        }
    }
}
