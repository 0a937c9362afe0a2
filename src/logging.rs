use std::io;
use std::sync::Mutex;

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter, Layer, Registry};

lazy_static! {
    static ref LOGGING_INSTALLED: Mutex<bool> = Mutex::new(false);
}

/// Set `EXCTREE_LOG_FORMAT=json` to get one JSON object per log line.
const LOG_FORMAT_VAR: &str = "EXCTREE_LOG_FORMAT";

/// Initialize logging.  If the environment variable `RUST_LOG` is set to a
/// non-empty value it is interpreted as a filter and matching events are
/// written to stderr; otherwise nothing is logged.  Stdout is reserved for the
/// rendered tree.  Safe to call more than once.
pub fn init_logging() {
    let mut installed = match LOGGING_INSTALLED.lock() {
        Ok(installed) => installed,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *installed {
        return;
    }
    *installed = true;

    let mut layers = Vec::new();
    // An empty RUST_LOG is treated the same as an absent one.
    if let Ok(rustlog) = std::env::var("RUST_LOG") {
        if !rustlog.is_empty() {
            if let Ok(env_filter) = EnvFilter::try_from_default_env() {
                let json = std::env::var(LOG_FORMAT_VAR)
                    .map(|format| format.eq_ignore_ascii_case("json"))
                    .unwrap_or(false);
                let layer = if json {
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .without_time()
                        .with_filter(env_filter)
                        .boxed()
                } else {
                    tracing_subscriber::fmt::layer()
                        .with_span_events(FmtSpan::CLOSE)
                        .compact()
                        .with_writer(io::stderr)
                        // Logs usually end up in files or CI output.
                        .with_ansi(false)
                        .without_time()
                        .with_filter(env_filter)
                        .boxed()
                };
                layers.push(layer);
            }
        }
    }

    // Someone else (a test harness, an embedding program) may already have
    // installed a global subscriber; theirs stays.
    let _ = Registry::default().with(layers).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        let installed = LOGGING_INSTALLED.lock().unwrap();
        assert!(*installed);
    }
}
