//! # Logging
//!
//! Every `flowkit` subcommand prints its result on stdout: hex for
//! `encode` and `sign`, a tree for `inspect`, one JSON receipt per line for
//! `simulate`. Diagnostics from the CLI and from `flowkit_protocol` go to
//! stderr through `tracing`, so `flowkit encode ... | xxd -r -p` and
//! `flowkit simulate | jq` see only the result.
//!
//! `--log-format json` (or `FLOWKIT_LOG_FORMAT=json`) switches stderr to
//! JSON lines for CI logs.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "flowkit=info,flowkit_protocol=info";

/// Format of the stderr log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Accepts "json" or "pretty" (case-insensitive). Anything else is
    /// `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the stderr subscriber. Fails if one is already installed.
///
/// `RUST_LOG` overrides `default_level`. Coordinator decisions (sequence
/// chosen, conflict flagged, key refreshed) are logged at debug and info
/// under `flowkit_protocol::submission`:
///
/// ```text
/// RUST_LOG=flowkit_protocol::submission=debug flowkit simulate -n 10
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(true);
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry.with(stderr.with_thread_ids(false)).try_init()?,
        LogFormat::Json => registry.with(stderr.json()).try_init()?,
    }

    tracing::debug!(?format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing_is_lenient() {
        assert_eq!(LogFormat::from_str_lossy("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str_lossy("yaml"), LogFormat::Pretty);
    }

    #[test]
    fn second_install_is_an_error_not_a_panic() {
        let _ = init_logging(DEFAULT_FILTER, LogFormat::Pretty);
        assert!(init_logging(DEFAULT_FILTER, LogFormat::Json).is_err());
    }
}
