/// Structured logging for the air-quality service.
///
/// Installs the `tracing` subscriber used by the binary and classifies
/// upstream failures so that expected conditions (a station without an
/// index, a retired endpoint serving HTML) stay quiet while real outages are
/// reported loudly.

use crate::model::FetchError;
use std::env;
use std::fmt;
use tracing_subscriber::filter::EnvFilter;

/// Fallback log level when `RUST_LOG` is not set.
pub const LOG_LEVEL_ENV: &str = "AQMON_LOG_LEVEL";

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// Installs the global `tracing` subscriber.
///
/// Uses `RUST_LOG` when present, otherwise `AQMON_LOG_LEVEL`, otherwise
/// `info`. Logs go to stderr so stdout stays clean for JSON output.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var(LOG_LEVEL_ENV).ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},reqwest=warn,hyper=warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The resource does not exist or is not published for this entity.
    Expected,
    /// The upstream is unreachable or failing.
    Unexpected,
    /// Cannot tell.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies the final error of a fetch (after all candidates failed).
///
/// - 404 / 410 and malformed bodies: `Expected`. Many stations publish no
///   index and retired endpoints answer with HTML.
/// - Transport errors, 5xx, 429: `Unexpected`.
/// - Other statuses: `Unknown`.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        FetchError::UpstreamHttp { status: 404 | 410, .. } => FailureType::Expected,
        FetchError::MalformedResponse { .. } => FailureType::Expected,
        FetchError::UpstreamHttp { status, .. } if *status >= 500 || *status == 429 => {
            FailureType::Unexpected
        }
        FetchError::Transport { .. } | FetchError::NoCandidates => FailureType::Unexpected,
        FetchError::UpstreamHttp { .. } => FailureType::Unknown,
    }
}

/// Logs a failed fetch at a level matching its classification.
pub fn log_fetch_failure(operation: &str, entity_id: Option<i64>, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    match failure_type {
        FailureType::Expected => {
            tracing::debug!(operation, entity_id, failure = %failure_type, error = %err, "fetch failed")
        }
        FailureType::Unexpected => {
            tracing::error!(operation, entity_id, failure = %failure_type, error = %err, "fetch failed")
        }
        FailureType::Unknown => {
            tracing::warn!(operation, entity_id, failure = %failure_type, error = %err, "fetch failed")
        }
    }
}
