/*!
 * Structured Tracing
 * Subscriber setup and per-role spans using the tracing crate
 *
 * Log lines go to stderr so they never interleave with the status lines
 * and build output that the relay prints on stdout.
 */

use crate::config::RelayConfig;
use crate::core::types::{ReturnCode, WrapperMode};
use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Filter used when RUST_LOG is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Initialize the global subscriber
///
/// Environment variables:
/// - RUST_LOG: log filter (default: warn)
/// - RELAY_TRACE_JSON: JSON output (read into `config.trace_json`)
///
/// A second call is a no-op.
pub fn init_tracing(config: &RelayConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.trace_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!(json = config.trace_json, "tracing initialized");
    }
}

/// Span covering one role of one process, `relay{role, pid}`
pub struct RoleSpan {
    span: tracing::Span,
    start: Instant,
    role: WrapperMode,
}

impl RoleSpan {
    pub fn new(role: WrapperMode) -> Self {
        let pid = std::process::id();
        let span = span!(
            Level::INFO,
            "relay",
            role = role.as_str(),
            pid = pid,
            return_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            role,
        }
    }

    /// Run `f` inside the span
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }

    /// Record the role's outcome; logged once more when the span closes
    pub fn record_outcome(&self, code: ReturnCode) {
        self.span.record("return_code", code.code());
    }
}

impl Drop for RoleSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.span.record("duration_ms", elapsed.as_millis() as u64);
        let _entered = self.span.enter();
        info!(role = %self.role, duration_ms = elapsed.as_millis() as u64, "role finished");
    }
}
