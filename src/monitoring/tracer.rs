/*!
 * Structured Tracing
 * Subscriber setup and per-pass spans for the dispatcher
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DISPATCH_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Span covering one `service()` pass
pub struct PassSpan {
    span: Span,
    start: Instant,
    pass: u64,
}

impl PassSpan {
    pub fn new(pass: u64) -> Self {
        let span = span!(
            Level::TRACE,
            "service_pass",
            pass = pass,
            invoked = tracing::field::Empty,
            skipped = tracing::field::Empty,
            failed = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            pass,
        }
    }

    /// Enter the span for the duration of the returned guard
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Record pass results and close the span
    pub fn finish(self, invoked: usize, skipped: usize, failed: usize) {
        let duration_us = self.start.elapsed().as_micros() as u64;
        self.span.record("invoked", invoked);
        self.span.record("skipped", skipped);
        self.span.record("failed", failed);
        self.span.record("duration_us", duration_us);

        if invoked + skipped + failed > 0 {
            debug!(
                pass = self.pass,
                invoked, skipped, failed, duration_us, "Service pass complete"
            );
        }
    }
}
