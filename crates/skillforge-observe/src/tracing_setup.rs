//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! Log output goes to stderr; stdout belongs to the interactive UI.
//!
//! # Usage
//!
//! ```no_run
//! use skillforge_observe::tracing_setup::{LogLevel, init_tracing};
//!
//! // Warnings only
//! init_tracing(LogLevel::from_flags(0, false), false).unwrap();
//!
//! // Debug output plus OpenTelemetry span export to stdout
//! init_tracing(LogLevel::from_flags(2, false), true).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Default verbosity, derived from `-v` / `--quiet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl LogLevel {
    /// `--quiet` wins over any number of `-v`.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => LogLevel::Quiet,
            (false, 0) => LogLevel::Normal,
            (false, 1) => LogLevel::Verbose,
            (false, 2) => LogLevel::Debug,
            (false, _) => LogLevel::Trace,
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "info,skillforge=debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// - Installs a structured `fmt` layer on stderr. Span close timing is
///   shown from [`LogLevel::Debug`] up.
/// - When `enable_otel` is true, additionally bridges tracing spans to
///   OpenTelemetry using a stdout exporter.
/// - `RUST_LOG` overrides the level-derived filter.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(level: LogLevel, enable_otel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let span_events = if matches!(level, LogLevel::Debug | LogLevel::Trace) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(span_events);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    if enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("skillforge");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        // Store the provider for shutdown and register it globally.
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// Safe to call even when OTel was not enabled (no-op in that case).
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(LogLevel::from_flags(3, true), LogLevel::Quiet);
        assert_eq!(LogLevel::from_flags(0, false), LogLevel::Normal);
        assert_eq!(LogLevel::from_flags(7, false), LogLevel::Trace);
    }

    #[test]
    fn directives_parse() {
        for level in [
            LogLevel::Quiet,
            LogLevel::Normal,
            LogLevel::Verbose,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert!(EnvFilter::try_new(level.directive()).is_ok());
        }
        assert_eq!(LogLevel::from_flags(2, false).directive(), "info,skillforge=debug");
    }
}
