//! Logging and observability
//!
//! Structured logging via tracing, with text or JSON formatting selected at
//! runtime through CLI flags and environment variables.
//!
//! All logging output is directed to stderr: stdout is reserved for progress
//! lines, container log lines, and the wrapped command's own output.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system with optional format specification
///
/// Sets up tracing-subscriber with either JSON or text formatting. Safe to
/// call multiple times; subsequent calls are no-ops.
///
/// ## Arguments
///
/// * `format` - Optional format specification string. Supports:
///   - `None` or `"text"` for human-readable text format
///   - `"json"` for structured JSON format
///
/// ## Environment Variables
///
/// * `DRYDOCK_LOG_FORMAT` - Controls the log output format ("json" for JSON, any other value for text)
/// * `DRYDOCK_LOG` - Controls the logging filter level
/// * `RUST_LOG` - Standard Rust logging environment variable (used as fallback)
pub fn init(format: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();

        // Determine format from parameter or environment variable
        let env_format = std::env::var("DRYDOCK_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        // Span lifecycle events: text stays quiet, json keeps NEW/CLOSE for tooling
        let span_events = match effective_format {
            "json" => fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE,
            _ => fmt::format::FmtSpan::NONE,
        };

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_span_events(span_events)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                // Default to text format (including None, "text", or any other value)
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_span_events(span_events)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter based on environment variables
fn create_env_filter() -> EnvFilter {
    if let Ok(drydock_log) = std::env::var("DRYDOCK_LOG") {
        EnvFilter::try_new(&drydock_log).unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid DRYDOCK_LOG specification '{}', using default 'info'",
                drydock_log
            );
            EnvFilter::new("info")
        })
    } else {
        // Fall back to standard RUST_LOG or default (info)
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
///
/// Primarily useful for testing scenarios where you need to know if the
/// logging system has already been set up.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
