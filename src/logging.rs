//! Tracing setup for the scanner binary.
//!
//! Diagnostics go to stderr; stdout is reserved for detection lines.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `default_level`. Call before the async runtime starts
/// so the local UTC offset can still be determined.
pub fn init(default_level: &str, offset: UtcOffset) -> Result<(), LoggingError> {
    let layer = fmt::layer()
        .with_timer(build_timer(offset))
        .with_writer(std::io::stderr);

    let subscriber = Registry::default()
        .with(build_env_filter(default_level))
        .with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Local offset if the platform can report one, UTC otherwise.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn build_timer(offset: UtcOffset) -> fmt::time::OffsetTime<&'static [FormatItem<'static>]> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT)
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
