//! Errors raised while installing the log subscriber.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A log format name was not recognized.
    #[error("unknown log format '{format}' (expected pretty, compact, json or full)")]
    UnknownFormat {
        /// The rejected name.
        format: String,
    },

    /// The level or a directive could not be parsed as a filter.
    #[error("invalid log filter '{directive}'")]
    InvalidFilter {
        /// The offending level or directive.
        directive: String,
        /// Parser diagnostic.
        #[source]
        source: ParseError,
    },

    /// The directory for file logging could not be created.
    #[error("cannot create log directory {path}")]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("log subscriber already installed")]
    AlreadyInitialized(#[source] TryInitError),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
