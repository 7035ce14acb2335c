//! Logging setup for unitreg.
//!
//! Every unitreg crate logs through `tracing`; this crate installs the
//! subscriber that decides where those events go and how they look.
//!
//! # Example
//!
//! ```rust,no_run
//! use unitreg_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), unitreg_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("unitreg_core=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
