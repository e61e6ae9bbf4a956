//! # LC Telemetry
//!
//! Subscriber setup for applications embedding the light client.
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the binary or test harness, through this crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lc_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `LC_JSON_LOGS` | `false` | JSON formatted output |
//! | `LC_SERVICE_NAME` | `light-client` | Service name field |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed (bad filter, or one already set).
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}
