//! # Quantum Telemetry
//!
//! Structured logging for Quantum-Chain platform services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QC_SERVICE_NAME` | `qc-platform-state` | Service name |
//! | `QC_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `QC_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `QC_LOG_TARGET` | `true` | Include event targets |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
