//! Error reporting and logging for the metrics aggregator daemon.
//!
//! This crate exposes the [`tracing`] macros used throughout the workspace, along with helpers to
//! print errors with their full chain of causes.
//!
//! # Setup
//!
//! Binaries initialize logging once at startup via [`init`], which requires the `init` feature.
//! Tests can capture logs of the calling crate via [`init_test!`], which requires the `test`
//! feature.
//!
//! # Logging
//!
//! ```
//! use mad_log::LogError;
//!
//! if let Err(error) = "x".parse::<f64>() {
//!     mad_log::error!("failed to parse value: {}", LogError(&error));
//! }
//! ```
//!
//! The log level of the internal crates can be configured in the `logging` section of the
//! configuration file, or overridden with the `RUST_LOG` environment variable.

#![warn(missing_docs)]

mod setup;
pub use setup::*;

#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
