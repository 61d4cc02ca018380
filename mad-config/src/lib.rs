//! Configuration for the metrics aggregator daemon CLI.
//!
//! The configuration is read from a `config.yml` file in the configuration folder. All sections
//! are optional; a missing file yields the defaults.
//!
//! ```yaml
//! logging:
//!   level: debug
//!   format: json
//! statsd:
//!   number_format:
//!     decimal_separator: "."
//!     grouping_separator: ","
//!   types:
//!     - token: c
//!       kind: counter
//!       sampled: true
//!     - token: ms
//!       kind: timer
//!       unit: millisecond
//!       sampled: true
//! ```

#![warn(missing_docs)]

mod config;

pub use self::config::*;
