//! Decoding of statsd datagrams into metric records.
//!
//! Clients submit metrics as plain text datagrams, usually over UDP. A datagram holds one or more
//! lines separated by `\n`, and every line describes a single sample of a single metric.
//!
//! # Protocol
//!
//! ```text
//! <name>[,<influx_tags>][:<value>]|<type>[|@<sample_rate>][|#<tags>]
//! ```
//!
//! - `name`: The name of the metric. It must not contain `:`, `@`, `|` or `,`.
//! - `influx_tags`: InfluxDB style dimensions of the form `key=value,key=value`.
//! - `value`: The numeric value. The value is optional for meters, which default to `1`.
//! - `type`: A token looked up in the [`TypeRegistry`]. The default registry recognizes `c`
//!   (counter), `g` (gauge), `ms` (timer), `h` (histogram) and `m` (meter).
//! - `sample_rate`: A rate in `[0, 1]` at which the client sampled this metric. The decoder
//!   drops lines at random in the same proportion. Only types that allow sampling accept a rate.
//! - `tags`: DogStatsD style dimensions of the form `key:value,key:value`. On a key collision
//!   with the influx tags, these tags win.
//!
//! # Examples
//!
//! ```text
//! api.requests:1|c
//! api.latency,host=web1:320|ms|@0.1
//! cpu.load:0.75|g|#host:web1,region:eu
//! page.views|m
//! ```
//!
//! Each decoded line becomes a [`Record`] with a fresh identifier, the current time from the
//! decoder's [`Clock`], the merged dimensions and exactly one metric. A single invalid line
//! rejects the entire datagram with a [`DecodeError`].
//!
//! ```
//! use mad_metrics::{DecodeErrorKind, StatsdDecoder};
//!
//! let decoder = StatsdDecoder::default();
//!
//! let records = decoder.decode(b"hits:1|c\nload:0.5|g", &mut rand::rng()).unwrap();
//! assert_eq!(records.len(), 2);
//!
//! let error = decoder.decode(b"hits:1|c\nload:x|g", &mut rand::rng()).unwrap_err();
//! assert_eq!(error.kind(), DecodeErrorKind::MalformedValue);
//! assert_eq!(error.line_number(), 2);
//! ```

#![warn(missing_docs)]

mod clock;
mod decoder;
mod error;
mod key;
mod number;
mod protocol;
mod record;
mod registry;
mod tags;

pub use self::clock::*;
pub use self::decoder::*;
pub use self::error::*;
pub use self::key::*;
pub use self::number::{NumberFormat, ParseNumberError};
pub use self::protocol::*;
pub use self::record::*;
pub use self::registry::*;
pub use self::tags::{ParseTagsError, TagDialect, merge_tags, parse_tags};
