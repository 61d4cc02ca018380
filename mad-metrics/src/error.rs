use std::fmt;
use std::num::ParseFloatError;
use std::str::Utf8Error;

use crate::{ParseNumberError, ParseTagsError};

/// The reason a statsd line was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum DecodeErrorKind {
    /// The line does not match `NAME[,TAGS][:VALUE]|TYPE[|@RATE][|#TAGS]`.
    #[error("invalid statsd line")]
    GrammarMismatch,
    /// The line is not valid UTF-8.
    #[error("statsd line is not valid utf-8")]
    InvalidUtf8,
    /// The metric name is empty.
    #[error("name not found or empty")]
    MissingName,
    /// The type token is not in the type registry.
    #[error("type not found or unsupported")]
    UnsupportedType,
    /// The value is absent for a type that requires one.
    #[error("value required but not specified")]
    MissingValue,
    /// The value is not a number.
    #[error("value is not a number")]
    MalformedValue,
    /// A sample rate was declared for a type that does not support sampling.
    #[error("sample rate not supported for this type")]
    SampleRateNotApplicable,
    /// The sample rate is outside of `[0, 1]`.
    #[error("sample rate out of range")]
    SampleRateOutOfRange,
    /// The sample rate is not a number.
    #[error("sample rate is not a number")]
    MalformedSampleRate,
    /// One of the tag blocks cannot be split into key-value pairs.
    #[error("invalid tags")]
    MalformedTags,
}

impl DecodeErrorKind {
    /// Returns a short, stable identifier of this error kind for use in logs and counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrammarMismatch => "grammar-mismatch",
            Self::InvalidUtf8 => "invalid-utf8",
            Self::MissingName => "missing-name",
            Self::UnsupportedType => "unsupported-type",
            Self::MissingValue => "missing-value",
            Self::MalformedValue => "malformed-value",
            Self::SampleRateNotApplicable => "sample-rate-not-applicable",
            Self::SampleRateOutOfRange => "sample-rate-out-of-range",
            Self::MalformedSampleRate => "malformed-sample-rate",
            Self::MalformedTags => "malformed-tags",
        }
    }
}

/// The lower-level error underlying a [`DecodeError`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeCause {
    /// See [`DecodeErrorKind::InvalidUtf8`].
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    /// See [`DecodeErrorKind::MalformedValue`].
    #[error(transparent)]
    Number(#[from] ParseNumberError),
    /// See [`DecodeErrorKind::MalformedSampleRate`].
    #[error(transparent)]
    SampleRate(#[from] ParseFloatError),
    /// See [`DecodeErrorKind::MalformedTags`].
    #[error(transparent)]
    Tags(#[from] ParseTagsError),
}

/// The raw bytes of a rejected line.
#[derive(Clone, Eq, PartialEq)]
pub struct RawLine(Vec<u8>);

impl RawLine {
    /// The bytes of the line as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawLine")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

/// An error returned by [`StatsdDecoder::decode`](crate::StatsdDecoder::decode).
///
/// A single rejected line fails the entire datagram. The error identifies the line by its
/// 1-based position in the datagram and retains its raw bytes for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("{kind} in line {line_number}: {line}")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    line_number: usize,
    line: RawLine,
    #[source]
    source: Option<DecodeCause>,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, line_number: usize, line: &[u8]) -> Self {
        Self {
            kind,
            line_number,
            line: RawLine(line.to_vec()),
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: impl Into<DecodeCause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The reason the line was rejected.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// The 1-based position of the rejected line within the datagram.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The raw bytes of the rejected line.
    pub fn line(&self) -> &RawLine {
        &self.line
    }
}
