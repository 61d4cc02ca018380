use std::collections::BTreeMap;
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::tags::{self, TagDialect};
use crate::{
    Clock, DecodeError, DecodeErrorKind, FiniteF64, Metric, MetricKind, NumberFormat, Quantity,
    Record, StatsdType, SystemClock, TypeRegistry,
};

/// Matches `NAME[,INFLUXTAGS][:VALUE]|TYPE[|@SAMPLERATE][|#TAGS]`.
fn statsd_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<name>[^:@|,]*)",
            r"(?:,(?P<influx>[^:@|]+))?",
            r"(?::(?P<value>[^|]*))?",
            r"\|(?P<type>[^|]+)",
            r"(?:\|@(?P<rate>[^|]+))?",
            r"(?:\|#(?P<tags>.+))?$",
        ))
        .unwrap()
    })
}

/// The raw components of a statsd line that matched the grammar.
#[derive(Debug, Default, PartialEq)]
struct LineFields<'a> {
    name: &'a str,
    influx_tags: Option<&'a str>,
    value: Option<&'a str>,
    ty: &'a str,
    sample_rate: Option<&'a str>,
    tags: Option<&'a str>,
}

impl<'a> LineFields<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let captures = statsd_grammar().captures(line)?;
        let group = |name| captures.name(name).map(|m| m.as_str());

        Some(Self {
            name: group("name")?,
            influx_tags: group("influx"),
            // An empty value is the same as no value at all.
            value: group("value").filter(|v| !v.is_empty()),
            ty: group("type")?,
            sample_rate: group("rate"),
            tags: group("tags"),
        })
    }
}

/// The position and raw bytes of the line being decoded.
#[derive(Clone, Copy)]
struct LineContext<'a> {
    number: usize,
    bytes: &'a [u8],
}

impl LineContext<'_> {
    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.number, self.bytes)
    }
}

/// Decodes statsd datagrams into [`Record`]s.
///
/// Both the traditional statsd protocol and the DogStatsD and InfluxDB tag extensions are
/// supported:
///
/// ```text
/// NAME[,INFLUXTAGS][:VALUE]|TYPE[|@SAMPLERATE][|#TAGS]
/// ```
///
/// Each counter, timer, or meter value is a sample of its metric rather than a delta to be
/// folded into an aggregate; aggregation happens downstream.
///
/// The decoder holds only immutable configuration and the injected [`Clock`], so a single
/// instance can serve any number of threads. Randomness for sampling is passed into every call
/// to [`decode`](Self::decode).
///
/// # Example
///
/// ```
/// use mad_metrics::StatsdDecoder;
///
/// let decoder = StatsdDecoder::default();
/// let records = decoder
///     .decode(b"api.latency:12.5|ms|#host:web1", &mut rand::rng())
///     .expect("datagram should decode");
///
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].dimension("host"), Some("web1"));
/// ```
#[derive(Clone, Debug)]
pub struct StatsdDecoder<C = SystemClock> {
    registry: TypeRegistry,
    number_format: NumberFormat,
    clock: C,
}

impl StatsdDecoder {
    /// Creates a decoder using the system clock.
    pub fn new(registry: TypeRegistry, number_format: NumberFormat) -> Self {
        Self {
            registry,
            number_format,
            clock: SystemClock,
        }
    }
}

impl Default for StatsdDecoder {
    fn default() -> Self {
        Self::new(TypeRegistry::default(), NumberFormat::default())
    }
}

impl<C: Clock> StatsdDecoder<C> {
    /// Replaces the clock used to timestamp records.
    pub fn with_clock<T: Clock>(self, clock: T) -> StatsdDecoder<T> {
        StatsdDecoder {
            registry: self.registry,
            number_format: self.number_format,
            clock,
        }
    }

    /// The type registry used to resolve type tokens.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Decodes all lines of a datagram.
    ///
    /// Lines are separated by `\n` and empty lines are skipped. Lines whose sample rate causes
    /// them to be dropped produce no record. The remaining records are returned in line order.
    ///
    /// If any line is invalid, the entire datagram is rejected and records decoded from earlier
    /// lines are discarded.
    pub fn decode<R: Rng>(&self, datagram: &[u8], rng: &mut R) -> Result<Vec<Record>, DecodeError> {
        let mut records = Vec::new();

        for (index, bytes) in datagram.split(|&b| b == b'\n').enumerate() {
            if bytes.is_empty() {
                continue;
            }

            let line = LineContext {
                number: index + 1,
                bytes,
            };

            if let Some(record) = self.decode_line(line, rng)? {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn decode_line<R: Rng>(
        &self,
        line: LineContext<'_>,
        rng: &mut R,
    ) -> Result<Option<Record>, DecodeError> {
        let text = std::str::from_utf8(line.bytes)
            .map_err(|e| line.error(DecodeErrorKind::InvalidUtf8).with_source(e))?;

        let fields =
            LineFields::parse(text).ok_or_else(|| line.error(DecodeErrorKind::GrammarMismatch))?;

        if fields.name.is_empty() {
            return Err(line.error(DecodeErrorKind::MissingName));
        }

        let ty = self
            .registry
            .get(fields.ty)
            .ok_or_else(|| line.error(DecodeErrorKind::UnsupportedType))?;

        let value = self.resolve_value(line, fields.value, ty)?;
        let sample_rate = resolve_sample_rate(line, fields.sample_rate, ty)?;

        let influx = tags::parse_tags(fields.influx_tags, TagDialect::Influx)
            .map_err(|e| line.error(DecodeErrorKind::MalformedTags).with_source(e))?;
        let classic = tags::parse_tags(fields.tags, TagDialect::Classic)
            .map_err(|e| line.error(DecodeErrorKind::MalformedTags).with_source(e))?;

        if !is_sampled_in(sample_rate, rng) {
            mad_log::trace!(
                metric = fields.name,
                sample_rate,
                "dropping statsd line by sample rate"
            );
            return Ok(None);
        }

        let dimensions = tags::merge_tags(influx, classic);
        Ok(Some(self.build_record(fields.name, value, ty, dimensions)))
    }

    fn resolve_value(
        &self,
        line: LineContext<'_>,
        value: Option<&str>,
        ty: &StatsdType,
    ) -> Result<FiniteF64, DecodeError> {
        match value {
            None if ty.kind == MetricKind::Meter => Ok(FiniteF64::from(1)),
            None => Err(line.error(DecodeErrorKind::MissingValue)),
            Some(value) => self
                .number_format
                .parse(value)
                .map_err(|e| line.error(DecodeErrorKind::MalformedValue).with_source(e)),
        }
    }

    fn build_record(
        &self,
        name: &str,
        value: FiniteF64,
        ty: &StatsdType,
        dimensions: BTreeMap<String, String>,
    ) -> Record {
        let metric = Metric::single(ty.kind, Quantity::new(value, ty.unit));

        Record::new(
            Uuid::new_v4(),
            self.clock.now(),
            dimensions,
            BTreeMap::from([(name.to_owned(), metric)]),
        )
    }
}

/// Parses and validates the optional sample rate of a line.
fn resolve_sample_rate(
    line: LineContext<'_>,
    sample_rate: Option<&str>,
    ty: &StatsdType,
) -> Result<Option<f64>, DecodeError> {
    let Some(sample_rate) = sample_rate else {
        return Ok(None);
    };

    if !ty.sampled {
        return Err(line.error(DecodeErrorKind::SampleRateNotApplicable));
    }

    let rate: f64 = sample_rate
        .parse()
        .map_err(|e| line.error(DecodeErrorKind::MalformedSampleRate).with_source(e))?;

    // NaN fails the range check as well.
    if !(0.0..=1.0).contains(&rate) {
        return Err(line.error(DecodeErrorKind::SampleRateOutOfRange));
    }

    Ok(Some(rate))
}

/// Decides whether a line with the given sample rate is kept.
///
/// A rate of `1` always keeps and a rate of `0` always drops the line. For any other rate, one
/// uniform draw from `[0, 1)` keeps the line if it does not exceed the rate.
fn is_sampled_in<R: Rng>(sample_rate: Option<f64>, rng: &mut R) -> bool {
    match sample_rate {
        None => true,
        Some(rate) if rate >= 1.0 => true,
        Some(rate) if rate <= 0.0 => false,
        Some(rate) => rng.random::<f64>() <= rate,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_pcg::Pcg32;
    use similar_asserts::assert_eq;

    use crate::{DurationUnit, FixedClock, MetricUnit};

    use super::*;

    fn decoder() -> StatsdDecoder<FixedClock> {
        let time = Utc.with_ymd_and_hms(2017, 5, 9, 21, 3, 12).unwrap();
        StatsdDecoder::default().with_clock(FixedClock(time))
    }

    fn decode(datagram: &str) -> Result<Vec<Record>, DecodeError> {
        decoder().decode(datagram.as_bytes(), &mut Pcg32::seed_from_u64(4711))
    }

    fn decode_one(line: &str) -> Record {
        let mut records = decode(line).unwrap();
        assert_eq!(records.len(), 1);
        records.pop().unwrap()
    }

    fn error_kind(datagram: &str) -> DecodeErrorKind {
        decode(datagram).unwrap_err().kind()
    }

    fn single_value(record: &Record, name: &str) -> (MetricKind, f64, MetricUnit) {
        let metric = record.metric(name).unwrap();
        assert_eq!(metric.values().len(), 1);
        let quantity = metric.values()[0];
        (metric.kind(), quantity.value().to_f64(), quantity.unit())
    }

    fn dimensions(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_grammar_fields() {
        let fields = LineFields::parse("name,a=1,b=2:3.5|ms|@0.5|#c:3").unwrap();
        assert_eq!(
            fields,
            LineFields {
                name: "name",
                influx_tags: Some("a=1,b=2"),
                value: Some("3.5"),
                ty: "ms",
                sample_rate: Some("0.5"),
                tags: Some("c:3"),
            }
        );
    }

    #[test]
    fn test_grammar_optional_value() {
        let fields = LineFields::parse("hits|m").unwrap();
        assert_eq!(fields.value, None);

        let fields = LineFields::parse("hits:|m").unwrap();
        assert_eq!(fields.value, None);
    }

    #[test]
    fn test_grammar_rejects() {
        assert!(LineFields::parse("bad_line").is_none());
        assert!(LineFields::parse("name:1").is_none());
        assert!(LineFields::parse("name:1|").is_none());
        assert!(LineFields::parse("na@me:1|c").is_none());
        assert!(LineFields::parse("name:1|c|x").is_none());
    }

    #[test]
    fn test_decode_counter() {
        let record = decode_one("hits:42|c");

        assert_eq!(
            single_value(&record, "hits"),
            (MetricKind::Counter, 42.0, MetricUnit::None)
        );
        assert!(record.dimensions().is_empty());
        assert_eq!(record.metrics().len(), 1);
        assert_eq!(
            record.time(),
            Utc.with_ymd_and_hms(2017, 5, 9, 21, 3, 12).unwrap()
        );
    }

    #[test]
    fn test_decode_registry_types() {
        let ms = MetricUnit::Duration(DurationUnit::MilliSecond);

        let cases = [
            ("x:1|c", MetricKind::Counter, 1.0, MetricUnit::None),
            ("x:-2.5|g", MetricKind::Gauge, -2.5, MetricUnit::None),
            ("x:320|ms", MetricKind::Timer, 320.0, ms),
            ("x:0.25|h", MetricKind::Histogram, 0.25, MetricUnit::None),
            ("x:3|m", MetricKind::Meter, 3.0, MetricUnit::None),
        ];

        for (line, kind, value, unit) in cases {
            let record = decode_one(line);
            assert_eq!(single_value(&record, "x"), (kind, value, unit), "{line}");
        }
    }

    #[test]
    fn test_decode_grouped_value() {
        let record = decode_one("bytes:1,234.5|h");
        assert_eq!(single_value(&record, "bytes").1, 1234.5);
    }

    #[test]
    fn test_decode_meter_without_value() {
        for line in ["requests|m", "requests:|m"] {
            let record = decode_one(line);
            assert_eq!(
                single_value(&record, "requests"),
                (MetricKind::Meter, 1.0, MetricUnit::None)
            );
        }
    }

    #[test]
    fn test_decode_missing_value() {
        assert_eq!(error_kind("requests|c"), DecodeErrorKind::MissingValue);
        assert_eq!(error_kind("requests:|g"), DecodeErrorKind::MissingValue);
    }

    #[test]
    fn test_decode_malformed_value() {
        let error = decode("x:abc|c").unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::MalformedValue);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_decode_missing_name() {
        assert_eq!(error_kind(":1|c"), DecodeErrorKind::MissingName);
        assert_eq!(error_kind(",a=1:1|c"), DecodeErrorKind::MissingName);
    }

    #[test]
    fn test_decode_unsupported_type() {
        assert_eq!(error_kind("x:1|s"), DecodeErrorKind::UnsupportedType);
        assert_eq!(error_kind("x:1|counter"), DecodeErrorKind::UnsupportedType);
    }

    #[test]
    fn test_decode_grammar_mismatch() {
        let error = decode("bad_line").unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::GrammarMismatch);
        assert_eq!(error.line().as_bytes(), b"bad_line");
        assert_eq!(error.line_number(), 1);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let error = decoder()
            .decode(b"x\xff:1|c", &mut Pcg32::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::InvalidUtf8);
    }

    #[test]
    fn test_decode_tag_dialects() {
        let expected = dimensions(&[("a", "1"), ("b", "2")]);

        let plain = decode_one("name:1|c");
        assert!(plain.metric("name").is_some());
        assert!(plain.dimensions().is_empty());

        let classic = decode_one("name:1|c|#a:1,b:2");
        assert!(classic.metric("name").is_some());
        assert_eq!(classic.dimensions(), &expected);

        let influx = decode_one("name,a=1,b=2:1|c");
        assert!(influx.metric("name").is_some());
        assert_eq!(influx.dimensions(), &expected);
    }

    #[test]
    fn test_decode_tag_overlay() {
        let record = decode_one("name,a=influx,b=2:1|c|#a:classic,c:3");
        assert_eq!(
            record.dimensions(),
            &dimensions(&[("a", "classic"), ("b", "2"), ("c", "3")])
        );
    }

    #[test]
    fn test_decode_mixed_tag_separators() {
        let error = decode("name:1|c|#a:1,b=ignored").unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::MalformedTags);
        insta::assert_snapshot!(
            mad_log::LogError(&error).to_string(),
            @r#"
        invalid tags in line 1: name:1|c|#a:1,b=ignored
          caused by: classic tag "b=ignored" must contain exactly one ':'
        "#
        );
    }

    #[test]
    fn test_decode_batch_fails_atomically() {
        let error = decode("ok:1|c\nbad_line\n").unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::GrammarMismatch);
        assert_eq!(error.line_number(), 2);
    }

    #[test]
    fn test_decode_multiple_lines() {
        let records = decode("a:1|c\n\n\nb:2|g\nc:3|ms\n").unwrap();
        let names: Vec<_> = records
            .iter()
            .flat_map(|r| r.metrics().keys().cloned())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decode_empty_datagram() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_does_not_trim_whitespace() {
        assert_eq!(error_kind("x:1|c\r\n"), DecodeErrorKind::UnsupportedType);
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        assert_eq!(error_kind("x:1|c|@2.0"), DecodeErrorKind::SampleRateOutOfRange);
        assert_eq!(error_kind("x:1|c|@-0.1"), DecodeErrorKind::SampleRateOutOfRange);
        assert_eq!(error_kind("x:1|c|@NaN"), DecodeErrorKind::SampleRateOutOfRange);
    }

    #[test]
    fn test_sample_rate_not_applicable() {
        assert_eq!(
            error_kind("x:1|g|@0.5"),
            DecodeErrorKind::SampleRateNotApplicable
        );
        assert_eq!(
            error_kind("x|m|@0.5"),
            DecodeErrorKind::SampleRateNotApplicable
        );
    }

    #[test]
    fn test_sample_rate_malformed() {
        assert_eq!(error_kind("x:1|c|@half"), DecodeErrorKind::MalformedSampleRate);
    }

    #[test]
    fn test_sample_rate_one_always_keeps() {
        // A constant `u64::MAX` yields the largest possible draw.
        for mut rng in [StepRng::new(0, 0), StepRng::new(u64::MAX, 0)] {
            let records = decoder().decode(b"x:1|c|@1.0", &mut rng).unwrap();
            assert_eq!(records.len(), 1);
        }

        for seed in 0..100 {
            let records = decoder()
                .decode(b"x:1|c|@1", &mut Pcg32::seed_from_u64(seed))
                .unwrap();
            assert_eq!(records.len(), 1);
        }
    }

    #[test]
    fn test_sample_rate_zero_always_drops() {
        for seed in 0..100 {
            let records = decoder()
                .decode(b"x:1|c|@0", &mut Pcg32::seed_from_u64(seed))
                .unwrap();
            assert!(records.is_empty());
        }

        let records = decoder()
            .decode(b"x:1|c|@0.0", &mut StepRng::new(0, 0))
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_sample_rate_drop_keeps_other_lines() {
        let records = decode("a:1|c|@0\nb:1|c").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].metric("b").is_some());
    }

    #[test]
    fn test_sample_rate_convergence() {
        let decoder = decoder();
        let mut rng = Pcg32::seed_from_u64(0xdead_beef);

        for rate in [0.1, 0.25, 0.5, 0.9] {
            let line = format!("x:1|c|@{rate}");
            let trials = 20_000;
            let kept = (0..trials)
                .filter(|_| !decoder.decode(line.as_bytes(), &mut rng).unwrap().is_empty())
                .count();

            let fraction = kept as f64 / trials as f64;
            assert!(
                (fraction - rate).abs() < 0.02,
                "rate {rate} retained {fraction}"
            );
        }
    }

    #[test]
    fn test_decode_twice_differs_in_id_only() {
        let decoder = decoder();
        let mut rng = Pcg32::seed_from_u64(1);

        let first = decoder.decode(b"x:1|c|@1.0|#a:b", &mut rng).unwrap();
        let second = decoder.decode(b"x:1|c|@1.0|#a:b", &mut rng).unwrap();

        assert_ne!(first[0].id(), second[0].id());
        assert_eq!(first[0].time(), second[0].time());
        assert_eq!(first[0].dimensions(), second[0].dimensions());
        assert_eq!(first[0].metrics(), second[0].metrics());
    }

    #[test]
    fn test_custom_registry() {
        let registry = TypeRegistry::new([StatsdType {
            token: "d".to_owned(),
            kind: MetricKind::Histogram,
            unit: MetricUnit::Duration(DurationUnit::Second),
            sampled: false,
        }])
        .unwrap();

        let decoder = StatsdDecoder::new(registry, NumberFormat::default());
        let mut rng = Pcg32::seed_from_u64(1);

        let records = decoder.decode(b"x:1.5|d", &mut rng).unwrap();
        insta::assert_debug_snapshot!(records[0].metrics(), @r#"
        {
            "x": Metric {
                kind: Histogram,
                values: [
                    Quantity {
                        value: 1.5,
                        unit: Duration(
                            Second,
                        ),
                    },
                ],
            },
        }
        "#);

        let error = decoder.decode(b"x:1|c", &mut rng).unwrap_err();
        assert_eq!(error.kind(), DecodeErrorKind::UnsupportedType);
    }
}
