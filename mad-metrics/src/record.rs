use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::{FiniteF64, MetricKind, MetricUnit};

/// A single numeric magnitude with its unit.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quantity {
    value: FiniteF64,
    #[serde(default, skip_serializing_if = "MetricUnit::is_none")]
    unit: MetricUnit,
}

impl Quantity {
    /// Creates a new quantity.
    pub fn new(value: FiniteF64, unit: MetricUnit) -> Self {
        Self { value, unit }
    }

    /// The magnitude of this quantity.
    pub fn value(&self) -> FiniteF64 {
        self.value
    }

    /// The unit of this quantity.
    pub fn unit(&self) -> MetricUnit {
        self.unit
    }
}

/// The values of a [`Metric`].
///
/// Decoded statsd lines carry exactly one value, so the first quantity is stored inline.
pub type QuantityValues = SmallVec<[Quantity; 1]>;

/// A metric of a given kind with an ordered list of samples.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Metric {
    #[serde(rename = "type")]
    kind: MetricKind,
    values: QuantityValues,
}

impl Metric {
    /// Creates a metric from a list of samples.
    pub fn new(kind: MetricKind, values: impl IntoIterator<Item = Quantity>) -> Self {
        Self {
            kind,
            values: values.into_iter().collect(),
        }
    }

    /// Creates a metric holding a single sample.
    pub fn single(kind: MetricKind, quantity: Quantity) -> Self {
        Self::new(kind, [quantity])
    }

    /// The kind of this metric.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// The samples of this metric in submission order.
    pub fn values(&self) -> &[Quantity] {
        &self.values
    }
}

/// An immutable, decoded submission.
///
/// Records carry a unique identifier, the instant they were captured, a set of dimensions and
/// the metrics keyed by name. Both maps are fixed once the record is built.
///
/// # JSON Representation
///
/// ```json
/// {
///   "id": "f5a1a2d4-55e4-4c3c-9d61-0a4ec2b2c0f4",
///   "time": "2017-05-09T21:03:12Z",
///   "dimensions": {"host": "web1"},
///   "metrics": {
///     "api.latency": {"type": "timer", "values": [{"value": 12.5, "unit": "millisecond"}]}
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Record {
    id: Uuid,
    time: DateTime<Utc>,
    #[serde(default)]
    dimensions: BTreeMap<String, String>,
    metrics: BTreeMap<String, Metric>,
}

impl Record {
    /// Creates a new record.
    pub fn new(
        id: Uuid,
        time: DateTime<Utc>,
        dimensions: BTreeMap<String, String>,
        metrics: BTreeMap<String, Metric>,
    ) -> Self {
        Self {
            id,
            time,
            dimensions,
            metrics,
        }
    }

    /// The unique identifier assigned when the record was built.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The capture time of the record.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// All dimensions of this record.
    pub fn dimensions(&self) -> &BTreeMap<String, String> {
        &self.dimensions
    }

    /// Returns the value of the specified dimension if it exists.
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }

    /// All metrics of this record keyed by metric name.
    pub fn metrics(&self) -> &BTreeMap<String, Metric> {
        &self.metrics
    }

    /// Returns the metric with the given name if it exists.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }
}
