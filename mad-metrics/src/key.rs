use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Record;

/// Dimension holding the name of the cluster.
pub const CLUSTER_DIMENSION: &str = "cluster";
/// Dimension holding the name of the service.
pub const SERVICE_DIMENSION: &str = "service";
/// Dimension holding the name of the host.
pub const HOST_DIMENSION: &str = "host";

/// The identity under which metrics are aggregated.
///
/// Two keys are equal only if all of their dimensions match exactly. The well-known dimensions
/// are exposed as accessors over the same mapping.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AggregationKey {
    dimensions: BTreeMap<String, String>,
}

impl AggregationKey {
    /// Creates a key from a set of dimensions.
    pub fn new(dimensions: BTreeMap<String, String>) -> Self {
        Self { dimensions }
    }

    /// Creates a key from the dimensions of a record.
    pub fn from_record(record: &Record) -> Self {
        Self::new(record.dimensions().clone())
    }

    /// All dimensions of this key.
    pub fn dimensions(&self) -> &BTreeMap<String, String> {
        &self.dimensions
    }

    /// The value of the `cluster` dimension.
    pub fn cluster(&self) -> Option<&str> {
        self.get(CLUSTER_DIMENSION)
    }

    /// The value of the `service` dimension.
    pub fn service(&self) -> Option<&str> {
        self.get(SERVICE_DIMENSION)
    }

    /// The value of the `host` dimension.
    pub fn host(&self) -> Option<&str> {
        self.get(HOST_DIMENSION)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.dimensions.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}
