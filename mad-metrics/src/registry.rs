use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DurationUnit, MetricKind, MetricUnit};

/// A statsd type token and its meaning.
///
/// The token is the `TYPE` component of a statsd line, for instance `c` in `hits:1|c`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct StatsdType {
    /// The protocol token.
    pub token: String,
    /// The kind of metric produced for this token.
    pub kind: MetricKind,
    /// The unit assigned to every quantity of this type.
    #[serde(default, skip_serializing_if = "MetricUnit::is_none")]
    pub unit: MetricUnit,
    /// Whether lines of this type may declare a sample rate with `|@<rate>`.
    #[serde(default)]
    pub sampled: bool,
}

impl StatsdType {
    fn new(token: &str, kind: MetricKind, unit: MetricUnit, sampled: bool) -> Self {
        Self {
            token: token.to_owned(),
            kind,
            unit,
            sampled,
        }
    }
}

/// An error returned when building a [`TypeRegistry`] from a list of types.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// A type has an empty token.
    #[error("statsd type token must not be empty")]
    EmptyToken,
    /// A token contains a `|`, which can never match the statsd grammar.
    #[error("statsd type token {0:?} contains a pipe")]
    InvalidToken(String),
    /// The same token is registered twice.
    #[error("statsd type token {0:?} is registered more than once")]
    DuplicateToken(String),
}

/// The table of statsd type tokens understood by the decoder.
///
/// The default registry contains the following types:
///
/// | token | kind      | unit        | sample rate |
/// |-------|-----------|-------------|-------------|
/// | `c`   | counter   | none        | yes         |
/// | `g`   | gauge     | none        | no          |
/// | `ms`  | timer     | millisecond | yes         |
/// | `h`   | histogram | none        | yes         |
/// | `m`   | meter     | none        | no          |
///
/// Sets (`s`) are not supported, since they would have to be pushed down to bucketing and
/// aggregation as a first-class metric kind.
///
/// The registry is read-only once built. In configuration files it is represented as a list of
/// [`StatsdType`] entries.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<StatsdType>", into = "Vec<StatsdType>")]
pub struct TypeRegistry {
    types: BTreeMap<String, StatsdType>,
}

impl TypeRegistry {
    /// Builds a registry from a list of types.
    pub fn new(types: impl IntoIterator<Item = StatsdType>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();

        for ty in types {
            if ty.token.is_empty() {
                return Err(RegistryError::EmptyToken);
            }
            if ty.token.contains('|') {
                return Err(RegistryError::InvalidToken(ty.token));
            }
            if map.contains_key(&ty.token) {
                return Err(RegistryError::DuplicateToken(ty.token));
            }
            map.insert(ty.token.clone(), ty);
        }

        Ok(Self { types: map })
    }

    /// Resolves a protocol token.
    pub fn get(&self, token: &str) -> Option<&StatsdType> {
        self.types.get(token)
    }

    /// Iterates all registered types ordered by token.
    pub fn iter(&self) -> impl Iterator<Item = &StatsdType> {
        self.types.values()
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let ms = MetricUnit::Duration(DurationUnit::MilliSecond);
        let types = [
            StatsdType::new("c", MetricKind::Counter, MetricUnit::None, true),
            StatsdType::new("g", MetricKind::Gauge, MetricUnit::None, false),
            StatsdType::new("ms", MetricKind::Timer, ms, true),
            StatsdType::new("h", MetricKind::Histogram, MetricUnit::None, true),
            StatsdType::new("m", MetricKind::Meter, MetricUnit::None, false),
        ];

        Self {
            types: types.into_iter().map(|ty| (ty.token.clone(), ty)).collect(),
        }
    }
}

impl TryFrom<Vec<StatsdType>> for TypeRegistry {
    type Error = RegistryError;

    fn try_from(types: Vec<StatsdType>) -> Result<Self, Self::Error> {
        Self::new(types)
    }
}

impl From<TypeRegistry> for Vec<StatsdType> {
    fn from(registry: TypeRegistry) -> Self {
        registry.types.into_values().collect()
    }
}
