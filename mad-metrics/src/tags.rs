//! Parsing and merging of the two statsd tag dialects.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// A syntax for encoding dimensions in a statsd line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagDialect {
    /// InfluxDB style tags attached to the name: `name,key=value,key=value:1|c`.
    Influx,
    /// DogStatsD style tags at the end of the line: `name:1|c|#key:value,key:value`.
    Classic,
}

impl TagDialect {
    /// The character separating a tag key from its value.
    pub fn separator(self) -> char {
        match self {
            Self::Influx => '=',
            Self::Classic => ':',
        }
    }
}

impl fmt::Display for TagDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Influx => f.write_str("influx"),
            Self::Classic => f.write_str("classic"),
        }
    }
}

/// An error returned when a tag block cannot be split into key-value pairs.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseTagsError {
    /// An entry does not contain exactly one key-value separator.
    #[error("{dialect} tag {entry:?} must contain exactly one {:?}", .dialect.separator())]
    InvalidEntry {
        /// The tag dialect of the block.
        dialect: TagDialect,
        /// The offending entry.
        entry: String,
    },
    /// An entry has an empty key.
    #[error("{dialect} tag {entry:?} has an empty key")]
    EmptyKey {
        /// The tag dialect of the block.
        dialect: TagDialect,
        /// The offending entry.
        entry: String,
    },
    /// A key occurs more than once in the same block.
    #[error("duplicate {dialect} tag {key:?}")]
    DuplicateKey {
        /// The tag dialect of the block.
        dialect: TagDialect,
        /// The repeated key.
        key: String,
    },
}

/// Parses a comma separated tag block of the given dialect.
///
/// Returns an empty map if the block is absent. Values may be empty, keys may not.
pub fn parse_tags(
    block: Option<&str>,
    dialect: TagDialect,
) -> Result<BTreeMap<String, String>, ParseTagsError> {
    let mut tags = BTreeMap::new();
    let Some(block) = block else {
        return Ok(tags);
    };

    let separator = dialect.separator();
    for entry in block.split(',') {
        let mut parts = entry.split(separator);
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseTagsError::InvalidEntry {
                dialect,
                entry: entry.to_owned(),
            });
        };

        if key.is_empty() {
            return Err(ParseTagsError::EmptyKey {
                dialect,
                entry: entry.to_owned(),
            });
        }

        match tags.entry(key.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
            }
            Entry::Occupied(slot) => {
                return Err(ParseTagsError::DuplicateKey {
                    dialect,
                    key: slot.key().clone(),
                });
            }
        }
    }

    Ok(tags)
}

/// Merges the tags of both dialects into one dimension map.
///
/// Influx tags are applied first, classic tags are overlaid on top. On a key collision, the
/// classic value wins.
pub fn merge_tags(
    influx: BTreeMap<String, String>,
    classic: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut dimensions = influx;
    dimensions.extend(classic);
    dimensions
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_absent() {
        assert_eq!(parse_tags(None, TagDialect::Classic), Ok(BTreeMap::new()));
    }

    #[test]
    fn test_parse_classic() {
        let tags = parse_tags(Some("a:1,b:2"), TagDialect::Classic).unwrap();
        assert_eq!(tags, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_influx() {
        let tags = parse_tags(Some("a=1,b=2"), TagDialect::Influx).unwrap();
        assert_eq!(tags, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_empty_value() {
        let tags = parse_tags(Some("a:"), TagDialect::Classic).unwrap();
        assert_eq!(tags, map(&[("a", "")]));
    }

    #[test]
    fn test_parse_wrong_separator() {
        let result = parse_tags(Some("a:1,b=ignored"), TagDialect::Classic);
        assert_eq!(
            result,
            Err(ParseTagsError::InvalidEntry {
                dialect: TagDialect::Classic,
                entry: "b=ignored".to_owned(),
            })
        );
    }

    #[test]
    fn test_parse_multiple_separators() {
        let result = parse_tags(Some("url:http://x"), TagDialect::Classic);
        assert!(matches!(result, Err(ParseTagsError::InvalidEntry { .. })));
    }

    #[test]
    fn test_parse_empty_key() {
        let result = parse_tags(Some("=1"), TagDialect::Influx);
        assert!(matches!(result, Err(ParseTagsError::EmptyKey { .. })));

        let result = parse_tags(Some("a:1,"), TagDialect::Classic);
        assert!(matches!(result, Err(ParseTagsError::InvalidEntry { .. })));
    }

    #[test]
    fn test_parse_duplicate_key() {
        let result = parse_tags(Some("a:1,a:2"), TagDialect::Classic);
        assert_eq!(
            result,
            Err(ParseTagsError::DuplicateKey {
                dialect: TagDialect::Classic,
                key: "a".to_owned(),
            })
        );
    }

    #[test]
    fn test_merge_classic_wins() {
        let influx = map(&[("a", "influx"), ("b", "2")]);
        let classic = map(&[("a", "classic"), ("c", "3")]);

        let merged = merge_tags(influx, classic);
        assert_eq!(merged, map(&[("a", "classic"), ("b", "2"), ("c", "3")]));
    }

    #[test]
    fn test_error_message() {
        let error = ParseTagsError::InvalidEntry {
            dialect: TagDialect::Classic,
            entry: "b=ignored".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            r#"classic tag "b=ignored" must contain exactly one ':'"#
        );
    }
}
