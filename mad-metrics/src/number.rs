//! Locale-aware parsing of numeric values.

use std::num::ParseFloatError;

use serde::{Deserialize, Serialize};

use crate::FiniteF64;

/// An error returned by [`NumberFormat::parse`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseNumberError {
    /// The input was empty.
    #[error("empty number")]
    Empty,
    /// A character that is not allowed at this position.
    #[error("unexpected character {character:?} at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character in the input.
        position: usize,
    },
    /// The mantissa or the exponent contains no digits.
    #[error("missing digits")]
    MissingDigits,
    /// The normalized number was rejected by the float parser.
    #[error("invalid number")]
    Invalid(#[source] ParseFloatError),
    /// The number does not fit into a finite float.
    #[error("number is not finite")]
    NotFinite,
}

/// Symbols of a numeric locale used to parse metric values.
///
/// The default matches the `en-US` locale: a `.` separates the fraction and `,` groups
/// thousands, so both `1234.5` and `1,234.5` are accepted. Numbers may carry a leading minus
/// sign and an exponent introduced by `E` or `e`. The entire input must form a number; trailing
/// characters are an error.
///
/// The format holds no mutable state and can be shared freely between threads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Separates the integer part from the fraction.
    pub decimal_separator: char,
    /// Groups digits of the integer part.
    pub grouping_separator: char,
}

impl NumberFormat {
    /// Returns `true` if the separators are distinct and cannot be confused with other number
    /// syntax.
    pub fn is_valid(&self) -> bool {
        let reserved = |c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | 'e' | 'E');
        self.decimal_separator != self.grouping_separator
            && !reserved(self.decimal_separator)
            && !reserved(self.grouping_separator)
    }

    /// Parses a finite number from `text`.
    pub fn parse(&self, text: &str) -> Result<FiniteF64, ParseNumberError> {
        if text.is_empty() {
            return Err(ParseNumberError::Empty);
        }

        let mut normalized = String::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();

        if let Some((_, '-')) = chars.peek() {
            normalized.push('-');
            chars.next();
        }

        let mut mantissa_digits = 0;
        let mut in_fraction = false;
        let mut previous_digit = false;

        while let Some(&(position, character)) = chars.peek() {
            let unexpected = ParseNumberError::UnexpectedCharacter {
                character,
                position,
            };

            if character.is_ascii_digit() {
                normalized.push(character);
                mantissa_digits += 1;
                previous_digit = true;
            } else if character == self.grouping_separator && !in_fraction {
                // Groups are only valid between digits of the integer part.
                let next_is_digit = text[position + character.len_utf8()..]
                    .starts_with(|c: char| c.is_ascii_digit());
                if !previous_digit || !next_is_digit {
                    return Err(unexpected);
                }
                previous_digit = false;
            } else if character == self.decimal_separator && !in_fraction {
                normalized.push('.');
                in_fraction = true;
                previous_digit = false;
            } else if matches!(character, 'e' | 'E') {
                break;
            } else {
                return Err(unexpected);
            }

            chars.next();
        }

        if mantissa_digits == 0 {
            return Err(ParseNumberError::MissingDigits);
        }

        if chars.next().is_some() {
            normalized.push('e');

            if let Some(&(_, sign @ ('-' | '+'))) = chars.peek() {
                normalized.push(sign);
                chars.next();
            }

            let mut exponent_digits = 0;
            for (position, character) in chars {
                if !character.is_ascii_digit() {
                    return Err(ParseNumberError::UnexpectedCharacter {
                        character,
                        position,
                    });
                }
                normalized.push(character);
                exponent_digits += 1;
            }

            if exponent_digits == 0 {
                return Err(ParseNumberError::MissingDigits);
            }
        }

        let value: f64 = normalized.parse().map_err(ParseNumberError::Invalid)?;
        FiniteF64::new(value).ok_or(ParseNumberError::NotFinite)
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}
