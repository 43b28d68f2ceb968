//! Lenient integer decoding.
//!
//! Integer fields may arrive as JSON floats (`15.0`). Any finite number is
//! accepted and truncated toward zero.

// ============================================================================
// Imports
// ============================================================================

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Number;

// ============================================================================
// Conversion
// ============================================================================

/// Reads a JSON number as an integer.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_integer(number: &Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

// ============================================================================
// Deserializers
// ============================================================================

/// `deserialize_with` target for `i64` fields.
pub(crate) fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    to_integer(&number).ok_or_else(|| D::Error::custom(format!("{number} is not an integer")))
}

/// `deserialize_with` target for `Option<i64>` fields. `null` reads as `None`.
pub(crate) fn optional_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Number>::deserialize(deserializer)? {
        Some(number) => to_integer(&number)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("{number} is not an integer"))),
        None => Ok(None),
    }
}

// ============================================================================
// Tests
// ============================================================================
