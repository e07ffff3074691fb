//! Errors produced while parsing style values.

use thiserror::Error;

/// A keyword or length that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// The value is not a keyword of the named property.
    #[error("unknown {property} keyword '{value}'")]
    UnknownKeyword {
        /// Property being parsed, e.g. `"display"`.
        property: &'static str,
        /// The rejected input.
        value: String,
    },
    /// The value is not a `<length>`, `<percentage>`, `auto` or `none`.
    #[error("invalid length '{0}'")]
    InvalidLength(String),
}

/// Parse a keyword-valued property, naming the property in the error.
///
/// # Errors
/// Returns [`StyleError::UnknownKeyword`] if `value` is not a keyword of `T`.
pub fn parse_keyword<T>(property: &'static str, value: &str) -> Result<T, StyleError>
where
    T: std::str::FromStr,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|_| StyleError::UnknownKeyword {
            property,
            value: value.to_string(),
        })
}
