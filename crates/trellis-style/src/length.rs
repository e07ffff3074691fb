//! CSS Length values and resolution
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)

use std::str::FromStr;

use serde::Serialize;

use crate::error::StyleError;

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
///
/// A computed length as layout sees it: absolute units have already been
/// converted to pixels by the cascade, percentages are still relative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum Length {
    /// [§ 4.4](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
    ///
    /// "The keyword 'auto'... allows the user agent to compute the value
    /// based on other properties."
    #[default]
    Auto,
    /// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    ///
    /// A length in CSS pixels.
    Fixed(f32),
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    ///
    /// "Percentages are always relative to another quantity."
    Percent(f32),
    /// `none`, only meaningful for `max-width` / `max-height`.
    None,
}

impl Length {
    /// `0px`.
    pub const ZERO: Self = Self::Fixed(0.0);

    /// Whether this is an absolute length.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Whether this is a percentage.
    #[must_use]
    pub const fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Whether this is `auto`.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Whether this is `none`.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this is `0px` or `0%`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Fixed(v) | Self::Percent(v) => *v == 0.0,
            Self::Auto | Self::None => false,
        }
    }

    /// The raw number: pixels for [`Length::Fixed`], the percentage for
    /// [`Length::Percent`], zero otherwise.
    #[must_use]
    pub const fn value(&self) -> f32 {
        match self {
            Self::Fixed(v) | Self::Percent(v) => *v,
            Self::Auto | Self::None => 0.0,
        }
    }

    /// Resolve against a container dimension.
    ///
    /// `auto` and `none` resolve to the whole container, which is what the
    /// width equations and `max-*` clamps want.
    #[must_use]
    pub fn calc(&self, container: f32) -> f32 {
        match self {
            Self::Fixed(v) => *v,
            Self::Percent(p) => container * p / 100.0,
            Self::Auto | Self::None => container,
        }
    }

    /// Resolve against a container dimension, with `auto` and `none`
    /// contributing nothing (margins, padding, `min-*`).
    #[must_use]
    pub fn calc_min(&self, container: f32) -> f32 {
        match self {
            Self::Fixed(v) => *v,
            Self::Percent(p) => container * p / 100.0,
            Self::Auto | Self::None => 0.0,
        }
    }

    /// Resolve if the result does not depend on an unknown container.
    ///
    /// Percentages resolve only when `container` is definite.
    #[must_use]
    pub fn resolve(&self, container: Option<f32>) -> Option<f32> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Percent(p) => container.map(|c| c * p / 100.0),
            Self::Auto | Self::None => None,
        }
    }
}

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
///
/// Accepts `auto`, `none`, `<number>px`, a unitless number (pixels) and
/// `<number>%`.
impl FromStr for Length {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if input.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }

        let invalid = || StyleError::InvalidLength(s.to_string());
        if let Some(number) = input.strip_suffix('%') {
            return number
                .trim()
                .parse::<f32>()
                .map(Self::Percent)
                .map_err(|_| invalid());
        }

        let number = input
            .strip_suffix("px")
            .or_else(|| input.strip_suffix("PX"))
            .unwrap_or(input);
        let value = number.trim().parse::<f32>().map_err(|_| invalid())?;
        if value.is_finite() {
            Ok(Self::Fixed(value))
        } else {
            Err(invalid())
        }
    }
}
