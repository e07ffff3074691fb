//! Margin collapsing.
//!
//! [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//!
//! "In CSS, the adjoining margins of two or more boxes (which might or might
//! not be siblings) can combine to form a single margin. Margins that combine
//! this way are said to collapse, and the resulting combined margin is called
//! a collapsed margin."
//!
//! "When two or more margins collapse, the resulting margin width is the
//! maximum of the collapsing margins' widths. In the case of negative
//! margins, the maximum of the absolute values of the negative adjoining
//! margins is deducted from the maximum of the positive adjoining margins."
//!
//! Positive and negative parts are therefore tracked separately and only
//! combined when a position is needed.

use serde::Serialize;

/// A set of adjoining margins: the largest positive one and the largest
/// magnitude among the negative ones (stored as a non-negative number).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarginPair {
    /// Largest positive margin.
    pub positive: f32,
    /// Largest absolute value of the negative margins.
    pub negative: f32,
}

impl MarginPair {
    /// No margin at all.
    pub const ZERO: Self = Self {
        positive: 0.0,
        negative: 0.0,
    };

    /// A single margin.
    #[must_use]
    pub fn from_margin(value: f32) -> Self {
        if value >= 0.0 {
            Self {
                positive: value,
                negative: 0.0,
            }
        } else {
            Self {
                positive: 0.0,
                negative: -value,
            }
        }
    }

    /// Collapse with another set of adjoining margins.
    #[must_use]
    pub fn collapse_with(self, other: Self) -> Self {
        Self {
            positive: self.positive.max(other.positive),
            negative: self.negative.max(other.negative),
        }
    }

    /// The collapsed margin: `max(positive) − max(|negative|)`.
    #[must_use]
    pub fn resolve(self) -> f32 {
        self.positive - self.negative
    }
}

/// The four scalars a block container keeps: its own collapsed top and
/// bottom margins, including the margins of children that collapse through
/// its top or bottom edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CollapsedMargins {
    /// Largest positive margin collapsing at the top edge.
    pub pos_top: f32,
    /// Largest negative margin magnitude collapsing at the top edge.
    pub neg_top: f32,
    /// Largest positive margin collapsing at the bottom edge.
    pub pos_bottom: f32,
    /// Largest negative margin magnitude collapsing at the bottom edge.
    pub neg_bottom: f32,
}

impl CollapsedMargins {
    /// Start from the box's own used margins.
    #[must_use]
    pub fn from_own(top: f32, bottom: f32) -> Self {
        let top = MarginPair::from_margin(top);
        let bottom = MarginPair::from_margin(bottom);
        Self {
            pos_top: top.positive,
            neg_top: top.negative,
            pos_bottom: bottom.positive,
            neg_bottom: bottom.negative,
        }
    }

    /// Top edge as a pair.
    #[must_use]
    pub const fn top(&self) -> MarginPair {
        MarginPair {
            positive: self.pos_top,
            negative: self.neg_top,
        }
    }

    /// Bottom edge as a pair.
    #[must_use]
    pub const fn bottom(&self) -> MarginPair {
        MarginPair {
            positive: self.pos_bottom,
            negative: self.neg_bottom,
        }
    }

    /// Fold more margins into the top edge.
    pub fn collapse_top(&mut self, pair: MarginPair) {
        self.pos_top = self.pos_top.max(pair.positive);
        self.neg_top = self.neg_top.max(pair.negative);
    }

    /// Fold more margins into the bottom edge.
    pub fn collapse_bottom(&mut self, pair: MarginPair) {
        self.pos_bottom = self.pos_bottom.max(pair.positive);
        self.neg_bottom = self.neg_bottom.max(pair.negative);
    }

    /// Collapsed top margin.
    #[must_use]
    pub fn collapsed_top(&self) -> f32 {
        self.top().resolve()
    }

    /// Collapsed bottom margin.
    #[must_use]
    pub fn collapsed_bottom(&self) -> f32 {
        self.bottom().resolve()
    }
}

/// Running state of the margin collapsing walk over one container's
/// children.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarginInfo {
    /// A child's top margin may collapse with the container's top margin:
    /// the container has no top border or padding and does not establish a
    /// new block formatting context.
    pub(crate) can_collapse_top: bool,
    /// Likewise for the bottom edge (additionally the height must be `auto`).
    pub(crate) can_collapse_bottom: bool,
    /// No in-flow content has been placed yet.
    pub(crate) at_before_side: bool,
    /// Margins waiting to be resolved against the next in-flow content.
    pub(crate) pending: MarginPair,
}

impl MarginInfo {
    pub(crate) const fn new(can_collapse_top: bool, can_collapse_bottom: bool) -> Self {
        Self {
            can_collapse_top,
            can_collapse_bottom,
            at_before_side: true,
            pending: MarginPair::ZERO,
        }
    }

    /// Whether pending margins are still adjoining the container's top edge.
    pub(crate) const fn collapses_with_top(&self) -> bool {
        self.at_before_side && self.can_collapse_top
    }

    pub(crate) fn add(&mut self, pair: MarginPair) {
        self.pending = self.pending.collapse_with(pair);
    }

    /// Consume the pending margins, returning their collapsed value.
    pub(crate) fn take(&mut self) -> f32 {
        let value = self.pending.resolve();
        self.pending = MarginPair::ZERO;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_signs_subtract_largest_magnitudes() {
        let gap = MarginPair::from_margin(10.0).collapse_with(MarginPair::from_margin(-4.0));
        assert!((gap.resolve() - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_two_negatives_take_the_most_negative() {
        let gap = MarginPair::from_margin(-3.0).collapse_with(MarginPair::from_margin(-8.0));
        assert!((gap.resolve() + 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_collapsed_margins_keep_four_scalars() {
        let mut margins = CollapsedMargins::from_own(5.0, -2.0);
        margins.collapse_top(MarginPair::from_margin(12.0));
        margins.collapse_bottom(MarginPair::from_margin(-6.0));
        assert!((margins.collapsed_top() - 12.0).abs() < f32::EPSILON);
        assert!((margins.collapsed_bottom() + 6.0).abs() < f32::EPSILON);
    }
}
