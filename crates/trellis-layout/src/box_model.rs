//! CSS Box Model types.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use serde::Serialize;
use trellis_style::{Edges, Length};

/// A rectangle positioned in 2D space.
///
/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// A rectangle from its corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// A width and a height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// A size from its two extents.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Edge sizes for padding, border, or margin.
///
/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// Resolve per-side lengths; percentages refer to the containing block
    /// width and `auto` contributes nothing.
    ///
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    ///
    /// NOTE: Margin AND padding percentages both resolve against the containing
    /// block's **width**, even for top/bottom.
    #[must_use]
    pub fn resolve(edges: &Edges<Length>, containing_width: f32) -> Self {
        Self {
            top: edges.top.calc_min(containing_width),
            right: edges.right.calc_min(containing_width),
            bottom: edges.bottom.calc_min(containing_width),
            left: edges.left.calc_min(containing_width),
        }
    }

    /// Resolve border and padding widths, which can never be negative.
    #[must_use]
    pub fn resolve_non_negative(edges: &Edges<Length>, containing_width: f32) -> Self {
        let resolved = Self::resolve(edges, containing_width);
        Self {
            top: resolved.top.max(0.0),
            right: resolved.right.max(0.0),
            bottom: resolved.bottom.max(0.0),
            left: resolved.left.max(0.0),
        }
    }

    /// `left + right`.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// `top + bottom`.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Used geometry of one box.
///
/// `x`, `y`, `width` and `height` describe the border box. The position is
/// relative to the border box of the box's offset parent: the nearest
/// ancestor that is not an inline box.
///
/// ```text
/// ┌──────────────────────────────────┐  margin box
/// │   ┌──────────────────────────┐   │  border box (x, y, width, height)
/// │   │   ┌──────────────────┐   │   │  padding box
/// │   │   │   ┌──────────┐   │   │   │  content box
/// │   │   │   └──────────┘   │   │   │
/// │   │   └──────────────────┘   │   │
/// │   └──────────────────────────┘   │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxFrame {
    /// Border box left edge.
    pub x: f32,
    /// Border box top edge.
    pub y: f32,
    /// Border box width.
    pub width: f32,
    /// Border box height.
    pub height: f32,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Used border widths.
    pub border: EdgeSizes,
    /// Used padding.
    pub padding: EdgeSizes,
}

impl BoxFrame {
    /// [§ 3.3 Borders](https://www.w3.org/TR/css-box-3/#borders)
    ///
    /// "The border box contains content, padding, and border areas."
    #[must_use]
    pub const fn border_box(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// [§ 3.1 Margins](https://www.w3.org/TR/css-box-3/#margins)
    ///
    /// "The margin box is the outermost box, and contains all four areas."
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        Rect {
            x: self.x - self.margin.left,
            y: self.y - self.margin.top,
            width: self.width + self.margin.horizontal(),
            height: self.height + self.margin.vertical(),
        }
    }

    /// [§ 3.2 Padding](https://www.w3.org/TR/css-box-3/#paddings)
    ///
    /// "The padding box contains both the content and padding areas."
    ///
    /// Relative to this box's own border box.
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        Rect {
            x: self.border.left,
            y: self.border.top,
            width: (self.width - self.border.horizontal()).max(0.0),
            height: (self.height - self.border.vertical()).max(0.0),
        }
    }

    /// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
    ///
    /// "The content box contains the actual content of the element."
    ///
    /// Relative to this box's own border box.
    #[must_use]
    pub fn content_box(&self) -> Rect {
        Rect {
            x: self.border.left + self.padding.left,
            y: self.border.top + self.padding.top,
            width: self.content_width(),
            height: self.content_height(),
        }
    }

    /// Border box width minus borders and padding.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        (self.width - self.border.horizontal() - self.padding.horizontal()).max(0.0)
    }

    /// Border box height minus borders and padding.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        (self.height - self.border.vertical() - self.padding.vertical()).max(0.0)
    }

    /// Horizontal border plus padding.
    #[must_use]
    pub fn border_padding_horizontal(&self) -> f32 {
        self.border.horizontal() + self.padding.horizontal()
    }

    /// Vertical border plus padding.
    #[must_use]
    pub fn border_padding_vertical(&self) -> f32 {
        self.border.vertical() + self.padding.vertical()
    }
}
