//! Keyword-valued properties consulted by layout.
//!
//! Each enum parses from its CSS keyword (`"table-header-group"`,
//! `"border-box"`, ...) through [`std::str::FromStr`].

use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};

/// [§ 9.3.1 Choosing a positioning scheme: 'position' property](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Position {
    /// "The box is a normal box, laid out according to the normal flow."
    #[default]
    Static,
    /// "The box's position is calculated according to the normal flow. Then
    /// the box is offset relative to its normal position."
    Relative,
    /// "The box's position (and possibly size) is specified with the 'top',
    /// 'right', 'bottom', and 'left' properties."
    Absolute,
    /// "The box's position is calculated according to the 'absolute' model,
    /// but in addition, the box is fixed with respect to some reference."
    Fixed,
}

impl Position {
    /// Absolutely positioned boxes are taken out of the normal flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Float {
    /// "The box is not floated."
    #[default]
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Clear {
    /// "No constraint on the box's position with respect to floats."
    #[default]
    None,
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes."
    Left,
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any right-floating boxes."
    Right,
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any right-floating and left-floating boxes."
    Both,
}

/// [§ 4.4 box-sizing](https://www.w3.org/TR/css-box-4/#box-sizing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BoxSizing {
    /// Width and height apply to the content box.
    #[default]
    ContentBox,
    /// Width and height include padding and border.
    BorderBox,
}

/// [§ 2.1 Specifying directionality: the direction property](https://www.w3.org/TR/css-writing-modes-3/#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Direction {
    /// Left-to-right inline base direction.
    #[default]
    Ltr,
    /// Right-to-left inline base direction.
    Rtl,
}

/// [§ 7.1 Text Alignment: the text-align shorthand](https://www.w3.org/TR/css-text-3/#text-align-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TextAlign {
    /// "Inline-level content is aligned to the start edge of the line box."
    #[default]
    Start,
    /// "Inline-level content is aligned to the end edge of the line box."
    End,
    /// "Inline-level content is aligned to the line-left edge of the line box."
    Left,
    /// "Inline-level content is aligned to the line-right edge of the line box."
    Right,
    /// "Inline-level content is centered within the line box."
    Center,
    /// "Text is justified according to the method specified by the
    /// text-justify property." Laid out as `start`.
    Justify,
}

/// [§ 3 White Space and Wrapping: the white-space property](https://www.w3.org/TR/css-text-3/#white-space-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WhiteSpace {
    /// Collapse white space, wrap at soft wrap opportunities.
    #[default]
    Normal,
    /// Collapse white space, never wrap.
    Nowrap,
    /// Preserve white space, break only at preserved newlines.
    Pre,
}

impl WhiteSpace {
    /// Whether lines may break at spaces.
    #[must_use]
    pub const fn allows_wrap(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
///
/// Only the values that apply to table cells and atomic inlines are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum VerticalAlign {
    /// "The baseline of the cell is put at the same height as the baseline of
    /// the first of the rows it spans." Laid out as `top`.
    #[default]
    Baseline,
    /// "The top of the cell box is aligned with the top of the first row it spans."
    Top,
    /// "The center of the cell is aligned with the center of the rows it spans."
    Middle,
    /// "The bottom of the cell box is aligned with the bottom of the last row it spans."
    Bottom,
}

/// [§ 11.1.1 Overflow: the 'overflow' property](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Overflow {
    /// "This value indicates that content is not clipped."
    #[default]
    Visible,
    /// "This value indicates that the content is clipped."
    Hidden,
    /// Clipped, with a scrolling mechanism.
    Scroll,
    /// User agent dependent; behaves like `scroll` for layout purposes.
    Auto,
}

/// [§ 17.5.2 Table width algorithms: the 'table-layout' property](https://www.w3.org/TR/CSS2/tables.html#width-layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TableLayoutMode {
    /// "Use any automatic table layout algorithm."
    #[default]
    Auto,
    /// "Use the fixed table layout algorithm."
    Fixed,
}

/// [§ 12.5.1 Lists: the 'list-style-position' property](https://www.w3.org/TR/CSS2/generate.html#lists)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ListStylePosition {
    /// "The marker box is outside the principal block box."
    #[default]
    Outside,
    /// "The marker box is placed as the first inline box in the principal
    /// block box."
    Inside,
}

/// [§ 5.1 Flex Flow Direction: the flex-direction property](https://www.w3.org/TR/css-flexbox-1/#flex-direction-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FlexDirection {
    /// Main axis is the inline axis.
    #[default]
    Row,
    /// Same as `row`, with start and end swapped.
    RowReverse,
    /// Main axis is the block axis.
    Column,
    /// Same as `column`, with start and end swapped.
    ColumnReverse,
}

impl FlexDirection {
    /// Whether the main axis is horizontal.
    #[must_use]
    pub const fn is_row(self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }

    /// Whether items are laid out in reverse order.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::RowReverse | Self::ColumnReverse)
    }
}

/// Pseudo-elements that generate boxes the layout core treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PseudoType {
    /// [§ 3 Markers: the ::marker pseudo-element](https://www.w3.org/TR/css-lists-3/#marker-pseudo)
    Marker,
}
