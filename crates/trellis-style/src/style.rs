//! The resolved style record.

use serde::Serialize;

use crate::display::Display;
use crate::edges::Edges;
use crate::length::Length;
use crate::properties::{
    BoxSizing, Clear, Direction, FlexDirection, Float, ListStylePosition, Overflow, Position,
    PseudoType, TableLayoutMode, TextAlign, VerticalAlign, WhiteSpace,
};

/// User agent default font size.
/// [§ 3.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// [§ 17.6.1 The separated borders model](https://www.w3.org/TR/CSS2/tables.html#separated-borders)
///
/// "The 'border-spacing' property specifies the distance that separates
/// adjoining cell borders."
///
/// Default value per UA stylesheet is 2px.
pub const DEFAULT_BORDER_SPACING: f32 = 2.0;

/// Computed values for one box.
///
/// Boxes share these through `Rc<Style>`; splitting an inline box clones the
/// pointer, never the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    /// [§ 2 The display property](https://www.w3.org/TR/css-display-3/#the-display-properties)
    pub display: Display,
    /// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
    pub position: Position,
    /// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    pub float: Float,
    /// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    pub clear: Clear,
    /// [§ 4.4 box-sizing](https://www.w3.org/TR/css-box-4/#box-sizing)
    pub box_sizing: BoxSizing,
    /// Inline base direction. Inherited.
    pub direction: Direction,
    /// Line alignment. Inherited.
    pub text_align: TextAlign,
    /// White space handling. Inherited.
    pub white_space: WhiteSpace,
    /// Vertical alignment of table cell content and atomic inlines.
    pub vertical_align: VerticalAlign,
    /// Overflow; anything but `visible` establishes a block formatting context.
    pub overflow: Overflow,
    /// [§ 17.5.2 'table-layout'](https://www.w3.org/TR/CSS2/tables.html#width-layout)
    pub table_layout: TableLayoutMode,
    /// Position of list markers. Inherited.
    pub list_style_position: ListStylePosition,
    /// Set when this style belongs to a pseudo-element box.
    pub pseudo: Option<PseudoType>,

    /// [§ 10.2 Content width: the 'width' property](https://www.w3.org/TR/CSS2/visudet.html#the-width-property)
    pub width: Length,
    /// [§ 10.5 Content height: the 'height' property](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
    pub height: Length,
    /// [§ 10.4 Minimum and maximum widths](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    pub min_width: Length,
    /// `none` means no maximum.
    pub max_width: Length,
    /// [§ 10.7 Minimum and maximum heights](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    pub min_height: Length,
    /// `none` means no maximum.
    pub max_height: Length,
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    pub margin: Edges<Length>,
    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    pub padding: Edges<Length>,
    /// [§ 8.5.1 Border width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
    pub border: Edges<Length>,
    /// [§ 9.3.2 Box offsets](https://www.w3.org/TR/CSS2/visuren.html#position-props)
    ///
    /// `top`, `right`, `bottom` and `left`.
    pub inset: Edges<Length>,
    /// [§ 9.9.1 'z-index'](https://www.w3.org/TR/CSS2/visuren.html#z-index); `None` is `auto`.
    pub z_index: Option<i32>,
    /// Whether `transform` is anything other than `none`.
    pub has_transform: bool,

    /// Font size in pixels. Inherited.
    pub font_size: f32,
    /// Used line height in pixels; `None` is `normal`. Inherited.
    pub line_height: Option<f32>,
    /// Horizontal and vertical `border-spacing`. Inherited.
    pub border_spacing: (f32, f32),

    /// [§ 5.1 'flex-direction'](https://www.w3.org/TR/css-flexbox-1/#flex-direction-property)
    pub flex_direction: FlexDirection,
    /// [§ 7.3.1 'flex-grow'](https://www.w3.org/TR/css-flexbox-1/#flex-grow-property)
    pub flex_grow: f32,
    /// [§ 7.3.2 'flex-shrink'](https://www.w3.org/TR/css-flexbox-1/#flex-shrink-property)
    pub flex_shrink: f32,
    /// [§ 7.3.3 'flex-basis'](https://www.w3.org/TR/css-flexbox-1/#flex-basis-property); `auto` uses the width.
    pub flex_basis: Length,
}

impl Default for Style {
    /// Initial values of every property.
    fn default() -> Self {
        Self {
            display: Display::Inline,
            position: Position::Static,
            float: Float::None,
            clear: Clear::None,
            box_sizing: BoxSizing::ContentBox,
            direction: Direction::Ltr,
            text_align: TextAlign::Start,
            white_space: WhiteSpace::Normal,
            vertical_align: VerticalAlign::Baseline,
            overflow: Overflow::Visible,
            table_layout: TableLayoutMode::Auto,
            list_style_position: ListStylePosition::Outside,
            pseudo: None,
            width: Length::Auto,
            height: Length::Auto,
            min_width: Length::ZERO,
            max_width: Length::None,
            min_height: Length::ZERO,
            max_height: Length::None,
            margin: Edges::all(Length::ZERO),
            padding: Edges::all(Length::ZERO),
            border: Edges::all(Length::ZERO),
            inset: Edges::all(Length::Auto),
            z_index: None,
            has_transform: false,
            font_size: DEFAULT_FONT_SIZE,
            line_height: None,
            border_spacing: (DEFAULT_BORDER_SPACING, DEFAULT_BORDER_SPACING),
            flex_direction: FlexDirection::Row,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Length::Auto,
        }
    }
}

impl Style {
    /// Initial values with the given display.
    #[must_use]
    pub fn with_display(display: Display) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "The properties of anonymous boxes are inherited from the enclosing
    /// non-anonymous box. Non-inherited properties have their initial value."
    #[must_use]
    pub fn anonymous(parent: &Self, display: Display) -> Self {
        Self {
            display,
            direction: parent.direction,
            text_align: parent.text_align,
            white_space: parent.white_space,
            list_style_position: parent.list_style_position,
            font_size: parent.font_size,
            line_height: parent.line_height,
            border_spacing: parent.border_spacing,
            ..Self::default()
        }
    }

    /// Whether the box floats.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        !matches!(self.float, Float::None)
    }

    /// Whether `position` is anything but `static`.
    #[must_use]
    pub const fn is_positioned(&self) -> bool {
        !matches!(self.position, Position::Static)
    }

    /// Whether the box is absolutely positioned (`absolute` or `fixed`).
    #[must_use]
    pub const fn is_out_of_flow_positioned(&self) -> bool {
        self.position.is_out_of_flow()
    }

    /// [§ 9.7 Relationships between 'display', 'position', and 'float'](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo)
    ///
    /// "Otherwise, if 'float' has a value other than 'none', the box is
    /// floated and 'display' is set according to the table below." Floats and
    /// absolutely positioned boxes are blockified, so they are never
    /// inline-level.
    #[must_use]
    pub const fn is_inline_level(&self) -> bool {
        self.display.is_inline_level() && !self.is_floating() && !self.is_out_of_flow_positioned()
    }

    /// Whether the principal box is a marker pseudo-element.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(self.pseudo, Some(PseudoType::Marker))
    }
}
