//! Layout box types.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! A box is a fixed header (node, style, tree links, flags, geometry) plus a
//! closed [`BoxKind`] that carries what only some kinds have: a child list,
//! line boxes, a continuation, table bookkeeping.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use trellis_style::Style;

use crate::arena::{BoxId, LineId};
use crate::box_list::BoxList;
use crate::box_model::{BoxFrame, Size};
use crate::float::FloatingBoxList;
use crate::margin::CollapsedMargins;
use crate::node::Node;
use crate::positioned::PositionedBoxList;
use crate::table::{TableBox, TableCellBox, TableColumnBox, TableRowBox, TableSectionBox};

/// [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
///
/// Boolean facts about a box, fixed at creation except for
/// `children_inline`, which flips once a block-level child arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoxFlags {
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// The box has no node of its own.
    pub anonymous: bool,
    /// The box is a replaced element (its content is outside CSS).
    pub replaced: bool,
    /// The box is inline-level.
    pub inline: bool,
    /// The box floats.
    pub floating: bool,
    /// `position` is anything but `static`.
    pub positioned: bool,
    /// All in-flow children are inline-level (block flow containers only).
    pub children_inline: bool,
    /// The box has a transform and therefore its own layer.
    pub has_transform: bool,
    /// The box is the root of the tree.
    pub root: bool,
}

/// Min-content and max-content border-box widths.
///
/// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PreferredWidths {
    /// "The narrowest size the box could take while not overflowing."
    pub min: f32,
    /// "The size the box would take if given infinite space."
    pub max: f32,
}

impl PreferredWidths {
    /// Both widths equal.
    #[must_use]
    pub const fn fixed(width: f32) -> Self {
        Self {
            min: width,
            max: width,
        }
    }
}

/// A run of text.
#[derive(Debug, Default)]
pub struct TextBox {
    pub(crate) text: String,
    /// Text line boxes this box owns, in line order.
    pub(crate) lines: Vec<LineId>,
}

/// [§ 9.2.2 Inline-level elements and inline boxes](https://www.w3.org/TR/CSS2/visuren.html#inline-boxes)
///
/// "An inline box is one that is both inline-level and whose contents
/// participate in its containing inline formatting context."
#[derive(Debug, Default)]
pub struct InlineBox {
    pub(crate) children: BoxList,
    /// The anonymous block that continues this box after a split.
    pub(crate) continuation: Option<BoxId>,
    /// Flow line boxes this box owns, one per line it appears on.
    pub(crate) lines: Vec<LineId>,
}

/// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
///
/// Shared state of every block container kind: block, list item, caption,
/// outside marker and table cell.
#[derive(Debug, Default)]
pub struct BlockFlow {
    pub(crate) children: BoxList,
    /// For anonymous blocks created by an inline split: the inline clone
    /// that continues the split inline after this block.
    pub(crate) continuation: Option<BoxId>,
    /// Root line boxes, one per visual line, when children are inline.
    pub(crate) lines: Vec<LineId>,
    /// Floats placed in or intruding into this block.
    pub(crate) floats: FloatingBoxList,
    /// Collapsed top and bottom margins, including margins of children that
    /// collapse through this box.
    pub(crate) margins: CollapsedMargins,
}

impl BlockFlow {
    /// Floats placed in or intruding into this block after the last layout.
    #[must_use]
    pub const fn floats(&self) -> &FloatingBoxList {
        &self.floats
    }

    /// Collapsed margins of the last layout.
    #[must_use]
    pub const fn margins(&self) -> &CollapsedMargins {
        &self.margins
    }
}

/// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacedBox {
    /// Intrinsic dimensions, if the content has any.
    pub(crate) intrinsic_size: Option<Size>,
    /// Whether the content is an image.
    pub(crate) is_image: bool,
}

impl ReplacedBox {
    /// Intrinsic dimensions, if the content has any.
    #[must_use]
    pub const fn intrinsic_size(&self) -> Option<Size> {
        self.intrinsic_size
    }

    /// Whether the content is an image.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        self.is_image
    }
}

/// [§ 9 Flex Layout Algorithm](https://www.w3.org/TR/css-flexbox-1/#layout-algorithm)
#[derive(Debug, Default)]
pub struct FlexBox {
    pub(crate) children: BoxList,
}

/// The kind of a box and its kind-specific state.
#[derive(Debug)]
pub enum BoxKind {
    /// A text run.
    Text(TextBox),
    /// An inline box.
    Inline(InlineBox),
    /// A `::marker` with `list-style-position: inside`.
    InsideListMarker(InlineBox),
    /// A block container.
    Block(BlockFlow),
    /// A `display: list-item` block container.
    ListItem(BlockFlow),
    /// A `::marker` with `list-style-position: outside`.
    OutsideListMarker(BlockFlow),
    /// A table caption.
    TableCaption(BlockFlow),
    /// A table cell: a block container with grid bookkeeping.
    TableCell(BlockFlow, TableCellBox),
    /// A flex container.
    Flexible(FlexBox),
    /// A replaced element.
    Replaced(ReplacedBox),
    /// A table (or inline table).
    Table(TableBox),
    /// A row group.
    TableSection(TableSectionBox),
    /// A table row.
    TableRow(TableRowBox),
    /// A table column.
    TableColumn(TableColumnBox),
    /// A table column group.
    TableColumnGroup(TableColumnBox),
}

/// Field-less mirror of [`BoxKind`], for dispatch and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoxKindTag {
    /// [`BoxKind::Text`]
    Text,
    /// [`BoxKind::Inline`]
    Inline,
    /// [`BoxKind::InsideListMarker`]
    InsideListMarker,
    /// [`BoxKind::Block`]
    Block,
    /// [`BoxKind::ListItem`]
    ListItem,
    /// [`BoxKind::OutsideListMarker`]
    OutsideListMarker,
    /// [`BoxKind::TableCaption`]
    TableCaption,
    /// [`BoxKind::TableCell`]
    TableCell,
    /// [`BoxKind::Flexible`]
    Flexible,
    /// [`BoxKind::Replaced`]
    Replaced,
    /// [`BoxKind::Table`]
    Table,
    /// [`BoxKind::TableSection`]
    TableSection,
    /// [`BoxKind::TableRow`]
    TableRow,
    /// [`BoxKind::TableColumn`]
    TableColumn,
    /// [`BoxKind::TableColumnGroup`]
    TableColumnGroup,
}

impl BoxKindTag {
    /// Kinds that lay out their content with the block flow engine.
    #[must_use]
    pub const fn is_block_flow(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::ListItem
                | Self::OutsideListMarker
                | Self::TableCaption
                | Self::TableCell
        )
    }

    /// Inline boxes, whose content joins the enclosing line layout.
    #[must_use]
    pub const fn is_inline_box(self) -> bool {
        matches!(self, Self::Inline | Self::InsideListMarker)
    }

    /// Parts of a table other than the table itself.
    #[must_use]
    pub const fn is_table_part(self) -> bool {
        matches!(
            self,
            Self::TableCaption
                | Self::TableCell
                | Self::TableSection
                | Self::TableRow
                | Self::TableColumn
                | Self::TableColumnGroup
        )
    }
}

impl BoxKind {
    /// The field-less tag of this kind.
    #[must_use]
    pub const fn tag(&self) -> BoxKindTag {
        match self {
            Self::Text(_) => BoxKindTag::Text,
            Self::Inline(_) => BoxKindTag::Inline,
            Self::InsideListMarker(_) => BoxKindTag::InsideListMarker,
            Self::Block(_) => BoxKindTag::Block,
            Self::ListItem(_) => BoxKindTag::ListItem,
            Self::OutsideListMarker(_) => BoxKindTag::OutsideListMarker,
            Self::TableCaption(_) => BoxKindTag::TableCaption,
            Self::TableCell(..) => BoxKindTag::TableCell,
            Self::Flexible(_) => BoxKindTag::Flexible,
            Self::Replaced(_) => BoxKindTag::Replaced,
            Self::Table(_) => BoxKindTag::Table,
            Self::TableSection(_) => BoxKindTag::TableSection,
            Self::TableRow(_) => BoxKindTag::TableRow,
            Self::TableColumn(_) => BoxKindTag::TableColumn,
            Self::TableColumnGroup(_) => BoxKindTag::TableColumnGroup,
        }
    }

    /// The child list, for kinds that have one.
    #[must_use]
    pub const fn children(&self) -> Option<&BoxList> {
        match self {
            Self::Inline(inline) | Self::InsideListMarker(inline) => Some(&inline.children),
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => Some(&flow.children),
            Self::Flexible(flex) => Some(&flex.children),
            Self::Table(table) => Some(&table.children),
            Self::TableSection(section) => Some(&section.children),
            Self::TableRow(row) => Some(&row.children),
            Self::TableColumnGroup(group) => Some(&group.children),
            Self::Text(_) | Self::Replaced(_) | Self::TableColumn(_) => None,
        }
    }

    /// The child list, mutably.
    pub fn children_mut(&mut self) -> Option<&mut BoxList> {
        match self {
            Self::Inline(inline) | Self::InsideListMarker(inline) => Some(&mut inline.children),
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => Some(&mut flow.children),
            Self::Flexible(flex) => Some(&mut flex.children),
            Self::Table(table) => Some(&mut table.children),
            Self::TableSection(section) => Some(&mut section.children),
            Self::TableRow(row) => Some(&mut row.children),
            Self::TableColumnGroup(group) => Some(&mut group.children),
            Self::Text(_) | Self::Replaced(_) | Self::TableColumn(_) => None,
        }
    }

    /// Block flow state, for block container kinds.
    #[must_use]
    pub const fn block_flow(&self) -> Option<&BlockFlow> {
        match self {
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => Some(flow),
            _ => None,
        }
    }

    /// Block flow state, mutably.
    pub fn block_flow_mut(&mut self) -> Option<&mut BlockFlow> {
        match self {
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => Some(flow),
            _ => None,
        }
    }

    /// The continuation pointer, for kinds that can be split or can host a split.
    #[must_use]
    pub const fn continuation(&self) -> Option<BoxId> {
        match self {
            Self::Inline(inline) | Self::InsideListMarker(inline) => inline.continuation,
            Self::Block(flow) => flow.continuation,
            _ => None,
        }
    }

    /// Set the continuation pointer. Kinds without one ignore the call.
    pub fn set_continuation(&mut self, continuation: Option<BoxId>) {
        match self {
            Self::Inline(inline) | Self::InsideListMarker(inline) => {
                inline.continuation = continuation;
            }
            Self::Block(flow) => flow.continuation = continuation,
            _ => {}
        }
    }

    /// Line boxes registered in a list slot of this box (text lines, flow
    /// lines or root lines).
    #[must_use]
    pub fn lines(&self) -> &[LineId] {
        match self {
            Self::Text(text) => &text.lines,
            Self::Inline(inline) | Self::InsideListMarker(inline) => &inline.lines,
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => &flow.lines,
            _ => &[],
        }
    }

    /// The list slot for line boxes, if this kind has one.
    pub fn lines_mut(&mut self) -> Option<&mut Vec<LineId>> {
        match self {
            Self::Text(text) => Some(&mut text.lines),
            Self::Inline(inline) | Self::InsideListMarker(inline) => Some(&mut inline.lines),
            Self::Block(flow)
            | Self::ListItem(flow)
            | Self::OutsideListMarker(flow)
            | Self::TableCaption(flow)
            | Self::TableCell(flow, _) => Some(&mut flow.lines),
            _ => None,
        }
    }
}

/// A node in the box tree.
#[derive(Debug)]
pub struct LayoutBox {
    pub(crate) node: Option<Weak<Node>>,
    pub(crate) style: Rc<Style>,
    pub(crate) parent: Option<BoxId>,
    pub(crate) prev: Option<BoxId>,
    pub(crate) next: Option<BoxId>,
    pub(crate) flags: BoxFlags,
    pub(crate) frame: BoxFrame,
    pub(crate) kind: BoxKind,
    /// Cached preferred widths; cleared whenever content below changes.
    pub(crate) preferred: Cell<Option<PreferredWidths>>,
    /// Single-slot registration of the replaced line box of an atomic inline.
    pub(crate) line: Option<LineId>,
    /// Out-of-flow descendants this box positions as their containing block.
    pub(crate) positioned: PositionedBoxList,
    /// For absolutely positioned boxes: the box they were registered with.
    pub(crate) containing_block: Option<BoxId>,
    /// Hypothetical static position, relative to the offset parent.
    pub(crate) static_position: Option<(f32, f32)>,
    /// Index of the stacking layer this box owns, if any.
    pub(crate) layer: Option<usize>,
}

impl LayoutBox {
    pub(crate) fn new(node: Option<&Rc<Node>>, style: Rc<Style>, kind: BoxKind) -> Self {
        let flags = BoxFlags {
            anonymous: node.is_none(),
            floating: style.is_floating(),
            positioned: style.is_positioned(),
            has_transform: style.has_transform,
            inline: style.is_inline_level(),
            children_inline: true,
            replaced: matches!(kind, BoxKind::Replaced(_)),
            root: false,
        };
        Self {
            node: node.map(Rc::downgrade),
            style,
            parent: None,
            prev: None,
            next: None,
            flags,
            frame: BoxFrame::default(),
            kind,
            preferred: Cell::new(None),
            line: None,
            positioned: PositionedBoxList::default(),
            containing_block: None,
            static_position: None,
            layer: None,
        }
    }

    /// The node that generated this box, if it is still alive.
    #[must_use]
    pub fn node(&self) -> Option<Rc<Node>> {
        self.node.as_ref().and_then(Weak::upgrade)
    }

    /// Resolved style.
    #[must_use]
    pub fn style(&self) -> &Rc<Style> {
        &self.style
    }

    /// Parent box.
    #[must_use]
    pub const fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    /// Previous sibling.
    #[must_use]
    pub const fn prev_sibling(&self) -> Option<BoxId> {
        self.prev
    }

    /// Next sibling.
    #[must_use]
    pub const fn next_sibling(&self) -> Option<BoxId> {
        self.next
    }

    /// First child, for kinds with a child list.
    #[must_use]
    pub fn first_child(&self) -> Option<BoxId> {
        self.kind.children().and_then(|list| list.first)
    }

    /// Last child, for kinds with a child list.
    #[must_use]
    pub fn last_child(&self) -> Option<BoxId> {
        self.kind.children().and_then(|list| list.last)
    }

    /// Flags.
    #[must_use]
    pub const fn flags(&self) -> BoxFlags {
        self.flags
    }

    /// Used geometry.
    #[must_use]
    pub const fn frame(&self) -> &BoxFrame {
        &self.frame
    }

    /// Kind and kind-specific state.
    #[must_use]
    pub const fn kind(&self) -> &BoxKind {
        &self.kind
    }

    /// Field-less kind tag.
    #[must_use]
    pub const fn tag(&self) -> BoxKindTag {
        self.kind.tag()
    }

    /// Whether the box has no node.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.flags.anonymous
    }

    /// Whether the box is inline-level.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        self.flags.inline
    }

    /// Whether the box floats.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        self.flags.floating
    }

    /// Whether the box is absolutely positioned (`absolute` or `fixed`).
    #[must_use]
    pub fn is_out_of_flow_positioned(&self) -> bool {
        self.style.is_out_of_flow_positioned()
    }

    /// Whether this box is taken out of the flow of its parent: floats,
    /// absolutely positioned boxes, and outside list markers.
    #[must_use]
    pub fn is_out_of_flow(&self) -> bool {
        self.flags.floating
            || self.is_out_of_flow_positioned()
            || matches!(self.kind, BoxKind::OutsideListMarker(_))
    }

    /// Whether the children of this block container are all inline-level.
    #[must_use]
    pub const fn children_inline(&self) -> bool {
        self.flags.children_inline
    }

    /// The continuation of this box, if it was split.
    #[must_use]
    pub const fn continuation(&self) -> Option<BoxId> {
        self.kind.continuation()
    }

    /// The text of a text box.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            BoxKind::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Line boxes registered with this box, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<LineId> {
        let mut lines = self.kind.lines().to_vec();
        lines.extend(self.line);
        lines
    }
}
