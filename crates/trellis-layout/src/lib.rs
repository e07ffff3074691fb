//! Box tree construction and layout for the Trellis document renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Box tree** ([§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen))
//!   - One arena per pass holding every box and line box, addressed by
//!     generational handles
//!   - Box creation from a node and its resolved style
//!   - Anonymous block, inline and table wrapper synthesis
//!   - Inline splitting with continuations
//!
//! - **Block flow** ([§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting))
//!   - Width and height equations, min/max constraints, preferred widths
//!   - Margin collapsing ([§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins))
//!   - Floats and clearance ([§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats))
//!   - Relative, absolute and fixed positioning ([§ 9.3](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme))
//!
//! - **Inline formatting** ([§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting))
//!   - Greedy line breaking around floats, atomic inlines, `text-align`
//!
//! - **Tables** ([§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html))
//!   - Row and cell indexing with `rowspan`/`colspan`
//!   - Fixed and automatic column width algorithms
//!
//! - **Flexible boxes** ([CSS Flexbox Level 1](https://www.w3.org/TR/css-flexbox-1/)), single line
//!
//! - **Stacking layers** ([§ 9.9 Layered presentation](https://www.w3.org/TR/CSS2/visuren.html#layers))
//!
//! # Not Yet Implemented
//!
//! - `border-collapse: collapse`
//! - Multi-line flex containers
//! - Bidirectional reordering within a line

mod block;
mod builder;
mod flex;
mod replaced;

/// Generational arena and box/line handles.
pub mod arena;
/// Intrusive sibling lists.
pub mod box_list;
/// Geometry: rectangles, sizes, edges, box frames.
pub mod box_model;
/// Tree invariant violations.
pub mod error;
/// Per-block float bookkeeping per [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats).
pub mod float;
/// Inline formatting and font metrics per [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting).
pub mod inline;
/// Layout pass entry points.
pub mod layout;
/// Box kinds and the box header.
pub mod layout_box;
/// Line boxes per [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting).
pub mod line_box;
/// Margin collapsing per [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins).
pub mod margin;
/// Content nodes as seen by layout.
pub mod node;
/// Positioned layout per [§ 9.3](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme).
pub mod positioned;
/// Painter-facing geometry snapshots.
pub mod snapshot;
/// Stacking layers per [§ 9.9](https://www.w3.org/TR/CSS2/visuren.html#layers).
pub mod stacking;
/// Table structure and layout per [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html).
pub mod table;
/// The box tree.
pub mod tree;

pub use arena::{BoxId, LineId};
pub use box_model::{BoxFrame, EdgeSizes, Rect, Size};
pub use error::TreeError;
pub use float::{FloatSide, FloatingBox, FloatingBoxList};
pub use inline::{ApproximateFontMetrics, FontMetrics};
pub use layout::LayoutContext;
pub use layout_box::{BoxFlags, BoxKind, BoxKindTag, LayoutBox, PreferredWidths};
pub use line_box::{LineBox, LineBoxKind, LineBoxKindTag};
pub use margin::{CollapsedMargins, MarginPair};
pub use node::Node;
pub use snapshot::{BoxSnapshot, LayerSnapshot, LineSnapshot, TreeSnapshot};
pub use stacking::Layer;
pub use table::{
    CellSlot, TableBox, TableCellBox, TableCellMap, TableColumnBox, TableLayoutAlgorithm,
    TableRowBox, TableSectionBox,
};
pub use tree::BoxTree;
