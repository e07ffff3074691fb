//! Layout passes.
//!
//! [§ 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! "In the visual formatting model, each element in the document tree
//! generates zero or more boxes according to the box model. The layout of
//! these boxes is governed by:
//!
//! - box dimensions and type.
//! - positioning scheme (normal flow, float, and absolute positioning).
//! - relationships between elements in the document tree.
//! - external information (e.g., viewport size, intrinsic dimensions of
//!   images, etc.)."
//!
//! A pass is `build` (table structure, stacking layers) followed by a
//! recursive layout from the root against the viewport. Every box's
//! `layout` sets its own size, margins, borders and padding, and positions
//! its children; its own position is set by whoever laid it out.

use trellis_common::{trace, warning};
use trellis_style::Length;

use crate::arena::BoxId;
use crate::box_model::Size;
use crate::error::TreeError;
use crate::inline::FontMetrics;
use crate::layout_box::{BoxKindTag, PreferredWidths};
use crate::tree::BoxTree;

/// Runtime configuration of one layout pass.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    /// [§ 9.1.1 The viewport](https://www.w3.org/TR/CSS2/visuren.html#viewport)
    ///
    /// The initial containing block, and the containing block of
    /// `position: fixed` boxes.
    pub viewport: Size,
    /// Text measurement.
    pub metrics: &'a dyn FontMetrics,
}

impl<'a> LayoutContext<'a> {
    /// A context for a viewport of the given size.
    #[must_use]
    pub fn new(viewport: Size, metrics: &'a dyn FontMetrics) -> Self {
        Self { viewport, metrics }
    }
}

impl std::fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// What the parent tells a box when it lays it out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LayoutInput {
    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// Width of the containing block; percentages and the width equation
    /// refer to it.
    pub(crate) containing_width: f32,
    /// Height of the containing block, when it is definite.
    pub(crate) containing_height: Option<f32>,
    /// Border-box width imposed by the parent (table cells, flex items,
    /// positioned boxes).
    pub(crate) override_width: Option<f32>,
    /// Border-box height imposed by the parent.
    pub(crate) override_height: Option<f32>,
}

impl LayoutInput {
    pub(crate) const fn new(containing_width: f32, containing_height: Option<f32>) -> Self {
        Self {
            containing_width,
            containing_height,
            override_width: None,
            override_height: None,
        }
    }

    pub(crate) const fn with_width(mut self, width: f32) -> Self {
        self.override_width = Some(width);
        self
    }

    pub(crate) const fn with_height(mut self, height: f32) -> Self {
        self.override_height = Some(height);
        self
    }
}

impl BoxTree {
    /// Derive per-pass structure from the current tree: the table grid of
    /// every table and the stacking layers.
    ///
    /// # Errors
    /// Fails if a box handle in the tree is stale.
    pub fn build(&mut self) -> Result<(), TreeError> {
        let Some(root) = self.root else {
            return Err(TreeError::NoRoot);
        };
        let tables: Vec<BoxId> = self
            .subtree(root)
            .into_iter()
            .filter(|&id| self.boxes.get(id).is_some_and(|b| b.tag() == BoxKindTag::Table))
            .collect();
        for table in tables {
            self.build_table(table)?;
        }
        self.build_layers()
    }

    /// Lay out the whole tree against the viewport.
    ///
    /// # Errors
    /// Returns [`TreeError::NoRoot`] without a root box, or the first
    /// invariant violation met during the pass.
    pub fn layout(&mut self, ctx: &LayoutContext<'_>) -> Result<(), TreeError> {
        warning::clear_warnings();
        let root = self.root.ok_or(TreeError::NoRoot)?;
        let _scope = trace::enter("pass", || format!("viewport {:?}", ctx.viewport));
        self.build()?;

        let input = LayoutInput::new(ctx.viewport.width, Some(ctx.viewport.height));
        self.layout_box(root, input, ctx)?;

        let node = self.get_mut(root)?;
        node.frame.x = node.frame.margin.left;
        node.frame.y = node.frame.margin.top;
        Ok(())
    }

    /// Lay out one box: size it, lay out its content and then its
    /// out-of-flow descendants.
    pub(crate) fn layout_box(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        let tag = self.tag(id)?;
        let _scope = trace::enter("layout", || {
            format!("{tag:?} {id:?} cw={}", input.containing_width)
        });
        match tag {
            BoxKindTag::Block
            | BoxKindTag::ListItem
            | BoxKindTag::OutsideListMarker
            | BoxKindTag::TableCaption
            | BoxKindTag::TableCell => self.layout_block_flow(id, input, ctx)?,
            BoxKindTag::Flexible => self.layout_flex(id, input, ctx)?,
            BoxKindTag::Replaced => self.layout_replaced(id, input)?,
            BoxKindTag::Table => self.layout_table(id, input, ctx)?,
            // Inline content is placed by the line layout of its block.
            BoxKindTag::Text | BoxKindTag::Inline | BoxKindTag::InsideListMarker => {}
            // Table internals are placed by the table.
            BoxKindTag::TableSection
            | BoxKindTag::TableRow
            | BoxKindTag::TableColumn
            | BoxKindTag::TableColumnGroup => {}
        }
        self.layout_positioned_descendants(id, ctx)
    }

    /// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
    ///
    /// Min-content and max-content border-box widths of `id`, cached until
    /// its content changes.
    pub(crate) fn preferred_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let node = self.get(id)?;
        if let Some(cached) = node.preferred.get() {
            return Ok(cached);
        }
        let widths = match node.tag() {
            BoxKindTag::Block
            | BoxKindTag::ListItem
            | BoxKindTag::OutsideListMarker
            | BoxKindTag::TableCaption
            | BoxKindTag::TableCell => self.block_preferred_widths(id, ctx)?,
            BoxKindTag::Flexible => self.flex_preferred_widths(id, ctx)?,
            BoxKindTag::Replaced => self.replaced_preferred_widths(id)?,
            BoxKindTag::Table => self.table_preferred_widths(id, ctx)?,
            BoxKindTag::Text | BoxKindTag::Inline | BoxKindTag::InsideListMarker => {
                self.inline_preferred_widths(&[id], ctx)?
            }
            BoxKindTag::TableSection
            | BoxKindTag::TableRow
            | BoxKindTag::TableColumn
            | BoxKindTag::TableColumnGroup => PreferredWidths::default(),
        };
        node.preferred.set(Some(widths));
        Ok(widths)
    }

    /// Preferred widths of `id` plus its fixed horizontal margins: the
    /// contribution to a parent's preferred widths.
    pub(crate) fn preferred_margin_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let widths = self.preferred_widths(id, ctx)?;
        let style = &self.get(id)?.style;
        let margins = fixed_or_zero(style.margin.left) + fixed_or_zero(style.margin.right);
        Ok(PreferredWidths {
            min: widths.min + margins,
            max: widths.max + margins,
        })
    }
}

/// A length's pixel value when it is absolute; percentages and `auto`
/// count as zero when nothing is known about the container.
pub(crate) fn fixed_or_zero(length: Length) -> f32 {
    match length {
        Length::Fixed(v) => v,
        Length::Percent(_) | Length::Auto | Length::None => 0.0,
    }
}
