//! Block flow layout.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."
//!
//! "In a block formatting context, each box's left outer edge touches the
//! left edge of the containing block (for right-to-left formatting, right
//! edges touch). This is true even in the presence of floats (although a
//! box's line boxes may shrink due to the floats), unless the box
//! establishes a new block formatting context (in which case the box itself
//! may become narrower due to the floats)."

use trellis_common::warning::warn_once;
use trellis_style::{BoxSizing, Clear, Direction, Length, Overflow, Style, WhiteSpace};

use crate::arena::BoxId;
use crate::box_model::EdgeSizes;
use crate::error::TreeError;
use crate::float::{FloatSide, FloatingBox, FloatingBoxList};
use crate::layout::{fixed_or_zero, LayoutContext, LayoutInput};
use crate::layout_box::{BoxKindTag, PreferredWidths};
use crate::margin::{CollapsedMargins, MarginInfo, MarginPair};
use crate::positioned::{border_box_size, relative_offset};
use crate::tree::BoxTree;

/// Gap between an outside list marker and the start edge of its list item.
pub const MARKER_GAP: f32 = 8.0;

const EPSILON: f32 = 0.01;

impl BoxTree {
    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' (except
    /// when that value has been propagated to the viewport) establish new
    /// block formatting contexts for their contents."
    ///
    /// Flex items, outside markers and the root do as well, and every box
    /// that is not laid out by the block flow engine is opaque to floats.
    pub(crate) fn establishes_bfc(&self, id: BoxId) -> bool {
        let Some(node) = self.boxes.get(id) else {
            return false;
        };
        let tag = node.tag();
        if !matches!(tag, BoxKindTag::Block | BoxKindTag::ListItem) {
            return true;
        }
        let flex_item = node
            .parent
            .and_then(|p| self.boxes.get(p))
            .is_some_and(|p| p.tag() == BoxKindTag::Flexible);
        node.flags.root
            || node.flags.floating
            || node.flags.inline
            || node.is_out_of_flow_positioned()
            || node.style.overflow != Overflow::Visible
            || flex_item
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "If 'width' is computed as 'auto', the used value is the
    /// 'shrink-to-fit' width."
    ///
    /// The same holds for inline-blocks (§ 10.3.9) and outside markers.
    fn uses_shrink_to_fit(&self, id: BoxId) -> bool {
        self.boxes.get(id).is_some_and(|node| {
            node.flags.floating
                || node.flags.inline
                || node.tag() == BoxKindTag::OutsideListMarker
                || node.is_out_of_flow_positioned()
        })
    }

    /// [§ 10.4 Minimum and maximum widths](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    ///
    /// Clamp a border-box width by `min-width` and `max-width`; never below
    /// the box's own borders and padding.
    pub(crate) fn clamp_width(
        &self,
        style: &Style,
        width: f32,
        containing_width: f32,
        border_padding: f32,
    ) -> f32 {
        let max = style
            .max_width
            .resolve(Some(containing_width))
            .map_or(f32::INFINITY, |m| border_box_size(style, m, border_padding));
        let min = style
            .min_width
            .resolve(Some(containing_width))
            .map_or(border_padding, |m| border_box_size(style, m, border_padding));
        width.min(max).max(min).max(border_padding)
    }

    /// [§ 10.7 Minimum and maximum heights](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    ///
    /// "If the height of the containing block is not specified explicitly
    /// [...] the percentage value is treated as '0' (for 'min-height') or
    /// 'none' (for 'max-height')."
    pub(crate) fn clamp_height(
        style: &Style,
        height: f32,
        containing_height: Option<f32>,
        border_padding: f32,
    ) -> f32 {
        let max = style
            .max_height
            .resolve(containing_height)
            .map_or(f32::INFINITY, |m| border_box_size(style, m, border_padding));
        let min = style
            .min_height
            .resolve(containing_height)
            .map_or(border_padding, |m| border_box_size(style, m, border_padding));
        height.min(max).max(min).max(border_padding)
    }

    /// [§ 10.3 Calculating widths and margins](https://www.w3.org/TR/CSS2/visudet.html#Computing_widths_and_margins)
    ///
    /// Resolve the used width, the horizontal margins, and all borders and
    /// padding of a non-replaced box.
    pub(crate) fn compute_width(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        let style = self.style(id)?;
        let cw = input.containing_width.max(0.0);

        // STEP 1: Borders and padding.
        // [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
        //
        // "The percentage is calculated with respect to the width of the
        // generated box's containing block, even for 'padding-top' and
        // 'padding-bottom'."
        let border = EdgeSizes::resolve_non_negative(&style.border, cw);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, cw);
        let bp = border.horizontal() + padding.horizontal();

        let margin_left = style.margin.left.resolve(Some(cw));
        let margin_right = style.margin.right.resolve(Some(cw));
        let shrink = self.uses_shrink_to_fit(id);
        let in_flow_block = {
            let node = self.get(id)?;
            !node.flags.inline && !shrink && node.tag() != BoxKindTag::TableCell
        };

        // STEP 2: The used width.
        let declared = style
            .width
            .resolve(Some(cw))
            .map(|w| border_box_size(&style, w, bp));
        let width = if let Some(width) = input.override_width {
            Some(width.max(bp))
        } else if let Some(width) = declared {
            Some(self.clamp_width(&style, width, cw, bp))
        } else if shrink {
            // [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
            //
            // "Calculation of the shrink-to-fit width is similar to calculating
            // the width of a table cell using the automatic table layout
            // algorithm. [...] the shrink-to-fit width is:
            // min(max(preferred minimum width, available width), preferred width)."
            let preferred = self.preferred_widths(id, ctx)?;
            let available =
                (cw - margin_left.unwrap_or(0.0) - margin_right.unwrap_or(0.0)).max(0.0);
            let fit = preferred.min.max(available).min(preferred.max);
            Some(self.clamp_width(&style, fit, cw, bp))
        } else {
            None
        };

        // STEP 3: Solve the width equation.
        // [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
        //
        // "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
        // 'padding-right' + 'border-right-width' + 'margin-right' = width of
        // containing block"
        let (width, ml, mr) = match width {
            None => {
                // "If 'width' is set to 'auto', any other 'auto' values become
                // '0' and 'width' follows from the resulting equality."
                let ml = margin_left.unwrap_or(0.0);
                let mr = margin_right.unwrap_or(0.0);
                let stretched = (cw - ml - mr).max(bp);
                let clamped = self.clamp_width(&style, stretched, cw, bp);
                if (clamped - stretched).abs() > EPSILON {
                    let (ml, mr) = solve_margins(
                        cw,
                        clamped,
                        margin_left,
                        margin_right,
                        style.direction,
                    );
                    (clamped, ml, mr)
                } else {
                    (stretched, ml, mr)
                }
            }
            Some(width) if in_flow_block => {
                let (ml, mr) = solve_margins(cw, width, margin_left, margin_right, style.direction);
                (width, ml, mr)
            }
            Some(width) => (
                width,
                margin_left.unwrap_or(0.0),
                margin_right.unwrap_or(0.0),
            ),
        };

        let node = self.get_mut(id)?;
        node.frame.width = width;
        node.frame.border = border;
        node.frame.padding = padding;
        node.frame.margin = EdgeSizes {
            top: style.margin.top.calc_min(cw),
            right: mr,
            bottom: style.margin.bottom.calc_min(cw),
            left: ml,
        };
        Ok(())
    }

    /// [§ 10.6.3 Block-level non-replaced elements in normal flow when 'overflow' computes to 'visible'](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
    ///
    /// Set the used border-box height from the declared height or the
    /// content height, then clamp it.
    pub(crate) fn compute_height(
        &mut self,
        id: BoxId,
        content_height: f32,
        input: LayoutInput,
    ) -> Result<(), TreeError> {
        let style = self.style(id)?;
        let bp = self.get(id)?.frame.border_padding_vertical();
        let height = if let Some(height) = input.override_height {
            height.max(bp)
        } else {
            let declared = style
                .height
                .resolve(input.containing_height)
                .map_or(content_height.max(0.0) + bp, |h| border_box_size(&style, h, bp));
            Self::clamp_height(&style, declared, input.containing_height, bp)
        };
        self.get_mut(id)?.frame.height = height;
        Ok(())
    }

    /// The content height children may resolve percentages against, when
    /// it is known before layout.
    pub(crate) fn definite_content_height(
        &self,
        id: BoxId,
        input: LayoutInput,
    ) -> Result<Option<f32>, TreeError> {
        let node = self.get(id)?;
        let bp = node.frame.border_padding_vertical();
        if let Some(height) = input.override_height {
            return Ok(Some((height - bp).max(0.0)));
        }
        Ok(node
            .style
            .height
            .resolve(input.containing_height)
            .map(|h| match node.style.box_sizing {
                BoxSizing::ContentBox => h,
                BoxSizing::BorderBox => (h - bp).max(0.0),
            }))
    }

    /// Lay out a block container: width, then content (lines or blocks),
    /// then height, then outside markers.
    pub(crate) fn layout_block_flow(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        self.compute_width(id, input, ctx)?;
        let bfc = self.establishes_bfc(id);

        {
            let node = self.get_mut(id)?;
            let margins = CollapsedMargins::from_own(node.frame.margin.top, node.frame.margin.bottom);
            if let Some(flow) = node.kind.block_flow_mut() {
                if bfc {
                    flow.floats = FloatingBoxList::default();
                } else {
                    flow.floats.remove_own_floats();
                }
                flow.margins = margins;
            }
        }
        self.clear_lines(id);

        let content_top = {
            let frame = &self.get(id)?.frame;
            frame.border.top + frame.padding.top
        };
        let mut content_bottom = if self.get(id)?.children_inline() {
            self.layout_inline_content(id, input, ctx)?
        } else {
            self.layout_block_children(id, bfc, input, ctx)?
        };

        // [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
        //
        // "In addition, if the element has any floating descendants whose
        // bottom margin edge is below the element's bottom content edge,
        // then the height is increased to include those edges."
        if bfc {
            if let Some(flow) = self.get(id)?.kind.block_flow() {
                content_bottom = content_bottom.max(flow.floats.lowest_float_bottom(None));
            }
        }

        self.compute_height(id, content_bottom - content_top, input)?;
        self.place_outside_markers(id, ctx)
    }

    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// Stack the block-level children of `id` vertically, collapsing
    /// margins, placing floats and recording static positions. Returns the
    /// bottom of the content in `id`'s border-box coordinates.
    fn layout_block_children(
        &mut self,
        id: BoxId,
        bfc: bool,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<f32, TreeError> {
        let child_height = self.definite_content_height(id, input)?;
        let (content_left, content_top, content_width, style, can_top, can_bottom) = {
            let node = self.get(id)?;
            let frame = node.frame;
            let style = std::rc::Rc::clone(&node.style);
            let can_top = !bfc && frame.border.top == 0.0 && frame.padding.top == 0.0;
            let can_bottom = !bfc
                && frame.border.bottom == 0.0
                && frame.padding.bottom == 0.0
                && style.height.is_auto()
                && input.override_height.is_none()
                && style.min_height.is_zero();
            (
                frame.border.left + frame.padding.left,
                frame.border.top + frame.padding.top,
                frame.content_width(),
                style,
                can_top,
                can_bottom,
            )
        };

        let mut info = MarginInfo::new(can_top, can_bottom);
        let mut cursor = content_top;

        for child in self.child_ids(id) {
            let (out_of_flow_positioned, floating, marker) = {
                let c = self.get(child)?;
                (
                    c.is_out_of_flow_positioned(),
                    c.is_floating(),
                    c.tag() == BoxKindTag::OutsideListMarker,
                )
            };

            // [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
            //
            // "The static position for 'left' is the distance from the left
            // edge of the containing block to the left margin edge of a
            // hypothetical box that would have been the first box of the
            // element if its 'position' property had been 'static'."
            if out_of_flow_positioned {
                let pending = if info.collapses_with_top() {
                    0.0
                } else {
                    info.pending.resolve()
                };
                self.get_mut(child)?.static_position = Some((content_left, cursor + pending));
                continue;
            }
            if marker {
                continue;
            }

            if floating {
                self.layout_box(child, LayoutInput::new(content_width, child_height), ctx)?;
                let pending = if info.collapses_with_top() {
                    0.0
                } else {
                    info.pending.resolve().max(0.0)
                };
                self.place_float(id, child, cursor + pending, content_width, child_height)?;
                continue;
            }

            // STEP 1: Estimate the position so intruding floats can be
            // handed down before the child lays out its lines.
            let own_top = {
                let c = self.get(child)?;
                MarginPair::from_margin(c.style.margin.top.calc_min(content_width))
            };
            let estimate = if info.collapses_with_top() {
                cursor
            } else {
                cursor + info.pending.collapse_with(own_top).resolve()
            };
            let child_input = LayoutInput::new(content_width, child_height);
            let child_bfc = self.establishes_bfc(child);
            let placed_y =
                self.layout_in_flow_child(id, child, child_bfc, estimate, child_input, ctx)?;

            // STEP 2: Collapse margins.
            let child_margins = self.collapsed_margins_of(child)?;
            if self.is_self_collapsing(child)? {
                // [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
                //
                // "If the top and bottom margins of a box are adjoining, then
                // it is possible for margins to collapse through it."
                info.add(child_margins.top());
                info.add(child_margins.bottom());
                let y = if info.collapses_with_top() {
                    cursor
                } else {
                    cursor + info.pending.resolve().max(0.0)
                };
                self.get_mut(child)?.frame.y = y;
                self.add_overhanging_floats(id, child)?;
                self.apply_relative_offset(child, content_width, child_height, style.direction)?;
                continue;
            }

            info.add(child_margins.top());
            let mut y = if info.collapses_with_top() {
                let pending = info.pending;
                info.pending = MarginPair::ZERO;
                if let Some(flow) = self.get_mut(id)?.kind.block_flow_mut() {
                    flow.margins.collapse_top(pending);
                }
                cursor
            } else {
                cursor + info.take()
            };
            info.at_before_side = false;
            y = y.max(placed_y);

            // STEP 3: Clearance.
            // [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
            //
            // "Clearance is introduced as spacing above the margin-top of an
            // element. It is used to push the element vertically past the
            // float."
            let clear = self.get(child)?.style.clear;
            if clear != Clear::None {
                if let Some(flow) = self.get(id)?.kind.block_flow() {
                    y = flow.floats.clearance_y(clear, y);
                }
            }

            // STEP 4: Lay out again when the final position moved past
            // floats that shape the child's lines.
            if (y - estimate).abs() > EPSILON && self.floats_reach(id, estimate.min(y))? {
                let placed = self.layout_in_flow_child(id, child, child_bfc, y, child_input, ctx)?;
                y = y.max(placed);
            }

            let height = {
                let c = self.get_mut(child)?;
                c.frame.y = y;
                c.frame.height
            };
            cursor = y + height;
            info.pending = child_margins.bottom();

            self.add_overhanging_floats(id, child)?;
            self.apply_relative_offset(child, content_width, child_height, style.direction)?;
        }

        // STEP 5: The last margins collapse through the bottom edge or stay
        // inside the box.
        let pending = info.pending;
        let through_top = info.at_before_side && info.can_collapse_top;
        if through_top {
            if let Some(flow) = self.get_mut(id)?.kind.block_flow_mut() {
                flow.margins.collapse_top(pending);
            }
        }
        if info.can_collapse_bottom {
            if let Some(flow) = self.get_mut(id)?.kind.block_flow_mut() {
                flow.margins.collapse_bottom(pending);
            }
        } else if !through_top {
            cursor += pending.resolve();
        }
        Ok(cursor.max(content_top))
    }

    /// Lay out one in-flow child of a block at `y`. Returns the position
    /// the child was actually placed at, which is lower than `y` when a
    /// block formatting context root had to move below floats.
    fn layout_in_flow_child(
        &mut self,
        parent: BoxId,
        child: BoxId,
        child_bfc: bool,
        y: f32,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<f32, TreeError> {
        let (content_left, floats, direction) = {
            let node = self.get(parent)?;
            let floats = node
                .kind
                .block_flow()
                .map(|flow| flow.floats.clone())
                .unwrap_or_default();
            (
                node.frame.border.left + node.frame.padding.left,
                floats,
                node.style.direction,
            )
        };
        let content_width = input.containing_width;

        if !child_bfc {
            // [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
            //
            // "The current and subsequent line boxes created next to the
            // float are shortened as necessary to make room for the margin
            // box of the float."
            //
            // The child's margins are needed to translate the parent's floats
            // into its coordinates, so resolve its width first.
            self.compute_width(child, input, ctx)?;
            let x = content_left + self.get(child)?.frame.margin.left;
            let intruding = floats.intruding_into(x, y, y);
            if let Some(flow) = self.get_mut(child)?.kind.block_flow_mut() {
                flow.floats = FloatingBoxList::default();
                for float in intruding {
                    // Already listed means it intrudes twice; skip the copy.
                    if !flow.floats.contains_float(float.box_id) {
                        let _ = flow.floats.insert(float);
                    }
                }
            }
            self.layout_box(child, input, ctx)?;
            let node = self.get_mut(child)?;
            node.frame.x = x;
            return Ok(y);
        }

        // [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
        //
        // "The border box of a table, a block-level replaced element, or an
        // element in the normal flow that establishes a new block formatting
        // context [...] must not overlap the margin box of any floats in the
        // same block formatting context as the element itself. If necessary,
        // implementations should clear the said element by placing it below
        // any preceding floats, but may place it adjacent to such floats if
        // there is sufficient space."
        let mut y = y;
        for _ in 0..=floats.len() {
            let (band_left, band_width) = floats.available_range(y, 1.0, content_left, content_width);
            let narrowed = band_width + EPSILON < content_width;
            let child_input = if narrowed {
                LayoutInput {
                    containing_width: band_width,
                    ..input
                }
            } else {
                input
            };
            self.layout_box(child, child_input, ctx)?;

            let margin_box = self.get(child)?.frame.margin_box();
            let (band_left, band_width) = if narrowed {
                floats.available_range(y, margin_box.height.max(1.0), content_left, content_width)
            } else {
                (band_left, band_width)
            };
            let next = floats.next_float_bottom_after(y);
            if margin_box.width <= band_width + EPSILON || next <= y {
                let node = self.get_mut(child)?;
                node.frame.x = match direction {
                    _ if !narrowed => content_left + node.frame.margin.left,
                    Direction::Ltr => band_left + node.frame.margin.left,
                    Direction::Rtl => {
                        band_left + band_width - node.frame.width - node.frame.margin.right
                    }
                };
                return Ok(y);
            }
            y = next;
        }
        let node = self.get_mut(child)?;
        node.frame.x = content_left + node.frame.margin.left;
        Ok(y)
    }

    /// Whether any float of `id` reaches below `y`.
    fn floats_reach(&self, id: BoxId, y: f32) -> Result<bool, TreeError> {
        Ok(self
            .get(id)?
            .kind
            .block_flow()
            .is_some_and(|flow| flow.floats.iter().any(|f| f.rect.bottom() > y)))
    }

    /// The margins a child contributes to collapsing: its own, plus those of
    /// its children that collapsed through it.
    fn collapsed_margins_of(&self, child: BoxId) -> Result<CollapsedMargins, TreeError> {
        let node = self.get(child)?;
        Ok(node.kind.block_flow().map_or_else(
            || CollapsedMargins::from_own(node.frame.margin.top, node.frame.margin.bottom),
            |flow| flow.margins,
        ))
    }

    /// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
    ///
    /// "top and bottom margins of a box that does not establish a new block
    /// formatting context and that has zero computed 'min-height', zero or
    /// 'auto' computed 'height', and no in-flow children"
    fn is_self_collapsing(&self, child: BoxId) -> Result<bool, TreeError> {
        let node = self.get(child)?;
        let Some(flow) = node.kind.block_flow() else {
            return Ok(false);
        };
        let height_allows = node.style.height.is_auto() || node.style.height.is_zero();
        Ok(height_allows
            && node.style.min_height.is_zero()
            && node.frame.height <= 0.0
            && node.frame.border_padding_vertical() <= 0.0
            && flow.lines.is_empty())
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place an already laid out float child of `block` no higher than `y`,
    /// in `block`'s float list, and position its frame.
    pub(crate) fn place_float(
        &mut self,
        block: BoxId,
        child: BoxId,
        y: f32,
        containing_width: f32,
        containing_height: Option<f32>,
    ) -> Result<(), TreeError> {
        let (margin_box, margin, side, clear) = {
            let c = self.get(child)?;
            let side = FloatSide::from_style(c.style.float).unwrap_or(FloatSide::Left);
            (c.frame.margin_box(), c.frame.margin, side, c.style.clear)
        };
        let (content_left, content_width, direction) = {
            let b = self.get(block)?;
            (
                b.frame.border.left + b.frame.padding.left,
                b.frame.content_width(),
                b.style.direction,
            )
        };
        let rect = {
            let Some(flow) = self.get_mut(block)?.kind.block_flow_mut() else {
                return Err(TreeError::Corrupt(block, "float placed in a box without float list"));
            };
            let y = flow.floats.clearance_y(clear, y);
            flow.floats.place_float(
                child,
                side,
                margin_box.width,
                margin_box.height,
                y,
                content_left,
                content_width,
            )
        };
        {
            let c = self.get_mut(child)?;
            c.frame.x = rect.x + margin.left;
            c.frame.y = rect.y + margin.top;
        }
        self.apply_relative_offset(child, containing_width, containing_height, direction)
    }

    /// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// A float inside a child that does not establish a block formatting
    /// context still affects the child's later siblings, so the part that
    /// hangs out of the child is copied into the parent's list.
    fn add_overhanging_floats(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        if self.establishes_bfc(child) {
            return Ok(());
        }
        let (x, y, bottom, own) = {
            let c = self.get(child)?;
            let Some(flow) = c.kind.block_flow() else {
                return Ok(());
            };
            let own: Vec<FloatingBox> = flow
                .floats
                .iter()
                .filter(|f| !f.is_intruding && f.is_placed)
                .copied()
                .collect();
            (c.frame.x, c.frame.y, c.frame.height, own)
        };
        let Some(flow) = self.get_mut(parent)?.kind.block_flow_mut() else {
            return Ok(());
        };
        for float in own {
            let rect = float.rect.translate(x, y);
            if rect.bottom() > y + bottom {
                // A float already listed here keeps its first entry.
                let _added = flow.floats.insert(FloatingBox {
                    rect,
                    is_intruding: false,
                    ..float
                });
            }
        }
        Ok(())
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    pub(crate) fn apply_relative_offset(
        &mut self,
        id: BoxId,
        containing_width: f32,
        containing_height: Option<f32>,
        direction: Direction,
    ) -> Result<(), TreeError> {
        let node = self.get_mut(id)?;
        let (dx, dy) = relative_offset(&node.style, containing_width, containing_height, direction);
        node.frame.x += dx;
        node.frame.y += dy;
        Ok(())
    }

    /// [CSS Lists § 3.1 The ::marker pseudo-element](https://www.w3.org/TR/css-lists-3/#marker-pseudo)
    ///
    /// Outside markers sit in the start margin of their list item, level with
    /// its first line.
    fn place_outside_markers(&mut self, id: BoxId, ctx: &LayoutContext<'_>) -> Result<(), TreeError> {
        let markers: Vec<BoxId> = self
            .children(id)
            .filter(|&c| {
                self.boxes
                    .get(c)
                    .is_some_and(|b| b.tag() == BoxKindTag::OutsideListMarker)
            })
            .collect();
        if markers.is_empty() {
            return Ok(());
        }
        if self.get(id)?.tag() != BoxKindTag::ListItem {
            let _ = warn_once("Layout", "outside marker without a list item");
        }
        let (content_left, content_top, content_width, direction) = {
            let node = self.get(id)?;
            (
                node.frame.border.left + node.frame.padding.left,
                node.frame.border.top + node.frame.padding.top,
                node.frame.content_width(),
                node.style.direction,
            )
        };
        let line_top = self.first_line_top(id).unwrap_or(content_top);
        for marker in markers {
            self.layout_box(marker, LayoutInput::new(content_width, None), ctx)?;
            let node = self.get_mut(marker)?;
            let margin_box = node.frame.margin_box();
            node.frame.x = match direction {
                Direction::Ltr => content_left - margin_box.width - MARKER_GAP + node.frame.margin.left,
                Direction::Rtl => content_left + content_width + MARKER_GAP + node.frame.margin.left,
            };
            node.frame.y = line_top + node.frame.margin.top;
        }
        Ok(())
    }

    /// Top of the first line box inside `id`, looking through in-flow block
    /// children, in `id`'s coordinates.
    pub(crate) fn first_line_top(&self, id: BoxId) -> Option<f32> {
        let node = self.boxes.get(id)?;
        let flow = node.kind.block_flow()?;
        if let Some(&first) = flow.lines.first() {
            return self.lines.get(first).map(|line| line.rect.y);
        }
        self.children(id).find_map(|child| {
            let c = self.boxes.get(child)?;
            if c.is_out_of_flow() {
                return None;
            }
            self.first_line_top(child).map(|top| c.frame.y + top)
        })
    }

    /// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
    ///
    /// Preferred widths of a block container: a fixed width short-circuits
    /// everything; otherwise its inline content or its block children
    /// decide.
    pub(crate) fn block_preferred_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let node = self.get(id)?;
        let style = &node.style;
        let bp = fixed_or_zero(style.border.left)
            + fixed_or_zero(style.border.right)
            + fixed_or_zero(style.padding.left)
            + fixed_or_zero(style.padding.right);

        if let Length::Fixed(width) = style.width {
            let width = self.clamp_width(style, border_box_size(style, width, bp), 0.0, bp);
            return Ok(PreferredWidths::fixed(width));
        }

        let content = if node.children_inline() {
            let children = self.child_ids(id);
            self.inline_preferred_widths(&children, ctx)?
        } else {
            self.block_children_preferred_widths(id, ctx)?
        };

        let mut min = content.min + bp;
        let mut max = content.max.max(content.min) + bp;
        if let Length::Fixed(m) = style.min_width {
            let m = border_box_size(style, m, bp);
            min = min.max(m);
            max = max.max(m);
        }
        if let Length::Fixed(m) = style.max_width {
            let m = border_box_size(style, m, bp);
            min = min.min(m).max(bp);
            max = max.min(m).max(bp);
        }
        Ok(PreferredWidths { min, max })
    }

    /// Running maxima over block children, with left and right float widths
    /// accumulated side by side until a clear.
    fn block_children_preferred_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let nowrap = self.get(id)?.style.white_space == WhiteSpace::Nowrap;
        let mut min: f32 = 0.0;
        let mut max: f32 = 0.0;
        let mut float_left: f32 = 0.0;
        let mut float_right: f32 = 0.0;

        for child in self.children(id) {
            let c = self.get(child)?;
            if c.is_out_of_flow_positioned() || c.tag() == BoxKindTag::OutsideListMarker {
                continue;
            }
            // [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
            //
            // A clear ends the run of floats that could sit side by side.
            match c.style.clear {
                Clear::None => {}
                Clear::Left => {
                    max = max.max(float_left + float_right);
                    float_left = 0.0;
                }
                Clear::Right => {
                    max = max.max(float_left + float_right);
                    float_right = 0.0;
                }
                Clear::Both => {
                    max = max.max(float_left + float_right);
                    float_left = 0.0;
                    float_right = 0.0;
                }
            }

            let widths = self.preferred_margin_widths(child, ctx)?;
            if c.is_floating() {
                match FloatSide::from_style(c.style.float) {
                    Some(FloatSide::Right) => float_right += widths.max,
                    _ => float_left += widths.max,
                }
                if nowrap {
                    min += widths.min;
                } else {
                    min = min.max(widths.min);
                }
                continue;
            }

            min = min.max(widths.min);
            if self.establishes_bfc(child) {
                // Sits beside the floats.
                max = max.max(widths.max + float_left + float_right);
            } else {
                max = max.max(float_left + float_right).max(widths.max);
                float_left = 0.0;
                float_right = 0.0;
            }
        }
        max = max.max(float_left + float_right);
        Ok(PreferredWidths { min, max })
    }
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// Horizontal margins of a block whose width is known.
pub(crate) fn solve_margins(
    containing_width: f32,
    width: f32,
    margin_left: Option<f32>,
    margin_right: Option<f32>,
    direction: Direction,
) -> (f32, f32) {
    let free = containing_width - width;
    match (margin_left, margin_right) {
        // "If both 'margin-left' and 'margin-right' are 'auto', their used
        // values are equal. This horizontally centers the element with
        // respect to the edges of the containing block."
        (None, None) if free >= 0.0 => (free / 2.0, free / 2.0),
        // "If 'width' is not 'auto' and [the sum] is larger than the width
        // of the containing block, then any 'auto' values for 'margin-left'
        // or 'margin-right' are, for the following rules, treated as zero."
        (None, None) => match direction {
            Direction::Ltr => (0.0, free),
            Direction::Rtl => (free, 0.0),
        },
        // "If there is exactly one value specified as 'auto', its used value
        // follows from the equality."
        (None, Some(right)) => (free - right, right),
        (Some(left), None) => (left, free - left),
        // "If all of the above have a computed value other than 'auto', the
        // values are said to be "over-constrained" and one of the used
        // values will have to be different from its computed value. If the
        // 'direction' property of the containing block has the value 'ltr',
        // the specified value of 'margin-right' is ignored and the value is
        // calculated so as to make the equality true. If the value of
        // 'direction' is 'rtl', this happens to 'margin-left' instead."
        (Some(left), Some(right)) => match direction {
            Direction::Ltr => (left, free - left),
            Direction::Rtl => (free - right, right),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_margins_center() {
        assert_eq!(solve_margins(300.0, 100.0, None, None, Direction::Ltr), (100.0, 100.0));
    }

    #[test]
    fn test_over_constrained_adjusts_the_end_margin() {
        assert_eq!(
            solve_margins(300.0, 100.0, Some(10.0), Some(10.0), Direction::Ltr),
            (10.0, 190.0)
        );
        assert_eq!(
            solve_margins(300.0, 100.0, Some(10.0), Some(10.0), Direction::Rtl),
            (190.0, 10.0)
        );
    }

    #[test]
    fn test_too_wide_box_treats_auto_margins_as_zero() {
        assert_eq!(solve_margins(100.0, 150.0, None, None, Direction::Ltr), (0.0, -50.0));
    }
}
