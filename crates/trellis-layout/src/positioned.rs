//! CSS Positioned Layout.
//!
//! [§ 9.3 Positioning schemes](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme)
//!
//! "In CSS 2, a box may be laid out according to three positioning schemes:
//!
//! 1. Normal flow. In CSS 2, normal flow includes block formatting of block-level
//!    boxes, inline formatting of inline-level boxes, and relative positioning of
//!    block-level and inline-level boxes.
//!
//! 2. Floats. In the float model, a box is first laid out according to the normal
//!    flow, then taken out of the flow and shifted to the left or right as far as
//!    possible.
//!
//! 3. Absolute positioning. In the absolute positioning model, a box is removed
//!    from the normal flow entirely and assigned a position with respect to a
//!    containing block."
//!
//! Absolutely positioned boxes are registered with the box that acts as
//! their containing block whenever they are inserted into the tree. That box
//! places them after its own size is final.

use trellis_style::{BoxSizing, Direction, Position, Style};

use crate::arena::BoxId;
use crate::box_model::EdgeSizes;
use crate::error::TreeError;
use crate::layout::{LayoutContext, LayoutInput};
use crate::tree::BoxTree;

/// The out-of-flow descendants a containing block positions, in tree order
/// of registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionedBoxList {
    boxes: Vec<BoxId>,
}

impl PositionedBoxList {
    /// Add a box; registering the same box twice is a no-op.
    pub fn insert(&mut self, id: BoxId) -> bool {
        if self.boxes.contains(&id) {
            return false;
        }
        self.boxes.push(id);
        true
    }

    /// Remove a box. Returns whether it was registered.
    pub fn remove(&mut self, id: BoxId) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|&b| b != id);
        before != self.boxes.len()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.boxes.contains(&id)
    }

    /// Registered boxes.
    #[must_use]
    pub fn as_slice(&self) -> &[BoxId] {
        &self.boxes
    }

    /// Number of registered boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
///
/// "Once a box has been laid out according to the normal flow, it may be
/// shifted relative to its normal position. This is called relative
/// positioning."
///
/// "Offsetting a box (B1) in this way has no effect on the box (B2) that
/// follows: B2 is given a position as if B1 were not offset and B2 is
/// not re-positioned after B1's offset is applied."
///
/// Returns the `(dx, dy)` shift for a `position: relative` box; zero for
/// every other position.
#[must_use]
pub fn relative_offset(
    style: &Style,
    containing_width: f32,
    containing_height: Option<f32>,
    direction: Direction,
) -> (f32, f32) {
    if style.position != Position::Relative {
        return (0.0, 0.0);
    }
    let left = style.inset.left.resolve(Some(containing_width));
    let right = style.inset.right.resolve(Some(containing_width));
    let top = style.inset.top.resolve(containing_height);
    let bottom = style.inset.bottom.resolve(containing_height);

    // STEP 1: Horizontal offset.
    //
    // "If both 'left' and 'right' are 'auto', the used values are both 0."
    // "If 'left' is 'auto', its used value is minus the value of 'right'."
    // "If 'right' is 'auto', its used value is minus the value of 'left'."
    // "If neither 'left' nor 'right' is 'auto', the position is
    //  over-constrained, and one of them has to be ignored. If the
    //  'direction' property of the containing block is 'ltr', the value
    //  of 'left' wins and 'right' becomes -'left'. If 'direction' of the
    //  containing block is 'rtl', 'right' wins and 'left' is ignored."
    let dx = match (left, right) {
        (None, None) => 0.0,
        (Some(left), None) => left,
        (None, Some(right)) => -right,
        (Some(left), Some(right)) => match direction {
            Direction::Ltr => left,
            Direction::Rtl => -right,
        },
    };

    // STEP 2: Vertical offset.
    //
    // "If neither is 'auto', 'bottom' is ignored (i.e., the used value
    //  of 'bottom' will be minus the value of 'top')."
    let dy = match (top, bottom) {
        (None, None) => 0.0,
        (Some(top), _) => top,
        (None, Some(bottom)) => -bottom,
    };
    (dx, dy)
}

/// One axis of the constraint equation of an absolutely positioned box.
///
/// All sizes are border-box; `None` stands for `auto`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisConstraint {
    pub(crate) start: Option<f32>,
    pub(crate) end: Option<f32>,
    pub(crate) size: Option<f32>,
    pub(crate) margin_start: Option<f32>,
    pub(crate) margin_end: Option<f32>,
    pub(crate) containing: f32,
    /// Start edge of the hypothetical static box, margin edge.
    pub(crate) static_start: f32,
    /// Over-constrained equations ignore the start offset instead of the end.
    pub(crate) end_wins: bool,
}

/// Used values of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisSolution {
    /// Offset of the margin edge from the containing block edge.
    pub(crate) start: f32,
    pub(crate) size: f32,
    pub(crate) margin_start: f32,
    pub(crate) margin_end: f32,
}

/// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
///
/// "The constraint that determines the used values for these elements is:
///
/// 'left' + 'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' + 'right'
/// = width of containing block"
///
/// [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
/// applies the same equation vertically. `auto_size` receives the space
/// available to an `auto` size and returns the size to use.
pub(crate) fn solve_axis(c: AxisConstraint, auto_size: impl FnOnce(f32) -> f32) -> AxisSolution {
    if let (Some(start), Some(size), Some(end)) = (c.start, c.size, c.end) {
        // CASE 2: "If none of the three is 'auto': If both 'margin-left' and
        // 'margin-right' are 'auto', solve the equation under the extra
        // constraint that the two margins get equal values [...] If one of
        // 'margin-left' or 'margin-right' is 'auto', solve the equation for
        // that value. If the values are over-constrained, ignore the value
        // for 'left' (in case the 'direction' property of the containing
        // block is 'rtl') or 'right' (in case 'direction' is 'ltr')."
        let free = c.containing - start - size - end;
        let (margin_start, margin_end, start) = match (c.margin_start, c.margin_end) {
            (None, None) if free >= 0.0 => (free / 2.0, free / 2.0, start),
            (None, None) if c.end_wins => (free, 0.0, start),
            (None, None) => (0.0, free, start),
            (None, Some(me)) => (free - me, me, start),
            (Some(ms), None) => (ms, free - ms, start),
            (Some(ms), Some(me)) if c.end_wins => (ms, me, c.containing - end - me - size - ms),
            (Some(ms), Some(me)) => (ms, me, start),
        };
        return AxisSolution {
            start,
            size,
            margin_start,
            margin_end,
        };
    }

    // CASE 3: "Otherwise, set 'auto' values for 'margin-left' and
    // 'margin-right' to 0, and pick the one of the following six rules
    // that applies."
    let ms = c.margin_start.unwrap_or(0.0);
    let me = c.margin_end.unwrap_or(0.0);
    let (start, size) = match (c.start, c.size, c.end) {
        // CASE 1: "If all three of 'left', 'width', and 'right' are 'auto':
        // [...] set 'left' to the static position and apply rule number
        // three below."
        (None, None, None) => {
            let size = auto_size((c.containing - c.static_start - ms - me).max(0.0));
            (c.static_start, size)
        }
        // 1. "'left' and 'width' are 'auto' and 'right' is not 'auto', then
        //    the width is shrink-to-fit. Then solve for 'left'."
        (None, None, Some(end)) => {
            let size = auto_size((c.containing - end - ms - me).max(0.0));
            (c.containing - end - me - size - ms, size)
        }
        // 2. "'left' and 'right' are 'auto' and 'width' is not 'auto', then
        //    [...] set 'left' to the static position."
        (None, Some(size), None) => (c.static_start, size),
        // 3. "'width' and 'right' are 'auto' and 'left' is not 'auto', then
        //    the width is shrink-to-fit."
        (Some(start), None, None) => {
            let size = auto_size((c.containing - start - ms - me).max(0.0));
            (start, size)
        }
        // 4. "'left' is 'auto', 'width' and 'right' are not 'auto', then
        //    solve for 'left'."
        (None, Some(size), Some(end)) => (c.containing - end - me - size - ms, size),
        // 5. "'width' is 'auto', 'left' and 'right' are not 'auto', then
        //    solve for 'width'."
        (Some(start), None, Some(end)) => (start, (c.containing - start - end - ms - me).max(0.0)),
        // 6. "'right' is 'auto', 'left' and 'width' are not 'auto', then
        //    solve for 'right'."
        (Some(start), Some(size), None) => (start, size),
        (Some(start), Some(size), Some(_)) => (start, size),
    };
    AxisSolution {
        start,
        size,
        margin_start: ms,
        margin_end: me,
    }
}

/// Convert a declared `width`/`height` into a border-box size.
pub(crate) fn border_box_size(style: &Style, content_or_border: f32, border_padding: f32) -> f32 {
    match style.box_sizing {
        BoxSizing::ContentBox => content_or_border + border_padding,
        BoxSizing::BorderBox => content_or_border.max(border_padding),
    }
}

impl BoxTree {
    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// "If the element has 'position: absolute', the containing block is
    /// established by the nearest ancestor with a 'position' of 'absolute',
    /// 'relative' or 'fixed' [...] If there is no such ancestor, the
    /// containing block is the initial containing block."
    ///
    /// "If the element's position is 'fixed', the containing block is
    /// established by the viewport."
    ///
    /// Inline ancestors are skipped. The topmost ancestor stands in for the
    /// initial containing block and for the viewport.
    fn positioned_container_for(&self, id: BoxId) -> Option<BoxId> {
        let fixed = self.boxes.get(id)?.style.position == Position::Fixed;
        let ancestors = self.ancestors(id);
        if !fixed {
            let positioned = ancestors.iter().copied().find(|&ancestor| {
                self.boxes.get(ancestor).is_some_and(|b| {
                    b.style.is_positioned() && !b.tag().is_inline_box()
                })
            });
            if positioned.is_some() {
                return positioned;
            }
        }
        ancestors.last().copied()
    }

    /// Re-register every absolutely positioned box in the subtree of `top`
    /// with its current containing block.
    pub(crate) fn register_positioned_in(&mut self, top: BoxId) -> Result<(), TreeError> {
        for id in self.subtree(top) {
            if !self.get(id)?.is_out_of_flow_positioned() {
                continue;
            }
            let container = self.positioned_container_for(id);
            let previous = self.get(id)?.containing_block;
            if previous == container {
                continue;
            }
            self.unregister_positioned(id);
            if let Some(container) = container {
                let added = self.get_mut(container)?.positioned.insert(id);
                debug_assert!(added, "box registered twice with its containing block");
                self.get_mut(id)?.containing_block = Some(container);
            }
        }
        Ok(())
    }

    /// Remove `id` from the positioned list of the box it is registered with.
    pub(crate) fn unregister_positioned(&mut self, id: BoxId) {
        let Some(container) = self.boxes.get_mut(id).and_then(|b| b.containing_block.take()) else {
            return;
        };
        if let Some(container) = self.boxes.get_mut(container) {
            let _ = container.positioned.remove(id);
        }
    }

    /// The absolutely positioned boxes `id` places as their containing block.
    #[must_use]
    pub fn positioned_boxes(&self, id: BoxId) -> Vec<BoxId> {
        self.boxes
            .get(id)
            .map(|b| b.positioned.as_slice().to_vec())
            .unwrap_or_default()
    }

    /// Position every box registered with `container`, once the container's
    /// own size is final.
    pub(crate) fn layout_positioned_descendants(
        &mut self,
        container: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        let registered = self.positioned_boxes(container);
        for id in registered {
            if self.boxes.contains(id) {
                self.layout_absolute(id, container, ctx)?;
            }
        }
        Ok(())
    }

    /// [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    /// and [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
    fn layout_absolute(
        &mut self,
        id: BoxId,
        container: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        // STEP 1: Find the containing rectangle, in the container's
        // border-box coordinates.
        let (cx, cy, cw, ch) = {
            let cb = self.get(container)?;
            let style = self.style(id)?;
            let viewport = style.position == Position::Fixed
                || (cb.flags.root && !cb.style.is_positioned());
            if viewport {
                (
                    -cb.frame.margin.left,
                    -cb.frame.margin.top,
                    ctx.viewport.width,
                    ctx.viewport.height,
                )
            } else {
                let padding = cb.frame.padding_box();
                (padding.x, padding.y, padding.width, padding.height)
            }
        };

        // STEP 2: The static position, moved into the same coordinates.
        let offset_parent = self.offset_parent(id);
        let (ox, oy) = offset_parent.map_or((0.0, 0.0), |op| self.offset_from(op, container));
        let (sx, sy) = self.get(id)?.static_position.unwrap_or((0.0, 0.0));
        let static_x = sx + ox - cx;
        let static_y = sy + oy - cy;

        let style = self.style(id)?;
        let border = EdgeSizes::resolve_non_negative(&style.border, cw);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, cw);
        let bp_h = border.horizontal() + padding.horizontal();
        let bp_v = border.vertical() + padding.vertical();
        let replaced = self.get(id)?.flags.replaced;

        // STEP 3: Horizontal constraint equation.
        let declared_width = if replaced {
            Some(self.replaced_used_size(id, cw, Some(ch))?.width + bp_h)
        } else {
            style
                .width
                .resolve(Some(cw))
                .map(|w| border_box_size(&style, w, bp_h))
        };
        let preferred = if declared_width.is_none() {
            Some(self.preferred_widths(id, ctx)?)
        } else {
            None
        };
        let horizontal = solve_axis(
            AxisConstraint {
                start: style.inset.left.resolve(Some(cw)),
                end: style.inset.right.resolve(Some(cw)),
                size: declared_width,
                margin_start: style.margin.left.resolve(Some(cw)),
                margin_end: style.margin.right.resolve(Some(cw)),
                containing: cw,
                static_start: static_x,
                end_wins: style.direction == Direction::Rtl,
            },
            |available| {
                // Shrink-to-fit: min(max(preferred minimum width, available
                // width), preferred width).
                preferred.map_or(available, |p| p.min.max(available).min(p.max))
            },
        );
        let width = self.clamp_width(&style, horizontal.size, cw, bp_h);

        // STEP 4: Lay out the content at that width.
        let mut input = LayoutInput::new(cw, Some(ch)).with_width(width);
        if let Some(h) = style.height.resolve(Some(ch)) {
            input = input.with_height(border_box_size(&style, h, bp_v));
        }
        self.layout_box(id, input, ctx)?;
        let laid_out_height = self.get(id)?.frame.height;

        // STEP 5: Vertical constraint equation.
        let vertical = solve_axis(
            AxisConstraint {
                start: style.inset.top.resolve(Some(ch)),
                end: style.inset.bottom.resolve(Some(ch)),
                size: input.override_height,
                margin_start: style.margin.top.resolve(Some(cw)),
                margin_end: style.margin.bottom.resolve(Some(cw)),
                containing: ch,
                static_start: static_y,
                end_wins: false,
            },
            |_| laid_out_height,
        );
        if (vertical.size - laid_out_height).abs() > f32::EPSILON && !replaced {
            self.layout_box(id, input.with_height(vertical.size.max(bp_v)), ctx)?;
        }

        // STEP 6: Place the box relative to its offset parent.
        let node = self.get_mut(id)?;
        node.frame.margin.left = horizontal.margin_start;
        node.frame.margin.right = horizontal.margin_end;
        node.frame.margin.top = vertical.margin_start;
        node.frame.margin.bottom = vertical.margin_end;
        node.frame.x = cx + horizontal.start + horizontal.margin_start - ox;
        node.frame.y = cy + vertical.start + vertical.margin_start - oy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(start: Option<f32>, size: Option<f32>, end: Option<f32>) -> AxisConstraint {
        AxisConstraint {
            start,
            end,
            size,
            margin_start: Some(0.0),
            margin_end: Some(0.0),
            containing: 500.0,
            static_start: 30.0,
            end_wins: false,
        }
    }

    #[test]
    fn test_all_auto_uses_static_position_and_shrink_to_fit() {
        let solved = solve_axis(constraint(None, None, None), |available| available.min(120.0));
        assert!((solved.start - 30.0).abs() < f32::EPSILON);
        assert!((solved.size - 120.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_right_anchored_box_solves_left() {
        let solved = solve_axis(constraint(None, Some(100.0), Some(20.0)), |a| a);
        assert!((solved.start - 380.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_left_and_right_stretch_width() {
        let solved = solve_axis(constraint(Some(10.0), None, Some(40.0)), |a| a);
        assert!((solved.size - 450.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_auto_margins_center_when_over_determined() {
        let mut c = constraint(Some(0.0), Some(100.0), Some(0.0));
        c.margin_start = None;
        c.margin_end = None;
        let solved = solve_axis(c, |a| a);
        assert!((solved.margin_start - 200.0).abs() < f32::EPSILON);
        assert!((solved.margin_end - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_relative_offset_prefers_left_in_ltr_and_right_in_rtl() {
        let mut style = Style {
            position: Position::Relative,
            ..Style::default()
        };
        style.inset.left = trellis_style::Length::Fixed(10.0);
        style.inset.right = trellis_style::Length::Fixed(4.0);
        assert_eq!(relative_offset(&style, 100.0, None, Direction::Ltr), (10.0, 0.0));
        assert_eq!(relative_offset(&style, 100.0, None, Direction::Rtl), (-4.0, 0.0));
    }
}
