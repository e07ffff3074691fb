//! CSS Flexbox Layout Algorithm.
//!
//! [§ 9 Flex Layout Algorithm](https://www.w3.org/TR/css-flexbox-1/#layout-algorithm)
//!
//! A single-line subset of CSS Flexbox:
//! - `flex-direction` row, row-reverse, column and column-reverse
//! - `flex-grow` / `flex-shrink` distribution (§ 9.7)
//! - `flex-basis` (definite length or auto)
//! - `align-items: stretch` on the cross axis
//! - No margin collapsing between flex items
//!
//! Not implemented: flex-wrap, justify-content, align-self, order.

use trellis_style::{FlexDirection, Length};

use crate::arena::BoxId;
use crate::box_model::EdgeSizes;
use crate::error::TreeError;
use crate::layout::{fixed_or_zero, LayoutContext, LayoutInput};
use crate::layout_box::PreferredWidths;
use crate::positioned::border_box_size;
use crate::tree::BoxTree;

/// Per-item data collected during flex layout.
///
/// [§ 9.2 Line Length Determination](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
#[derive(Debug, Clone)]
struct FlexItem {
    id: BoxId,
    /// [§ 9.2 step 3](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
    /// The flex base size (content size on the main axis).
    base_size: f32,
    /// [§ 9.2 step 3E](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
    /// The flex base size clamped by the item's min and max main sizes.
    hypothetical_size: f32,
    /// Min and max main content sizes.
    min_size: f32,
    max_size: f32,
    grow: f32,
    shrink: f32,
    /// The resolved target main size after § 9.7.
    target_size: f32,
    frozen: bool,
    /// Margins, borders and padding on the main axis.
    outer_main: f32,
    /// Borders and padding on the main axis.
    border_padding_main: f32,
    margin: EdgeSizes,
}

impl FlexItem {
    fn clamp(&self, size: f32) -> f32 {
        size.min(self.max_size).max(self.min_size)
    }
}

impl BoxTree {
    /// Main entry point for flex layout.
    ///
    /// [§ 9 Flex Layout Algorithm](https://www.w3.org/TR/css-flexbox-1/#layout-algorithm)
    pub(crate) fn layout_flex(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        // STEP 1 (§ 9.2): Resolve the container's own width.
        //
        // [§ 10.3.3](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
        //
        // The flex container is a block-level box, so its own width is
        // determined by the same constraint equation.
        self.compute_width(id, input, ctx)?;
        let style = self.style(id)?;
        let (content_left, content_top, content_width) = {
            let frame = &self.get(id)?.frame;
            (
                frame.border.left + frame.padding.left,
                frame.border.top + frame.padding.top,
                frame.content_width(),
            )
        };
        let content_height = self.definite_content_height(id, input)?;
        let row = matches!(
            style.flex_direction,
            FlexDirection::Row | FlexDirection::RowReverse
        );
        let reverse = matches!(
            style.flex_direction,
            FlexDirection::RowReverse | FlexDirection::ColumnReverse
        );

        // STEP 2: Collect flex items.
        //
        // [§ 4.1 Absolutely-Positioned Flex Children](https://www.w3.org/TR/css-flexbox-1/#abspos-items)
        //
        // "An absolutely-positioned child of a flex container does not
        // participate in flex layout." Its static position is the content
        // box origin.
        let mut items = Vec::new();
        for child in self.child_ids(id) {
            if self.get(child)?.is_out_of_flow_positioned() {
                self.get_mut(child)?.static_position = Some((content_left, content_top));
                continue;
            }
            items.push(self.flex_item(child, row, content_width, content_height, ctx)?);
        }

        // STEP 3 (§ 9.7): Resolve flexible lengths.
        let available_main = if row {
            Some(content_width)
        } else {
            content_height
        };
        match available_main {
            Some(available) => resolve_flexible_lengths(&mut items, available),
            // An indefinite main size is the sum of the hypothetical sizes:
            // nothing flexes.
            None => {
                for item in &mut items {
                    item.target_size = item.hypothetical_size;
                }
            }
        }

        // STEP 4: Lay out each item with its main size; the cross size of
        // the line is the largest outer cross size.
        let child_input = LayoutInput::new(content_width, content_height);
        let mut line_cross: f32 = 0.0;
        for item in &items {
            let main = item.target_size + item.border_padding_main;
            let item_input = if row {
                child_input.with_width(main)
            } else {
                let stretched = self.stretched_cross_width(item.id, &item.margin, content_width)?;
                let input = child_input.with_height(main);
                match stretched {
                    Some(width) => input.with_width(width),
                    None => input,
                }
            };
            self.layout_box(item.id, item_input, ctx)?;
            self.get_mut(item.id)?.frame.margin = item.margin;
            let frame = &self.get(item.id)?.frame;
            line_cross = line_cross.max(if row {
                frame.margin_box().height
            } else {
                frame.margin_box().width
            });
        }
        if row {
            if let Some(height) = content_height {
                line_cross = height;
            }
        }

        // STEP 5 (§ 9.4 step 11): Stretch.
        //
        // "If a flex item has align-self: stretch, its computed cross size
        // property is auto, and neither of its cross-axis margins are auto,
        // the used outer cross size is the used cross size of its flex line."
        if row {
            for item in &items {
                let auto_height = self.get(item.id)?.style.height.is_auto();
                if !auto_height {
                    continue;
                }
                let (height, width) = {
                    let frame = &self.get(item.id)?.frame;
                    (
                        (line_cross - item.margin.vertical()).max(0.0),
                        frame.width,
                    )
                };
                if (height - self.get(item.id)?.frame.height).abs() > f32::EPSILON {
                    self.layout_box(item.id, child_input.with_width(width).with_height(height), ctx)?;
                    self.get_mut(item.id)?.frame.margin = item.margin;
                }
            }
        }

        // STEP 6 (§ 9.5): Main-axis placement.
        let used_main: f32 = items
            .iter()
            .map(|item| {
                self.boxes.get(item.id).map_or(0.0, |b| {
                    let margin_box = b.frame.margin_box();
                    if row {
                        margin_box.width
                    } else {
                        margin_box.height
                    }
                })
            })
            .sum();
        let container_main = if row {
            content_width
        } else {
            content_height.unwrap_or(used_main)
        };
        let mut cursor = if reverse { container_main } else { 0.0 };
        for item in &items {
            let node = self.get_mut(item.id)?;
            let margin_box = node.frame.margin_box();
            let extent = if row { margin_box.width } else { margin_box.height };
            if reverse {
                cursor -= extent;
            }
            if row {
                node.frame.x = content_left + cursor + item.margin.left;
                node.frame.y = content_top + item.margin.top;
            } else {
                node.frame.x = content_left + item.margin.left;
                node.frame.y = content_top + cursor + item.margin.top;
            }
            if !reverse {
                cursor += extent;
            }
            self.apply_relative_offset(item.id, content_width, content_height, style.direction)?;
        }

        // STEP 7 (§ 9.9): Container height.
        //
        // "If the cross size property is a definite size, use that;
        // otherwise, use the largest of the flex lines' cross sizes."
        let content = if row { line_cross } else { used_main };
        self.compute_height(id, content, input)
    }

    /// [§ 9.2 step 3](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
    ///
    /// Determine flex base size:
    ///   A. If flex-basis is a definite length, use it.
    ///   B. If flex-basis is auto and the item has a definite main size, use that.
    ///   C. Otherwise, use the max-content size (row) or the laid-out content
    ///      height (column).
    fn flex_item(
        &mut self,
        id: BoxId,
        row: bool,
        content_width: f32,
        content_height: Option<f32>,
        ctx: &LayoutContext<'_>,
    ) -> Result<FlexItem, TreeError> {
        let style = self.style(id)?;
        let border = EdgeSizes::resolve_non_negative(&style.border, content_width);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, content_width);
        // "Auto margins on flex items" are not distributed; they count as zero.
        let margin = EdgeSizes::resolve(&style.margin, content_width);
        let (bp, margin_main, container_main, declared, min, max) = if row {
            (
                border.horizontal() + padding.horizontal(),
                margin.horizontal(),
                Some(content_width),
                style.width,
                style.min_width,
                style.max_width,
            )
        } else {
            (
                border.vertical() + padding.vertical(),
                margin.vertical(),
                content_height,
                style.height,
                style.min_height,
                style.max_height,
            )
        };
        let to_content = |size: f32| (border_box_size(&style, size, bp) - bp).max(0.0);

        let basis = match style.flex_basis {
            Length::Auto => declared.resolve(container_main),
            basis => basis.resolve(container_main),
        };
        let base_size = match basis {
            Some(size) => to_content(size),
            None if row => (self.preferred_widths(id, ctx)?.max - bp).max(0.0),
            None => {
                let mut input = LayoutInput::new(content_width, None);
                if let Some(width) = self.stretched_cross_width(id, &margin, content_width)? {
                    input = input.with_width(width);
                }
                self.layout_box(id, input, ctx)?;
                (self.get(id)?.frame.height - bp).max(0.0)
            }
        };

        let min_size = min.resolve(container_main).map_or(0.0, to_content);
        let max_size = max
            .resolve(container_main)
            .map_or(f32::INFINITY, to_content)
            .max(min_size);
        let mut item = FlexItem {
            id,
            base_size,
            hypothetical_size: base_size,
            min_size,
            max_size,
            grow: style.flex_grow.max(0.0),
            shrink: style.flex_shrink.max(0.0),
            target_size: 0.0,
            frozen: false,
            outer_main: margin_main + bp,
            border_padding_main: bp,
            margin,
        };
        // [§ 9.2 step 3E](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
        //
        // "The hypothetical main size is the item's flex base size clamped
        // according to its used min and max main sizes."
        item.hypothetical_size = item.clamp(base_size);
        Ok(item)
    }

    /// The stretched border-box width of an item in a column container, or
    /// `None` when its width is not `auto`.
    fn stretched_cross_width(
        &self,
        id: BoxId,
        margin: &EdgeSizes,
        content_width: f32,
    ) -> Result<Option<f32>, TreeError> {
        let style = &self.get(id)?.style;
        if !style.width.is_auto() {
            return Ok(None);
        }
        let border = EdgeSizes::resolve_non_negative(&style.border, content_width);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, content_width);
        let bp = border.horizontal() + padding.horizontal();
        let stretched = (content_width - margin.horizontal()).max(bp);
        Ok(Some(self.clamp_width(style, stretched, content_width, bp)))
    }

    /// [§ 9.9.1 Flex Container Intrinsic Main Sizes](https://www.w3.org/TR/css-flexbox-1/#intrinsic-main-sizes)
    ///
    /// A single-line row container sums its items' contributions; a column
    /// container takes the largest.
    pub(crate) fn flex_preferred_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let style = self.style(id)?;
        let bp = fixed_or_zero(style.border.left)
            + fixed_or_zero(style.border.right)
            + fixed_or_zero(style.padding.left)
            + fixed_or_zero(style.padding.right);
        if let Length::Fixed(width) = style.width {
            let width = self.clamp_width(&style, border_box_size(&style, width, bp), 0.0, bp);
            return Ok(PreferredWidths::fixed(width));
        }
        let row = matches!(
            style.flex_direction,
            FlexDirection::Row | FlexDirection::RowReverse
        );
        let mut min: f32 = 0.0;
        let mut max: f32 = 0.0;
        for child in self.children(id) {
            if self.get(child)?.is_out_of_flow_positioned() {
                continue;
            }
            let widths = self.preferred_margin_widths(child, ctx)?;
            if row {
                min += widths.min;
                max += widths.max;
            } else {
                min = min.max(widths.min);
                max = max.max(widths.max);
            }
        }
        Ok(PreferredWidths {
            min: min + bp,
            max: max.max(min) + bp,
        })
    }
}

/// [§ 9.7 Resolving Flexible Lengths](https://www.w3.org/TR/css-flexbox-1/#resolve-flexible-lengths)
///
/// Full iterative freeze-loop algorithm.
fn resolve_flexible_lengths(items: &mut [FlexItem], available_main: f32) {
    if items.is_empty() {
        return;
    }

    // STEP 1: "Determine the used flex factor."
    //
    // "If the sum of the outer hypothetical main sizes of all items on the
    // line is less than the flex container's inner main size, use the flex
    // grow factor for the rest of this algorithm; otherwise, use the flex
    // shrink factor."
    let sum_outer_hypo: f32 = items
        .iter()
        .map(|item| item.hypothetical_size + item.outer_main)
        .sum();
    let growing = sum_outer_hypo < available_main;

    // STEP 2: "Size inflexible items."
    //
    // "Freeze, setting its target main size to its hypothetical main size…
    //   - any item that has a flex factor of zero
    //   - if using the flex grow factor: any item that has a flex base size
    //     greater than its hypothetical main size
    //   - if using the flex shrink factor: any item that has a flex base size
    //     less than its hypothetical main size"
    for item in items.iter_mut() {
        let factor = if growing { item.grow } else { item.shrink };
        let freeze = factor == 0.0
            || (growing && item.base_size > item.hypothetical_size)
            || (!growing && item.base_size < item.hypothetical_size);
        item.target_size = item.hypothetical_size;
        if freeze {
            item.frozen = true;
        }
    }

    let outer_sum = |items: &[FlexItem]| -> f32 {
        items
            .iter()
            .map(|item| {
                if item.frozen {
                    item.target_size + item.outer_main
                } else {
                    item.base_size + item.outer_main
                }
            })
            .sum()
    };

    // STEP 3: "Calculate initial free space."
    let initial_free_space = available_main - outer_sum(items);

    // STEP 4: Loop until all items are frozen.
    while !items.iter().all(|item| item.frozen) {
        // 4b. Calculate remaining free space.
        let remaining_free = available_main - outer_sum(items);

        // 4c. "If the sum of the unfrozen flex factors is less than one,
        //      multiply the initial free space by this sum."
        let unfrozen_factor_sum: f32 = items
            .iter()
            .filter(|item| !item.frozen)
            .map(|item| if growing { item.grow } else { item.shrink })
            .sum();
        let free_space = if unfrozen_factor_sum < 1.0 {
            let scaled = initial_free_space * unfrozen_factor_sum;
            if scaled.abs() < remaining_free.abs() {
                scaled
            } else {
                remaining_free
            }
        } else {
            remaining_free
        };

        // 4d. Distribute free space.
        if growing {
            // "Find the ratio of the item's flex grow factor to the sum of the
            // flex grow factors of all unfrozen items on the line. Set the
            // item's target main size to its flex base size plus a fraction
            // of the remaining free space proportional to the ratio."
            let grow_sum: f32 = items
                .iter()
                .filter(|item| !item.frozen)
                .map(|item| item.grow)
                .sum();
            if grow_sum > 0.0 {
                for item in items.iter_mut().filter(|item| !item.frozen) {
                    item.target_size = item.base_size + free_space * item.grow / grow_sum;
                }
            }
        } else {
            // "For every unfrozen item on the line, multiply its flex shrink
            // factor by its inner flex base size, and note this as its scaled
            // flex shrink factor. [...] Set the item's target main size to its
            // flex base size minus a fraction of the absolute value of the
            // remaining free space proportional to the ratio."
            let scaled_shrink_sum: f32 = items
                .iter()
                .filter(|item| !item.frozen)
                .map(|item| item.shrink * item.base_size)
                .sum();
            if scaled_shrink_sum > 0.0 {
                for item in items.iter_mut().filter(|item| !item.frozen) {
                    let ratio = item.shrink * item.base_size / scaled_shrink_sum;
                    item.target_size = free_space.abs().mul_add(-ratio, item.base_size);
                }
            }
        }

        // 4e. "Fix min/max violations. Clamp each non-frozen item's target
        // main size by its used min and max main sizes and floor its
        // content-box size at zero."
        let mut total_violation = 0.0_f32;
        let mut violations = Vec::with_capacity(items.len());
        for item in items.iter_mut() {
            if item.frozen {
                violations.push(0.0);
                continue;
            }
            let clamped = item.clamp(item.target_size).max(0.0);
            let violation = clamped - item.target_size;
            total_violation += violation;
            violations.push(violation);
            item.target_size = clamped;
        }

        // 4f. "Freeze over-flexed items."
        //
        // "Zero: Freeze all items. Positive: Freeze all the items with min
        // violations. Negative: Freeze all the items with max violations."
        for (item, violation) in items.iter_mut().zip(violations) {
            let freeze = if total_violation.abs() < 0.01 {
                true
            } else if total_violation > 0.0 {
                violation > 0.0
            } else {
                violation < 0.0
            };
            if freeze {
                item.frozen = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::BoxId;

    fn item(id: BoxId, base: f32, grow: f32, shrink: f32) -> FlexItem {
        FlexItem {
            id,
            base_size: base,
            hypothetical_size: base,
            min_size: 0.0,
            max_size: f32::INFINITY,
            grow,
            shrink,
            target_size: 0.0,
            frozen: false,
            outer_main: 0.0,
            border_padding_main: 0.0,
            margin: EdgeSizes::default(),
        }
    }

    fn some_id() -> BoxId {
        let mut tree = BoxTree::new();
        tree.create_text(None, std::rc::Rc::new(trellis_style::Style::default()), "x")
            .expect("text box")
    }

    #[test]
    fn test_grow_distributes_proportionally() {
        let id = some_id();
        let mut items = vec![item(id, 100.0, 1.0, 1.0), item(id, 100.0, 3.0, 1.0)];
        resolve_flexible_lengths(&mut items, 600.0);
        assert!((items[0].target_size - 200.0).abs() < 0.01);
        assert!((items[1].target_size - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_shrink_is_weighted_by_base_size() {
        let id = some_id();
        let mut items = vec![item(id, 300.0, 0.0, 1.0), item(id, 100.0, 0.0, 1.0)];
        resolve_flexible_lengths(&mut items, 200.0);
        assert!((items[0].target_size - 150.0).abs() < 0.01);
        assert!((items[1].target_size - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_max_violation_freezes_and_redistributes() {
        let id = some_id();
        let mut capped = item(id, 0.0, 1.0, 1.0);
        capped.max_size = 50.0;
        let mut items = vec![capped, item(id, 0.0, 1.0, 1.0)];
        resolve_flexible_lengths(&mut items, 300.0);
        assert!((items[0].target_size - 50.0).abs() < 0.01);
        assert!((items[1].target_size - 250.0).abs() < 0.01);
    }
}
