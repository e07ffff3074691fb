//! Replaced elements.
//!
//! [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
//!
//! "A replaced element is an element whose content is outside the scope of
//! the CSS formatting model, such as an image, embedded document, or applet."
//!
//! The same width and height rules apply whether the replaced box is
//! inline-level, block-level, floating or absolutely positioned; only the
//! treatment of `auto` margins differs.

use trellis_style::{BoxSizing, Length, Style};

use crate::arena::BoxId;
use crate::block::solve_margins;
use crate::box_model::{EdgeSizes, Size};
use crate::error::TreeError;
use crate::layout::LayoutInput;
use crate::layout_box::{BoxKind, PreferredWidths};
use crate::tree::BoxTree;

/// "Otherwise, if 'width' has a computed value of 'auto', and the element has
/// an intrinsic width, then that intrinsic width is the used value of 'width'.
/// [...] Otherwise, [...] the used value of 'width' becomes 300px."
const DEFAULT_WIDTH: f32 = 300.0;

/// "Otherwise, if 'height' has a computed value of 'auto', but none of the
/// conditions above are met, then the used value of 'height' must be set to
/// the height of the largest rectangle that has a 2:1 ratio, has a height not
/// greater than 150px, and has a width not greater than the device width."
const DEFAULT_HEIGHT: f32 = 150.0;

/// Convert a declared size into a content size.
fn content_size(style: &Style, declared: f32, border_padding: f32) -> f32 {
    match style.box_sizing {
        BoxSizing::ContentBox => declared,
        BoxSizing::BorderBox => (declared - border_padding).max(0.0),
    }
}

/// Clamp a content size by its min and max constraints.
fn clamp_content(
    style: &Style,
    value: f32,
    min: Length,
    max: Length,
    container: Option<f32>,
    border_padding: f32,
) -> f32 {
    let max = max
        .resolve(container)
        .map_or(f32::INFINITY, |m| content_size(style, m, border_padding));
    let min = min
        .resolve(container)
        .map_or(0.0, |m| content_size(style, m, border_padding));
    value.min(max).max(min)
}

impl BoxTree {
    /// [§ 10.3.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width) and
    /// [§ 10.6.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-height)
    ///
    /// Used content width and height of a replaced box.
    pub(crate) fn replaced_used_size(
        &self,
        id: BoxId,
        containing_width: f32,
        containing_height: Option<f32>,
    ) -> Result<Size, TreeError> {
        let node = self.get(id)?;
        let style = &node.style;
        let intrinsic = match &node.kind {
            BoxKind::Replaced(replaced) => replaced.intrinsic_size,
            _ => return Err(TreeError::Corrupt(id, "replaced sizing on a non-replaced box")),
        };

        let border = EdgeSizes::resolve_non_negative(&style.border, containing_width);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, containing_width);
        let bp_h = border.horizontal() + padding.horizontal();
        let bp_v = border.vertical() + padding.vertical();

        // STEP 1: Declared sizes, as content sizes.
        let declared_width = style
            .width
            .resolve(Some(containing_width))
            .map(|w| content_size(style, w, bp_h));
        // "If the height of the containing block is not specified explicitly
        // [...] the value computes to 'auto'."
        let declared_height = style
            .height
            .resolve(containing_height)
            .map(|h| content_size(style, h, bp_v));

        // STEP 2: Intrinsic ratio.
        let ratio = intrinsic.and_then(|size| {
            (size.width > 0.0 && size.height > 0.0).then(|| size.width / size.height)
        });

        // STEP 3: Width.
        let width = match (declared_width, declared_height) {
            (Some(width), _) => width,
            // "If 'height' and 'width' both have computed values of 'auto' and
            // the element also has an intrinsic width, then that intrinsic
            // width is the used value of 'width'."
            (None, None) if intrinsic.is_some_and(|s| s.width > 0.0) => {
                intrinsic.map_or(DEFAULT_WIDTH, |s| s.width)
            }
            // "If 'width' has a computed value of 'auto', and the element has
            // an intrinsic ratio [and a used height], then the used value of
            // 'width' is: (used height) * (intrinsic ratio)"
            (None, Some(height)) => ratio.map_or_else(
                || intrinsic.map_or(DEFAULT_WIDTH, |s| s.width),
                |ratio| height * ratio,
            ),
            (None, None) => DEFAULT_WIDTH,
        };
        let width = clamp_content(
            style,
            width,
            style.min_width,
            style.max_width,
            Some(containing_width),
            bp_h,
        );

        // STEP 4: Height.
        let height = match declared_height {
            Some(height) => height,
            // "Otherwise, if 'height' has a computed value of 'auto', and the
            // element has an intrinsic ratio then the used value of 'height'
            // is: (used width) / (intrinsic ratio)"
            None => match (ratio, intrinsic) {
                (Some(ratio), _) => width / ratio,
                (None, Some(size)) if size.height > 0.0 => size.height,
                _ => DEFAULT_HEIGHT,
            },
        };
        let height = clamp_content(
            style,
            height,
            style.min_height,
            style.max_height,
            containing_height,
            bp_v,
        );

        Ok(Size::new(width, height))
    }

    /// Size a replaced box and resolve its margins.
    pub(crate) fn layout_replaced(&mut self, id: BoxId, input: LayoutInput) -> Result<(), TreeError> {
        let cw = input.containing_width.max(0.0);
        let style = self.style(id)?;
        let size = self.replaced_used_size(id, cw, input.containing_height)?;

        // STEP 1: Resolve padding, border, and margin.
        let border = EdgeSizes::resolve_non_negative(&style.border, cw);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, cw);
        let width = input
            .override_width
            .unwrap_or(size.width + border.horizontal() + padding.horizontal());
        let height = input
            .override_height
            .unwrap_or(size.height + border.vertical() + padding.vertical());

        // STEP 2: Horizontal margins.
        // [§ 10.3.4 Block-level, replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#block-replaced-width)
        //
        // "The used value of 'width' is determined as for inline replaced
        // elements. Then the rules for non-replaced block-level elements are
        // applied to determine the margins."
        let (block_level_in_flow, ml, mr) = {
            let node = self.get(id)?;
            (
                !node.flags.inline && !node.flags.floating && !node.is_out_of_flow_positioned(),
                style.margin.left.resolve(Some(cw)),
                style.margin.right.resolve(Some(cw)),
            )
        };
        let (ml, mr) = if block_level_in_flow {
            solve_margins(cw, width, ml, mr, style.direction)
        } else {
            // "A computed value of 'auto' for 'margin-left' or 'margin-right'
            // becomes a used value of '0'."
            (ml.unwrap_or(0.0), mr.unwrap_or(0.0))
        };

        let node = self.get_mut(id)?;
        node.frame.width = width;
        node.frame.height = height;
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

    /// [§ 5.2 Intrinsic Contributions](https://www.w3.org/TR/css-sizing-3/#intrinsic-contribution)
    ///
    /// A replaced box with a percentage width contributes nothing to the
    /// min-content width of its container.
    pub(crate) fn replaced_preferred_widths(&self, id: BoxId) -> Result<PreferredWidths, TreeError> {
        let style = self.style(id)?;
        let border = EdgeSizes::resolve_non_negative(&style.border, 0.0);
        let padding = EdgeSizes::resolve_non_negative(&style.padding, 0.0);
        let bp = border.horizontal() + padding.horizontal();
        if matches!(style.width, Length::Percent(_)) {
            let intrinsic = match &self.get(id)?.kind {
                BoxKind::Replaced(replaced) => replaced.intrinsic_size.map_or(DEFAULT_WIDTH, |s| s.width),
                _ => DEFAULT_WIDTH,
            };
            return Ok(PreferredWidths {
                min: bp,
                max: intrinsic + bp,
            });
        }
        let size = self.replaced_used_size(id, 0.0, None)?;
        Ok(PreferredWidths::fixed(size.width + bp))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use trellis_style::{Display, Length, Style};

    use crate::box_model::Size;
    use crate::tree::BoxTree;

    fn image(tree: &mut BoxTree, style: Style, intrinsic: Option<Size>) -> crate::arena::BoxId {
        tree.create_replaced(None, Rc::new(style), intrinsic, true)
            .expect("replaced box")
    }

    #[test]
    fn test_intrinsic_size_is_used_when_both_dimensions_are_auto() {
        let mut tree = BoxTree::new();
        let id = image(
            &mut tree,
            Style::with_display(Display::Inline),
            Some(Size::new(40.0, 20.0)),
        );
        let size = tree.replaced_used_size(id, 500.0, None).expect("size");
        assert_eq!(size, Size::new(40.0, 20.0));
    }

    #[test]
    fn test_declared_width_keeps_the_ratio() {
        let mut tree = BoxTree::new();
        let style = Style {
            width: Length::Fixed(80.0),
            ..Style::with_display(Display::Inline)
        };
        let id = image(&mut tree, style, Some(Size::new(40.0, 20.0)));
        let size = tree.replaced_used_size(id, 500.0, None).expect("size");
        assert_eq!(size, Size::new(80.0, 40.0));
    }

    #[test]
    fn test_no_intrinsic_size_falls_back_to_300_by_150() {
        let mut tree = BoxTree::new();
        let id = image(&mut tree, Style::with_display(Display::Inline), None);
        let size = tree.replaced_used_size(id, 500.0, None).expect("size");
        assert_eq!(size, Size::new(300.0, 150.0));
    }
}
