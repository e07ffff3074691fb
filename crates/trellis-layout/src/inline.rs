//! CSS Inline Layout and Line Box Model.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! [§ 10.8 Line height calculations: the 'line-height' and 'vertical-align' properties](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "The height of the line box is determined by the rules given in the
//! section on line height calculations."
//!
//! The inline content of a block container is flattened into a list of
//! items (words, spaces, inline box edges, atomic inlines, floats), filled
//! greedily into lines narrowed by the block's floats, and each finished
//! line becomes a root line box with nested flow, text and replaced line
//! boxes.

use trellis_style::{Direction, Style, TextAlign, VerticalAlign, WhiteSpace};

use crate::arena::{BoxId, LineId};
use crate::box_model::{EdgeSizes, Rect};
use crate::error::TreeError;
use crate::layout::{LayoutContext, LayoutInput};
use crate::layout_box::{BoxKindTag, PreferredWidths};
use crate::line_box::LineBoxKind;
use crate::tree::BoxTree;

const EPSILON: f32 = 0.01;

/// Font metrics interface for text measurement during layout.
///
/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
///
/// Implementors provide the actual per-glyph advance widths and line
/// height values needed for inline layout. The layout engine calls
/// these methods to measure text for line breaking and fragment placement.
pub trait FontMetrics {
    /// Measure the total advance width of a text string at the given font size.
    ///
    /// This should sum the advance width of each glyph in the string,
    /// matching the cursor advancement used during text rendering.
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Calculate the line height for a given font size.
    ///
    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// "The initial value of 'line-height' is 'normal'. We recommend a used
    /// value for 'normal' between 1.0 and 1.2."
    fn line_height(&self, font_size: f32) -> f32;
}

/// Approximate font metrics using fixed ratios.
///
/// Every glyph advances 0.6× the font size and `line-height: normal` is
/// 1.2× the font size. Used when no font is available, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        const CHAR_WIDTH_RATIO: f32 = 0.6;
        text.chars().count() as f32 * font_size * CHAR_WIDTH_RATIO
    }

    fn line_height(&self, font_size: f32) -> f32 {
        const LINE_HEIGHT_RATIO: f32 = 1.2;
        font_size * LINE_HEIGHT_RATIO
    }
}

/// Used `line-height` of a style.
pub(crate) fn line_height_of(style: &Style, metrics: &dyn FontMetrics) -> f32 {
    style
        .line_height
        .unwrap_or_else(|| metrics.line_height(style.font_size))
}

/// One unit of inline content.
#[derive(Debug, Clone, PartialEq)]
enum InlineItem {
    /// Start of an inline box; `edge` is its start margin, border and padding.
    Open { owner: BoxId, edge: f32 },
    /// End of an inline box.
    Close { owner: BoxId, edge: f32 },
    /// An unbreakable run of text.
    Word {
        owner: BoxId,
        text: String,
        width: f32,
        line_height: f32,
    },
    /// Collapsed white space between words.
    Space {
        owner: BoxId,
        width: f32,
        breakable: bool,
    },
    /// A replaced element, inline-block, inline-table or inline-flex.
    Atomic { owner: BoxId, breakable: bool },
    /// A float met in the middle of inline content.
    Float { owner: BoxId },
    /// An absolutely positioned box; only its static position is recorded.
    OutOfFlow { owner: BoxId },
    /// A preserved newline.
    ForcedBreak,
}

/// An item placed on the line being filled, at `x` from the line's left.
#[derive(Debug, Clone, Copy)]
struct PlacedItem {
    index: usize,
    x: f32,
}

/// Measured inline content of one block.
struct InlineContent {
    items: Vec<InlineItem>,
    widths: Vec<f32>,
    heights: Vec<f32>,
}

impl BoxTree {
    /// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    ///
    /// Flatten the inline content under `roots` into items.
    fn collect_inline_items(
        &self,
        roots: &[BoxId],
        containing_width: f32,
        ctx: &LayoutContext<'_>,
    ) -> Result<Vec<InlineItem>, TreeError> {
        let mut items = Vec::new();
        // Leading white space of the block is dropped.
        let mut last_was_space = true;
        for &root in roots {
            self.collect_item(root, containing_width, ctx, &mut items, &mut last_was_space)?;
        }
        Ok(items)
    }

    fn collect_item(
        &self,
        id: BoxId,
        containing_width: f32,
        ctx: &LayoutContext<'_>,
        items: &mut Vec<InlineItem>,
        last_was_space: &mut bool,
    ) -> Result<(), TreeError> {
        let node = self.get(id)?;
        let style = &node.style;
        match node.tag() {
            BoxKindTag::Text => {
                let text = node.text().unwrap_or_default();
                collect_text(id, text, style, ctx.metrics, items, last_was_space);
            }
            BoxKindTag::OutsideListMarker => {}
            _ if node.is_out_of_flow_positioned() => items.push(InlineItem::OutOfFlow { owner: id }),
            _ if node.is_floating() => items.push(InlineItem::Float { owner: id }),
            BoxKindTag::Inline | BoxKindTag::InsideListMarker => {
                let start = style.margin.left.calc_min(containing_width)
                    + style.border.left.calc_min(containing_width).max(0.0)
                    + style.padding.left.calc_min(containing_width).max(0.0);
                let end = style.margin.right.calc_min(containing_width)
                    + style.border.right.calc_min(containing_width).max(0.0)
                    + style.padding.right.calc_min(containing_width).max(0.0);
                items.push(InlineItem::Open {
                    owner: id,
                    edge: start,
                });
                for child in self.children(id) {
                    self.collect_item(child, containing_width, ctx, items, last_was_space)?;
                }
                items.push(InlineItem::Close { owner: id, edge: end });
            }
            _ => {
                items.push(InlineItem::Atomic {
                    owner: id,
                    breakable: style.white_space.allows_wrap(),
                });
                *last_was_space = false;
            }
        }
        Ok(())
    }

    /// Lay out the inline children of block `id` into line boxes. Returns
    /// the bottom of the last line in `id`'s border-box coordinates.
    pub(crate) fn layout_inline_content(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<f32, TreeError> {
        let (content_left, content_top, content_width, block_style) = {
            let node = self.get(id)?;
            (
                node.frame.border.left + node.frame.padding.left,
                node.frame.border.top + node.frame.padding.top,
                node.frame.content_width(),
                std::rc::Rc::clone(&node.style),
            )
        };
        let child_height = self.definite_content_height(id, input)?;
        let children = self.child_ids(id);
        let items = self.collect_inline_items(&children, content_width, ctx)?;
        let content = self.measure_items(items, content_width, child_height, ctx)?;

        let mut filler = LineFiller {
            block: id,
            content_left,
            content_width,
            line_top: content_top,
            strut: line_height_of(&block_style, ctx.metrics),
            text_align: block_style.text_align,
            direction: block_style.direction,
            open_at_start: Vec::new(),
            placed_floats: Vec::new(),
            touched: Vec::new(),
            containing_height: child_height,
        };
        filler.run(self, &content)?;
        let bottom = filler.line_top;
        self.finish_inline_frames(&filler.touched, content_left, bottom)?;
        Ok(bottom)
    }

    /// Lay out atomics and floats once and record every item's advance and
    /// height.
    fn measure_items(
        &mut self,
        items: Vec<InlineItem>,
        containing_width: f32,
        containing_height: Option<f32>,
        ctx: &LayoutContext<'_>,
    ) -> Result<InlineContent, TreeError> {
        let mut widths = Vec::with_capacity(items.len());
        let mut heights = Vec::with_capacity(items.len());
        for item in &items {
            let (width, height) = match item {
                InlineItem::Open { owner, edge } => {
                    self.resolve_inline_edges(*owner, containing_width)?;
                    (*edge, 0.0)
                }
                InlineItem::Close { edge, .. } => (*edge, 0.0),
                InlineItem::Word {
                    width, line_height, ..
                } => (*width, *line_height),
                InlineItem::Space { width, .. } => (*width, 0.0),
                InlineItem::Atomic { owner, .. } | InlineItem::Float { owner } => {
                    self.layout_box(
                        *owner,
                        LayoutInput::new(containing_width, containing_height),
                        ctx,
                    )?;
                    let margin_box = self.get(*owner)?.frame.margin_box();
                    (margin_box.width, margin_box.height)
                }
                InlineItem::OutOfFlow { .. } | InlineItem::ForcedBreak => (0.0, 0.0),
            };
            widths.push(width);
            heights.push(height);
        }
        Ok(InlineContent {
            items,
            widths,
            heights,
        })
    }

    /// Resolve margins, borders and padding of an inline box.
    fn resolve_inline_edges(&mut self, id: BoxId, containing_width: f32) -> Result<(), TreeError> {
        let node = self.get_mut(id)?;
        node.frame.margin = EdgeSizes::resolve(&node.style.margin, containing_width);
        node.frame.border = EdgeSizes::resolve_non_negative(&node.style.border, containing_width);
        node.frame.padding = EdgeSizes::resolve_non_negative(&node.style.padding, containing_width);
        Ok(())
    }

    /// Text and inline box frames are the union of their line boxes.
    fn finish_inline_frames(
        &mut self,
        touched: &[BoxId],
        content_left: f32,
        bottom: f32,
    ) -> Result<(), TreeError> {
        for &id in touched {
            let rects: Vec<Rect> = self
                .get(id)?
                .kind
                .lines()
                .iter()
                .filter_map(|&line| self.lines.get(line).map(|l| l.rect))
                .collect();
            let frame = rects
                .iter()
                .skip(1)
                .fold(rects.first().copied(), |acc, r| acc.map(|a| a.union(r)))
                .unwrap_or_else(|| Rect::new(content_left, bottom, 0.0, 0.0));
            let node = self.get_mut(id)?;
            node.frame.x = frame.x;
            node.frame.y = frame.y;
            node.frame.width = frame.width;
            node.frame.height = frame.height;
        }
        Ok(())
    }

    /// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
    ///
    /// Preferred widths of inline content: the minimum is the widest
    /// unbreakable run, the maximum the widest line without soft breaks.
    pub(crate) fn inline_preferred_widths(
        &self,
        roots: &[BoxId],
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let items = self.collect_inline_items(roots, 0.0, ctx)?;
        let mut min: f32 = 0.0;
        let mut max: f32 = 0.0;
        let mut run: f32 = 0.0;
        let mut line: f32 = 0.0;
        for item in &items {
            match item {
                InlineItem::Word { width, .. } => {
                    run += width;
                    line += width;
                }
                InlineItem::Open { edge, .. } | InlineItem::Close { edge, .. } => {
                    run += edge;
                    line += edge;
                }
                InlineItem::Space {
                    width, breakable, ..
                } => {
                    if *breakable {
                        min = min.max(run);
                        run = 0.0;
                    } else {
                        run += width;
                    }
                    line += width;
                }
                InlineItem::Atomic { owner, breakable } => {
                    let widths = self.preferred_margin_widths(*owner, ctx)?;
                    if *breakable {
                        min = min.max(run).max(widths.min);
                        run = 0.0;
                    } else {
                        run += widths.min;
                    }
                    line += widths.max;
                }
                InlineItem::Float { owner } => {
                    let widths = self.preferred_margin_widths(*owner, ctx)?;
                    min = min.max(widths.min);
                    line += widths.max;
                }
                InlineItem::ForcedBreak => {
                    min = min.max(run);
                    max = max.max(line);
                    run = 0.0;
                    line = 0.0;
                }
                InlineItem::OutOfFlow { .. } => {}
            }
        }
        min = min.max(run);
        max = max.max(line).max(min);
        Ok(PreferredWidths { min, max })
    }
}

/// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// "If 'white-space' is set to 'normal', 'nowrap', or 'pre-line', [...]
/// every tab is converted to a space [...] any space immediately following
/// another collapsible space [...] is collapsed to have zero advance
/// width."
fn collect_text(
    owner: BoxId,
    text: &str,
    style: &Style,
    metrics: &dyn FontMetrics,
    items: &mut Vec<InlineItem>,
    last_was_space: &mut bool,
) {
    let line_height = line_height_of(style, metrics);
    let word = |text: &str| InlineItem::Word {
        owner,
        text: text.to_owned(),
        width: metrics.text_width(text, style.font_size),
        line_height,
    };

    if style.white_space == WhiteSpace::Pre {
        // "Prevents user agents from collapsing sequences of white space.
        // Lines are only broken at preserved newline characters."
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                items.push(InlineItem::ForcedBreak);
            }
            if !segment.is_empty() {
                items.push(word(&segment.replace('\t', "    ")));
            }
        }
        *last_was_space = false;
        return;
    }

    let breakable = style.white_space.allows_wrap();
    let space_width = metrics.text_width(" ", style.font_size);
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                items.push(word(&current));
                current.clear();
                *last_was_space = false;
            }
            if !*last_was_space {
                items.push(InlineItem::Space {
                    owner,
                    width: space_width,
                    breakable,
                });
                *last_was_space = true;
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        items.push(word(&current));
        *last_was_space = false;
    }
}

/// State of the greedy line filling of one block.
struct LineFiller {
    block: BoxId,
    content_left: f32,
    content_width: f32,
    line_top: f32,
    strut: f32,
    text_align: TextAlign,
    direction: Direction,
    containing_height: Option<f32>,
    /// Inline boxes opened on an earlier line and still open.
    open_at_start: Vec<BoxId>,
    placed_floats: Vec<BoxId>,
    /// Text and inline boxes that received line boxes.
    touched: Vec<BoxId>,
}

impl LineFiller {
    fn band(&self, tree: &BoxTree, height: f32) -> (f32, f32) {
        tree.boxes
            .get(self.block)
            .and_then(|b| b.kind.block_flow())
            .map_or((self.content_left, self.content_width), |flow| {
                flow.floats
                    .available_range(self.line_top, height, self.content_left, self.content_width)
            })
    }

    fn next_float_bottom(&self, tree: &BoxTree) -> f32 {
        tree.boxes
            .get(self.block)
            .and_then(|b| b.kind.block_flow())
            .map_or(self.line_top, |flow| flow.floats.next_float_bottom_after(self.line_top))
    }

    fn place_float(&mut self, tree: &mut BoxTree, float: BoxId) -> Result<(), TreeError> {
        if self.placed_floats.contains(&float) {
            return Ok(());
        }
        self.placed_floats.push(float);
        tree.place_float(
            self.block,
            float,
            self.line_top,
            self.content_width,
            self.containing_height,
        )
    }

    /// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
    ///
    /// "When an inline box exceeds the width of a line box, it is split into
    /// several boxes and these boxes are distributed across several line
    /// boxes."
    fn run(&mut self, tree: &mut BoxTree, content: &InlineContent) -> Result<(), TreeError> {
        let items = &content.items;
        let mut line: Vec<PlacedItem> = Vec::new();
        let mut pending_floats: Vec<BoxId> = Vec::new();
        let mut x: f32 = 0.0;
        let mut has_content = false;
        // Position in `line` and item index of the last soft wrap opportunity.
        let mut break_at: Option<(usize, usize)> = None;
        let mut i = 0;

        while i < items.len() {
            let width = content.widths[i];
            let (_, available) = self.band(tree, self.strut);
            match &items[i] {
                InlineItem::Space { breakable, .. } => {
                    // "A sequence of collapsible spaces at the beginning of a
                    // line is removed."
                    if has_content {
                        if *breakable {
                            break_at = Some((line.len(), i));
                        }
                        line.push(PlacedItem { index: i, x });
                        x += width;
                    }
                }
                InlineItem::Word { .. } | InlineItem::Atomic { .. } => {
                    if has_content && matches!(items[i], InlineItem::Atomic { breakable: true, .. }) {
                        // Atomic inlines may wrap before themselves.
                        break_at = Some((line.len(), i - 1));
                    }
                    if has_content && x + width > available + EPSILON {
                        // STEP 1: Break at the last soft wrap opportunity.
                        if let Some((position, index)) = break_at {
                            line.truncate(position);
                            self.commit(tree, content, &line, false)?;
                            self.after_line(tree, &mut pending_floats, &line, content)?;
                            line.clear();
                            x = 0.0;
                            has_content = false;
                            break_at = None;
                            i = index + 1;
                            continue;
                        }
                    }
                    if !has_content && width > available + EPSILON {
                        // STEP 2: Nothing fits beside the floats; move the
                        // line below the next float bottom.
                        let next = self.next_float_bottom(tree);
                        if next > self.line_top {
                            self.line_top = next;
                            continue;
                        }
                    }
                    line.push(PlacedItem { index: i, x });
                    x += width;
                    has_content = true;
                }
                InlineItem::Open { .. } | InlineItem::Close { .. } | InlineItem::OutOfFlow { .. } => {
                    line.push(PlacedItem { index: i, x });
                    x += width;
                }
                InlineItem::Float { owner } => {
                    // A float that fits goes on the current line; otherwise
                    // it waits for the next one.
                    if !has_content || x + width <= available + EPSILON {
                        self.place_float(tree, *owner)?;
                    } else {
                        pending_floats.push(*owner);
                    }
                }
                InlineItem::ForcedBreak => {
                    self.commit(tree, content, &line, true)?;
                    self.after_line(tree, &mut pending_floats, &line, content)?;
                    line.clear();
                    x = 0.0;
                    has_content = false;
                    break_at = None;
                }
            }
            i += 1;
        }

        self.commit(tree, content, &line, false)?;
        self.after_line(tree, &mut pending_floats, &line, content)?;
        Ok(())
    }

    /// Place floats deferred to the next line and carry open inline boxes
    /// over.
    fn after_line(
        &mut self,
        tree: &mut BoxTree,
        pending_floats: &mut Vec<BoxId>,
        line: &[PlacedItem],
        content: &InlineContent,
    ) -> Result<(), TreeError> {
        for placed in line {
            match &content.items[placed.index] {
                InlineItem::Open { owner, .. } => self.open_at_start.push(*owner),
                InlineItem::Close { owner, .. } => {
                    if let Some(pos) = self.open_at_start.iter().rposition(|o| o == owner) {
                        let _ = self.open_at_start.remove(pos);
                    }
                }
                _ => {}
            }
        }
        for float in pending_floats.drain(..) {
            self.place_float(tree, float)?;
        }
        Ok(())
    }

    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// Finalize one line: its height, its horizontal alignment and its line
    /// boxes.
    ///
    /// "The height of the line box is the distance between the uppermost box
    /// top and the lowermost box bottom."
    fn commit(
        &mut self,
        tree: &mut BoxTree,
        content: &InlineContent,
        line: &[PlacedItem],
        forced: bool,
    ) -> Result<(), TreeError> {
        let items = &content.items;
        let has_content = line.iter().any(|p| {
            matches!(
                items[p.index],
                InlineItem::Word { .. } | InlineItem::Atomic { .. }
            )
        });

        // STEP 1: Line height. Bottom-aligned content; the strut keeps
        // the line at least as tall as the block's own line height.
        let mut height: f32 = if has_content || forced { self.strut } else { 0.0 };
        for placed in line {
            if matches!(
                items[placed.index],
                InlineItem::Word { .. } | InlineItem::Atomic { .. }
            ) {
                height = height.max(content.heights[placed.index]);
            }
        }

        let (band_left, band_width) = self.band(tree, height.max(1.0));

        // STEP 2: Trailing spaces hang and do not count.
        // [§ 4.1.3](https://www.w3.org/TR/css-text-3/#white-space-phase-2)
        //
        // "A sequence of collapsible spaces at the end of a line is removed."
        let mut used: f32 = 0.0;
        for placed in line {
            if !matches!(items[placed.index], InlineItem::Space { .. }) {
                used = used.max(placed.x + content.widths[placed.index]);
            }
        }

        // STEP 3: text-align.
        // [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        //
        // "This property describes how inline-level content of a block
        // container is aligned."
        let free = (band_width - used).max(0.0);
        let offset = match (self.text_align, self.direction) {
            (TextAlign::Left, _)
            | (TextAlign::Start | TextAlign::Justify, Direction::Ltr)
            | (TextAlign::End, Direction::Rtl) => 0.0,
            (TextAlign::Right, _)
            | (TextAlign::Start | TextAlign::Justify, Direction::Rtl)
            | (TextAlign::End, Direction::Ltr) => free,
            (TextAlign::Center, _) => free / 2.0,
        };
        let left = band_left + offset;
        let top = self.line_top;

        if !has_content && !forced {
            // An empty line generates no line box; out-of-flow content still
            // gets a static position.
            for placed in line {
                if let InlineItem::OutOfFlow { owner } = items[placed.index] {
                    tree.get_mut(owner)?.static_position = Some((left + placed.x, top));
                }
            }
            return Ok(());
        }

        // STEP 4: Build the line boxes.
        let root = tree.create_line(
            self.block,
            None,
            Rect::new(band_left, top, band_width, height),
            LineBoxKind::Root {
                children: Vec::new(),
            },
        )?;

        // Inline boxes still open from the previous line continue here.
        let mut stack: Vec<(BoxId, LineId, f32)> = Vec::new();
        let carried = self.open_at_start.clone();
        for owner in carried {
            let parent = stack.last().map_or(root, |s| s.1);
            let flow = self.open_flow(tree, owner, parent, left, top, height)?;
            stack.push((owner, flow, left));
        }

        // Consecutive words of the same text box merge into one text line box.
        let mut run: Option<TextRun> = None;

        for (n, placed) in line.iter().enumerate() {
            let x = left + placed.x;
            let width = content.widths[placed.index];
            match &items[placed.index] {
                InlineItem::Word {
                    owner,
                    text,
                    line_height,
                    ..
                } => {
                    match &mut run {
                        Some(r) if r.owner == *owner => {
                            if r.pending_space {
                                r.text.push(' ');
                                r.pending_space = false;
                            }
                            r.text.push_str(text);
                            r.end = x + width;
                            r.line_height = r.line_height.max(*line_height);
                        }
                        _ => {
                            self.flush_run(tree, run.take(), &stack, root, top, height)?;
                            run = Some(TextRun {
                                owner: *owner,
                                text: text.clone(),
                                start: x,
                                end: x + width,
                                line_height: *line_height,
                                pending_space: false,
                            });
                        }
                    }
                }
                InlineItem::Space { owner, .. } => {
                    let continues = line[n + 1..]
                        .iter()
                        .find(|p| !matches!(items[p.index], InlineItem::Space { .. }))
                        .is_some_and(|p| {
                            matches!(&items[p.index], InlineItem::Word { owner: o, .. } if o == owner)
                        });
                    if let Some(r) = &mut run {
                        if r.owner == *owner && continues {
                            r.pending_space = true;
                        }
                    }
                }
                InlineItem::Open { owner, .. } => {
                    self.flush_run(tree, run.take(), &stack, root, top, height)?;
                    let parent = stack.last().map_or(root, |s| s.1);
                    let flow = self.open_flow(tree, *owner, parent, x, top, height)?;
                    stack.push((*owner, flow, x));
                }
                InlineItem::Close { owner, .. } => {
                    self.flush_run(tree, run.take(), &stack, root, top, height)?;
                    if let Some(pos) = stack.iter().rposition(|s| s.0 == *owner) {
                        let (_, flow, start) = stack.remove(pos);
                        set_line_width(tree, flow, x + width - start);
                    }
                }
                InlineItem::Atomic { owner, .. } => {
                    self.flush_run(tree, run.take(), &stack, root, top, height)?;
                    let atomic_height = content.heights[placed.index];
                    let align = tree.get(*owner)?.style.vertical_align;
                    let dy = match align {
                        VerticalAlign::Top => 0.0,
                        VerticalAlign::Middle => (height - atomic_height) / 2.0,
                        VerticalAlign::Bottom | VerticalAlign::Baseline => height - atomic_height,
                    };
                    let parent = stack.last().map_or(root, |s| s.1);
                    let line = tree.create_line(
                        *owner,
                        Some(parent),
                        Rect::new(x, top + dy, width, atomic_height),
                        LineBoxKind::Replaced,
                    )?;
                    let node = tree.get_mut(*owner)?;
                    debug_assert_eq!(node.line, Some(line));
                    node.frame.x = x + node.frame.margin.left;
                    node.frame.y = top + dy + node.frame.margin.top;
                }
                InlineItem::OutOfFlow { owner } => {
                    tree.get_mut(*owner)?.static_position = Some((x, top));
                }
                InlineItem::Float { .. } | InlineItem::ForcedBreak => {}
            }
        }
        self.flush_run(tree, run.take(), &stack, root, top, height)?;

        // Inline boxes that continue on the next line end at the line's end.
        let end = left + used;
        for (_, flow, start) in stack {
            set_line_width(tree, flow, (end - start).max(0.0));
        }

        self.line_top += height;
        Ok(())
    }

    fn open_flow(
        &mut self,
        tree: &mut BoxTree,
        owner: BoxId,
        parent: LineId,
        x: f32,
        top: f32,
        height: f32,
    ) -> Result<LineId, TreeError> {
        let own_height = {
            let node = tree.get(owner)?;
            node.style
                .line_height
                .unwrap_or(self.strut)
                .min(height)
        };
        if !self.touched.contains(&owner) {
            self.touched.push(owner);
        }
        tree.create_line(
            owner,
            Some(parent),
            Rect::new(x, top + height - own_height, 0.0, own_height),
            LineBoxKind::Flow {
                children: Vec::new(),
            },
        )
    }

    fn flush_run(
        &mut self,
        tree: &mut BoxTree,
        run: Option<TextRun>,
        stack: &[(BoxId, LineId, f32)],
        root: LineId,
        top: f32,
        height: f32,
    ) -> Result<(), TreeError> {
        let Some(run) = run else {
            return Ok(());
        };
        if !self.touched.contains(&run.owner) {
            self.touched.push(run.owner);
        }
        let parent = stack.last().map_or(root, |s| s.1);
        let text_height = run.line_height.min(height);
        tree.create_line(
            run.owner,
            Some(parent),
            Rect::new(run.start, top + height - text_height, run.end - run.start, text_height),
            LineBoxKind::Text { text: run.text },
        )
        .map(drop)
    }
}

/// Words of one text box on one line, waiting to become a text line box.
struct TextRun {
    owner: BoxId,
    text: String,
    start: f32,
    end: f32,
    line_height: f32,
    pending_space: bool,
}

fn set_line_width(tree: &mut BoxTree, line: LineId, width: f32) {
    if let Some(line) = tree.lines.get_mut(line) {
        line.rect.width = width.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_metrics() {
        let metrics = ApproximateFontMetrics;
        assert!((metrics.text_width("abcde", 10.0) - 30.0).abs() < f32::EPSILON);
        assert!((metrics.line_height(10.0) - 12.0).abs() < 1e-4);
    }
}
