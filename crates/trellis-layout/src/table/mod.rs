//! CSS Table Layout.
//!
//! [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html)
//!
//! - `build_table` derives the structure of a table from its children: the
//!   caption list, the head, foot and body sections, the flattened column
//!   list, and per section a [`TableCellMap`] with every cell's row and
//!   column index (honouring `rowspan` and `colspan`).
//! - Column widths come from exactly one [`TableLayoutAlgorithm`], fixed
//!   (§ 17.5.2.1) or automatic (§ 17.5.2.2), chosen from style when the
//!   table box is created.
//! - Row heights, rowspans and cell `vertical-align` are shared by both.
//!
//! Not implemented: `border-collapse: collapse`, `caption-side: bottom`,
//! `visibility: collapse` columns.

mod auto;
mod fixed;

use std::collections::BTreeMap;

use serde::Serialize;
use trellis_common::warning::warn_once;
use trellis_style::{Display, Length, Style, TableLayoutMode, VerticalAlign};

use crate::arena::BoxId;
use crate::box_list::BoxList;
use crate::box_model::{EdgeSizes, Rect};
use crate::error::TreeError;
use crate::layout::{fixed_or_zero, LayoutContext, LayoutInput};
use crate::layout_box::{BoxKind, BoxKindTag, PreferredWidths};
use crate::positioned::border_box_size;
use crate::tree::BoxTree;

pub use auto::AutoTableLayout;
pub use fixed::FixedTableLayout;

/// One entry of a [`TableCellMap`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellSlot {
    /// The cell occupying the slot.
    pub cell: BoxId,
    /// The slot is occupied because the cell spans down from an earlier row.
    pub in_row_span: bool,
    /// The slot is occupied because the cell spans right from an earlier column.
    pub in_col_span: bool,
}

impl CellSlot {
    /// Whether this is the cell's own starting slot.
    #[must_use]
    pub const fn is_origin(&self) -> bool {
        !self.in_row_span && !self.in_col_span
    }
}

/// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
///
/// Per-row multimap from column index to the cells that start at or span
/// into that column. Only occupied columns have entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCellMap {
    rows: Vec<BTreeMap<usize, Vec<CellSlot>>>,
}

impl TableCellMap {
    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Occupied slots of one row, in column order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, &CellSlot)> {
        self.rows
            .get(row)
            .into_iter()
            .flat_map(|slots| slots.iter().flat_map(|(&col, v)| v.iter().map(move |s| (col, s))))
    }

    /// All slots at one grid position.
    #[must_use]
    pub fn slots_at(&self, row: usize, column: usize) -> &[CellSlot] {
        self.rows
            .get(row)
            .and_then(|slots| slots.get(&column))
            .map_or(&[][..], Vec::as_slice)
    }

    /// The cell covering one grid position, if any.
    #[must_use]
    pub fn cell_at(&self, row: usize, column: usize) -> Option<BoxId> {
        self.slots_at(row, column).first().map(|slot| slot.cell)
    }

    /// Whether a grid position is covered by a cell.
    #[must_use]
    pub fn is_occupied(&self, row: usize, column: usize) -> bool {
        !self.slots_at(row, column).is_empty()
    }

    fn insert(&mut self, row: usize, column: usize, slot: CellSlot) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, BTreeMap::new);
        }
        self.rows[row].entry(column).or_default().push(slot);
    }
}

/// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
///
/// A table (`display: table` or `inline-table`).
#[derive(Debug)]
pub struct TableBox {
    pub(crate) children: BoxList,
    pub(crate) captions: Vec<BoxId>,
    pub(crate) head: Option<BoxId>,
    pub(crate) foot: Option<BoxId>,
    pub(crate) bodies: Vec<BoxId>,
    /// Column and childless column group boxes, in order.
    pub(crate) columns: Vec<BoxId>,
    pub(crate) column_count: usize,
    /// Used column widths of the last layout.
    pub(crate) column_widths: Vec<f32>,
    pub(crate) algorithm: TableLayoutAlgorithm,
}

impl TableBox {
    pub(crate) fn new(style: &Style) -> Self {
        Self {
            children: BoxList::default(),
            captions: Vec::new(),
            head: None,
            foot: None,
            bodies: Vec::new(),
            columns: Vec::new(),
            column_count: 0,
            column_widths: Vec::new(),
            algorithm: TableLayoutAlgorithm::for_style(style),
        }
    }

    /// Caption boxes, in document order.
    #[must_use]
    pub fn captions(&self) -> &[BoxId] {
        &self.captions
    }

    /// The header section (`table-header-group`), if any.
    #[must_use]
    pub const fn head(&self) -> Option<BoxId> {
        self.head
    }

    /// The footer section (`table-footer-group`), if any.
    #[must_use]
    pub const fn foot(&self) -> Option<BoxId> {
        self.foot
    }

    /// Body sections, in document order.
    #[must_use]
    pub fn bodies(&self) -> &[BoxId] {
        &self.bodies
    }

    /// Sections in layout order: head, bodies, foot.
    #[must_use]
    pub fn sections(&self) -> Vec<BoxId> {
        self.head
            .into_iter()
            .chain(self.bodies.iter().copied())
            .chain(self.foot)
            .collect()
    }

    /// Column boxes, flattened out of column groups.
    #[must_use]
    pub fn columns(&self) -> &[BoxId] {
        &self.columns
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    /// Used column widths of the last layout.
    #[must_use]
    pub fn column_widths(&self) -> &[f32] {
        &self.column_widths
    }

    /// The column width algorithm of this table.
    #[must_use]
    pub const fn algorithm(&self) -> &TableLayoutAlgorithm {
        &self.algorithm
    }
}

/// A row group (`table-row-group`, `table-header-group`, `table-footer-group`).
#[derive(Debug, Default)]
pub struct TableSectionBox {
    pub(crate) children: BoxList,
    pub(crate) cell_map: TableCellMap,
    pub(crate) row_heights: Vec<f32>,
}

impl TableSectionBox {
    /// The grid of this section.
    #[must_use]
    pub const fn cell_map(&self) -> &TableCellMap {
        &self.cell_map
    }

    /// Used row heights of the last layout.
    #[must_use]
    pub fn row_heights(&self) -> &[f32] {
        &self.row_heights
    }
}

/// A table row.
#[derive(Debug, Default)]
pub struct TableRowBox {
    pub(crate) children: BoxList,
    pub(crate) row_index: usize,
}

impl TableRowBox {
    /// Index of the row within its section.
    #[must_use]
    pub const fn row_index(&self) -> usize {
        self.row_index
    }
}

/// Grid bookkeeping of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCellBox {
    pub(crate) row_span: usize,
    pub(crate) col_span: usize,
    pub(crate) row_index: usize,
    pub(crate) column_index: usize,
}

impl Default for TableCellBox {
    fn default() -> Self {
        Self {
            row_span: 1,
            col_span: 1,
            row_index: 0,
            column_index: 0,
        }
    }
}

impl TableCellBox {
    /// Rows spanned (at least 1).
    #[must_use]
    pub const fn row_span(&self) -> usize {
        self.row_span
    }

    /// Columns spanned (at least 1).
    #[must_use]
    pub const fn col_span(&self) -> usize {
        self.col_span
    }

    /// Index of the cell's row within its section.
    #[must_use]
    pub const fn row_index(&self) -> usize {
        self.row_index
    }

    /// Index of the cell's starting column.
    #[must_use]
    pub const fn column_index(&self) -> usize {
        self.column_index
    }
}

/// A column or column group.
#[derive(Debug)]
pub struct TableColumnBox {
    pub(crate) children: BoxList,
    pub(crate) span: usize,
}

impl Default for TableColumnBox {
    fn default() -> Self {
        Self {
            children: BoxList::default(),
            span: 1,
        }
    }
}

impl TableColumnBox {
    /// Columns covered by this box.
    #[must_use]
    pub const fn span(&self) -> usize {
        self.span
    }
}

/// Per-column width constraints derived by a layout algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPlan {
    /// Minimum column widths.
    pub min: Vec<f32>,
    /// Maximum (preferred) column widths.
    pub max: Vec<f32>,
    /// Columns whose width was declared with a fixed length.
    pub fixed: Vec<bool>,
}

impl ColumnPlan {
    pub(crate) fn new(columns: usize) -> Self {
        Self {
            min: vec![0.0; columns],
            max: vec![0.0; columns],
            fixed: vec![false; columns],
        }
    }

    /// Sum of the minimum widths.
    #[must_use]
    pub fn total_min(&self) -> f32 {
        self.min.iter().sum()
    }

    /// Sum of the maximum widths.
    #[must_use]
    pub fn total_max(&self) -> f32 {
        self.max.iter().sum()
    }
}

/// [§ 17.5.2 Table width algorithms: the 'table-layout' property](https://www.w3.org/TR/CSS2/tables.html#width-layout)
///
/// "The 'table-layout' property controls the algorithm used to lay out the
/// table cells, rows, and columns."
#[derive(Debug, Clone, PartialEq)]
pub enum TableLayoutAlgorithm {
    /// § 17.5.2.1 Fixed table layout.
    Fixed(FixedTableLayout),
    /// § 17.5.2.2 Automatic table layout.
    Auto(AutoTableLayout),
}

impl TableLayoutAlgorithm {
    /// "If the table's width is 'auto', the 'table-layout' property's
    /// computed value of 'fixed' is treated as 'auto'."
    #[must_use]
    pub fn for_style(style: &Style) -> Self {
        if style.table_layout == TableLayoutMode::Fixed && !style.width.is_auto() {
            Self::Fixed(FixedTableLayout)
        } else {
            Self::Auto(AutoTableLayout)
        }
    }

    /// Whether this is the fixed algorithm.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Derive per-column constraints from the table's current structure.
    pub(crate) fn column_plan(
        &self,
        tree: &BoxTree,
        table: BoxId,
        grid_width: f32,
        ctx: &LayoutContext<'_>,
    ) -> Result<ColumnPlan, TreeError> {
        match self {
            Self::Fixed(fixed) => fixed.column_plan(tree, table, grid_width),
            Self::Auto(auto) => auto.column_plan(tree, table, grid_width, ctx),
        }
    }

    /// Assign used column widths for the available grid width.
    pub(crate) fn distribute(&self, plan: &ColumnPlan, grid_width: f32) -> Vec<f32> {
        match self {
            Self::Fixed(fixed) => fixed.distribute(plan, grid_width),
            Self::Auto(auto) => auto.distribute(plan, grid_width),
        }
    }
}

/// Where a cell sits in the table grid.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellPlacement {
    pub(crate) cell: BoxId,
    pub(crate) column: usize,
    pub(crate) col_span: usize,
    /// The cell is in the first row of the first section.
    pub(crate) first_row: bool,
}

/// Split `amount` over columns in proportion to `weights`, in whole pixels.
///
/// The amount is rounded up to a whole number of pixels. Each column gets
/// the floor of its exact share; the pixels left over go one each to the
/// columns with the largest fractional parts, ties going to the lower
/// index. Zero weights everywhere split evenly.
#[must_use]
pub fn distribute_largest_remainder(amount: f32, weights: &[f32]) -> Vec<f32> {
    if weights.is_empty() || amount <= 0.0 {
        return vec![0.0; weights.len()];
    }
    let total_weight: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    let pixels = f64::from(amount.ceil());
    let exact: Vec<f64> = weights
        .iter()
        .map(|&w| {
            if total_weight > 0.0 {
                pixels * f64::from(w.max(0.0) / total_weight)
            } else {
                pixels / weights.len() as f64
            }
        })
        .collect();
    let mut shares: Vec<f64> = exact.iter().map(|e| e.floor()).collect();
    let leftover = pixels - shares.iter().sum::<f64>();

    // `sort_by` is stable: equal remainders keep index order.
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - shares[b]).total_cmp(&(exact[a] - shares[a])));
    let mut remaining = leftover.round();
    for index in order.into_iter().cycle() {
        if remaining < 1.0 {
            break;
        }
        shares[index] += 1.0;
        remaining -= 1.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let shares: Vec<f32> = shares.into_iter().map(|s| s as f32).collect();
    shares
}

/// Width of `span` columns starting at `start`, including the spacing
/// between them.
fn span_width(widths: &[f32], start: usize, span: usize, spacing: f32) -> f32 {
    let end = (start + span).min(widths.len());
    let columns = end.saturating_sub(start);
    let sum: f32 = widths.get(start..end).map_or(0.0, |w| w.iter().sum());
    let gaps = columns.saturating_sub(1) as f32;
    sum + spacing * gaps
}

/// Left edge of every column, relative to the table's content box.
fn column_offsets(widths: &[f32], spacing: f32) -> Vec<f32> {
    let mut offsets = Vec::with_capacity(widths.len());
    let mut x = spacing;
    for &w in widths {
        offsets.push(x);
        x += w + spacing;
    }
    offsets
}

/// Declared border-box width of a cell or column, when it is a length.
pub(crate) fn declared_width(style: &Style, containing_width: f32) -> Option<f32> {
    let bp = fixed_or_zero(style.border.left)
        + fixed_or_zero(style.border.right)
        + fixed_or_zero(style.padding.left)
        + fixed_or_zero(style.padding.right);
    match style.width {
        Length::Fixed(w) => Some(border_box_size(style, w, bp)),
        Length::Percent(_) if containing_width > 0.0 => style
            .width
            .resolve(Some(containing_width))
            .map(|w| border_box_size(style, w, bp)),
        _ => None,
    }
}

impl BoxTree {
    fn table(&self, id: BoxId) -> Result<&TableBox, TreeError> {
        match &self.get(id)?.kind {
            BoxKind::Table(table) => Ok(table),
            _ => Err(TreeError::Corrupt(id, "not a table box")),
        }
    }

    fn table_mut(&mut self, id: BoxId) -> Result<&mut TableBox, TreeError> {
        match &mut self.get_mut(id)?.kind {
            BoxKind::Table(table) => Ok(table),
            _ => Err(TreeError::Corrupt(id, "not a table box")),
        }
    }

    /// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
    ///
    /// Derive the structure of a table in one forward scan of its children:
    /// captions, head and foot sections (the first of each; later ones are
    /// bodies), body sections, and the flattened column list. Then index the
    /// rows and cells of every section.
    pub(crate) fn build_table(&mut self, id: BoxId) -> Result<(), TreeError> {
        let mut captions = Vec::new();
        let mut head = None;
        let mut foot = None;
        let mut bodies = Vec::new();
        let mut columns = Vec::new();
        let mut column_boxes_span = 0;

        for child in self.child_ids(id) {
            let node = self.get(child)?;
            match node.tag() {
                BoxKindTag::TableCaption => captions.push(child),
                BoxKindTag::TableSection => match node.style.display {
                    Display::TableHeaderGroup if head.is_none() => head = Some(child),
                    Display::TableFooterGroup if foot.is_none() => foot = Some(child),
                    _ => bodies.push(child),
                },
                // "column-group children contribute their column children,
                // or themselves if childless"
                BoxKindTag::TableColumnGroup => {
                    let group_columns = self.child_ids(child);
                    if group_columns.is_empty() {
                        column_boxes_span += self.column_span(child)?;
                        columns.push(child);
                    } else {
                        for column in group_columns {
                            column_boxes_span += self.column_span(column)?;
                            columns.push(column);
                        }
                    }
                }
                BoxKindTag::TableColumn => {
                    column_boxes_span += self.column_span(child)?;
                    columns.push(child);
                }
                _ => {}
            }
        }

        let sections: Vec<BoxId> = head
            .into_iter()
            .chain(bodies.iter().copied())
            .chain(foot)
            .collect();
        let mut column_count = column_boxes_span;
        let mut any_rows = false;
        for &section in &sections {
            let (section_columns, rows) = self.build_section(section)?;
            column_count = column_count.max(section_columns);
            any_rows |= rows > 0;
        }
        if !any_rows {
            let _ = warn_once("Layout", "table without rows");
        }

        let table = self.table_mut(id)?;
        table.captions = captions;
        table.head = head;
        table.foot = foot;
        table.bodies = bodies;
        table.columns = columns;
        table.column_count = column_count;
        Ok(())
    }

    fn column_span(&self, id: BoxId) -> Result<usize, TreeError> {
        Ok(match &self.get(id)?.kind {
            BoxKind::TableColumn(column) | BoxKind::TableColumnGroup(column) => column.span.max(1),
            _ => 0,
        })
    }

    /// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
    ///
    /// Assign row indices and cell column indices in one section. "Cells
    /// may span several rows or columns." A cell's column is the first
    /// column at or after the end of the previous cell that no earlier
    /// cell's rowspan occupies. Returns the number of columns used and the
    /// number of rows.
    fn build_section(&mut self, section: BoxId) -> Result<(usize, usize), TreeError> {
        let rows: Vec<BoxId> = self
            .child_ids(section)
            .into_iter()
            .filter(|&row| self.boxes.get(row).is_some_and(|b| b.tag() == BoxKindTag::TableRow))
            .collect();
        let row_count = rows.len();
        let mut map = TableCellMap::default();
        // For each column, the first row index no longer covered by a rowspan.
        let mut busy_until: Vec<usize> = Vec::new();
        let mut column_count = 0;

        for (row_index, &row) in rows.iter().enumerate() {
            if let BoxKind::TableRow(r) = &mut self.get_mut(row)?.kind {
                r.row_index = row_index;
            }
            let mut cursor = 0;
            for cell in self.child_ids(row) {
                let (row_span, col_span) = match &self.get(cell)?.kind {
                    BoxKind::TableCell(_, c) => (c.row_span.max(1), c.col_span.max(1)),
                    _ => continue,
                };
                while busy_until.get(cursor).is_some_and(|&until| until > row_index) {
                    cursor += 1;
                }
                let column = cursor;
                let row_span = row_span.min(row_count - row_index);
                if busy_until.len() < column + col_span {
                    busy_until.resize(column + col_span, 0);
                }
                for c in column..column + col_span {
                    busy_until[c] = busy_until[c].max(row_index + row_span);
                }
                for r in row_index..row_index + row_span {
                    for c in column..column + col_span {
                        map.insert(
                            r,
                            c,
                            CellSlot {
                                cell,
                                in_row_span: r > row_index,
                                in_col_span: c > column,
                            },
                        );
                    }
                }
                if let BoxKind::TableCell(_, c) = &mut self.get_mut(cell)?.kind {
                    c.row_index = row_index;
                    c.column_index = column;
                }
                cursor = column + col_span;
                column_count = column_count.max(cursor);
            }
        }

        if let BoxKind::TableSection(s) = &mut self.get_mut(section)?.kind {
            s.cell_map = map;
        }
        Ok((column_count, row_count))
    }

    /// Every cell of a table with its grid position, section by section.
    pub(crate) fn table_cells(&self, table: BoxId) -> Result<Vec<CellPlacement>, TreeError> {
        let mut out = Vec::new();
        let mut first_section = true;
        for section in self.table(table)?.sections() {
            let mut has_rows = false;
            for row in self.children(section) {
                for cell in self.children(row) {
                    if let BoxKind::TableCell(_, c) = &self.get(cell)?.kind {
                        has_rows = true;
                        out.push(CellPlacement {
                            cell,
                            column: c.column_index,
                            col_span: c.col_span.max(1),
                            first_row: first_section && c.row_index == 0,
                        });
                    }
                }
            }
            first_section &= !has_rows;
        }
        Ok(out)
    }

    /// [§ 17.5.2 Table width algorithms](https://www.w3.org/TR/CSS2/tables.html#width-layout)
    ///
    /// Preferred widths of a table: its columns' widths plus spacing, and
    /// at least as wide as its widest caption.
    pub(crate) fn table_preferred_widths(
        &self,
        id: BoxId,
        ctx: &LayoutContext<'_>,
    ) -> Result<PreferredWidths, TreeError> {
        let style = self.style(id)?;
        let table = self.table(id)?;
        let bp = fixed_or_zero(style.border.left)
            + fixed_or_zero(style.border.right)
            + fixed_or_zero(style.padding.left)
            + fixed_or_zero(style.padding.right);
        let spacing = style.border_spacing.0;
        let plan = table.algorithm.column_plan(self, id, 0.0, ctx)?;
        let columns = table.column_count;
        let gaps = if columns == 0 { 0.0 } else { spacing * (columns + 1) as f32 };

        let mut min = plan.total_min() + gaps;
        let mut max = plan.total_max().max(plan.total_min()) + gaps;
        for &caption in &table.captions {
            let caption = self.preferred_margin_widths(caption, ctx)?;
            min = min.max(caption.min);
            max = max.max(caption.min);
        }
        min += bp;
        max += bp;

        // "the used width is the greater of the value of the 'width'
        // property for the table element and the sum of the column widths
        // (plus cell spacing or borders)"
        if let Length::Fixed(width) = style.width {
            let width = border_box_size(&style, width, bp);
            let width = if table.algorithm.is_fixed() { width } else { width.max(min) };
            return Ok(PreferredWidths::fixed(width));
        }
        Ok(PreferredWidths { min, max })
    }

    /// Main entry point for table layout.
    ///
    /// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
    pub(crate) fn layout_table(
        &mut self,
        id: BoxId,
        input: LayoutInput,
        ctx: &LayoutContext<'_>,
    ) -> Result<(), TreeError> {
        let style = self.style(id)?;
        let cw = input.containing_width.max(0.0);

        // STEP 1: The table's own width.
        //
        // [§ 17.5.2.2](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
        //
        // "If the 'table' or 'inline-table' element has 'width: auto', the
        // used width is the greater of the table's containing block width,
        // CAPMIN, and MIN. However, if either CAPMIN or the maximum width
        // required by the columns plus cell spacing or borders (MAX) is less
        // than that of the containing block, use max(MAX, CAPMIN)."
        let preferred = self.preferred_widths(id, ctx)?;
        if input.override_width.is_some() {
            self.compute_width(id, input, ctx)?;
        } else if style.width.resolve(Some(cw)).is_none() {
            let margins = style.margin.left.calc_min(cw) + style.margin.right.calc_min(cw);
            let available = (cw - margins).max(0.0);
            let width = preferred.min.max(available).min(preferred.max);
            self.compute_width(id, input.with_width(width), ctx)?;
        } else {
            self.compute_width(id, input, ctx)?;
            if self.get(id)?.frame.width < preferred.min && !self.table(id)?.algorithm.is_fixed() {
                self.compute_width(id, input.with_width(preferred.min), ctx)?;
            }
        }

        let (content_left, content_top, content_width) = {
            let frame = &self.get(id)?.frame;
            (
                frame.border.left + frame.padding.left,
                frame.border.top + frame.padding.top,
                frame.content_width(),
            )
        };
        let (h_spacing, v_spacing) = style.border_spacing;

        // STEP 2: Captions, above the grid.
        //
        // [§ 17.4 Tables in the visual formatting model](https://www.w3.org/TR/CSS2/tables.html#model)
        //
        // "The caption boxes are block-level boxes that retain their own
        // content, padding, margin, and border areas."
        let mut cursor = content_top;
        let captions = self.table(id)?.captions.clone();
        for caption in captions {
            self.layout_box(caption, LayoutInput::new(content_width, None), ctx)?;
            let node = self.get_mut(caption)?;
            node.frame.x = content_left + node.frame.margin.left;
            node.frame.y = cursor + node.frame.margin.top;
            cursor += node.frame.margin_box().height;
        }

        // STEP 3: Column widths.
        let (sections, column_count, algorithm) = {
            let table = self.table(id)?;
            (table.sections(), table.column_count, table.algorithm.clone())
        };
        let grid_width = (content_width - h_spacing * (column_count + 1) as f32).max(0.0);
        let plan = algorithm.column_plan(self, id, grid_width, ctx)?;
        let widths = algorithm.distribute(&plan, grid_width);
        let offsets = column_offsets(&widths, h_spacing);
        self.table_mut(id)?.column_widths.clone_from(&widths);

        // STEP 4: Sections, rows and cells.
        let grid_top = cursor;
        let mut any_rows = false;
        cursor += v_spacing;
        for section in sections {
            let height = self.layout_section(
                section,
                content_width,
                &widths,
                &offsets,
                (h_spacing, v_spacing),
                ctx,
            )?;
            let rows = match &self.get(section)?.kind {
                BoxKind::TableSection(s) => s.row_heights.len(),
                _ => 0,
            };
            let node = self.get_mut(section)?;
            node.frame.x = content_left;
            node.frame.y = cursor;
            node.frame.width = content_width;
            node.frame.height = height;
            if rows > 0 {
                any_rows = true;
                cursor += height + v_spacing;
            }
        }
        if !any_rows {
            cursor = grid_top;
        }
        let grid_height = cursor - grid_top;
        self.place_columns(id, &widths, &offsets, content_left, grid_top, grid_height, h_spacing)?;

        // STEP 5: Height.
        //
        // [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
        //
        // "The height of a table is given by the 'height' property for the
        // 'table' or 'inline-table' element. A value of 'auto' means that the
        // height is the sum of the row heights plus any cell spacing or
        // borders. Any other value is treated as a minimum height."
        let content_height = cursor - content_top;
        self.compute_height(id, content_height, input)?;
        let node = self.get_mut(id)?;
        let minimum = content_height + node.frame.border_padding_vertical();
        if node.frame.height < minimum {
            node.frame.height = minimum;
        }
        Ok(())
    }

    /// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
    ///
    /// Lay out the cells of one section, resolve its row heights and place
    /// its rows and cells. Returns the section height.
    fn layout_section(
        &mut self,
        section: BoxId,
        section_width: f32,
        widths: &[f32],
        offsets: &[f32],
        (h_spacing, v_spacing): (f32, f32),
        ctx: &LayoutContext<'_>,
    ) -> Result<f32, TreeError> {
        let rows: Vec<BoxId> = self
            .child_ids(section)
            .into_iter()
            .filter(|&row| self.boxes.get(row).is_some_and(|b| b.tag() == BoxKindTag::TableRow))
            .collect();
        let mut row_heights = vec![0.0_f32; rows.len()];
        // (cell, row, column, row span, width, natural height)
        let mut cells = Vec::new();

        // STEP 1: Lay out every cell at its column width.
        //
        // "the height of a 'table-row' element's box is calculated once the
        // user agent has all the cells in the row available: it is the
        // maximum of the row's computed 'height', the computed 'height' of
        // each cell in the row, and the minimum height (MIN) required by the
        // cells."
        for (r, &row) in rows.iter().enumerate() {
            if let Some(height) = self.get(row)?.style.height.resolve(None) {
                row_heights[r] = row_heights[r].max(height);
            }
            for cell in self.child_ids(row) {
                let placement = match &self.get(cell)?.kind {
                    BoxKind::TableCell(_, c) => *c,
                    _ => continue,
                };
                let column = placement.column_index.min(widths.len());
                let col_span = placement.col_span.max(1);
                let width = span_width(widths, column, col_span, h_spacing);
                self.layout_box(cell, LayoutInput::new(width, None).with_width(width), ctx)?;
                let height = self.get(cell)?.frame.height;
                let row_span = placement.row_span.clamp(1, rows.len() - r);
                if row_span == 1 {
                    row_heights[r] = row_heights[r].max(height);
                }
                cells.push((cell, r, column, row_span, width, height));
            }
        }

        // STEP 2: Rowspans. A spanning cell taller than the rows it spans
        // grows the last of them.
        for &(_, r, _, row_span, _, height) in &cells {
            if row_span > 1 {
                let have = span_width(&row_heights, r, row_span, v_spacing);
                if height > have {
                    row_heights[r + row_span - 1] += height - have;
                }
            }
        }

        // STEP 3: Rows, relative to the section.
        let mut y = 0.0;
        let mut row_tops = Vec::with_capacity(rows.len());
        for (r, &row) in rows.iter().enumerate() {
            row_tops.push(y);
            let node = self.get_mut(row)?;
            node.frame.x = 0.0;
            node.frame.y = y;
            node.frame.width = section_width;
            node.frame.height = row_heights[r];
            y += row_heights[r] + v_spacing;
        }
        let section_height = if rows.is_empty() { 0.0 } else { y - v_spacing };

        // STEP 4: Cells, stretched to their rows.
        //
        // [§ 17.5.3](https://www.w3.org/TR/CSS2/tables.html#height-layout)
        //
        // "The 'vertical-align' property of each table cell determines its
        // alignment within the row."
        for (cell, r, column, row_span, width, natural) in cells {
            let height = span_width(&row_heights, r, row_span, v_spacing);
            if (height - natural).abs() > f32::EPSILON {
                let input = LayoutInput::new(width, None).with_width(width).with_height(height);
                self.layout_box(cell, input, ctx)?;
            }
            let dy = match self.get(cell)?.style.vertical_align {
                VerticalAlign::Middle => (height - natural) / 2.0,
                VerticalAlign::Bottom => height - natural,
                // Baseline alignment is approximated by top alignment.
                VerticalAlign::Top | VerticalAlign::Baseline => 0.0,
            };
            if dy > 0.0 {
                self.shift_cell_content(cell, dy);
            }
            let node = self.get_mut(cell)?;
            node.frame.x = offsets.get(column).copied().unwrap_or(h_spacing);
            node.frame.y = 0.0;
        }

        if let BoxKind::TableSection(s) = &mut self.get_mut(section)?.kind {
            s.row_heights = row_heights;
        }
        Ok(section_height)
    }

    /// Move the in-flow content of a cell down.
    fn shift_cell_content(&mut self, cell: BoxId, dy: f32) {
        let descendants: Vec<BoxId> = self
            .subtree(cell)
            .into_iter()
            .skip(1)
            .filter(|&d| {
                self.offset_parent(d) == Some(cell)
                    && self.boxes.get(d).is_some_and(|b| !b.is_out_of_flow_positioned())
            })
            .collect();
        for d in descendants {
            if let Some(node) = self.boxes.get_mut(d) {
                node.frame.y += dy;
            }
        }
        let lines = self
            .boxes
            .get(cell)
            .map(|b| b.kind.lines().to_vec())
            .unwrap_or_default();
        for line in lines {
            self.translate_line(line, 0.0, dy);
        }
        if let Some(flow) = self.boxes.get_mut(cell).and_then(|b| b.kind.block_flow_mut()) {
            flow.floats.translate(0.0, dy);
        }
    }

    /// Give column and column group boxes the geometry of the grid columns
    /// they cover.
    #[allow(clippy::too_many_arguments)]
    fn place_columns(
        &mut self,
        table: BoxId,
        widths: &[f32],
        offsets: &[f32],
        content_left: f32,
        grid_top: f32,
        grid_height: f32,
        spacing: f32,
    ) -> Result<(), TreeError> {
        let columns = self.table(table)?.columns.clone();
        let mut index = 0;
        let mut groups: Vec<(BoxId, Rect)> = Vec::new();
        for column in columns {
            let span = self.column_span(column)?;
            let x = content_left + offsets.get(index).copied().unwrap_or(spacing);
            let rect = Rect::new(x, grid_top, span_width(widths, index, span, spacing), grid_height);
            index += span;

            let parent = self.get(column)?.parent;
            let in_group = match parent {
                Some(parent) if parent != table => Some(parent),
                _ => None,
            };
            let node = self.get_mut(column)?;
            node.frame.x = rect.x;
            node.frame.y = rect.y;
            node.frame.width = rect.width;
            node.frame.height = rect.height;
            node.frame.border = EdgeSizes::default();
            if let Some(group) = in_group {
                match groups.iter_mut().find(|(g, _)| *g == group) {
                    Some((_, union)) => *union = union.union(&rect),
                    None => groups.push((group, rect)),
                }
            }
        }
        for (group, rect) in groups {
            for column in self.child_ids(group) {
                let node = self.get_mut(column)?;
                node.frame.x -= rect.x;
                node.frame.y -= rect.y;
            }
            let node = self.get_mut(group)?;
            node.frame.x = rect.x;
            node.frame.y = rect.y;
            node.frame.width = rect.width;
            node.frame.height = rect.height;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_remainder_gives_leftover_to_lower_index() {
        assert_eq!(distribute_largest_remainder(10.0, &[1.0, 1.0, 1.0]), vec![4.0, 3.0, 3.0]);
    }

    #[test]
    fn test_largest_remainder_follows_weights() {
        assert_eq!(distribute_largest_remainder(10.0, &[3.0, 1.0]), vec![8.0, 2.0]);
        assert_eq!(distribute_largest_remainder(7.0, &[0.0, 0.0]), vec![4.0, 3.0]);
    }

    #[test]
    fn test_span_width_includes_inner_spacing() {
        let widths = [10.0, 20.0, 30.0];
        assert!((span_width(&widths, 0, 3, 2.0) - 64.0).abs() < f32::EPSILON);
        assert!((span_width(&widths, 2, 5, 2.0) - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_column_offsets_start_after_spacing() {
        assert_eq!(column_offsets(&[10.0, 20.0], 2.0), vec![2.0, 14.0]);
    }
}
