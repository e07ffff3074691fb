//! Integration tests for table structure and table layout.

use std::rc::Rc;

use trellis_layout::{
    ApproximateFontMetrics, BoxId, BoxKind, BoxKindTag, BoxTree, LayoutContext, Node, Size,
    TableBox, TableCellBox, TableSectionBox,
};
use trellis_style::{Display, Length, Style, TableLayoutMode};

const EPSILON: f32 = 0.01;

fn assert_widths(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < EPSILON, "{actual:?} vs {expected:?}");
    }
}

fn new_tree() -> (BoxTree, BoxId) {
    let mut tree = BoxTree::new();
    let html = Node::new("html");
    let root = tree
        .create_box(Some(&html), Rc::new(Style::with_display(Display::Block)))
        .expect("root box");
    (tree, root)
}

fn add(tree: &mut BoxTree, parent: BoxId, style: Style) -> BoxId {
    let node = Node::new("td");
    let id = tree.create_box(Some(&node), Rc::new(style)).expect("box");
    tree.add_box(parent, id).expect("add box");
    id
}

fn add_display(tree: &mut BoxTree, parent: BoxId, display: Display) -> BoxId {
    add(tree, parent, Style::with_display(display))
}

fn table_style(layout: TableLayoutMode, width: f32) -> Style {
    let mut style = Style::with_display(Display::Table);
    style.table_layout = layout;
    style.width = Length::Fixed(width);
    style.border_spacing = (0.0, 0.0);
    style
}

fn sized_cell(height: f32) -> Style {
    let mut style = Style::with_display(Display::TableCell);
    style.height = Length::Fixed(height);
    style
}

fn table_of(tree: &BoxTree, id: BoxId) -> &TableBox {
    match tree.get(id).expect("table").kind() {
        BoxKind::Table(table) => table,
        other => panic!("not a table: {other:?}"),
    }
}

fn cell_of(tree: &BoxTree, id: BoxId) -> TableCellBox {
    match tree.get(id).expect("cell").kind() {
        BoxKind::TableCell(_, cell) => *cell,
        other => panic!("not a cell: {other:?}"),
    }
}

fn section_of(tree: &BoxTree, id: BoxId) -> &TableSectionBox {
    match tree.get(id).expect("section").kind() {
        BoxKind::TableSection(section) => section,
        other => panic!("not a section: {other:?}"),
    }
}

fn layout(tree: &mut BoxTree) {
    let metrics = ApproximateFontMetrics;
    let ctx = LayoutContext::new(Size::new(800.0, 600.0), &metrics);
    tree.layout(&ctx).expect("layout");
}

// ---------------------------------------------------------------------------
// Anonymous table objects
//
// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
// ---------------------------------------------------------------------------

#[test]
fn test_loose_cells_share_one_anonymous_table() {
    let (mut tree, root) = new_tree();
    let first = add_display(&mut tree, root, Display::TableCell);
    let second = add_display(&mut tree, root, Display::TableCell);

    let tables = tree.child_ids(root);
    assert_eq!(tables.len(), 1);
    let table = tree.get(tables[0]).expect("table");
    assert_eq!(table.tag(), BoxKindTag::Table);
    assert!(table.is_anonymous());

    let sections = tree.child_ids(tables[0]);
    assert_eq!(sections.len(), 1);
    assert_eq!(tree.get(sections[0]).expect("section").tag(), BoxKindTag::TableSection);
    let rows = tree.child_ids(sections[0]);
    assert_eq!(rows.len(), 1);
    assert_eq!(tree.child_ids(rows[0]), vec![first, second]);
    tree.verify().expect("valid tree");
}

#[test]
fn test_loose_row_in_table_gets_a_section() {
    let (mut tree, root) = new_tree();
    let table = add_display(&mut tree, root, Display::Table);
    let row = add_display(&mut tree, table, Display::TableRow);

    let sections = tree.child_ids(table);
    assert_eq!(sections.len(), 1);
    assert!(tree.get(sections[0]).expect("section").is_anonymous());
    assert_eq!(tree.child_ids(sections[0]), vec![row]);
    tree.verify().expect("valid tree");
}

#[test]
fn test_block_in_row_is_wrapped_in_one_cell() {
    let (mut tree, root) = new_tree();
    let table = add_display(&mut tree, root, Display::Table);
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let row = add_display(&mut tree, section, Display::TableRow);
    let a = add_display(&mut tree, row, Display::Block);
    let b = add_display(&mut tree, row, Display::Block);

    let cells = tree.child_ids(row);
    assert_eq!(cells.len(), 1);
    assert_eq!(tree.get(cells[0]).expect("cell").tag(), BoxKindTag::TableCell);
    assert_eq!(tree.child_ids(cells[0]), vec![a, b]);
    tree.verify().expect("valid tree");
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

#[test]
fn test_sections_are_ordered_head_bodies_foot() {
    let (mut tree, root) = new_tree();
    let table = add(&mut tree, root, table_style(TableLayoutMode::Auto, 100.0));
    let foot = add_display(&mut tree, table, Display::TableFooterGroup);
    let body = add_display(&mut tree, table, Display::TableRowGroup);
    let head = add_display(&mut tree, table, Display::TableHeaderGroup);
    let second_head = add_display(&mut tree, table, Display::TableHeaderGroup);
    for section in [foot, body, head, second_head] {
        let row = add_display(&mut tree, section, Display::TableRow);
        let _ = add(&mut tree, row, sized_cell(10.0));
    }
    tree.build().expect("build");

    let info = table_of(&tree, table);
    assert_eq!(info.head(), Some(head));
    assert_eq!(info.foot(), Some(foot));
    // A second header group is laid out as a body.
    assert_eq!(info.sections(), vec![head, body, second_head, foot]);

    layout(&mut tree);
    let y = |id: BoxId| tree.get(id).expect("section").frame().y;
    assert!(y(head) < y(body));
    assert!(y(second_head) < y(foot));
}

/// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
///
/// "Cells may span several rows or columns."
#[test]
fn test_rowspan_pushes_later_cells_right() {
    let (mut tree, root) = new_tree();
    let table = add_display(&mut tree, root, Display::Table);
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let first_row = add_display(&mut tree, section, Display::TableRow);
    let second_row = add_display(&mut tree, section, Display::TableRow);
    let tall = add_display(&mut tree, first_row, Display::TableCell);
    let beside = add_display(&mut tree, first_row, Display::TableCell);
    let below = add_display(&mut tree, second_row, Display::TableCell);
    tree.set_cell_span(tall, 2, 1).expect("span");
    tree.build().expect("build");

    assert_eq!(cell_of(&tree, beside).column_index(), 1);
    let below = cell_of(&tree, below);
    assert_eq!(below.row_index(), 1);
    assert_eq!(below.column_index(), 1);

    let map = section_of(&tree, section).cell_map();
    assert_eq!(map.row_count(), 2);
    assert_eq!(map.cell_at(1, 0), Some(tall));
    assert!(map.slots_at(1, 0)[0].in_row_span);
    assert_eq!(table_of(&tree, table).column_count(), 2);
}

#[test]
fn test_rowspan_is_clipped_to_the_section() {
    let (mut tree, root) = new_tree();
    let table = add_display(&mut tree, root, Display::Table);
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let row = add_display(&mut tree, section, Display::TableRow);
    let cell = add_display(&mut tree, row, Display::TableCell);
    tree.set_cell_span(cell, 5, 1).expect("span");
    tree.build().expect("build");

    assert_eq!(section_of(&tree, section).cell_map().row_count(), 1);
}

// ---------------------------------------------------------------------------
// Column widths
//
// [§ 17.5.2 Table width algorithms](https://www.w3.org/TR/CSS2/tables.html#width-layout)
// ---------------------------------------------------------------------------

/// Two rows; only the second has content. Fixed layout looks at the first
/// row alone, automatic layout at every cell.
fn two_row_table(mode: TableLayoutMode) -> (BoxTree, BoxId) {
    let (mut tree, root) = new_tree();
    let table = add(&mut tree, root, table_style(mode, 300.0));
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let first = add_display(&mut tree, section, Display::TableRow);
    let _ = add_display(&mut tree, first, Display::TableCell);
    let _ = add_display(&mut tree, first, Display::TableCell);
    let second = add_display(&mut tree, section, Display::TableRow);
    let wide = add_display(&mut tree, second, Display::TableCell);
    let _ = add_display(&mut tree, second, Display::TableCell);
    // 30 glyphs of 9.6px: one unbreakable 288px word.
    let word = tree
        .create_text(None, Rc::new(Style::default()), "a".repeat(30))
        .expect("text");
    tree.add_box(wide, word).expect("add text");
    layout(&mut tree);
    (tree, table)
}

#[test]
fn test_fixed_layout_ignores_later_rows() {
    let (tree, table) = two_row_table(TableLayoutMode::Fixed);
    assert!(table_of(&tree, table).algorithm().is_fixed());
    assert_widths(table_of(&tree, table).column_widths(), &[150.0, 150.0]);
}

#[test]
fn test_auto_layout_sizes_columns_by_content() {
    let (tree, table) = two_row_table(TableLayoutMode::Auto);
    assert!(!table_of(&tree, table).algorithm().is_fixed());
    assert_widths(table_of(&tree, table).column_widths(), &[300.0, 0.0]);
    assert!((tree.get(table).expect("table").frame().width - 300.0).abs() < EPSILON);
}

#[test]
fn test_fixed_layout_uses_column_widths() {
    let (mut tree, root) = new_tree();
    let table = add(&mut tree, root, table_style(TableLayoutMode::Fixed, 300.0));
    let group = add_display(&mut tree, table, Display::TableColumnGroup);
    for width in [100.0, 50.0] {
        let mut column = Style::with_display(Display::TableColumn);
        column.width = Length::Fixed(width);
        let _ = add(&mut tree, group, column);
    }
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let row = add_display(&mut tree, section, Display::TableRow);
    let _ = add_display(&mut tree, row, Display::TableCell);
    let _ = add_display(&mut tree, row, Display::TableCell);
    layout(&mut tree);

    assert_eq!(table_of(&tree, table).columns().len(), 2);
    // The 150px surplus is spread in proportion to the declared widths.
    assert_widths(table_of(&tree, table).column_widths(), &[200.0, 100.0]);
}

/// One row of two cells with declared widths, then one cell spanning both.
/// The table is as wide as the resulting columns, so the distribution step
/// hands every column exactly its maximum.
fn spanning_table(widths: [f32; 2], spanning: f32, table_width: f32) -> (BoxTree, BoxId, BoxId) {
    let (mut tree, root) = new_tree();
    let table = add(&mut tree, root, table_style(TableLayoutMode::Auto, table_width));
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let first = add_display(&mut tree, section, Display::TableRow);
    for width in widths {
        let mut cell = Style::with_display(Display::TableCell);
        cell.width = Length::Fixed(width);
        let _ = add(&mut tree, first, cell);
    }
    let second = add_display(&mut tree, section, Display::TableRow);
    let mut wide = Style::with_display(Display::TableCell);
    wide.width = Length::Fixed(spanning);
    let wide = add(&mut tree, second, wide);
    tree.set_cell_span(wide, 1, 2).expect("span");
    layout(&mut tree);
    (tree, table, wide)
}

/// [§ 17.5.2.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
///
/// "For each cell that spans more than one column, increase the minimum
/// widths of the columns it spans so that together, they are at least as
/// wide as the cell."
#[test]
fn test_spanning_cell_widens_columns_in_proportion() {
    // 60.5px missing, rounded up to 61 and split 3:1 as 45.75 / 15.25.
    // The leftover pixel goes to the larger fraction.
    let (tree, table, wide) = spanning_table([30.0, 10.0], 100.5, 101.0);

    assert_widths(table_of(&tree, table).column_widths(), &[76.0, 25.0]);
    assert!((tree.get(wide).expect("wide").frame().width - 101.0).abs() < EPSILON);
    assert!((tree.get(table).expect("table").frame().width - 101.0).abs() < EPSILON);
}

#[test]
fn test_spanning_cell_leftover_pixel_goes_to_first_column() {
    // 10.5px missing over equal columns: 11 pixels, 5.5 each, tie.
    let (tree, table, _) = spanning_table([10.0, 10.0], 30.5, 31.0);

    assert_widths(table_of(&tree, table).column_widths(), &[16.0, 15.0]);
}

#[test]
fn test_spanning_cell_that_fits_leaves_columns_alone() {
    let (tree, table, wide) = spanning_table([30.0, 10.0], 25.0, 40.0);

    assert_widths(table_of(&tree, table).column_widths(), &[30.0, 10.0]);
    let cell = cell_of(&tree, wide);
    assert_eq!((cell.column_index(), cell.col_span()), (0, 2));
}

// ---------------------------------------------------------------------------
// Row heights
//
// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
// ---------------------------------------------------------------------------

#[test]
fn test_spanning_cell_grows_last_row() {
    let (mut tree, root) = new_tree();
    let table = add(&mut tree, root, table_style(TableLayoutMode::Auto, 200.0));
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let first = add_display(&mut tree, section, Display::TableRow);
    let second = add_display(&mut tree, section, Display::TableRow);
    let tall = add(&mut tree, first, sized_cell(100.0));
    let _ = add(&mut tree, first, sized_cell(20.0));
    let _ = add(&mut tree, second, sized_cell(30.0));
    tree.set_cell_span(tall, 2, 1).expect("span");
    layout(&mut tree);

    assert_widths(section_of(&tree, section).row_heights(), &[20.0, 80.0]);
    assert!((tree.get(table).expect("table").frame().height - 100.0).abs() < EPSILON);
    assert!((tree.get(tall).expect("tall").frame().height - 100.0).abs() < EPSILON);
}

#[test]
fn test_cells_are_placed_at_column_offsets() {
    let (mut tree, root) = new_tree();
    let mut style = table_style(TableLayoutMode::Fixed, 206.0);
    style.border_spacing = (2.0, 2.0);
    let table = add(&mut tree, root, style);
    let section = add_display(&mut tree, table, Display::TableRowGroup);
    let row = add_display(&mut tree, section, Display::TableRow);
    let left = add(&mut tree, row, sized_cell(10.0));
    let right = add(&mut tree, row, sized_cell(10.0));
    layout(&mut tree);

    assert_widths(table_of(&tree, table).column_widths(), &[100.0, 100.0]);
    let left = *tree.get(left).expect("left").frame();
    let right = *tree.get(right).expect("right").frame();
    assert!((left.x - 2.0).abs() < EPSILON);
    assert!((right.x - 104.0).abs() < EPSILON);
    assert!((right.width - 100.0).abs() < EPSILON);
}
