//! Integration tests for block, inline, flex and positioned layout.

use std::rc::Rc;

use trellis_layout::{
    ApproximateFontMetrics, BoxId, BoxKindTag, BoxTree, LayoutContext, LineBoxKindTag, Node, Size,
};
use trellis_style::{Display, Float, Length, Position, Style};

const EPSILON: f32 = 0.01;

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// Helper: a tree with an `html` root box of the given style.
fn tree_with_root(root_style: Style) -> (BoxTree, BoxId) {
    let mut tree = BoxTree::new();
    let html = Node::new("html");
    let root = tree
        .create_box(Some(&html), Rc::new(root_style))
        .expect("root box");
    (tree, root)
}

fn element(tree: &mut BoxTree, parent: BoxId, style: Style) -> BoxId {
    let node = Node::new("div");
    let id = tree.create_box(Some(&node), Rc::new(style)).expect("box");
    tree.add_box(parent, id).expect("add box");
    id
}

fn text(tree: &mut BoxTree, parent: BoxId, content: &str) -> BoxId {
    let id = tree
        .create_text(None, Rc::new(Style::default()), content)
        .expect("text");
    tree.add_box(parent, id).expect("add text");
    id
}

fn sized_block(width: Option<f32>, height: Option<f32>) -> Style {
    let mut style = Style::with_display(Display::Block);
    if let Some(width) = width {
        style.width = Length::Fixed(width);
    }
    if let Some(height) = height {
        style.height = Length::Fixed(height);
    }
    style
}

fn layout(tree: &mut BoxTree, width: f32, height: f32) {
    let metrics = ApproximateFontMetrics;
    let ctx = LayoutContext::new(Size::new(width, height), &metrics);
    tree.layout(&ctx).expect("layout");
}

// ---------------------------------------------------------------------------
// Block flow
// ---------------------------------------------------------------------------

#[test]
fn test_auto_width_block_fills_containing_block() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut style = sized_block(None, Some(20.0));
    style.margin.left = Length::Fixed(10.0);
    style.padding.right = Length::Fixed(5.0);
    let child = element(&mut tree, root, style);
    layout(&mut tree, 400.0, 300.0);

    let frame = tree.get(child).expect("child").frame();
    assert_close(frame.x, 10.0);
    assert_close(frame.width, 390.0);
    assert_close(tree.get(root).expect("root").frame().width, 400.0);
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths."
#[test]
fn test_sibling_margins_collapse_to_the_larger() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut first = sized_block(None, Some(10.0));
    first.margin.bottom = Length::Fixed(6.0);
    let mut second = sized_block(None, Some(10.0));
    second.margin.top = Length::Fixed(4.0);
    let a = element(&mut tree, root, first);
    let b = element(&mut tree, root, second);
    layout(&mut tree, 400.0, 300.0);

    let a = *tree.get(a).expect("a").frame();
    let b = *tree.get(b).expect("b").frame();
    assert_close(b.y - (a.y + a.height), 6.0);
}

#[test]
fn test_negative_margin_collapses_with_positive() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut first = sized_block(None, Some(10.0));
    first.margin.bottom = Length::Fixed(20.0);
    let mut second = sized_block(None, Some(10.0));
    second.margin.top = Length::Fixed(-5.0);
    let a = element(&mut tree, root, first);
    let b = element(&mut tree, root, second);
    layout(&mut tree, 400.0, 300.0);

    let a = *tree.get(a).expect("a").frame();
    let b = *tree.get(b).expect("b").frame();
    assert_close(b.y - (a.y + a.height), 15.0);
}

#[test]
fn test_auto_height_sums_children() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let wrapper = element(&mut tree, root, sized_block(None, None));
    let _ = element(&mut tree, wrapper, sized_block(None, Some(30.0)));
    let _ = element(&mut tree, wrapper, sized_block(None, Some(12.0)));
    layout(&mut tree, 400.0, 300.0);

    assert_close(tree.get(wrapper).expect("wrapper").frame().height, 42.0);
}

// ---------------------------------------------------------------------------
// Floats
//
// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
// ---------------------------------------------------------------------------

#[test]
fn test_float_narrows_line_boxes() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut float_style = sized_block(Some(200.0), Some(50.0));
    float_style.float = Float::Left;
    let float = element(&mut tree, root, float_style);
    let _ = text(&mut tree, root, "hello");
    layout(&mut tree, 300.0, 300.0);

    let root_box = tree.get(root).expect("root");
    let flow = root_box.kind().block_flow().expect("block flow");
    assert!(flow.floats().contains_float(float));
    let (left, available) = flow.floats().available_range(0.0, 10.0, 0.0, 300.0);
    assert_close(left, 200.0);
    assert_close(available, 100.0);

    let first_line = root_box.lines()[0];
    let line = tree.line(first_line).expect("line");
    assert_eq!(line.tag(), LineBoxKindTag::Root);
    assert_close(line.rect().x, 200.0);
    assert_close(line.rect().width, 100.0);
}

#[test]
fn test_right_float_sits_at_the_right_edge() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut float_style = sized_block(Some(80.0), Some(20.0));
    float_style.float = Float::Right;
    let float = element(&mut tree, root, float_style);
    layout(&mut tree, 300.0, 300.0);

    let frame = tree.get(float).expect("float").frame();
    assert_close(frame.x, 220.0);
    assert_close(frame.y, 0.0);
    // The root is a block formatting context root and grows to hold it.
    assert_close(tree.get(root).expect("root").frame().height, 20.0);
}

/// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
///
/// Stacked blocks contribute their widest member; floats in a row add up.
#[test]
fn test_shrink_to_fit_takes_widest_block_and_summed_floats() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut outer = Style::with_display(Display::Block);
    outer.float = Float::Left;
    let outer = element(&mut tree, root, outer);
    let _ = element(&mut tree, outer, sized_block(Some(50.0), Some(10.0)));
    for width in [30.0, 40.0] {
        let mut float = sized_block(Some(width), Some(10.0));
        float.float = Float::Left;
        let _ = element(&mut tree, outer, float);
    }
    let _ = element(&mut tree, outer, sized_block(Some(20.0), Some(10.0)));
    layout(&mut tree, 400.0, 300.0);

    assert_close(tree.get(outer).expect("outer").frame().width, 70.0);
}

#[test]
fn test_clear_moves_block_below_float() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut float_style = sized_block(Some(50.0), Some(40.0));
    float_style.float = Float::Left;
    let _ = element(&mut tree, root, float_style);
    let mut cleared = sized_block(None, Some(10.0));
    cleared.clear = trellis_style::Clear::Both;
    let cleared = element(&mut tree, root, cleared);
    layout(&mut tree, 300.0, 300.0);

    assert!(tree.get(cleared).expect("cleared").frame().y >= 40.0 - EPSILON);
}

// ---------------------------------------------------------------------------
// Inline formatting
// ---------------------------------------------------------------------------

#[test]
fn test_text_wraps_at_spaces() {
    let (mut tree, root) = tree_with_root(sized_block(Some(60.0), None));
    // Each word is 5 glyphs of 9.6px = 48px; two words do not fit in 60px.
    let run = text(&mut tree, root, "aaaaa bbbbb ccccc");
    layout(&mut tree, 800.0, 600.0);

    let root_box = tree.get(root).expect("root");
    assert_eq!(root_box.lines().len(), 3);
    let line_height = 16.0 * 1.2;
    assert_close(root_box.frame().height, 3.0 * line_height);
    assert!(!tree.get(run).expect("text").lines().is_empty());
}

// ---------------------------------------------------------------------------
// Positioned layout
//
// [§ 9.6 Absolute positioning](https://www.w3.org/TR/CSS2/visuren.html#absolute-positioning)
// ---------------------------------------------------------------------------

#[test]
fn test_absolute_box_is_placed_in_positioned_ancestor() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let _ = element(&mut tree, root, sized_block(None, Some(25.0)));
    let mut container = sized_block(Some(200.0), Some(100.0));
    container.position = Position::Relative;
    let container = element(&mut tree, root, container);

    let mut abs = sized_block(Some(50.0), Some(30.0));
    abs.position = Position::Absolute;
    abs.inset.left = Length::Fixed(10.0);
    abs.inset.top = Length::Fixed(20.0);
    let abs = element(&mut tree, container, abs);
    layout(&mut tree, 400.0, 300.0);

    let frame = *tree.get(abs).expect("abs").frame();
    assert_close(frame.width, 50.0);
    assert_close(frame.height, 30.0);
    let (x, y) = tree.offset_from(abs, container);
    assert_close(x, 10.0);
    assert_close(y, 20.0);
    let (_, root_y) = tree.offset_from(abs, root);
    assert_close(root_y, 45.0);
}

#[test]
fn test_relative_offset_moves_box_without_affecting_siblings() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut shifted = sized_block(None, Some(10.0));
    shifted.position = Position::Relative;
    shifted.inset.top = Length::Fixed(5.0);
    shifted.inset.left = Length::Fixed(7.0);
    let shifted = element(&mut tree, root, shifted);
    let next = element(&mut tree, root, sized_block(None, Some(10.0)));
    layout(&mut tree, 400.0, 300.0);

    let frame = tree.get(shifted).expect("shifted").frame();
    assert_close(frame.x, 7.0);
    assert_close(frame.y, 5.0);
    assert_close(tree.get(next).expect("next").frame().y, 10.0);
}

// ---------------------------------------------------------------------------
// Flex layout
// ---------------------------------------------------------------------------

#[test]
fn test_flex_grow_splits_free_space() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut container = Style::with_display(Display::Flex);
    container.width = Length::Fixed(300.0);
    let container = element(&mut tree, root, container);

    let mut one = Style::with_display(Display::Block);
    one.flex_basis = Length::Fixed(0.0);
    one.flex_grow = 1.0;
    let mut three = one.clone();
    three.flex_grow = 3.0;
    let a = element(&mut tree, container, one);
    let b = element(&mut tree, container, three);
    layout(&mut tree, 400.0, 300.0);

    assert_eq!(tree.get(container).expect("flex").tag(), BoxKindTag::Flexible);
    let a = *tree.get(a).expect("a").frame();
    let b = *tree.get(b).expect("b").frame();
    assert_close(a.width, 75.0);
    assert_close(b.width, 225.0);
    assert_close(b.x, 75.0);
}

// ---------------------------------------------------------------------------
// Snapshots and layers
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_serializes_boxes_lines_and_layers() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let _ = text(&mut tree, root, "hi");
    layout(&mut tree, 400.0, 300.0);

    let snapshot = tree.snapshot().expect("snapshot");
    let value = serde_json::to_value(&snapshot).expect("json");
    assert_eq!(value["root"]["kind"], "Block");
    assert_eq!(value["root"]["lines"][0]["kind"], "Root");
    assert_eq!(value["root"]["lines"][0]["children"][0]["text"], "hi");
    assert_eq!(value["layers"]["z_index"], 0);
}

#[test]
fn test_snapshot_marks_image_boxes() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut ids = Vec::new();
    for is_image in [true, false] {
        let node = Node::new("img");
        let id = tree
            .create_replaced(
                Some(&node),
                Rc::new(Style::with_display(Display::Inline)),
                Some(Size::new(40.0, 30.0)),
                is_image,
            )
            .expect("replaced");
        tree.add_box(root, id).expect("add replaced");
        ids.push(id);
    }
    layout(&mut tree, 400.0, 300.0);

    let snapshot = tree.snapshot().expect("snapshot");
    let value = serde_json::to_value(&snapshot).expect("json");
    let image = &value["root"]["children"][0];
    assert_eq!(image["kind"], "Replaced");
    assert_eq!(image["image"], true);
    assert_eq!(image["rect"]["width"], 40.0);
    assert!(
        value["root"]["children"][1].get("image").is_none(),
        "non-image replaced content omits the flag"
    );
    assert_eq!(snapshot.root.children[1].id, ids[1]);
}

#[test]
fn test_layers_are_ordered_by_z_index() {
    let (mut tree, root) = tree_with_root(Style::with_display(Display::Block));
    let mut ids = Vec::new();
    for z in [Some(5), None, Some(-1)] {
        let mut style = sized_block(Some(10.0), Some(10.0));
        style.position = Position::Absolute;
        style.z_index = z;
        ids.push(element(&mut tree, root, style));
    }
    layout(&mut tree, 400.0, 300.0);

    let root_layer = tree.layer_of(root).expect("root layer");
    let order: Vec<BoxId> = root_layer
        .children
        .iter()
        .map(|&index| tree.layers()[index].owner)
        .collect();
    assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn test_layout_without_root_fails() {
    let mut tree = BoxTree::new();
    let metrics = ApproximateFontMetrics;
    let ctx = LayoutContext::new(Size::new(100.0, 100.0), &metrics);
    assert_eq!(tree.layout(&ctx), Err(trellis_layout::TreeError::NoRoot));
}
