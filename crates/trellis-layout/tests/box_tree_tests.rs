//! Integration tests for box tree construction.

use std::rc::Rc;

use quickcheck_macros::quickcheck;
use trellis_layout::{BoxId, BoxKind, BoxKindTag, BoxTree, Node, TreeError};
use trellis_style::{Display, ListStylePosition, Position, PseudoType, Style};

fn style(display: Display) -> Rc<Style> {
    Rc::new(Style::with_display(display))
}

fn root(tree: &mut BoxTree) -> BoxId {
    let html = Node::new("html");
    tree.create_box(Some(&html), style(Display::Block))
        .expect("root box")
}

fn block(tree: &mut BoxTree) -> BoxId {
    let div = Node::new("div");
    tree.create_box(Some(&div), style(Display::Block))
        .expect("block")
}

fn inline(tree: &mut BoxTree) -> BoxId {
    let span = Node::new("span");
    tree.create_box(Some(&span), style(Display::Inline))
        .expect("inline")
}

fn text(tree: &mut BoxTree, content: &str) -> BoxId {
    tree.create_text(None, Rc::new(Style::default()), content)
        .expect("text")
}

// ---------------------------------------------------------------------------
// Box creation
// ---------------------------------------------------------------------------

#[test]
fn test_create_box_maps_display_to_kind() {
    let mut tree = BoxTree::new();
    let cases = [
        (Display::Inline, BoxKindTag::Inline),
        (Display::Block, BoxKindTag::Block),
        (Display::InlineBlock, BoxKindTag::Block),
        (Display::ListItem, BoxKindTag::ListItem),
        (Display::Table, BoxKindTag::Table),
        (Display::TableFooterGroup, BoxKindTag::TableSection),
        (Display::TableRow, BoxKindTag::TableRow),
        (Display::TableCell, BoxKindTag::TableCell),
        (Display::TableCaption, BoxKindTag::TableCaption),
        (Display::TableColumn, BoxKindTag::TableColumn),
        (Display::InlineFlex, BoxKindTag::Flexible),
    ];
    for (display, tag) in cases {
        let id = tree.create_box(None, style(display)).expect("box");
        assert_eq!(tree.get(id).expect("alive").tag(), tag, "{display:?}");
    }
}

#[test]
fn test_marker_kind_follows_list_style_position() {
    let mut tree = BoxTree::new();
    let mut inside = Style::with_display(Display::Inline);
    inside.pseudo = Some(PseudoType::Marker);
    inside.list_style_position = ListStylePosition::Inside;
    let mut outside = inside.clone();
    outside.list_style_position = ListStylePosition::Outside;

    let a = tree.create_box(None, Rc::new(inside)).expect("inside");
    let b = tree.create_box(None, Rc::new(outside)).expect("outside");
    assert_eq!(tree.get(a).expect("a").tag(), BoxKindTag::InsideListMarker);
    assert_eq!(tree.get(b).expect("b").tag(), BoxKindTag::OutsideListMarker);
}

#[test]
fn test_add_box_rejects_second_parent() {
    let mut tree = BoxTree::new();
    let first = block(&mut tree);
    let second = block(&mut tree);
    let child = block(&mut tree);
    tree.add_box(first, child).expect("first parent");
    assert_eq!(
        tree.add_box(second, child),
        Err(TreeError::AlreadyParented(child))
    );
}

// ---------------------------------------------------------------------------
// Anonymous block boxes
//
// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
// ---------------------------------------------------------------------------

#[test]
fn test_float_before_text_moves_into_anonymous_block() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let first = block(&mut tree);
    tree.add_box(parent, first).expect("block");

    let mut float_style = Style::with_display(Display::Block);
    float_style.float = trellis_style::Float::Left;
    let float_node = Node::new("div");
    let float = tree
        .create_box(Some(&float_node), Rc::new(float_style))
        .expect("float");
    tree.add_box(parent, float).expect("float");
    // Without a trailing anonymous block, the float is appended as is.
    assert_eq!(tree.child_ids(parent), vec![first, float]);

    let run = text(&mut tree, "after");
    tree.add_box(parent, run).expect("text");
    let children = tree.child_ids(parent);
    assert_eq!(children.len(), 2);
    assert_eq!(tree.child_ids(children[1]), vec![float, run]);
    tree.verify().expect("valid tree");
}

// ---------------------------------------------------------------------------
// Inline splitting and continuations
// ---------------------------------------------------------------------------

#[test]
fn test_block_inside_inline_splits_it() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let span = inline(&mut tree);
    tree.add_box(parent, span).expect("span");
    let before = text(&mut tree, "before");
    tree.add_box(span, before).expect("before");
    let div = block(&mut tree);
    tree.add_box(span, div).expect("div");

    // pre block (span), block holding the div, post block (span clone)
    let blocks = tree.child_ids(parent);
    assert_eq!(blocks.len(), 3);
    assert!(blocks.iter().all(|&b| tree.get(b).expect("block").is_anonymous()));
    assert_eq!(tree.child_ids(blocks[0]), vec![span]);
    assert_eq!(tree.child_ids(blocks[1]), vec![div]);

    let clone = tree.child_ids(blocks[2])[0];
    assert_eq!(tree.get(clone).expect("clone").tag(), BoxKindTag::Inline);
    assert_eq!(tree.get(span).expect("span").continuation(), Some(blocks[1]));
    assert_eq!(tree.get(blocks[1]).expect("mid").continuation(), Some(clone));
    tree.verify().expect("valid tree");
}

#[test]
fn test_consecutive_blocks_share_one_split() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let span = inline(&mut tree);
    tree.add_box(parent, span).expect("span");
    let first = block(&mut tree);
    let second = block(&mut tree);
    tree.add_box(span, first).expect("first");
    tree.add_box(span, second).expect("second");

    let blocks = tree.child_ids(parent);
    assert_eq!(blocks.len(), 3);
    assert_eq!(tree.child_ids(blocks[1]), vec![first, second]);

    // Inline content added to the split inline lands in its last clone.
    let tail = text(&mut tree, "tail");
    tree.add_box(span, tail).expect("tail");
    let clone = tree.child_ids(blocks[2])[0];
    assert_eq!(tree.child_ids(clone), vec![tail]);
    tree.verify().expect("valid tree");
}

#[test]
fn test_nested_inline_split_clones_ancestry() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let outer = inline(&mut tree);
    let inner = inline(&mut tree);
    tree.add_box(parent, outer).expect("outer");
    tree.add_box(outer, inner).expect("inner");
    let after = text(&mut tree, "after");
    tree.add_box(outer, after).expect("after");

    let div = block(&mut tree);
    tree.add_box(inner, div).expect("div");

    let blocks = tree.child_ids(parent);
    let outer_clone = tree.child_ids(blocks[2])[0];
    let clone_children = tree.child_ids(outer_clone);
    assert_eq!(clone_children.len(), 2);
    assert_eq!(clone_children[1], after);
    assert_eq!(tree.get(outer).expect("outer").continuation(), Some(outer_clone));
    tree.verify().expect("valid tree");
}

/// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
///
/// "If a child C of a 'table-column-group' parent is not a 'table-column'
/// box, then it is treated as if it had 'display: none'."
#[test]
fn test_column_group_drops_non_column_children() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let table = tree.create_box(None, style(Display::Table)).expect("table");
    tree.add_box(parent, table).expect("table");
    let group = tree
        .create_box(None, style(Display::TableColumnGroup))
        .expect("group");
    tree.add_box(table, group).expect("group");

    let node = Node::new("div");
    let stray = tree
        .create_box(Some(&node), style(Display::Block))
        .expect("stray");
    tree.add_box(group, stray).expect("dropped, not rejected");
    assert!(!tree.contains(stray));
    assert_eq!(node.layout_box(), None);

    // A cell would need anonymous wrappers; they are dropped with it.
    let live = tree.len();
    let cell = tree.create_box(None, style(Display::TableCell)).expect("cell");
    tree.add_box(group, cell).expect("dropped, not rejected");
    assert!(!tree.contains(cell));
    assert_eq!(tree.len(), live);

    let column = tree.create_box(None, style(Display::TableColumn)).expect("column");
    tree.add_box(group, column).expect("column");
    assert_eq!(tree.child_ids(group), vec![column]);
    tree.verify().expect("valid tree");
}

// ---------------------------------------------------------------------------
// Destruction
// ---------------------------------------------------------------------------

#[test]
fn test_destroy_box_clears_node_slots_and_continuations() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let node = Node::new("span");
    let span = tree.create_box(Some(&node), style(Display::Inline)).expect("span");
    tree.add_box(parent, span).expect("span");
    let div = block(&mut tree);
    tree.add_box(span, div).expect("div");
    assert_eq!(node.layout_box(), Some(span));

    let blocks = tree.child_ids(parent);
    tree.destroy_box(blocks[1]).expect("destroy");

    assert!(!tree.contains(div));
    assert_eq!(tree.get(span).expect("span").continuation(), None);
    assert_eq!(tree.child_ids(parent).len(), 2);

    tree.destroy_box(span).expect("destroy span");
    assert_eq!(node.layout_box(), None);
    tree.verify().expect("valid tree");
}

#[test]
fn test_release_frees_everything() {
    let mut tree = BoxTree::new();
    let html = Node::new("html");
    let id = tree
        .create_box(Some(&html), style(Display::Block))
        .expect("root");
    let child = block(&mut tree);
    tree.add_box(id, child).expect("child");

    tree.release();
    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(html.layout_box(), None);
    assert!(matches!(tree.get(id), Err(TreeError::StaleBox(_))));
}

#[test]
fn test_positioned_box_registers_with_positioned_ancestor() {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let mut relative = Style::with_display(Display::Block);
    relative.position = Position::Relative;
    let container_node = Node::new("div");
    let container = tree
        .create_box(Some(&container_node), Rc::new(relative))
        .expect("container");
    tree.add_box(parent, container).expect("container");

    let mut absolute = Style::with_display(Display::Block);
    absolute.position = Position::Absolute;
    let abs_node = Node::new("div");
    let abs = tree
        .create_box(Some(&abs_node), Rc::new(absolute))
        .expect("abs");
    tree.add_box(container, abs).expect("abs");

    assert!(tree.get(abs).expect("abs").is_out_of_flow());
    assert!(matches!(
        tree.get(container).expect("container").kind(),
        BoxKind::Block(_)
    ));
    tree.destroy_box(abs).expect("destroy");
    tree.verify().expect("valid tree");
}

// ---------------------------------------------------------------------------
// Child list consistency
// ---------------------------------------------------------------------------

/// Random appends and removals keep the child list equal to a plain vector
/// model, in both directions.
#[quickcheck]
fn prop_child_list_matches_model(ops: Vec<(bool, u8)>) -> bool {
    let mut tree = BoxTree::new();
    let parent = root(&mut tree);
    let mut model: Vec<BoxId> = Vec::new();

    for (append, index) in ops {
        if append || model.is_empty() {
            let child = block(&mut tree);
            if tree.add_box(parent, child).is_err() {
                return false;
            }
            model.push(child);
        } else {
            let victim = model.remove(usize::from(index) % model.len());
            if tree.destroy_box(victim).is_err() {
                return false;
            }
        }
    }

    let forward = tree.child_ids(parent);
    let mut backward = Vec::new();
    let mut current = tree.get(parent).ok().and_then(|p| p.last_child());
    while let Some(id) = current {
        backward.push(id);
        current = tree.get(id).ok().and_then(|b| b.prev_sibling());
    }
    backward.reverse();

    forward == model && backward == model && tree.verify().is_ok()
}
