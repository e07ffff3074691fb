//! Box tree construction.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! [`BoxTree::create_box`] turns a node and its resolved style into exactly
//! one box. [`BoxTree::add_box`] links a box under a parent and synthesizes
//! whatever anonymous boxes CSS requires so the result is a valid nesting:
//!
//! - table parts get the table, section and row wrappers they need
//!   ([§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)),
//! - block containers never mix inline-level and block-level children
//!   ([§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)),
//! - an inline box that receives a block-level box is split around it, with
//!   a clone of its inline ancestry continuing after the block.

use std::collections::HashSet;
use std::rc::Rc;

use trellis_common::warning::warn_once;
use trellis_style::{Display, ListStylePosition, Style};

use crate::arena::BoxId;
use crate::box_model::Size;
use crate::error::TreeError;
use crate::layout_box::{
    BlockFlow, BoxKind, BoxKindTag, FlexBox, InlineBox, LayoutBox, ReplacedBox, TextBox,
};
use crate::node::Node;
use crate::table::{TableBox, TableCellBox, TableColumnBox, TableRowBox, TableSectionBox};
use crate::tree::BoxTree;

/// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
///
/// The wrappers a misparented table part needs, innermost first.
const fn required_wrappers(tag: BoxKindTag) -> &'static [BoxKindTag] {
    match tag {
        BoxKindTag::TableCell => &[BoxKindTag::TableRow, BoxKindTag::TableSection, BoxKindTag::Table],
        BoxKindTag::TableRow => &[BoxKindTag::TableSection, BoxKindTag::Table],
        BoxKindTag::TableSection | BoxKindTag::TableCaption | BoxKindTag::TableColumnGroup => {
            &[BoxKindTag::Table]
        }
        BoxKindTag::TableColumn => &[BoxKindTag::Table],
        _ => &[],
    }
}

/// Whether `parent` may hold `child` directly, as far as table structure
/// is concerned.
const fn table_parent_accepts(parent: BoxKindTag, child: BoxKindTag) -> bool {
    match child {
        BoxKindTag::TableCell => matches!(parent, BoxKindTag::TableRow),
        BoxKindTag::TableRow => matches!(parent, BoxKindTag::TableSection),
        BoxKindTag::TableSection | BoxKindTag::TableCaption | BoxKindTag::TableColumnGroup => {
            matches!(parent, BoxKindTag::Table)
        }
        BoxKindTag::TableColumn => {
            matches!(parent, BoxKindTag::Table | BoxKindTag::TableColumnGroup)
        }
        // "If a child C of a 'table' or 'inline-table' box is not a proper
        // table child, then generate an anonymous 'table-row' box around C"
        _ => !matches!(
            parent,
            BoxKindTag::Table | BoxKindTag::TableSection | BoxKindTag::TableRow
        ),
    }
}

impl BoxTree {
    /// [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
    ///
    /// "An element's display type determines the type of principal box it
    /// generates."
    ///
    /// Create the box for `node`. A marker pseudo-element becomes an inside
    /// or outside marker by `list-style-position`. The box of the document
    /// element becomes the root of the tree.
    ///
    /// # Errors
    /// Returns [`TreeError::NoBoxForDisplay`] for `display: none`.
    pub fn create_box(
        &mut self,
        node: Option<&Rc<Node>>,
        style: Rc<Style>,
    ) -> Result<BoxId, TreeError> {
        let kind = if style.is_marker() {
            match style.list_style_position {
                ListStylePosition::Inside => BoxKind::InsideListMarker(InlineBox::default()),
                ListStylePosition::Outside => BoxKind::OutsideListMarker(BlockFlow::default()),
            }
        } else {
            match style.display {
                // "The element and its descendants generate no boxes or text runs."
                Display::None => return Err(TreeError::NoBoxForDisplay("none")),
                Display::Inline => BoxKind::Inline(InlineBox::default()),
                Display::Block | Display::InlineBlock => BoxKind::Block(BlockFlow::default()),
                Display::ListItem => BoxKind::ListItem(BlockFlow::default()),
                Display::Table | Display::InlineTable => BoxKind::Table(TableBox::new(&style)),
                Display::TableRowGroup | Display::TableHeaderGroup | Display::TableFooterGroup => {
                    BoxKind::TableSection(TableSectionBox::default())
                }
                Display::TableRow => BoxKind::TableRow(TableRowBox::default()),
                Display::TableColumnGroup => BoxKind::TableColumnGroup(TableColumnBox::default()),
                Display::TableColumn => BoxKind::TableColumn(TableColumnBox::default()),
                Display::TableCell => {
                    BoxKind::TableCell(BlockFlow::default(), TableCellBox::default())
                }
                Display::TableCaption => BoxKind::TableCaption(BlockFlow::default()),
                Display::Flex | Display::InlineFlex => BoxKind::Flexible(FlexBox::default()),
            }
        };
        let id = self.insert_box(LayoutBox::new(node, style, kind));
        if let Some(node) = node {
            if node.is_root_element() && self.root.is_none() {
                self.set_root(id)?;
            }
        }
        Ok(id)
    }

    /// Create a text box. Text is always inline-level.
    ///
    /// # Errors
    /// Currently infallible; returns `Result` like the other constructors.
    pub fn create_text(
        &mut self,
        node: Option<&Rc<Node>>,
        style: Rc<Style>,
        text: impl Into<String>,
    ) -> Result<BoxId, TreeError> {
        let kind = BoxKind::Text(TextBox {
            text: text.into(),
            lines: Vec::new(),
        });
        let mut layout_box = LayoutBox::new(node, style, kind);
        layout_box.flags.inline = true;
        layout_box.flags.floating = false;
        Ok(self.insert_box(layout_box))
    }

    /// [§ 3.1 Replaced element](https://www.w3.org/TR/css-display-3/#replaced-element)
    ///
    /// Create a replaced box with the content's intrinsic size, if it has
    /// one.
    ///
    /// # Errors
    /// Returns [`TreeError::NoBoxForDisplay`] for `display: none`.
    pub fn create_replaced(
        &mut self,
        node: Option<&Rc<Node>>,
        style: Rc<Style>,
        intrinsic_size: Option<Size>,
        is_image: bool,
    ) -> Result<BoxId, TreeError> {
        if style.display == Display::None {
            return Err(TreeError::NoBoxForDisplay("none"));
        }
        let kind = BoxKind::Replaced(ReplacedBox {
            intrinsic_size,
            is_image,
        });
        Ok(self.insert_box(LayoutBox::new(node, style, kind)))
    }

    fn insert_box(&mut self, layout_box: LayoutBox) -> BoxId {
        let node = layout_box.node();
        let id = self.boxes.allocate(layout_box);
        if let Some(node) = node {
            node.set_layout_box(Some(id));
        }
        id
    }

    /// Set the `rowspan` and `colspan` of a table cell (at least 1 each).
    ///
    /// # Errors
    /// Fails if `id` is stale or not a table cell.
    pub fn set_cell_span(
        &mut self,
        id: BoxId,
        row_span: usize,
        col_span: usize,
    ) -> Result<(), TreeError> {
        match &mut self.get_mut(id)?.kind {
            BoxKind::TableCell(_, cell) => {
                cell.row_span = row_span.max(1);
                cell.col_span = col_span.max(1);
            }
            _ => return Err(TreeError::Corrupt(id, "span set on a box that is not a cell")),
        }
        self.invalidate_preferred_widths(id);
        Ok(())
    }

    /// Set the `span` of a column or column group (at least 1).
    ///
    /// # Errors
    /// Fails if `id` is stale or not a column.
    pub fn set_column_span(&mut self, id: BoxId, span: usize) -> Result<(), TreeError> {
        match &mut self.get_mut(id)?.kind {
            BoxKind::TableColumn(column) | BoxKind::TableColumnGroup(column) => {
                column.span = span.max(1);
            }
            _ => return Err(TreeError::Corrupt(id, "span set on a box that is not a column")),
        }
        Ok(())
    }

    /// Append `child` to `parent`, synthesizing anonymous boxes so that the
    /// tree stays a valid CSS nesting.
    ///
    /// # Errors
    /// Fails if either handle is stale, `child` already has a parent,
    /// `parent` cannot have children, or an inline box needs to be split but
    /// has no containing block.
    ///
    /// A child that is not a column, added to a column group, is destroyed.
    pub fn add_box(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        if self.get(child)?.parent.is_some() {
            return Err(TreeError::AlreadyParented(child));
        }
        self.add_box_to(parent, child)?;
        if !self.contains(child) {
            // Dropped as the content of a column group.
            return Ok(());
        }
        self.register_positioned_in(child)
    }

    fn add_box_to(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        let parent_tag = self.tag(parent)?;
        let child_tag = self.tag(child)?;
        if self.get(parent)?.kind.children().is_none() {
            return Err(TreeError::NoChildList(parent));
        }

        if !table_parent_accepts(parent_tag, child_tag) {
            return self.add_wrapped(parent, child, child_tag);
        }

        match parent_tag {
            BoxKindTag::Inline | BoxKindTag::InsideListMarker => self.add_to_inline(parent, child),
            BoxKindTag::Block
            | BoxKindTag::ListItem
            | BoxKindTag::OutsideListMarker
            | BoxKindTag::TableCaption
            | BoxKindTag::TableCell => self.add_to_block_flow(parent, child),
            BoxKindTag::Flexible => self.add_to_flex(parent, child),
            // [§ 17.2.1](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
            //
            // "If a child C of a 'table-column-group' parent is not a
            // 'table-column' box, then it is treated as if it had
            // 'display: none'."
            BoxKindTag::TableColumnGroup if child_tag != BoxKindTag::TableColumn => {
                let _ = warn_once("Layout", "column group holding a non-column child");
                self.destroy_box(child)
            }
            _ => self.append_child(parent, child),
        }
    }

    /// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
    ///
    /// Add a table part (or a non-table box under a table) through the
    /// anonymous wrapper it needs. A trailing anonymous wrapper of a kind on
    /// the child's wrapper chain is reused, so consecutive misparented parts
    /// end up in one wrapper.
    fn add_wrapped(
        &mut self,
        parent: BoxId,
        child: BoxId,
        child_tag: BoxKindTag,
    ) -> Result<(), TreeError> {
        let parent_tag = self.tag(parent)?;
        // A non-table box inside table structure is wrapped in a cell.
        let wrappers: &[BoxKindTag] = match required_wrappers(child_tag) {
            [] => &[BoxKindTag::TableCell, BoxKindTag::TableRow, BoxKindTag::TableSection],
            chain => chain,
        };

        // STEP 1: Coalesce with a trailing anonymous wrapper.
        if let Some(last) = self.last_child(parent) {
            let node = self.get(last)?;
            if node.flags.anonymous && wrappers.contains(&node.tag()) {
                return self.add_box_to(last, child);
            }
        }

        // STEP 2: Synthesize the innermost wrapper and add it to the parent,
        // which wraps it in turn if it is misparented too.
        let wrapper_tag = wrappers[0];
        let parent_style = self.style(parent)?;
        let display = match wrapper_tag {
            BoxKindTag::TableRow => Display::TableRow,
            BoxKindTag::TableSection => Display::TableRowGroup,
            BoxKindTag::TableCell => Display::TableCell,
            _ if parent_tag.is_inline_box() => Display::InlineTable,
            _ => Display::Table,
        };
        let wrapper = self.create_box(None, Rc::new(Style::anonymous(&parent_style, display)))?;
        self.add_box_to(parent, wrapper)?;
        if !self.contains(wrapper) {
            return self.destroy_box(child);
        }
        self.add_box_to(wrapper, child)
    }

    fn last_child(&self, parent: BoxId) -> Option<BoxId> {
        self.boxes.get(parent).and_then(LayoutBox::last_child)
    }

    /// Whether `id` takes part in block layout as a block-level in-flow box.
    fn is_block_level_in_flow(&self, id: BoxId) -> Result<bool, TreeError> {
        let node = self.get(id)?;
        Ok(!node.flags.inline && !node.is_out_of_flow())
    }

    fn new_anonymous_block(&mut self, style_from: BoxId) -> Result<BoxId, TreeError> {
        let parent_style = self.style(style_from)?;
        self.create_box(
            None,
            Rc::new(Style::anonymous(&parent_style, Display::Block)),
        )
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "if a block container box has a block-level box inside it, then we
    /// force it to have only block-level boxes inside it."
    fn add_to_block_flow(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        let children_inline = self.get(parent)?.flags.children_inline;

        if self.is_block_level_in_flow(child)? {
            if children_inline {
                // STEP 1: Wrap the inline content seen so far.
                if self.last_child(parent).is_some() {
                    let wrapper = self.new_anonymous_block(parent)?;
                    self.move_children_after(parent, wrapper, None)?;
                    self.append_child(parent, wrapper)?;
                }
                self.get_mut(parent)?.flags.children_inline = false;
            }
            return self.append_child(parent, child);
        }

        if children_inline {
            return self.append_child(parent, child);
        }

        // STEP 2: Inline-level or out-of-flow content after blocks goes into
        // the trailing anonymous block.
        if let Some(last) = self.last_child(parent) {
            let node = self.get(last)?;
            if node.flags.anonymous && node.tag() == BoxKindTag::Block {
                return self.add_box_to(last, child);
            }
        }
        if self.get(child)?.is_out_of_flow() {
            return self.append_child(parent, child);
        }

        // STEP 3: Start a new anonymous block. Floats and positioned boxes
        // directly before it belong with the new inline run.
        let wrapper = self.new_anonymous_block(parent)?;
        let mut trailing = Vec::new();
        let mut current = self.last_child(parent);
        while let Some(sibling) = current {
            if !self.get(sibling)?.is_out_of_flow() {
                break;
            }
            trailing.push(sibling);
            current = self.get(sibling)?.prev;
        }
        self.append_child(parent, wrapper)?;
        for sibling in trailing.into_iter().rev() {
            self.remove_child(parent, sibling)?;
            self.append_child(wrapper, sibling)?;
        }
        self.append_child(wrapper, child)
    }

    /// [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// Flex containers wrap runs of inline-level children in anonymous
    /// blocks; every other child becomes a flex item directly.
    fn add_to_flex(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        if !self.get(child)?.flags.inline {
            return self.append_child(parent, child);
        }
        if let Some(last) = self.last_child(parent) {
            let node = self.get(last)?;
            if node.flags.anonymous && node.tag() == BoxKindTag::Block {
                return self.add_box_to(last, child);
            }
        }
        let wrapper = self.new_anonymous_block(parent)?;
        self.append_child(parent, wrapper)?;
        self.append_child(wrapper, child)
    }

    /// The last inline box of the continuation chain that starts at `id`,
    /// and the anonymous block right before it (if any).
    fn last_continuation(&self, id: BoxId) -> Result<(BoxId, Option<BoxId>), TreeError> {
        let mut inline = id;
        let mut block = None;
        let mut seen = 0;
        while let Some(next) = self.get(inline)?.kind.continuation() {
            seen += 1;
            if seen > self.boxes.len() {
                return Err(TreeError::Corrupt(id, "cycle in continuation chain"));
            }
            if self.tag(next)?.is_inline_box() {
                block = None;
                inline = next;
            } else {
                block = Some(next);
                match self.get(next)?.kind.continuation() {
                    Some(clone) => inline = clone,
                    None => return Ok((inline, block)),
                }
            }
        }
        Ok((inline, block))
    }

    /// [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "When an inline box contains an in-flow block-level box, the inline
    /// box (and its inline ancestors within the same line box) are broken
    /// around the block-level box [...] splitting the inline box into two
    /// boxes (even if either side is empty), one on each side of the
    /// block-level box(es)."
    fn add_to_inline(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        // Content added to a split inline goes to the end of its chain.
        let (target, block_before) = self.last_continuation(parent)?;
        if !self.is_block_level_in_flow(child)? {
            return self.append_child(target, child);
        }
        // A block right after a block needs no second split.
        if let Some(block) = block_before {
            if self.last_child(target).is_none() {
                return self.add_box_to(block, child);
            }
        }
        self.split_inline(target, child)
    }

    fn split_inline(&mut self, inline: BoxId, child: BoxId) -> Result<(), TreeError> {
        // STEP 1: The anonymous block that will hold the block-level child.
        let containing = self
            .containing_block(inline)
            .ok_or(TreeError::DetachedInline(inline))?;
        let new_block = self.new_anonymous_block(containing)?;

        // STEP 2: Blocks before and after the split. An anonymous containing
        // block is already a split product and becomes the "before" block.
        let reuse = {
            let node = self.get(containing)?;
            node.flags.anonymous && node.tag() == BoxKindTag::Block
        };
        let (pre_block, post_block) = if reuse {
            let outer = self
                .get(containing)?
                .parent
                .ok_or(TreeError::DetachedInline(inline))?;
            let post_block = self.new_anonymous_block(outer)?;
            let after = self.get(containing)?.next;
            self.insert_child_before(outer, new_block, after)?;
            self.insert_child_before(outer, post_block, after)?;
            (containing, post_block)
        } else {
            let pre_block = self.new_anonymous_block(containing)?;
            let post_block = self.new_anonymous_block(containing)?;
            self.move_children_after(containing, pre_block, None)?;
            self.append_child(containing, pre_block)?;
            self.append_child(containing, new_block)?;
            self.append_child(containing, post_block)?;
            self.get_mut(containing)?.flags.children_inline = false;
            (pre_block, post_block)
        };

        // STEP 3: Clone the inline ancestry up to the "before" block. Each
        // clone takes the previous clone and the children that followed the
        // split point.
        let inline_clone = self.clone_inline(inline)?;
        let mut top_clone = inline_clone;
        let mut current = inline;
        loop {
            let parent = self
                .get(current)?
                .parent
                .ok_or(TreeError::DetachedInline(inline))?;
            if parent == pre_block {
                break;
            }
            let clone = self.clone_inline(parent)?;
            self.append_child(clone, top_clone)?;
            self.move_children_after(parent, clone, Some(current))?;
            self.get_mut(parent)?.kind.set_continuation(Some(clone));
            top_clone = clone;
            current = parent;
        }

        // STEP 4: The clone chain and everything after the split point go to
        // the "after" block.
        self.append_child(post_block, top_clone)?;
        self.move_children_after(pre_block, post_block, Some(current))?;

        // STEP 5: The block-level child goes into its own block, and the
        // continuation pointers link the pieces in order.
        self.add_box_to(new_block, child)?;
        self.get_mut(new_block)?.kind.set_continuation(Some(inline_clone));
        self.get_mut(inline)?.kind.set_continuation(Some(new_block));
        self.invalidate_preferred_widths(containing);
        Ok(())
    }

    /// An anonymous inline box sharing the style of `id`.
    fn clone_inline(&mut self, id: BoxId) -> Result<BoxId, TreeError> {
        let style = self.style(id)?;
        Ok(self.insert_box(LayoutBox::new(
            None,
            style,
            BoxKind::Inline(InlineBox::default()),
        )))
    }

    /// Unlink `id` from its parent and destroy it with its subtree: its line
    /// boxes, float entries, positioned registrations, continuation pointers
    /// to it and its node's box slot.
    ///
    /// # Errors
    /// Returns [`TreeError::StaleBox`] if `id` is not alive.
    pub fn destroy_box(&mut self, id: BoxId) -> Result<(), TreeError> {
        // STEP 1: Unlink from the parent first.
        if let Some(parent) = self.get(id)?.parent {
            self.remove_child(parent, id)?;
        }

        let doomed = self.subtree(id);
        let doomed_set: HashSet<BoxId> = doomed.iter().copied().collect();

        // STEP 2: Deregister from every list outside the subtree.
        for (_, node) in self.boxes.iter_mut() {
            if node.kind.continuation().is_some_and(|c| doomed_set.contains(&c)) {
                node.kind.set_continuation(None);
            }
            if let Some(flow) = node.kind.block_flow_mut() {
                for &gone in &doomed {
                    let _ = flow.floats.remove(gone);
                }
            }
            if node.containing_block.is_some_and(|c| doomed_set.contains(&c)) {
                node.containing_block = None;
            }
        }
        for &gone in &doomed {
            self.unregister_positioned(gone);
            self.destroy_owned_lines(gone);
        }

        // STEP 3: Tear down the subtree.
        for gone in doomed {
            if let Some(layout_box) = self.boxes.deallocate(gone) {
                if let Some(node) = layout_box.node() {
                    node.clear_layout_box(gone);
                }
            }
            if self.root == Some(gone) {
                self.root = None;
            }
        }
        self.layers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(tree: &mut BoxTree) -> BoxId {
        let div = Node::new("div");
        tree.create_box(Some(&div), Rc::new(Style::with_display(Display::Block)))
            .expect("block")
    }

    #[test]
    fn test_display_none_creates_no_box() {
        let mut tree = BoxTree::new();
        let result = tree.create_box(None, Rc::new(Style::with_display(Display::None)));
        assert_eq!(result, Err(TreeError::NoBoxForDisplay("none")));
    }

    #[test]
    fn test_html_node_becomes_root() {
        let mut tree = BoxTree::new();
        let node = Node::new("html");
        let id = tree
            .create_box(Some(&node), Rc::new(Style::with_display(Display::Block)))
            .expect("root");
        assert_eq!(tree.root(), Some(id));
        assert_eq!(node.layout_box(), Some(id));
    }

    #[test]
    fn test_block_after_text_wraps_text_in_anonymous_block() {
        let mut tree = BoxTree::new();
        let parent = block(&mut tree);
        let text = tree
            .create_text(None, Rc::new(Style::default()), "hello")
            .expect("text");
        let child = block(&mut tree);
        tree.add_box(parent, text).expect("add text");
        tree.add_box(parent, child).expect("add block");

        let children = tree.child_ids(parent);
        assert_eq!(children.len(), 2);
        assert!(tree.get(children[0]).expect("wrapper").is_anonymous());
        assert_eq!(tree.child_ids(children[0]), vec![text]);
        assert_eq!(children[1], child);
        assert!(!tree.get(parent).expect("parent").children_inline());
    }

    #[test]
    fn test_text_after_block_joins_one_anonymous_block() {
        let mut tree = BoxTree::new();
        let parent = block(&mut tree);
        let child = block(&mut tree);
        tree.add_box(parent, child).expect("add block");
        let a = tree.create_text(None, Rc::new(Style::default()), "a").expect("a");
        let b = tree.create_text(None, Rc::new(Style::default()), "b").expect("b");
        tree.add_box(parent, a).expect("add a");
        tree.add_box(parent, b).expect("add b");

        let children = tree.child_ids(parent);
        assert_eq!(children.len(), 2);
        assert_eq!(tree.child_ids(children[1]), vec![a, b]);
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut tree = BoxTree::new();
        let text = tree.create_text(None, Rc::new(Style::default()), "x").expect("text");
        let child = block(&mut tree);
        assert_eq!(tree.add_box(text, child), Err(TreeError::NoChildList(text)));
    }
}
