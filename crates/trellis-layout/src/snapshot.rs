//! Read-only geometry for the painter.
//!
//! A snapshot copies the result of a layout pass out of the arena: every box
//! with its frame and line boxes, and the layer tree. Positions are made
//! absolute (relative to the root's border box) so the painter does not
//! need to walk offset parents.

use serde::Serialize;

use crate::arena::{BoxId, LineId};
use crate::box_model::{EdgeSizes, Rect};
use crate::error::TreeError;
use crate::layout_box::{BoxKind, BoxKindTag};
use crate::line_box::LineBoxKindTag;
use crate::tree::BoxTree;

/// One box of a finished layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSnapshot {
    /// Handle of the box in the tree it was taken from.
    pub id: BoxId,
    /// Box kind.
    pub kind: BoxKindTag,
    /// Whether the box has no node.
    pub anonymous: bool,
    /// Text of a text box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The box is replaced by an image the painter draws into its content box.
    #[serde(skip_serializing_if = "is_false")]
    pub image: bool,
    /// Border box, in root coordinates.
    pub rect: Rect,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Used borders.
    pub border: EdgeSizes,
    /// Used padding.
    pub padding: EdgeSizes,
    /// Root lines of a block container, in root coordinates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<LineSnapshot>,
    /// Children, in tree order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BoxSnapshot>,
}

/// One line box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSnapshot {
    /// Line box kind.
    pub kind: LineBoxKindTag,
    /// The box the line belongs to.
    pub owner: BoxId,
    /// Line rectangle, in root coordinates.
    pub rect: Rect,
    /// Text of a text run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Nested line boxes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineSnapshot>,
}

/// One stacking layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSnapshot {
    /// The box that owns the layer.
    pub owner: BoxId,
    /// Stack level.
    pub z_index: i32,
    /// Child layers in painting order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerSnapshot>,
}

/// The whole result of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// The root box.
    pub root: BoxSnapshot,
    /// The root layer, if layers were built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<LayerSnapshot>,
}

impl BoxTree {
    /// Copy the geometry of the last layout pass out of the tree.
    ///
    /// # Errors
    /// Returns [`TreeError::NoRoot`] without a root box.
    pub fn snapshot(&self) -> Result<TreeSnapshot, TreeError> {
        let root = self.root.ok_or(TreeError::NoRoot)?;
        Ok(TreeSnapshot {
            root: self.snapshot_box(root)?,
            layers: (!self.layers.is_empty()).then(|| self.snapshot_layer(0)),
        })
    }

    /// Copy one box and its subtree.
    ///
    /// # Errors
    /// Returns [`TreeError::StaleBox`] if `id` is not alive.
    pub fn snapshot_box(&self, id: BoxId) -> Result<BoxSnapshot, TreeError> {
        let node = self.get(id)?;
        let (x, y) = match self.root {
            Some(root) => self.offset_from(id, root),
            None => (node.frame.x, node.frame.y),
        };
        let lines = node
            .kind
            .block_flow()
            .map(|flow| flow.lines.clone())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|line| self.snapshot_line(line, x, y))
            .collect();
        let children = self
            .children(id)
            .map(|child| self.snapshot_box(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoxSnapshot {
            id,
            kind: node.tag(),
            anonymous: node.flags.anonymous,
            text: node.text().map(str::to_owned),
            image: matches!(&node.kind, BoxKind::Replaced(r) if r.is_image()),
            rect: Rect::new(x, y, node.frame.width, node.frame.height),
            margin: node.frame.margin,
            border: node.frame.border,
            padding: node.frame.padding,
            lines,
            children,
        })
    }

    fn snapshot_line(&self, id: LineId, dx: f32, dy: f32) -> Option<LineSnapshot> {
        let line = self.lines.get(id)?;
        Some(LineSnapshot {
            kind: line.tag(),
            owner: line.owner,
            rect: line.rect.translate(dx, dy),
            text: line.text().map(str::to_owned),
            children: line
                .children()
                .iter()
                .filter_map(|&child| self.snapshot_line(child, dx, dy))
                .collect(),
        })
    }

    fn snapshot_layer(&self, index: usize) -> LayerSnapshot {
        let layer = &self.layers[index];
        LayerSnapshot {
            owner: layer.owner,
            z_index: layer.z_index,
            children: layer
                .children
                .iter()
                .map(|&child| self.snapshot_layer(child))
                .collect(),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}
