//! Stacking layers.
//!
//! [§ 9.9 Layered presentation](https://www.w3.org/TR/CSS2/visuren.html#layers)
//!
//! "An element in CSS 2 may have a stack level, which describes its position
//! within a set of elements sharing the same stacking context."
//!
//! The root box, every positioned box and every transformed box owns a
//! [`Layer`]. A layer's children are the layers of the nearest descendants
//! that own one, ordered by z-index. Boxes with equal z-index keep document
//! order.

use serde::Serialize;

use crate::arena::BoxId;
use crate::error::TreeError;
use crate::tree::BoxTree;

/// [§ 9.9.1 Specifying the stack level: the 'z-index' property](https://www.w3.org/TR/CSS2/visuren.html#z-index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    /// The box that owns this layer.
    pub owner: BoxId,
    /// "The stack level of the generated box in the current stacking
    /// context is 0" when `z-index` is `auto`.
    pub z_index: i32,
    /// Indices of child layers in [`BoxTree::layers`], in painting order.
    pub children: Vec<usize>,
}

impl BoxTree {
    /// All layers of the last build; the first is the root layer.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The layer owned by `id`, if it owns one.
    #[must_use]
    pub fn layer_of(&self, id: BoxId) -> Option<&Layer> {
        self.boxes
            .get(id)
            .and_then(|b| b.layer)
            .and_then(|index| self.layers.get(index))
    }

    fn owns_layer(&self, id: BoxId) -> bool {
        self.boxes
            .get(id)
            .is_some_and(|b| b.flags.root || b.flags.positioned || b.flags.has_transform)
    }

    /// [Appendix E. Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
    ///
    /// Rebuild the layer tree from the current box tree.
    pub(crate) fn build_layers(&mut self) -> Result<(), TreeError> {
        self.layers.clear();
        let Some(root) = self.root else {
            return Ok(());
        };

        // STEP 1: Allocate a layer for every owner, in document order, and
        // attach it to the layer of its nearest owning ancestor.
        let mut open: Vec<(BoxId, usize)> = Vec::new();
        for id in self.subtree(root) {
            self.get_mut(id)?.layer = None;
            if !self.owns_layer(id) {
                continue;
            }
            while let Some(&(owner, _)) = open.last() {
                if self.ancestors(id).contains(&owner) {
                    break;
                }
                let _ = open.pop();
            }
            let index = self.layers.len();
            self.layers.push(Layer {
                owner: id,
                z_index: self.get(id)?.style.z_index.unwrap_or(0),
                children: Vec::new(),
            });
            if let Some(&(_, parent)) = open.last() {
                self.layers[parent].children.push(index);
            }
            self.get_mut(id)?.layer = Some(index);
            open.push((id, index));
        }

        // STEP 2: "Positioned descendants with negative z-indices [...]
        // positioned descendants with 'z-index: auto' or 'z-index: 0' [...]
        // positioned descendants with positive z-indices". `sort_by_key` is
        // stable, so document order breaks ties.
        let z: Vec<i32> = self.layers.iter().map(|l| l.z_index).collect();
        for layer in &mut self.layers {
            layer.children.sort_by_key(|&child| z[child]);
        }
        Ok(())
    }
}
