//! CSS Float Layout.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! Each block container keeps an ordered [`FloatingBoxList`] in its own
//! border-box coordinates. It holds the floats it placed itself and copies of
//! floats from enclosing blocks that intrude into it.

use serde::Serialize;
use trellis_style::{Clear, Float};

use crate::arena::BoxId;
use crate::box_model::Rect;

/// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
///
/// "Values have the following meanings:
///
/// left
///   The element generates a block box that is floated to the left.
///
/// right
///   The element generates a block box that is floated to the right."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloatSide {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

impl FloatSide {
    /// The side of a `float` value; `None` for `float: none`.
    #[must_use]
    pub const fn from_style(float: Float) -> Option<Self> {
        match float {
            Float::Left => Some(Self::Left),
            Float::Right => Some(Self::Right),
            Float::None => None,
        }
    }
}

/// One float as seen by one block container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloatingBox {
    /// The floating box.
    pub box_id: BoxId,
    /// Which side it floats to.
    pub side: FloatSide,
    /// The float belongs to an enclosing block and was copied in because it
    /// overlaps this one.
    pub is_intruding: bool,
    /// The float has been positioned.
    pub is_placed: bool,
    /// The margin box, in the list owner's border-box coordinates.
    pub rect: Rect,
}

/// Ordered floats of one block container.
///
/// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box
/// of the float."
#[derive(Debug, Clone, Default)]
pub struct FloatingBoxList {
    floats: Vec<FloatingBox>,
}

impl FloatingBoxList {
    /// Returns true if there are no floats in this list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// Number of floats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.floats.len()
    }

    /// Floats in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FloatingBox> {
        self.floats.iter()
    }

    /// Whether `box_id` already has an entry.
    #[must_use]
    pub fn contains_float(&self, box_id: BoxId) -> bool {
        self.floats.iter().any(|f| f.box_id == box_id)
    }

    /// Append a float unless the box is already listed. Returns whether it
    /// was added.
    pub fn insert(&mut self, float: FloatingBox) -> bool {
        if self.contains_float(float.box_id) {
            return false;
        }
        self.floats.push(float);
        true
    }

    /// Remove the entry for `box_id`. Returns whether one existed.
    pub fn remove(&mut self, box_id: BoxId) -> bool {
        let before = self.floats.len();
        self.floats.retain(|f| f.box_id != box_id);
        self.floats.len() != before
    }

    /// Drop the floats this block placed itself, keeping intruding ones.
    pub fn remove_own_floats(&mut self) {
        self.floats.retain(|f| f.is_intruding);
    }

    /// Drop the intruding floats, keeping the ones this block placed.
    pub fn remove_intruding_floats(&mut self) {
        self.floats.retain(|f| !f.is_intruding);
    }

    /// Move every float by (`dx`, `dy`).
    pub(crate) fn translate(&mut self, dx: f32, dy: f32) {
        for float in &mut self.floats {
            float.rect = float.rect.translate(dx, dy);
        }
    }

    /// Whether any float was copied in from an enclosing block.
    #[must_use]
    pub fn has_intruding_floats(&self) -> bool {
        self.floats.iter().any(|f| f.is_intruding)
    }

    /// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place a float whose margin box is `width` × `height` inside the content
    /// area `[content_left, content_left + content_width)`, no higher than `y`.
    ///
    /// "A floated box is shifted to the left or right until its outer edge
    /// touches the containing block edge or the outer edge of another float."
    ///
    /// - Rule 1: Float cannot extend past containing block edges.
    /// - Rules 4, 5, 6, 8: Float is placed as high as possible, at or below
    ///   `y` and not above earlier floats.
    /// - Rule 9: Left floats go as far left as possible; right floats as far right.
    /// - Rules 2, 3, 7: Floats do not overlap each other.
    pub fn place_float(
        &mut self,
        box_id: BoxId,
        side: FloatSide,
        width: f32,
        height: f32,
        y: f32,
        content_left: f32,
        content_width: f32,
    ) -> Rect {
        // STEP 1: Start at the highest allowed position.
        // [§ 9.5.1 Rule 6](https://www.w3.org/TR/CSS2/visuren.html#float-position)
        //
        // "The outer top of a floating box may not be higher than the outer
        // top of any block or floated box generated by an element earlier in
        // the source document."
        let earlier_top = self
            .floats
            .iter()
            .filter(|f| f.is_placed)
            .map(|f| f.rect.y)
            .fold(f32::MIN, f32::max);
        let mut top = y.max(earlier_top);

        // STEP 2: Find a position where the float fits.
        // [§ 9.5.1 Rules 2, 3, 7](https://www.w3.org/TR/CSS2/visuren.html#float-position)
        //
        // Scan downward through float bottoms until the band is wide enough.
        let rect = loop {
            let (left, available) =
                self.available_range(top, height.max(1.0), content_left, content_width);
            let fits = available >= width || available >= content_width;
            let next = self.next_float_bottom_after(top);
            if fits || next <= top {
                // STEP 3: Place the float.
                // [§ 9.5.1 Rule 9](https://www.w3.org/TR/CSS2/visuren.html#float-position)
                //
                // "A left-floating box must be put as far to the left as possible,
                // a right-floating box as far to the right as possible."
                let x = match side {
                    FloatSide::Left => left,
                    FloatSide::Right => (left + available - width).max(left),
                };
                break Rect::new(x, top, width, height);
            }
            // STEP 4: Float doesn't fit at this Y; advance to the next
            // float bottom edge.
            top = next;
        };

        self.floats.retain(|f| f.box_id != box_id);
        self.floats.push(FloatingBox {
            box_id,
            side,
            is_intruding: false,
            is_placed: true,
            rect,
        });
        rect
    }

    /// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// "The current and subsequent line boxes created next to the float are
    /// shortened as necessary to make room for the margin box of the float."
    ///
    /// Returns `(left_offset, available_width)` for content in the band
    /// `[y, y + height)`, starting from the content area
    /// `[content_left, content_left + content_width)`.
    #[must_use]
    pub fn available_range(
        &self,
        y: f32,
        height: f32,
        content_left: f32,
        content_width: f32,
    ) -> (f32, f32) {
        let band_bottom = y + height.max(0.0);
        let mut left_edge = content_left;
        let mut right_edge = content_left + content_width;
        for f in self.floats.iter().filter(|f| f.is_placed) {
            // A float is active if its margin box intersects the band.
            let active = f.rect.y < band_bottom.max(y + f32::EPSILON) && f.rect.bottom() > y;
            if !active {
                continue;
            }
            match f.side {
                FloatSide::Left => left_edge = left_edge.max(f.rect.right()),
                FloatSide::Right => right_edge = right_edge.min(f.rect.x),
            }
        }
        (left_edge, (right_edge - left_edge).max(0.0))
    }

    /// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "This property indicates which sides of an element's box(es) may not
    /// be adjacent to an earlier floating box."
    ///
    /// Returns the Y position a box with `clear` must move down to.
    #[must_use]
    pub fn clearance_y(&self, clear: Clear, y: f32) -> f32 {
        let side = match clear {
            Clear::None => return y,
            Clear::Left => Some(FloatSide::Left),
            Clear::Right => Some(FloatSide::Right),
            Clear::Both => None,
        };
        y.max(self.lowest_float_bottom(side))
    }

    /// [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// Bottom of the lowest placed float on `side` (either side for `None`),
    /// or zero without floats.
    #[must_use]
    pub fn lowest_float_bottom(&self, side: Option<FloatSide>) -> f32 {
        self.floats
            .iter()
            .filter(|f| f.is_placed && side.is_none_or(|s| s == f.side))
            .map(|f| f.rect.bottom())
            .fold(0.0_f32, f32::max)
    }

    /// Bottom of the lowest float this block placed itself.
    #[must_use]
    pub fn lowest_own_float_bottom(&self) -> f32 {
        self.floats
            .iter()
            .filter(|f| f.is_placed && !f.is_intruding)
            .map(|f| f.rect.bottom())
            .fold(0.0_f32, f32::max)
    }

    /// Find the smallest float bottom edge that is strictly greater than `y`,
    /// or `y` itself when there is none.
    #[must_use]
    pub fn next_float_bottom_after(&self, y: f32) -> f32 {
        self.floats
            .iter()
            .filter(|f| f.is_placed)
            .map(|f| f.rect.bottom())
            .filter(|&bottom| bottom > y)
            .fold(None, |best: Option<f32>, bottom| {
                Some(best.map_or(bottom, |b| b.min(bottom)))
            })
            .unwrap_or(y)
    }

    /// Copies of the floats that reach below `top`, translated by
    /// `(-dx, -dy)` and marked intruding, for a child block at `(dx, dy)`.
    #[must_use]
    pub fn intruding_into(&self, dx: f32, dy: f32, top: f32) -> Vec<FloatingBox> {
        self.floats
            .iter()
            .filter(|f| f.is_placed && f.rect.bottom() > top)
            .map(|f| FloatingBox {
                is_intruding: true,
                rect: f.rect.translate(-dx, -dy),
                ..*f
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ArenaKey, GenIndex};

    fn id(index: u32) -> BoxId {
        BoxId::from_index(GenIndex {
            index,
            generation: 0,
        })
    }

    /// Helper: place a float inside a 200px wide content area starting at x = 0.
    fn place(
        list: &mut FloatingBoxList,
        box_id: BoxId,
        side: FloatSide,
        width: f32,
        height: f32,
    ) -> Rect {
        list.place_float(box_id, side, width, height, 0.0, 0.0, 200.0)
    }

    #[test]
    fn test_left_floats_stack_side_by_side() {
        let mut list = FloatingBoxList::default();
        let a = place(&mut list, id(1), FloatSide::Left, 50.0, 20.0);
        let b = place(&mut list, id(2), FloatSide::Left, 50.0, 20.0);

        assert_eq!((a.x, a.y), (0.0, 0.0));
        assert_eq!((b.x, b.y), (50.0, 0.0), "second float must not overlap the first");
        assert_eq!(list.available_range(0.0, 20.0, 0.0, 200.0), (100.0, 100.0));
        assert_eq!(
            list.available_range(20.0, 10.0, 0.0, 200.0),
            (0.0, 200.0),
            "below the floats the full width is available"
        );
    }

    #[test]
    fn test_right_float_hugs_the_right_edge() {
        let mut list = FloatingBoxList::default();
        let right = place(&mut list, id(1), FloatSide::Right, 50.0, 20.0);
        let left = place(&mut list, id(2), FloatSide::Left, 30.0, 20.0);

        assert_eq!((right.x, right.y), (150.0, 0.0));
        assert_eq!((left.x, left.y), (0.0, 0.0));
        assert_eq!(list.available_range(0.0, 20.0, 0.0, 200.0), (30.0, 120.0));
    }

    #[test]
    fn test_float_that_does_not_fit_moves_below() {
        let mut list = FloatingBoxList::default();
        let _ = place(&mut list, id(1), FloatSide::Left, 150.0, 20.0);
        let second = place(&mut list, id(2), FloatSide::Left, 100.0, 10.0);

        assert_eq!((second.x, second.y), (0.0, 20.0));
    }

    #[test]
    fn test_clearance_moves_below_floats_on_the_cleared_side() {
        let mut list = FloatingBoxList::default();
        let _ = place(&mut list, id(1), FloatSide::Left, 50.0, 20.0);
        let _ = place(&mut list, id(2), FloatSide::Right, 50.0, 40.0);

        assert_eq!(list.clearance_y(Clear::None, 5.0), 5.0);
        assert_eq!(list.clearance_y(Clear::Left, 5.0), 20.0);
        assert_eq!(list.clearance_y(Clear::Right, 5.0), 40.0);
        assert_eq!(list.clearance_y(Clear::Both, 5.0), 40.0);
        assert_eq!(list.clearance_y(Clear::Both, 60.0), 60.0, "already below every float");
    }

    #[test]
    fn test_insert_ignores_a_listed_box() {
        let mut list = FloatingBoxList::default();
        let rect = place(&mut list, id(1), FloatSide::Left, 50.0, 20.0);
        let copy = FloatingBox {
            box_id: id(1),
            side: FloatSide::Left,
            is_intruding: true,
            is_placed: true,
            rect,
        };

        assert!(list.contains_float(id(1)));
        assert!(!list.insert(copy));
        assert_eq!(list.len(), 1);
        assert!(!list.has_intruding_floats());
    }

    #[test]
    fn test_intruding_copies_are_translated_into_the_child() {
        let mut list = FloatingBoxList::default();
        let _ = place(&mut list, id(1), FloatSide::Left, 50.0, 20.0);
        let _ = place(&mut list, id(2), FloatSide::Left, 50.0, 5.0);

        let copies = list.intruding_into(10.0, 8.0, 8.0);
        assert_eq!(copies.len(), 1, "the 5px float ends above the child");
        assert!(copies[0].is_intruding);
        assert_eq!((copies[0].rect.x, copies[0].rect.y), (-10.0, -8.0));
    }
}
