//! Sentinel-packed predecessor links for the spanning-tree engine.

use crate::grid::CellId;

/// A predecessor link in the spanning forest, packed into a single `u32` rather than an enum so
/// a `Vec<Node>` stays one dense, cache-friendly array in the Dijkstra and LCA-walk hot loops.
///
/// Three reserved values encode "never touched", "mid flood-fill", and "tree root"; every other
/// value is a valid cell id.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pred(u32);

impl Pred {
    /// Not yet reached by flood fill or Dijkstra. Cells that are permanently blocked keep this
    /// value forever.
    pub const UNSET: Pred = Pred(u32::MAX);
    /// Currently queued or visited by the flood-fill sweep; predecessor not yet known.
    pub const FLOOD: Pred = Pred(u32::MAX - 1);
    /// This cell is the root of its spanning tree.
    pub const ROOT: Pred = Pred(u32::MAX - 2);

    /// Wrap a real cell id as a predecessor link.
    ///
    /// # Panics
    /// Panics (debug builds only) if `id` collides with a reserved sentinel value; this would
    /// require a grid with close to `u32::MAX` cells, far beyond [`crate::grid::MAX_DIM`].
    #[must_use]
    pub fn cell(id: CellId) -> Pred {
        debug_assert!(
            (id as u64) < u64::from(u32::MAX - 2),
            "cell id collides with a sentinel value"
        );
        Pred(id as u32)
    }

    /// Whether this is [`Pred::UNSET`].
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == Self::UNSET.0
    }

    /// Whether this is [`Pred::FLOOD`].
    #[must_use]
    pub const fn is_flood(self) -> bool {
        self.0 == Self::FLOOD.0
    }

    /// Whether this is [`Pred::ROOT`].
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == Self::ROOT.0
    }

    /// The linked cell id, or `None` if this is a sentinel value.
    #[must_use]
    pub const fn as_cell(self) -> Option<CellId> {
        if self.0 >= Self::ROOT.0 {
            None
        } else {
            Some(self.0 as CellId)
        }
    }
}

/// Sentinel cost meaning "unreached".
pub const COST_INV: u32 = u32::MAX;
/// Integer cost of one cardinal (N/E/S/W) step, fixed-point with 3 implied decimal digits.
pub const COST_CARDINAL: u32 = 1000;
/// Integer cost of one ordinal (diagonal) step, fixed-point with 3 implied decimal digits
/// (`1000 * sqrt(2)`, rounded).
pub const COST_ORDINAL: u32 = 1414;

/// One entry of the spanning forest: a predecessor link and an accumulated cost from the root of
/// its tree.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    /// Predecessor on the shortest path back to the tree root, or a sentinel.
    pub pred: Pred,
    /// Accumulated fixed-point cost from the tree root, or [`COST_INV`] if unreached.
    pub cost: u32,
}

impl Node {
    /// The value every cell starts at before flood fill and Dijkstra run.
    pub const UNREACHED: Node = Node {
        pred: Pred::UNSET,
        cost: COST_INV,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_round_trip() {
        assert!(Pred::UNSET.is_unset());
        assert!(Pred::FLOOD.is_flood());
        assert!(Pred::ROOT.is_root());
        assert_eq!(Pred::UNSET.as_cell(), None);
        assert_eq!(Pred::FLOOD.as_cell(), None);
        assert_eq!(Pred::ROOT.as_cell(), None);
    }

    #[test]
    fn cell_pred_round_trips() {
        let p = Pred::cell(42);
        assert_eq!(p.as_cell(), Some(42));
        assert!(!p.is_unset());
        assert!(!p.is_flood());
        assert!(!p.is_root());
    }
}
