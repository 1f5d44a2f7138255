//! Four-connected reachability used to discover spanning-tree clusters.

use crate::grid::{CellId, Grid, Point};
use crate::node::{Node, Pred};

/// Flood-fill the 4-connected component of traversable cells containing `origin`.
///
/// `nodes[origin]` must still be [`Node::UNREACHED`] and `grid` must be traversable at `origin`.
/// Every visited cell's predecessor is set to [`Pred::FLOOD`], marking it as claimed by this
/// cluster; the caller is responsible for overwriting these with real predecessors by running
/// [`crate::dijkstra::dijkstra`] over the returned cluster afterwards.
///
/// Note this is 4-connected while the Dijkstra pass that follows is 8-connected: a cell can only
/// anchor a cluster through an orthogonal neighbor, but once clustered, diagonal moves within it
/// are still searched. This asymmetry keeps the non-corner-cutting invariant out of the cheap
/// clustering pass entirely; it only has to be enforced once, in the Dijkstra relaxation step.
///
/// Returns the cluster as a list of points, in discovery order.
pub fn flood_fill(grid: &Grid, nodes: &mut [Node], origin: CellId) -> Vec<Point> {
    debug_assert!(nodes[origin].pred.is_unset());
    debug_assert!(grid.get(origin));

    let mut stack = vec![origin];
    nodes[origin].pred = Pred::FLOOD;
    let mut cluster = Vec::new();

    while let Some(id) = stack.pop() {
        let p = grid.unpack(id);
        cluster.push(p);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (x, y) = (i32::from(p.x) + dx, i32::from(p.y) + dy);
            if !grid.get_xy(x, y) {
                continue;
            }
            let neighbor = grid.pack(Point::new(x as u16, y as u16));
            if nodes[neighbor].pred.is_unset() {
                nodes[neighbor].pred = Pred::FLOOD;
                stack.push(neighbor);
            }
        }
    }

    cluster
}
