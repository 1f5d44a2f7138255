//! Per-component Dijkstra with 8-adjacency and no-corner-cutting move legality.

use std::collections::BinaryHeap;

use crate::grid::{CellId, Grid, Point};
use crate::node::{Node, Pred, COST_CARDINAL, COST_ORDINAL};
use crate::priority::MinEntry;

/// The eight 8-adjacency moves, as `(dx, dy, step cost)`. Cardinal moves cost
/// [`COST_CARDINAL`], diagonal moves cost [`COST_ORDINAL`].
const MOVES: [(i32, i32, u32); 8] = [
    (0, -1, COST_CARDINAL),
    (1, 0, COST_CARDINAL),
    (0, 1, COST_CARDINAL),
    (-1, 0, COST_CARDINAL),
    (1, -1, COST_ORDINAL),
    (-1, -1, COST_ORDINAL),
    (1, 1, COST_ORDINAL),
    (-1, 1, COST_ORDINAL),
];

/// A diagonal step from `(x, y)` to `(x + dx, y + dy)` is legal only if both cells orthogonally
/// adjacent to the destination are also traversable; for a cardinal move (`dx == 0` or
/// `dy == 0`) this reduces to checking the destination alone, since one of the two "orthogonal"
/// cells collapses onto the (already-traversable) source and the other onto the destination.
fn move_is_legal(grid: &Grid, x: i32, y: i32, dx: i32, dy: i32) -> bool {
    grid.get_xy(x, y + dy) && grid.get_xy(x + dx, y) && grid.get_xy(x + dx, y + dy)
}

/// Build a shortest-path tree rooted at `origin` over every cell 8-adjacency-reachable from it,
/// honoring the no-corner-cutting rule.
///
/// `nodes[origin]` must already be `{pred: Pred::ROOT, cost: 0}`; every other node reachable from
/// `origin` is relaxed in place. Nodes outside `origin`'s component are left untouched.
pub fn dijkstra(grid: &Grid, nodes: &mut [Node], origin: CellId) {
    debug_assert!(nodes[origin].pred.is_root());
    debug_assert_eq!(nodes[origin].cost, 0);

    let mut queue = BinaryHeap::new();
    queue.push(MinEntry {
        priority: 0,
        payload: origin,
    });

    while let Some(MinEntry { priority: cost, payload: id }) = queue.pop() {
        if cost != nodes[id].cost {
            continue; // stale entry: a better path to `id` was already relaxed
        }
        let p = grid.unpack(id);
        let (x, y) = (i32::from(p.x), i32::from(p.y));
        for &(dx, dy, step) in &MOVES {
            if !move_is_legal(grid, x, y, dx, dy) {
                continue;
            }
            let neighbor = grid.pack(Point::new((x + dx) as u16, (y + dy) as u16));
            let new_cost = cost + step;
            if new_cost < nodes[neighbor].cost {
                nodes[neighbor].cost = new_cost;
                nodes[neighbor].pred = Pred::cell(id);
                queue.push(MinEntry {
                    priority: new_cost,
                    payload: neighbor,
                });
            }
        }
    }
}
