//! Illustrative, non-amortized baseline engines for correctness cross-checks.
//!
//! Both recompute a full search on every query, with no persistent forest across map changes.
//! They exist to validate [`crate::engine::SpanningTreeEngine`]'s answers and to contrast
//! amortized vs. per-query search cost; neither is tuned to compete with it.

use std::collections::BinaryHeap;

use crate::driver::AppliedPatch;
use crate::grid::{CellId, Grid, Point};
use crate::node::{COST_CARDINAL, COST_ORDINAL};
use crate::path_engine::{EnginePath, PathEngine};
use crate::priority::MinEntry;

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

fn neighbors(grid: &Grid, id: CellId) -> impl Iterator<Item = (CellId, u32)> + '_ {
    let p = grid.unpack(id);
    let (x, y) = (i32::from(p.x), i32::from(p.y));
    MOVES.iter().filter_map(move |&(dx, dy, cost)| {
        let legal = grid.get_xy(x, y + dy) && grid.get_xy(x + dx, y) && grid.get_xy(x + dx, y + dy);
        legal.then(|| (grid.pack(Point::new((x + dx) as u16, (y + dy) as u16)), cost))
    })
}

/// Admissible octile-distance estimate between two cells, ignoring obstacles.
fn octile_heuristic(grid: &Grid, from: CellId, to: CellId) -> u32 {
    let a = grid.unpack(from);
    let b = grid.unpack(to);
    let dx = (i32::from(a.x) - i32::from(b.x)).unsigned_abs();
    let dy = (i32::from(a.y) - i32::from(b.y)).unsigned_abs();
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    lo * COST_ORDINAL + (hi - lo) * COST_CARDINAL
}

fn reconstruct(parents: &[Option<CellId>], goal: CellId, start: CellId, grid: &Grid) -> Vec<Point> {
    let mut path = vec![grid.unpack(goal)];
    let mut cur = goal;
    while cur != start {
        cur = parents[cur].expect("goal was reached, so its chain must reach start");
        path.push(grid.unpack(cur));
    }
    path.reverse();
    path
}

/// Shared by both baselines: run a best-first search from `start` towards `goal`, where
/// `priority` assigns the heap key for a freshly relaxed node (`g` for Dijkstra, `g + h` for
/// A*). Returns the full point path if found.
fn best_first_search(
    grid: &Grid,
    start: Point,
    goal: Point,
    priority: impl Fn(&Grid, CellId, u32) -> u32,
) -> Option<Vec<Point>> {
    let (si, gi) = (grid.pack(start), grid.pack(goal));
    if !grid.get(si) || !grid.get(gi) {
        return None;
    }
    if si == gi {
        return Some(vec![start, start]);
    }

    let mut best_cost = vec![u32::MAX; grid.size()];
    let mut parents: Vec<Option<CellId>> = vec![None; grid.size()];
    let mut open = BinaryHeap::new();
    best_cost[si] = 0;
    open.push(MinEntry {
        priority: priority(grid, si, 0),
        payload: si,
    });

    while let Some(MinEntry { payload: id, .. }) = open.pop() {
        let cost = best_cost[id];
        if id == gi {
            return Some(reconstruct(&parents, gi, si, grid));
        }
        for (neighbor, step) in neighbors(grid, id) {
            let new_cost = cost + step;
            if new_cost < best_cost[neighbor] {
                best_cost[neighbor] = new_cost;
                parents[neighbor] = Some(id);
                open.push(MinEntry {
                    priority: priority(grid, neighbor, new_cost),
                    payload: neighbor,
                });
            }
        }
    }
    None
}

/// Full-recompute-per-query A* with the octile heuristic, no corner cutting.
pub struct AstarEngine {
    grid: Option<Grid>,
}

impl AstarEngine {
    /// Construct an engine with no grid yet; call [`PathEngine::prepare`] before issuing
    /// queries.
    #[must_use]
    pub fn new() -> Self {
        AstarEngine { grid: None }
    }
}

impl Default for AstarEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PathEngine for AstarEngine {
    fn prepare(&mut self, grid: &Grid) {
        self.grid = Some(grid.clone());
    }

    fn on_change(&mut self, grid: &Grid, _patches: &[AppliedPatch]) {
        self.grid = Some(grid.clone());
    }

    fn get_path(&mut self, start: Point, goal: Point) -> EnginePath {
        let grid = self
            .grid
            .as_ref()
            .expect("prepare must be called before get_path");
        let goal_id = grid.pack(goal);
        let points = best_first_search(grid, start, goal, |grid, id, cost| {
            cost + octile_heuristic(grid, id, goal_id)
        });
        EnginePath {
            points: points.unwrap_or_default(),
            incomplete: false,
        }
    }

    fn name(&self) -> &'static str {
        "astar-per-query"
    }
}

/// Full-recompute-per-query Dijkstra (no heuristic), no corner cutting.
pub struct PerQueryDijkstraEngine {
    grid: Option<Grid>,
}

impl PerQueryDijkstraEngine {
    /// Construct an engine with no grid yet; call [`PathEngine::prepare`] before issuing
    /// queries.
    #[must_use]
    pub fn new() -> Self {
        PerQueryDijkstraEngine { grid: None }
    }
}

impl Default for PerQueryDijkstraEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PathEngine for PerQueryDijkstraEngine {
    fn prepare(&mut self, grid: &Grid) {
        self.grid = Some(grid.clone());
    }

    fn on_change(&mut self, grid: &Grid, _patches: &[AppliedPatch]) {
        self.grid = Some(grid.clone());
    }

    fn get_path(&mut self, start: Point, goal: Point) -> EnginePath {
        let grid = self
            .grid
            .as_ref()
            .expect("prepare must be called before get_path");
        let points = best_first_search(grid, start, goal, |_, _, cost| cost);
        EnginePath {
            points: points.unwrap_or_default(),
            incomplete: false,
        }
    }

    fn name(&self) -> &'static str {
        "dijkstra-per-query"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn astar_and_dijkstra_agree_on_cost() {
        let mut grid = Grid::new(6, 6, true);
        grid.apply_patch(Point::new(2, 0), &Grid::new(1, 4, false))
            .unwrap();
        let (start, goal) = (Point::new(0, 0), Point::new(5, 5));

        let mut astar = AstarEngine::new();
        astar.prepare(&grid);
        let mut dij = PerQueryDijkstraEngine::new();
        dij.prepare(&grid);

        let a = astar.get_path(start, goal);
        let d = dij.get_path(start, goal);
        assert!(!a.points.is_empty());
        assert_eq!(a.points.len(), d.points.len());
        assert_eq!(*a.points.first().unwrap(), start);
        assert_eq!(*a.points.last().unwrap(), goal);
    }

    #[test]
    fn blocked_goal_returns_empty() {
        let mut grid = Grid::new(3, 3, true);
        grid.apply_patch(Point::new(2, 2), &Grid::new(1, 1, false))
            .unwrap();
        let mut engine = AstarEngine::new();
        engine.prepare(&grid);
        let path = engine.get_path(Point::new(0, 0), Point::new(2, 2));
        assert!(path.points.is_empty());
        assert!(!path.incomplete);
    }
}
