//! Orchestrates cluster discovery, root selection, and LCA-based query answers.

use std::cmp::Ordering;

use crate::dijkstra::dijkstra;
use crate::driver::AppliedPatch;
use crate::flood_fill::flood_fill;
use crate::grid::{CellId, Grid, Point};
use crate::node::{Node, Pred};
use crate::path_engine::{EnginePath, PathEngine};

/// Maximum number of points handed back per [`PathEngine::get_path`] call.
///
/// Keeps any single call boundedly fast regardless of path length; the driver calls `get_path`
/// again with the same `(start, goal)` while `incomplete` is `true`.
const CHUNK_SIZE: usize = 256;

enum Delivery {
    Idle,
    Emitting { points: Vec<Point>, offset: usize },
}

/// Spanning-forest pathfinding engine: one shortest-path tree per connected component of the
/// grid, rebuilt in full on every [`PathEngine::prepare`]/[`PathEngine::on_change`], and queried
/// via a balanced two-pointer walk to the lowest common ancestor.
pub struct SpanningTreeEngine {
    width: u32,
    nodes: Vec<Node>,
    delivery: Delivery,
}

impl SpanningTreeEngine {
    /// Construct an engine with no spanning forest yet; call [`PathEngine::prepare`] before
    /// issuing queries.
    #[must_use]
    pub fn new() -> Self {
        SpanningTreeEngine {
            width: 0,
            nodes: Vec::new(),
            delivery: Delivery::Idle,
        }
    }

    fn pack(&self, p: Point) -> CellId {
        (p.y as usize) * (self.width as usize) + (p.x as usize)
    }

    fn unpack(&self, id: CellId) -> Point {
        let w = self.width as usize;
        Point::new((id % w) as u16, (id / w) as u16)
    }

    /// Rebuild the spanning forest from scratch against the current grid contents.
    fn setup(&mut self, grid: &Grid) {
        self.width = grid.width();
        self.nodes = vec![Node::UNREACHED; grid.size()];
        self.delivery = Delivery::Idle;

        for origin in 0..grid.size() {
            if !grid.get(origin) || !self.nodes[origin].pred.is_unset() {
                continue;
            }
            let cluster = flood_fill(grid, &mut self.nodes, origin);
            debug_assert!(!cluster.is_empty());

            let (mut sum_x, mut sum_y) = (0i64, 0i64);
            for p in &cluster {
                sum_x += i64::from(p.x);
                sum_y += i64::from(p.y);
            }
            let centre = Point::new(
                (sum_x / cluster.len() as i64) as u16,
                (sum_y / cluster.len() as i64) as u16,
            );
            let root = *cluster
                .iter()
                .min_by_key(|p| l1_distance(**p, centre))
                .expect("cluster is non-empty");
            let root_id = grid.pack(root);

            self.nodes[root_id] = Node {
                pred: Pred::ROOT,
                cost: 0,
            };
            dijkstra(grid, &mut self.nodes, root_id);

            debug_assert!(cluster
                .iter()
                .all(|p| !self.nodes[grid.pack(*p)].pred.is_flood()));
        }
    }

    /// Answer one query by walking both endpoints' predecessor chains to their lowest common
    /// ancestor. Returns `None` if either endpoint is blocked or the endpoints are not connected.
    fn search(&self, s: Point, g: Point) -> Option<Vec<Point>> {
        let si = self.pack(s);
        let gi = self.pack(g);
        if self.nodes[si].pred.is_unset() || self.nodes[gi].pred.is_unset() {
            return None;
        }
        if si == gi {
            return Some(vec![s, s]);
        }

        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut u = si;
        let mut v = gi;
        loop {
            let cu = self.nodes[u].cost;
            let cv = self.nodes[v].cost;
            match cu.cmp(&cv) {
                Ordering::Equal => {
                    if u == v {
                        head.push(self.unpack(u));
                        break;
                    }
                    if cu == 0 {
                        // Both sides reached a root, but different roots: disjoint trees.
                        return None;
                    }
                    head.push(self.unpack(u));
                    u = self.nodes[u]
                        .pred
                        .as_cell()
                        .expect("non-root node has a predecessor");
                }
                Ordering::Less => {
                    tail.push(self.unpack(v));
                    v = self.nodes[v]
                        .pred
                        .as_cell()
                        .expect("non-root node has a predecessor");
                }
                Ordering::Greater => {
                    head.push(self.unpack(u));
                    u = self.nodes[u]
                        .pred
                        .as_cell()
                        .expect("non-root node has a predecessor");
                }
            }
        }
        tail.reverse();
        head.extend(tail);
        Some(head)
    }
}

impl Default for SpanningTreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn l1_distance(a: Point, b: Point) -> i32 {
    (i32::from(a.x) - i32::from(b.x)).abs() + (i32::from(a.y) - i32::from(b.y)).abs()
}

impl PathEngine for SpanningTreeEngine {
    fn prepare(&mut self, grid: &Grid) {
        self.setup(grid);
    }

    fn on_change(&mut self, grid: &Grid, _patches: &[AppliedPatch]) {
        self.setup(grid);
    }

    fn get_path(&mut self, start: Point, goal: Point) -> EnginePath {
        if matches!(self.delivery, Delivery::Idle) {
            let points = self.search(start, goal).unwrap_or_default();
            self.delivery = Delivery::Emitting { points, offset: 0 };
        }
        let Delivery::Emitting { points, offset } = &mut self.delivery else {
            unreachable!("just set to Emitting above")
        };

        let end = (*offset + CHUNK_SIZE).min(points.len());
        let chunk = points[*offset..end].to_vec();
        *offset = end;
        let incomplete = *offset < points.len();
        if !incomplete {
            self.delivery = Delivery::Idle;
        }
        EnginePath {
            points: chunk,
            incomplete,
        }
    }

    fn name(&self) -> &'static str {
        "spanning-tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(grid: &Grid) -> SpanningTreeEngine {
        let mut engine = SpanningTreeEngine::new();
        engine.prepare(grid);
        engine
    }

    fn drain(engine: &mut SpanningTreeEngine, start: Point, goal: Point) -> Vec<Point> {
        let mut points = Vec::new();
        loop {
            let segment = engine.get_path(start, goal);
            points.extend(segment.points);
            if !segment.incomplete {
                break;
            }
        }
        points
    }

    #[test]
    fn same_cell_query_returns_two_coincident_points() {
        let grid = Grid::new(3, 3, true);
        let mut engine = engine_for(&grid);
        let p = Point::new(1, 1);
        assert_eq!(drain(&mut engine, p, p), vec![p, p]);
    }

    #[test]
    fn disjoint_components_return_no_path() {
        let mut grid = Grid::new(3, 1, true);
        grid.apply_patch(Point::new(1, 0), &Grid::new(1, 1, false))
            .unwrap();
        let mut engine = engine_for(&grid);
        assert!(drain(&mut engine, Point::new(0, 0), Point::new(2, 0)).is_empty());
    }

    #[test]
    fn open_grid_path_endpoints_match_query() {
        let grid = Grid::new(5, 5, true);
        let mut engine = engine_for(&grid);
        let (start, goal) = (Point::new(0, 0), Point::new(4, 4));
        let path = drain(&mut engine, start, goal);
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn get_path_segments_long_paths() {
        let grid = Grid::new(600, 1, true);
        let mut engine = engine_for(&grid);
        let first = engine.get_path(Point::new(0, 0), Point::new(599, 0));
        assert_eq!(first.points.len(), CHUNK_SIZE);
        assert!(first.incomplete);
    }

    #[test]
    fn rebuild_after_blocking_reroutes_query() {
        let mut grid = Grid::new(3, 3, true);
        let mut engine = engine_for(&grid);
        let (start, goal) = (Point::new(0, 1), Point::new(2, 1));
        assert!(!drain(&mut engine, start, goal).is_empty());

        grid.apply_patch(Point::new(1, 0), &Grid::new(1, 3, false))
            .unwrap();
        engine.on_change(&grid, &[]);
        assert!(drain(&mut engine, start, goal).is_empty());
    }
}
