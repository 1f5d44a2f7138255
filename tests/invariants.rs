//! Property-style checks of the universal invariants enumerated for the spanning-tree engine:
//! every query's answer agrees with a naive BFS reachability oracle, validates against
//! [`PathValidator`](spanforest::validator), and patch/inverse-patch round-trips leave query
//! answers unchanged.

use std::collections::VecDeque;

use itertools::Itertools;
use rand::prelude::*;

use spanforest::engine::SpanningTreeEngine;
use spanforest::grid::{Grid, Point};
use spanforest::path_engine::PathEngine;
use spanforest::validator::{validate_query, Verdict};

const MOVES: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (-1, -1),
    (1, 1),
    (-1, 1),
];

/// Whether `from -> to` is a legal, no-corner-cutting 8-adjacency step on `grid`.
fn step_is_legal(grid: &Grid, x: i32, y: i32, dx: i32, dy: i32) -> bool {
    grid.get_xy(x, y + dy) && grid.get_xy(x + dx, y) && grid.get_xy(x + dx, y + dy)
}

/// Naive BFS oracle for 8-adjacency, no-corner-cutting reachability, independent of the engine
/// under test.
fn bfs_reachable(grid: &Grid, start: Point, goal: Point) -> bool {
    if !grid.get(grid.pack(start)) || !grid.get(grid.pack(goal)) {
        return false;
    }
    if start == goal {
        return true;
    }
    let mut visited = vec![false; grid.size()];
    let si = grid.pack(start);
    visited[si] = true;
    let mut queue = VecDeque::from([start]);
    while let Some(p) = queue.pop_front() {
        let (x, y) = (i32::from(p.x), i32::from(p.y));
        for &(dx, dy) in &MOVES {
            if !step_is_legal(grid, x, y, dx, dy) {
                continue;
            }
            let np = Point::new((x + dx) as u16, (y + dy) as u16);
            let id = grid.pack(np);
            if visited[id] {
                continue;
            }
            if np == goal {
                return true;
            }
            visited[id] = true;
            queue.push_back(np);
        }
    }
    false
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

fn random_grid(rng: &mut StdRng, w: u32, h: u32, traversable_prob: f64) -> Grid {
    let mut grid = Grid::new(w, h, false);
    for y in 0..h as u16 {
        for x in 0..w as u16 {
            if rng.gen_bool(traversable_prob) {
                grid.apply_patch(Point::new(x, y), &Grid::new(1, 1, true)).unwrap();
            }
        }
    }
    grid
}

#[test]
fn engine_answers_agree_with_a_naive_bfs_oracle() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..20 {
        let grid = random_grid(&mut rng, 12, 12, 0.75);
        let mut engine = SpanningTreeEngine::new();
        engine.prepare(&grid);

        let cells: Vec<Point> = (0..12u16).cartesian_product(0..12u16).map(|(x, y)| Point::new(x, y)).collect();
        for (&a, &b) in cells.iter().tuple_combinations::<(_, _)>().take(200) {
            let path = drain(&mut engine, a, b);
            let connected = bfs_reachable(&grid, a, b);
            assert_eq!(
                !path.is_empty(),
                connected,
                "engine/oracle disagreement for {a:?} -> {b:?} on a 12x12 grid"
            );
            if connected {
                assert_eq!(validate_query(&grid, &path, a, b), Verdict::Complete);
            }
        }
    }
}

#[test]
fn patch_then_inverse_patch_restores_query_answers() {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    for _ in 0..10 {
        let mut grid = random_grid(&mut rng, 10, 10, 0.8);
        let mut engine = SpanningTreeEngine::new();
        engine.prepare(&grid);

        let before = grid.clone();
        let (px, py) = (rng.gen_range(0..7u16), rng.gen_range(0..7u16));
        let patch = random_grid(&mut rng, 3, 3, 0.5);
        let inverse = {
            let mut sub = Grid::new(3, 3, false);
            for y in 0..3u16 {
                for x in 0..3u16 {
                    if before.get(before.pack(Point::new(px + x, py + y))) {
                        sub.apply_patch(Point::new(x, y), &Grid::new(1, 1, true)).unwrap();
                    }
                }
            }
            sub
        };

        grid.apply_patch(Point::new(px, py), &patch).unwrap();
        engine.on_change(&grid, &[]);
        grid.apply_patch(Point::new(px, py), &inverse).unwrap();
        engine.on_change(&grid, &[]);

        let cells: Vec<Point> = (0..10u16).cartesian_product(0..10u16).map(|(x, y)| Point::new(x, y)).collect();
        for (&a, &b) in cells.iter().tuple_combinations::<(_, _)>().take(100) {
            let expected = bfs_reachable(&before, a, b);
            let path = drain(&mut engine, a, b);
            assert_eq!(!path.is_empty(), expected, "patch/inverse round trip changed reachability for {a:?} -> {b:?}");
        }
    }
}

#[test]
fn on_change_twice_with_no_edit_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0x1234);
    let grid = random_grid(&mut rng, 15, 15, 0.7);
    let mut engine = SpanningTreeEngine::new();
    engine.prepare(&grid);

    let (start, goal) = (Point::new(0, 0), Point::new(14, 14));
    let first = drain(&mut engine, start, goal);

    engine.on_change(&grid, &[]);
    let second = drain(&mut engine, start, goal);

    assert_eq!(first.len(), second.len(), "path length should be stable across a redundant on_change");
}
