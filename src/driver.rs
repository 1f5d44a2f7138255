//! Maintains the active grid under patch application and drives the engine/query loop.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::ScenarioParseError;
use crate::grid::{Grid, Point};
use crate::path_engine::PathEngine;
use crate::scenario::{parse_scenario, Command};
use crate::validator::{self, Verdict};

pub use crate::error::EngineProtocolError;

/// The Euclidean path length beyond which [`ResultRow::steps_20_cost_ns`] stops accumulating,
/// matching the benchmark's "time to the first 20 units of path length" column.
const PATH_FIRST_STEP_LENGTH: f64 = 20.0;

/// Geometry of one patch applied between two queries, handed to [`PathEngine::on_change`] as
/// advisory information an engine may use to limit recomputation.
#[derive(Clone, Copy, Debug)]
pub struct AppliedPatch {
    /// Top-left corner the patch was applied at.
    pub pos: Point,
    /// Patch width.
    pub width: u32,
    /// Patch height.
    pub height: u32,
}

/// Timing and outcome fields for one query, in the exact column order of the results CSV (the
/// `scen` filename column is prepended by the CLI shell, which is the only layer that knows the
/// scenario's path).
#[derive(Clone, Copy, Debug)]
pub struct ResultRow {
    /// Sequential id of this query within the scenario, from 0.
    pub experiment_id: u32,
    /// The query's declared bucket, i.e. the map-state epoch it was issued against.
    pub snapshot_id: u32,
    /// Nanoseconds spent in `on_change` immediately before this query, or 0 if nothing changed.
    pub snapshot_time_ns: u64,
    /// Number of points in the returned path, 0 if no path was found.
    pub path_size: u32,
    /// Sum of Euclidean distances between consecutive returned points, or -1 if no path.
    pub path_length: f64,
    /// The scenario's declared reference (optimal) octile cost for this query.
    pub ref_length: f64,
    /// Total nanoseconds spent across every `get_path` segment call for this query (the first
    /// segment's cost includes `snapshot_time_ns`).
    pub time_cost_ns: u64,
    /// Cumulative nanoseconds until the concatenated path first reached Euclidean length
    /// `20 - 1e-6`, tracked across segment boundaries.
    pub steps_20_cost_ns: u64,
    /// The single slowest segment call's nanosecond cost (the first segment's cost includes
    /// `snapshot_time_ns`, matching the benchmark harness).
    pub max_step_time_ns: u64,
}

fn euclidean(a: Point, b: Point) -> f64 {
    let dx = f64::from(a.x) - f64::from(b.x);
    let dy = f64::from(a.y) - f64::from(b.y);
    dx.hypot(dy)
}

fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| euclidean(w[0], w[1])).sum()
}

/// Owns the active grid and the parsed command stream, and drives a [`PathEngine`] through the
/// interleaved patch/query sequence a scenario describes.
pub struct ScenarioDriver {
    patches: Vec<Grid>,
    commands: Vec<Command>,
    cursor: usize,
    grid: Grid,
    next_experiment_id: u32,
    current: Option<(u32, u32, Point, Point, f64)>,
    last_applied: Vec<AppliedPatch>,
}

impl ScenarioDriver {
    /// Load a scenario file and its companion patch file, and build the active grid.
    ///
    /// The active grid starts fully traversable at the scenario's declared dimensions; patch
    /// commands are what carve obstacles (or re-open cells) into it as the command stream plays
    /// out, matching the benchmark harness's own initial all-traversable active map.
    ///
    /// # Errors
    /// Returns [`ScenarioParseError`] on any malformed header, command, or referenced patch file.
    pub fn load(scenario_path: &Path) -> Result<Self, ScenarioParseError> {
        let parsed = parse_scenario(scenario_path)?;
        Ok(ScenarioDriver {
            patches: parsed.patches,
            commands: parsed.commands,
            cursor: 0,
            grid: Grid::new(parsed.width, parsed.height, true),
            next_experiment_id: 0,
            current: None,
            last_applied: Vec::new(),
        })
    }

    /// The in-memory current grid state, as of the last applied patch.
    #[must_use]
    pub fn active_grid(&self) -> &Grid {
        &self.grid
    }

    /// Patches applied by the most recent [`ScenarioDriver::next_query`] call.
    #[must_use]
    pub fn applied_patches(&self) -> &[AppliedPatch] {
        &self.last_applied
    }

    /// Advance the command cursor, applying every `P`-command encountered, stopping at the next
    /// `Q`-command (which becomes retrievable via [`ScenarioDriver::current_query`]).
    ///
    /// Returns the number of patches applied since the previous query, or -1 if the command
    /// stream is exhausted with no further query.
    pub fn next_query(&mut self) -> i64 {
        self.last_applied.clear();
        let mut applied: i64 = 0;
        loop {
            let Some(command) = self.commands.get(self.cursor) else {
                self.current = None;
                return -1;
            };
            match *command {
                Command::Patch { patch_id, pos, .. } => {
                    let patch = &self.patches[patch_id as usize];
                    self.grid
                        .apply_patch(pos, patch)
                        .expect("patch placement was validated at load time");
                    self.last_applied.push(AppliedPatch {
                        pos,
                        width: patch.width(),
                        height: patch.height(),
                    });
                    applied += 1;
                    self.cursor += 1;
                }
                Command::Query { bucket, start, goal, cost } => {
                    let id = self.next_experiment_id;
                    self.next_experiment_id += 1;
                    self.current = Some((id, bucket, start, goal, cost));
                    self.cursor += 1;
                    return applied;
                }
            }
        }
    }

    /// `(query_id, bucket, start, goal, reference_cost)` for the query most recently positioned
    /// by [`ScenarioDriver::next_query`], or `None` if the stream is exhausted.
    #[must_use]
    pub fn current_query(&self) -> Option<(u32, u32, Point, Point, f64)> {
        self.current
    }

    /// Run every query in the scenario against `engine`, returning one [`ResultRow`] per query in
    /// file order.
    ///
    /// The scenario's leading patch set (bucket 0, up to the first query) is folded into the
    /// initial [`PathEngine::prepare`] call rather than a timed [`PathEngine::on_change`],
    /// matching the benchmark harness's own `search_init`-after-initial-patches ordering; that
    /// first query's `snapshot_time_ns` is therefore always 0.
    ///
    /// When `check` is `true`, each completed query's path is cross-checked against
    /// [`crate::validator::validate_query`] and any outcome other than [`Verdict::Complete`] is
    /// logged via `tracing::warn!` rather than aborting the run.
    ///
    /// # Errors
    /// Returns [`EngineProtocolError`] if an engine violates the `get_path` segmentation contract
    /// (an empty segment marked incomplete).
    pub fn run(
        &mut self,
        engine: &mut dyn PathEngine,
        check: bool,
    ) -> Result<Vec<ResultRow>, EngineProtocolError> {
        if self.next_query() < 0 {
            return Ok(Vec::new());
        }
        engine.prepare(&self.grid);

        let mut rows = Vec::new();
        let mut pending_snapshot_time = Duration::ZERO;
        loop {
            let Some((experiment_id, bucket, start, goal, ref_length)) = self.current_query()
            else {
                break;
            };

            let (points, time_cost, steps_20_cost, max_step_time) = self.drain_query(
                engine,
                start,
                goal,
                experiment_id,
                pending_snapshot_time,
            )?;

            if check {
                self.check_path(&points, start, goal);
            }

            let path_size = u32::try_from(points.len()).unwrap_or(u32::MAX);
            let path_length = if points.is_empty() { -1.0 } else { path_length(&points) };

            rows.push(ResultRow {
                experiment_id,
                snapshot_id: bucket,
                snapshot_time_ns: duration_as_nanos(pending_snapshot_time),
                path_size,
                path_length,
                ref_length,
                time_cost_ns: duration_as_nanos(time_cost),
                steps_20_cost_ns: duration_as_nanos(steps_20_cost),
                max_step_time_ns: duration_as_nanos(max_step_time),
            });

            let patches_applied = self.next_query();
            if patches_applied < 0 {
                break;
            }
            pending_snapshot_time = if patches_applied > 0 {
                let before = Instant::now();
                engine.on_change(&self.grid, &self.last_applied);
                before.elapsed()
            } else {
                Duration::ZERO
            };
        }
        Ok(rows)
    }

    /// Run the timed segment loop for one query: repeatedly call `engine.get_path(start, goal)`
    /// until it reports `incomplete = false`, concatenating segments and tracking the three
    /// timing columns. `snapshot_time` (already elapsed before this call) is folded onto the
    /// first segment's cost, matching the benchmark harness's `tcost_curr = snapshot_time`
    /// initialisation.
    fn drain_query(
        &mut self,
        engine: &mut dyn PathEngine,
        start: Point,
        goal: Point,
        experiment_id: u32,
        snapshot_time: Duration,
    ) -> Result<(Vec<Point>, Duration, Duration, Duration), EngineProtocolError> {
        let mut points = Vec::new();
        let mut time_cost = Duration::ZERO;
        let mut steps_20_cost = Duration::ZERO;
        let mut max_step_time = Duration::ZERO;
        let mut reached_20 = false;
        let mut first_segment = true;

        loop {
            let before = Instant::now();
            let segment = engine.get_path(start, goal);
            let mut segment_time = before.elapsed();
            if first_segment {
                segment_time += snapshot_time;
                first_segment = false;
            }

            if segment.points.is_empty() && segment.incomplete {
                return Err(EngineProtocolError::EmptyIncompleteSegment {
                    engine: engine.name(),
                    query_id: experiment_id,
                });
            }

            points.extend(segment.points);
            max_step_time = max_step_time.max(segment_time);
            time_cost += segment_time;
            if !reached_20 {
                steps_20_cost += segment_time;
                if path_length(&points) >= PATH_FIRST_STEP_LENGTH - 1e-6 {
                    reached_20 = true;
                }
            }

            if !segment.incomplete {
                break;
            }
        }
        Ok((points, time_cost, steps_20_cost, max_step_time))
    }

    fn check_path(&self, points: &[Point], start: Point, goal: Point) {
        if points.is_empty() {
            return;
        }
        match validator::validate_query(&self.grid, points, start, goal) {
            Verdict::Complete => {}
            other => {
                tracing::warn!(?other, ?start, ?goal, "path validation failed");
            }
        }
    }
}

fn duration_as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SpanningTreeEngine;
    use std::fs;
    use std::io::Write;

    fn write_temp(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn scratch_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("spanforest-driver-tests");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn single_query_scenario_produces_one_row() {
        let dir = scratch_dir();
        write_temp(&dir, "single.patch", "type patch\npatches 0\n");
        let scen = write_temp(
            &dir,
            "single.scen",
            "version 2\nheight 3\nwidth 3\n1 octile\npatch single.patch\ncommands\nQ 0 0 0 2 2 2.828\n",
        );

        let mut driver = ScenarioDriver::load(&scen).unwrap();
        let mut engine = SpanningTreeEngine::new();
        let rows = driver.run(&mut engine, true).unwrap();

        assert_eq!(rows.len(), 1);
        let row = rows[0];
        assert_eq!(row.experiment_id, 0);
        assert_eq!(row.snapshot_id, 0);
        assert_eq!(row.snapshot_time_ns, 0);
        assert!(row.path_size >= 2);
        assert!(row.path_length > 0.0);
    }

    #[test]
    fn patch_opens_a_blocked_region_before_query_succeeds() {
        let dir = scratch_dir();
        write_temp(
            &dir,
            "open.patch",
            "type patch\npatches 1\npatch 0\nheight 3\nwidth 3\nmap\n...\n...\n...\n",
        );
        let scen = write_temp(
            &dir,
            "open.scen",
            concat!(
                "version 2\nheight 5\nwidth 5\n1 octile\npatch open.patch\ncommands\n",
                "P 0 0 0 0\n",
                "Q 0 0 0 2 2 2.828\n",
            ),
        );

        let mut driver = ScenarioDriver::load(&scen).unwrap();
        // The rest of the 5x5 grid stays fully traversable (default fill); the patch only
        // narrows the top-left 3x3 corner, so this exercises patch application without needing
        // a blocked base grid.
        let mut engine = SpanningTreeEngine::new();
        let rows = driver.run(&mut engine, false).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].path_size >= 2);
    }

    #[test]
    fn no_path_query_reports_sentinel_length() {
        let dir = scratch_dir();
        write_temp(
            &dir,
            "wall.patch",
            "type patch\npatches 1\npatch 0\nheight 1\nwidth 3\nmap\n@@@\n",
        );
        let scen = write_temp(
            &dir,
            "wall.scen",
            concat!(
                "version 2\nheight 3\nwidth 3\n1 octile\npatch wall.patch\ncommands\n",
                "P 0 0 0 1\n",
                "Q 0 0 0 2 2 2.828\n",
            ),
        );

        let mut driver = ScenarioDriver::load(&scen).unwrap();
        let mut engine = SpanningTreeEngine::new();
        let rows = driver.run(&mut engine, false).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path_size, 0);
        assert!((rows[0].path_length - (-1.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_time_is_zero_for_first_query_and_nonzero_after_a_mid_stream_patch() {
        let dir = scratch_dir();
        write_temp(&dir, "mid.patch", "type patch\npatches 1\npatch 0\nheight 1\nwidth 1\nmap\n.\n");
        let scen = write_temp(
            &dir,
            "mid.scen",
            concat!(
                "version 2\nheight 3\nwidth 3\n1 octile\npatch mid.patch\ncommands\n",
                "Q 0 0 0 2 2 2.828\n",
                "P 1 0 1 1\n",
                "Q 1 0 0 2 2 2.828\n",
            ),
        );

        let mut driver = ScenarioDriver::load(&scen).unwrap();
        let mut engine = SpanningTreeEngine::new();
        let rows = driver.run(&mut engine, false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].snapshot_time_ns, 0);
        assert_eq!(rows[1].snapshot_id, 1);
    }
}
