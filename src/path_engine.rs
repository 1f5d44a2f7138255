//! The engine/driver contract, formalizing the GPPC C ABI
//! (`gppc_search_init`/`gppc_map_change`/`gppc_get_path`) as a Rust trait.

use crate::driver::AppliedPatch;
use crate::grid::{Grid, Point};

/// One (possibly partial) answer to a `get_path` query.
#[derive(Clone, Debug, Default)]
pub struct EnginePath {
    /// Points of this segment, in path order from `start` towards `goal`.
    pub points: Vec<Point>,
    /// If `true`, the driver must call [`PathEngine::get_path`] again with the same
    /// `(start, goal)`; the next call's points extend this segment.
    pub incomplete: bool,
}

/// The search backend contract a [`crate::driver::ScenarioDriver`] drives.
///
/// Mirrors the GPPC ABI's `gppc_search_init` / `gppc_map_change` / `gppc_get_path` triad.
/// Construction and `Drop` take the place of `search_init` / `free_data`, since Rust ownership
/// already gives the driver exclusive, lifetime-bounded access to the engine; there is no
/// separate teardown call to model.
pub trait PathEngine {
    /// Build (or rebuild) all internal state from the grid's current contents. Called once
    /// before the first query.
    fn prepare(&mut self, grid: &Grid);

    /// Called between queries whenever at least one patch was applied since the last call.
    /// `grid` already reflects every patch in `patches`; `patches` itself is advisory geometry
    /// an engine may use to limit recomputation, but a correct engine may always ignore it and
    /// fall back to a full [`PathEngine::prepare`]-equivalent rebuild.
    fn on_change(&mut self, grid: &Grid, patches: &[AppliedPatch]);

    /// Advance the current query's segmented answer. A fresh `(start, goal)` pair starts a new
    /// query; while the previously returned [`EnginePath::incomplete`] was `true`, the driver
    /// must call this again with the *same* `(start, goal)` to continue it.
    ///
    /// Returns an empty, non-incomplete [`EnginePath`] if `start` and `goal` are not connected
    /// (including when either is blocked).
    fn get_path(&mut self, start: Point, goal: Point) -> EnginePath;

    /// Stable identifier for this backend, used in output file names and diagnostics.
    fn name(&self) -> &'static str;
}
