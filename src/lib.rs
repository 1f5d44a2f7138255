#![deny(missing_docs)]

//! Dynamic 8-connected grid pathfinding for the GPPC dynamic-track benchmark.
//!
//! The production search backend is [`engine::SpanningTreeEngine`]: a spanning forest, one
//! shortest-path tree per connected component, rebuilt from scratch whenever the grid changes and
//! queried by walking both endpoints' predecessor chains to their lowest common ancestor. Two
//! illustrative, non-amortized baselines ([`baseline::AstarEngine`],
//! [`baseline::PerQueryDijkstraEngine`]) implement the same [`path_engine::PathEngine`] trait for
//! correctness cross-checks.
//!
//! [`driver::ScenarioDriver`] loads a benchmark scenario (§6.1-6.3), maintains the active grid
//! under patch application, and drives any [`path_engine::PathEngine`] through the interleaved
//! patch/query command stream, emitting one [`driver::ResultRow`] per query.

pub mod baseline;
pub mod csv_out;
pub mod driver;
pub mod engine;
pub mod error;
pub mod flood_fill;
pub mod grid;
pub mod node;
pub mod path_engine;
pub mod priority;
pub mod scenario;
pub mod validator;

mod dijkstra;
