//! Typed error taxonomy for scenario loading and the engine/driver contract.

use std::path::PathBuf;

use crate::grid::PatchOutOfBounds;

/// Everything that can go wrong while loading a scenario and its patch file. Loading aborts on
/// the first one encountered; there is no partial/best-effort load.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioParseError {
    /// A header line did not start with the expected keyword.
    #[error("{path}:{line}: expected '{expected}', found '{found}'")]
    UnexpectedToken {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was expected at this position.
        expected: &'static str,
        /// What was actually found.
        found: String,
    },

    /// A declared width or height fell outside `[1, MAX_DIM]`.
    #[error("{path}:{line}: {dimension} must be between 1 and {max}, got {value}")]
    DimensionOutOfRange {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Which dimension failed the check.
        dimension: &'static str,
        /// The value that was rejected.
        value: i64,
        /// The inclusive upper bound.
        max: u32,
    },

    /// The cost-column header did not contain exactly one `octile` entry.
    #[error("{path}:{line}: expected exactly one 'octile' cost column, found {found}")]
    OctileColumnCount {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// How many `octile` columns were actually found.
        found: usize,
    },

    /// A command line's leading token was neither `P` nor `Q`.
    #[error("{path}:{line}: unknown command '{command}'")]
    UnknownCommand {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The offending token.
        command: String,
    },

    /// A query or patch-placement coordinate fell outside the declared grid dimensions.
    #[error("{path}:{line}: coordinate ({x}, {y}) is out of bounds for a {width}x{height} grid")]
    PointOutOfBounds {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Offending x coordinate.
        x: u16,
        /// Offending y coordinate.
        y: u16,
        /// Declared grid width.
        width: u32,
        /// Declared grid height.
        height: u32,
    },

    /// A patch would not fit within the grid at the position it is applied.
    #[error("{path}:{line}: patch {id} does not fit at ({x}, {y})")]
    PatchPlacementOutOfBounds {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The patch's id.
        id: u32,
        /// Placement x coordinate.
        x: u16,
        /// Placement y coordinate.
        y: u16,
        /// The underlying bounds failure.
        #[source]
        source: PatchOutOfBounds,
    },

    /// A map body contained a character outside the known cell alphabet.
    #[error("{path}: unknown cell character '{ch}' at row {row}, column {col}")]
    UnknownCellCharacter {
        /// File being parsed.
        path: PathBuf,
        /// 0-based row within the map body.
        row: usize,
        /// 0-based column within the map body.
        col: usize,
        /// The offending character.
        ch: char,
    },

    /// A `patch <id>` command referenced an id past the end of the registered patch table.
    #[error("{path}: patch id {id} referenced but only {available} patches are registered")]
    UnknownPatchId {
        /// File being parsed.
        path: PathBuf,
        /// The id that was referenced.
        id: u32,
        /// How many patches actually exist.
        available: usize,
    },

    /// Non-blank content followed the command stream's terminating blank line.
    #[error("{path}: trailing data after the last command")]
    TrailingGarbage {
        /// File being parsed.
        path: PathBuf,
    },

    /// The file could not be read at all.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File that failed to open or read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// A violation of the engine/driver `get_path` segmentation contract, detected while a
/// [`crate::driver::ScenarioDriver`] drains segments for one query.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum EngineProtocolError {
    /// The engine returned a zero-length segment while still claiming `incomplete`, which would
    /// spin the driver forever.
    #[error("engine '{engine}' returned an empty segment marked incomplete for query {query_id}")]
    EmptyIncompleteSegment {
        /// The engine's [`crate::path_engine::PathEngine::name`].
        engine: &'static str,
        /// The query being answered when the violation was observed.
        query_id: u32,
    },
}
