//! Parsers for the scenario, patch, and plain grid-map text formats.
//!
//! The canonical grammar below is a deliberately stricter subset of the original harness's
//! whitespace/stream-token grammar: one logical record per line. It accepts every well-formed
//! file the looser grammar does, and is far easier to give precise, line-numbered errors for.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ScenarioParseError;
use crate::grid::{Grid, Point, MAX_DIM};

/// One command in a scenario's command stream, in file order.
#[derive(Clone, Debug)]
pub enum Command {
    /// Apply registered patch `patch_id` with its top-left corner at `pos`.
    Patch {
        /// Snapshot bucket this patch belongs to.
        bucket: u32,
        /// Index into the parsed patch file's patch table.
        patch_id: u32,
        /// Placement of the patch's top-left corner.
        pos: Point,
    },
    /// A point-to-point query.
    Query {
        /// Snapshot bucket this query is issued against.
        bucket: u32,
        /// Query start cell.
        start: Point,
        /// Query goal cell.
        goal: Point,
        /// Reference path cost (octile distance under an optimal solver), for reporting only.
        cost: f64,
    },
}

/// A fully parsed scenario: its declared dimensions, the patches its commands reference, and the
/// command stream itself.
pub struct ParsedScenario {
    /// Grid width, as declared by the scenario header.
    pub width: u32,
    /// Grid height, as declared by the scenario header.
    pub height: u32,
    /// Patches registered by the scenario's patch file, indexed by id.
    pub patches: Vec<Grid>,
    /// The interleaved patch/query command stream.
    pub commands: Vec<Command>,
}

type LineResult<T> = Result<T, ScenarioParseError>;

/// Cell alphabet shared by the patch and plain grid-map formats: `.`, `G`, `S` are traversable;
/// `@`, `O`, `T`, `W` are blocked.
fn cell_from_char(ch: char) -> Option<bool> {
    match ch {
        '.' | 'G' | 'S' => Some(true),
        '@' | 'O' | 'T' | 'W' => Some(false),
        _ => None,
    }
}

/// A cursor over a text file's lines, with helpers for the keyword-prefixed header records both
/// the scenario and patch formats are built from.
struct Lines<'a> {
    path: PathBuf,
    lines: std::iter::Peekable<std::str::Lines<'a>>,
    line_no: usize,
}

impl<'a> Lines<'a> {
    fn new(path: &Path, text: &'a str) -> Self {
        Lines {
            path: path.to_path_buf(),
            lines: text.lines().peekable(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }

    fn unexpected(&self, expected: &'static str, found: impl Into<String>) -> ScenarioParseError {
        ScenarioParseError::UnexpectedToken {
            path: self.path.clone(),
            line: self.line_no,
            expected,
            found: found.into(),
        }
    }

    /// Consume a line of the form `"<keyword> <value>"` and parse `value` as `T`.
    fn expect_keyword_value<T: std::str::FromStr>(&mut self, keyword: &'static str) -> LineResult<T> {
        let line = self.next_line().ok_or_else(|| self.unexpected(keyword, "<eof>"))?;
        let mut parts = line.split_whitespace();
        let tok = parts.next().unwrap_or("");
        if tok != keyword {
            return Err(self.unexpected(keyword, tok));
        }
        let value = parts.next().ok_or_else(|| self.unexpected("<value>", ""))?;
        value
            .parse()
            .map_err(|_| self.unexpected("<value>", value))
    }

    /// Consume a line that must be exactly `expected`.
    fn expect_exact(&mut self, expected: &'static str) -> LineResult<()> {
        let line = self.next_line().ok_or_else(|| self.unexpected(expected, "<eof>"))?;
        if line.trim() != expected {
            return Err(self.unexpected(expected, line));
        }
        Ok(())
    }
}

fn check_dimension(
    lines: &Lines<'_>,
    dimension: &'static str,
    value: u32,
) -> LineResult<()> {
    if value == 0 || value > MAX_DIM {
        return Err(ScenarioParseError::DimensionOutOfRange {
            path: lines.path.clone(),
            line: lines.line_no,
            dimension,
            value: i64::from(value),
            max: MAX_DIM,
        });
    }
    Ok(())
}

/// Parse a map body of `height` rows of `width` characters from the cell alphabet into a
/// [`Grid`], starting at the cursor's current position.
fn parse_map_body(lines: &mut Lines<'_>, width: u32, height: u32) -> LineResult<Grid> {
    let mut grid = Grid::new(width, height, false);
    for row in 0..height {
        let line = lines
            .next_line()
            .ok_or_else(|| lines.unexpected("<map row>", "<eof>"))?;
        let chars: Vec<char> = line.chars().collect();
        if chars.len() < width as usize {
            return Err(lines.unexpected("<map row>", line));
        }
        for (col, &ch) in chars.iter().enumerate().take(width as usize) {
            let traversable = cell_from_char(ch).ok_or_else(|| ScenarioParseError::UnknownCellCharacter {
                path: lines.path.clone(),
                row: row as usize,
                col,
                ch,
            })?;
            if traversable {
                grid.apply_patch(Point::new(col as u16, row as u16), &Grid::new(1, 1, true))
                    .expect("single cell always fits");
            }
        }
    }
    Ok(grid)
}

/// Parse a `type patch` file into its registered patches, in id order.
///
/// # Errors
/// Returns [`ScenarioParseError`] on any malformed header, sequencing, or map body.
pub fn parse_patch_file(path: &Path) -> Result<Vec<Grid>, ScenarioParseError> {
    let text = fs::read_to_string(path).map_err(|source| ScenarioParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Lines::new(path, &text);

    lines.expect_exact("type patch")?;
    let count: u32 = lines.expect_keyword_value("patches")?;

    let mut patches = Vec::with_capacity(count as usize);
    for expected_id in 0..count {
        let id: u32 = lines.expect_keyword_value("patch")?;
        if id != expected_id {
            return Err(lines.unexpected("sequential patch id", id.to_string()));
        }
        let height: u32 = lines.expect_keyword_value("height")?;
        let width: u32 = lines.expect_keyword_value("width")?;
        check_dimension(&lines, "width", width)?;
        check_dimension(&lines, "height", height)?;
        lines.expect_exact("map")?;
        patches.push(parse_map_body(&mut lines, width, height)?);
    }
    Ok(patches)
}

/// Parse a `type octile` plain grid-map file into a [`Grid`].
///
/// # Errors
/// Returns [`ScenarioParseError`] on any malformed header or map body.
pub fn parse_grid_map(path: &Path) -> Result<Grid, ScenarioParseError> {
    let text = fs::read_to_string(path).map_err(|source| ScenarioParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Lines::new(path, &text);
    lines.expect_exact("type octile")?;
    let height: u32 = lines.expect_keyword_value("height")?;
    let width: u32 = lines.expect_keyword_value("width")?;
    check_dimension(&lines, "width", width)?;
    check_dimension(&lines, "height", height)?;
    lines.expect_exact("map")?;
    parse_map_body(&mut lines, width, height)
}

fn parse_point(lines: &Lines<'_>, width: u32, height: u32, x: &str, y: &str) -> LineResult<Point> {
    let (x, y): (u16, u16) = (
        x.parse().map_err(|_| lines.unexpected("<u16>", x))?,
        y.parse().map_err(|_| lines.unexpected("<u16>", y))?,
    );
    if u32::from(x) >= width || u32::from(y) >= height {
        return Err(ScenarioParseError::PointOutOfBounds {
            path: lines.path.clone(),
            line: lines.line_no,
            x,
            y,
            width,
            height,
        });
    }
    Ok(Point::new(x, y))
}

/// Parse a version-2 scenario file, loading and registering its companion patch file along the
/// way.
///
/// # Errors
/// Returns [`ScenarioParseError`] on any malformed header, command, or referenced patch.
pub fn parse_scenario(path: &Path) -> Result<ParsedScenario, ScenarioParseError> {
    let text = fs::read_to_string(path).map_err(|source| ScenarioParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Lines::new(path, &text);

    lines.expect_exact("version 2")?;
    let height: u32 = lines.expect_keyword_value("height")?;
    let width: u32 = lines.expect_keyword_value("width")?;
    check_dimension(&lines, "width", width)?;
    check_dimension(&lines, "height", height)?;

    let cost_header = lines
        .next_line()
        .ok_or_else(|| lines.unexpected("<cost column list>", "<eof>"))?;
    let mut cost_names = cost_header.split_whitespace();
    let n_costs: usize = cost_names
        .next()
        .ok_or_else(|| lines.unexpected("<n_costs>", ""))?
        .parse()
        .map_err(|_| lines.unexpected("<n_costs>", cost_header))?;
    let names: Vec<&str> = cost_names.collect();
    if names.len() != n_costs {
        return Err(lines.unexpected("<n_costs matching column count>", cost_header));
    }
    let octile_positions: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, &n)| n == "octile")
        .map(|(i, _)| i)
        .collect();
    if octile_positions.len() != 1 {
        return Err(ScenarioParseError::OctileColumnCount {
            path: lines.path.clone(),
            line: lines.line_no,
            found: octile_positions.len(),
        });
    }
    let octile_pos = octile_positions[0];

    let patch_file: String = lines.expect_keyword_value("patch")?;
    let patch_path = path
        .parent()
        .map_or_else(|| PathBuf::from(&patch_file), |dir| dir.join(&patch_file));
    let patches = parse_patch_file(&patch_path)?;

    lines.expect_exact("commands")?;

    let mut commands = Vec::new();
    loop {
        let Some(line) = lines.lines.peek().copied() else {
            break;
        };
        if line.trim().is_empty() {
            lines.next_line();
            break;
        }
        lines.next_line();
        let mut parts = line.split_whitespace();
        let kind = parts.next().unwrap_or("");
        match kind {
            "P" => {
                let bucket: u32 = parts
                    .next()
                    .ok_or_else(|| lines.unexpected("<bucket>", ""))?
                    .parse()
                    .map_err(|_| lines.unexpected("<bucket>", line))?;
                let patch_id: u32 = parts
                    .next()
                    .ok_or_else(|| lines.unexpected("<patch id>", ""))?
                    .parse()
                    .map_err(|_| lines.unexpected("<patch id>", line))?;
                if patch_id as usize >= patches.len() {
                    return Err(ScenarioParseError::UnknownPatchId {
                        path: lines.path.clone(),
                        id: patch_id,
                        available: patches.len(),
                    });
                }
                let x = parts.next().ok_or_else(|| lines.unexpected("<x>", ""))?;
                let y = parts.next().ok_or_else(|| lines.unexpected("<y>", ""))?;
                let pos = parse_point(&lines, width, height, x, y)?;
                let patch = &patches[patch_id as usize];
                if u32::from(pos.x) + patch.width() > width || u32::from(pos.y) + patch.height() > height {
                    return Err(ScenarioParseError::PatchPlacementOutOfBounds {
                        path: lines.path.clone(),
                        line: lines.line_no,
                        id: patch_id,
                        x: pos.x,
                        y: pos.y,
                        source: crate::grid::PatchOutOfBounds,
                    });
                }
                commands.push(Command::Patch {
                    bucket,
                    patch_id,
                    pos,
                });
            }
            "Q" => {
                let bucket: u32 = parts
                    .next()
                    .ok_or_else(|| lines.unexpected("<bucket>", ""))?
                    .parse()
                    .map_err(|_| lines.unexpected("<bucket>", line))?;
                let sx = parts.next().ok_or_else(|| lines.unexpected("<sx>", ""))?;
                let sy = parts.next().ok_or_else(|| lines.unexpected("<sy>", ""))?;
                let gx = parts.next().ok_or_else(|| lines.unexpected("<gx>", ""))?;
                let gy = parts.next().ok_or_else(|| lines.unexpected("<gy>", ""))?;
                let start = parse_point(&lines, width, height, sx, sy)?;
                let goal = parse_point(&lines, width, height, gx, gy)?;
                let costs: Vec<&str> = parts.collect();
                if costs.len() != n_costs {
                    return Err(lines.unexpected("<cost columns matching header>", line));
                }
                let cost: f64 = costs[octile_pos]
                    .parse()
                    .map_err(|_| lines.unexpected("<f64>", costs[octile_pos]))?;
                commands.push(Command::Query {
                    bucket,
                    start,
                    goal,
                    cost,
                });
            }
            other => {
                return Err(ScenarioParseError::UnknownCommand {
                    path: lines.path.clone(),
                    line: lines.line_no,
                    command: other.to_string(),
                })
            }
        }
    }

    if lines.lines.any(|l| !l.trim().is_empty()) {
        return Err(ScenarioParseError::TrailingGarbage {
            path: path.to_path_buf(),
        });
    }

    Ok(ParsedScenario {
        width,
        height,
        patches,
        commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_minimal_scenario_with_no_patches() {
        let dir = std::env::temp_dir().join("spanforest-scenario-tests");
        fs::create_dir_all(&dir).unwrap();

        write_temp(
            &dir,
            "minimal.patch",
            "type patch\npatches 0\n",
        );
        let scen_path = write_temp(
            &dir,
            "minimal.scen",
            "version 2\nheight 3\nwidth 3\n1 octile\npatch minimal.patch\ncommands\nQ 0 0 0 2 2 2.828\n",
        );

        let scenario = parse_scenario(&scen_path).unwrap();
        assert_eq!(scenario.width, 3);
        assert_eq!(scenario.height, 3);
        assert!(scenario.patches.is_empty());
        assert_eq!(scenario.commands.len(), 1);
        match &scenario.commands[0] {
            Command::Query { start, goal, cost, .. } => {
                assert_eq!(*start, Point::new(0, 0));
                assert_eq!(*goal, Point::new(2, 2));
                assert!((*cost - 2.828).abs() < 1e-6);
            }
            Command::Patch { .. } => panic!("expected a query"),
        }
    }

    #[test]
    fn parses_patch_file_map_body() {
        let dir = std::env::temp_dir().join("spanforest-scenario-tests");
        fs::create_dir_all(&dir).unwrap();
        let path = write_temp(
            &dir,
            "withbody.patch",
            "type patch\npatches 1\npatch 0\nheight 2\nwidth 2\nmap\n.@\n@.\n",
        );
        let patches = parse_patch_file(&path).unwrap();
        assert_eq!(patches.len(), 1);
        let p = &patches[0];
        assert!(p.get(p.pack(Point::new(0, 0))));
        assert!(!p.get(p.pack(Point::new(1, 0))));
        assert!(!p.get(p.pack(Point::new(0, 1))));
        assert!(p.get(p.pack(Point::new(1, 1))));
    }

    #[test]
    fn rejects_unknown_command() {
        let dir = std::env::temp_dir().join("spanforest-scenario-tests");
        fs::create_dir_all(&dir).unwrap();
        write_temp(&dir, "bad.patch", "type patch\npatches 0\n");
        let scen_path = write_temp(
            &dir,
            "bad.scen",
            "version 2\nheight 3\nwidth 3\n1 octile\npatch bad.patch\ncommands\nX 0 0 0 2 2 2.828\n",
        );
        let err = parse_scenario(&scen_path).unwrap_err();
        assert!(matches!(err, ScenarioParseError::UnknownCommand { .. }));
    }

    #[test]
    fn rejects_out_of_bounds_dimension() {
        let dir = std::env::temp_dir().join("spanforest-scenario-tests");
        fs::create_dir_all(&dir).unwrap();
        let scen_path = write_temp(
            &dir,
            "toobig.scen",
            "version 2\nheight 0\nwidth 3\n1 octile\npatch toobig.patch\ncommands\n\n",
        );
        let err = parse_scenario(&scen_path).unwrap_err();
        assert!(matches!(err, ScenarioParseError::DimensionOutOfRange { .. }));
    }
}
