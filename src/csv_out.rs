//! Fixed-schema CSV serialization of [`ResultRow`] (see §6.4 of the results format).

use std::io::{self, Write};

use crate::driver::ResultRow;

/// Column header, in the exact order every row is written.
pub const HEADER: &str =
    "scen,experiment_id,snapshot_id,snapshot_time,path_size,path_length,ref_length,time_cost,20steps_cost,max_step_time";

/// Write the header followed by one line per row of `rows`, tagging every row with `scen_name`
/// (the scenario file's name, which the driver itself never sees).
///
/// # Errors
/// Returns any [`io::Error`] encountered while writing to `out`.
pub fn write_csv(out: &mut impl Write, scen_name: &str, rows: &[ResultRow]) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    for row in rows {
        write_row(out, scen_name, row)?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, scen_name: &str, row: &ResultRow) -> io::Result<()> {
    writeln!(
        out,
        "{scen_name},{},{},{},{},{:.14},{:.14},{},{},{}",
        row.experiment_id,
        row.snapshot_id,
        row.snapshot_time_ns,
        row.path_size,
        row.path_length,
        row.ref_length,
        row.time_cost_ns,
        row.steps_20_cost_ns,
        row.max_step_time_ns,
    )
}
