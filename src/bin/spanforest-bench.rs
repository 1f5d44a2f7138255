//! `spanforest-bench`: the GPPC dynamic-track CLI shell.
//!
//! `spanforest-bench <-full|-pre|-run|-check> <scenario-path>` loads a scenario, runs it against
//! [`spanforest::engine::SpanningTreeEngine`], and writes `result.csv` (see §6.4/§6.5).

use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use spanforest::csv_out::write_csv;
use spanforest::driver::{EngineProtocolError, ScenarioDriver};
use spanforest::engine::SpanningTreeEngine;
use spanforest::path_engine::PathEngine;

/// Which phases of a benchmark run to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Preprocess the map and run the scenario.
    Full,
    /// Preprocess the map only.
    Pre,
    /// Run the scenario without a separate preprocessing phase.
    Run,
    /// Run the scenario and additionally cross-check every path against the validator.
    Check,
}

impl Mode {
    const fn preprocesses(self) -> bool {
        matches!(self, Mode::Full | Mode::Pre)
    }

    const fn runs(self) -> bool {
        matches!(self, Mode::Full | Mode::Run | Mode::Check)
    }

    const fn checks(self) -> bool {
        matches!(self, Mode::Check)
    }
}

fn parse_mode(flag: &str) -> Result<Mode, String> {
    match flag {
        "-full" => Ok(Mode::Full),
        "-pre" => Ok(Mode::Pre),
        "-run" => Ok(Mode::Run),
        "-check" => Ok(Mode::Check),
        other => Err(format!("unrecognized flag '{other}', expected one of -full/-pre/-run/-check")),
    }
}

/// The benchmark harness's own flags are single-dash (`-full`, not `--full`); `allow_hyphen_values`
/// keeps clap from treating `mode` as an unknown option instead of a positional.
#[derive(Parser, Debug)]
#[command(name = "spanforest-bench", version, about = "GPPC dynamic-track benchmark driver")]
struct Cli {
    /// Which phases to run: one of -full, -pre, -run, -check.
    #[arg(allow_hyphen_values = true, value_parser = parse_mode)]
    mode: Mode,
    /// Path to the scenario file to load.
    scenario: PathBuf,
}

/// `GPPC_REDIRECT_OUTPUT=1` sends the `tracing` subscriber's output to `run.stdout` instead of
/// the terminal, standing in for the original harness's `freopen` of both stdout and stderr: this
/// binary never writes anything but diagnostics through `tracing` and the final CSV through its
/// own file handle, so there is no separate stdout stream to redirect.
fn init_tracing(redirect_output: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if redirect_output {
        let file = File::create("run.stdout").context("creating run.stdout")?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Sample `/proc/self/status` `VmHWM` (peak resident set size) on Linux; a no-op elsewhere.
#[cfg(target_os = "linux")]
fn peak_resident_memory_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status.lines().find_map(|line| {
        let rest = line.strip_prefix("VmHWM:")?;
        rest.trim().trim_end_matches(" kB").trim().parse().ok()
    })
}

#[cfg(not(target_os = "linux"))]
const fn peak_resident_memory_kb() -> Option<u64> {
    None
}

fn write_memory_info(init_elapsed_ns: u128) -> anyhow::Result<()> {
    let mut info = File::create("run.info").context("creating run.info")?;
    writeln!(info, "search_init {init_elapsed_ns}")?;
    if let Some(kb) = peak_resident_memory_kb() {
        writeln!(info, "peak_resident_kb {kb}")?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let redirect_output = std::env::var_os("GPPC_REDIRECT_OUTPUT").is_some();
    let memory_track = std::env::var_os("GPPC_MEMORY_TRACK").is_some();
    init_tracing(redirect_output)?;

    match run(&cli, memory_track) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<EngineProtocolError>().is_some() {
                eprintln!("{err}");
                std::process::exit(2);
            }
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli, memory_track: bool) -> anyhow::Result<()> {
    let mut driver = {
        let _span = tracing::debug_span!("load_scenario", scenario = %cli.scenario.display()).entered();
        ScenarioDriver::load(&cli.scenario)
            .with_context(|| format!("loading scenario {}", cli.scenario.display()))?
    };

    let mut engine = SpanningTreeEngine::new();
    if cli.mode.preprocesses() {
        let _span = tracing::debug_span!("preprocess").entered();
        engine.prepare(driver.active_grid());
    }
    if !cli.mode.runs() {
        return Ok(());
    }

    let init_started = Instant::now();
    // `prepare` always rebuilds from scratch, so calling it again here (even after `-pre` already
    // did) mirrors the harness calling `gppc_search_init` unconditionally before running.
    engine.prepare(driver.active_grid());
    let init_elapsed_ns = init_started.elapsed().as_nanos();

    if memory_track {
        write_memory_info(init_elapsed_ns)?;
    }

    let rows = {
        let _span = tracing::debug_span!("run_queries").entered();
        driver.run(&mut engine, cli.mode.checks())?
    };

    let scen_name = cli
        .scenario
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.scenario.display().to_string());
    let mut out = File::create("result.csv").context("creating result.csv")?;
    write_csv(&mut out, &scen_name, &rows).context("writing result.csv")?;

    tracing::info!(queries = rows.len(), "scenario run complete");
    Ok(())
}
