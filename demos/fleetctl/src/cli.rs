//! Command-line flags.  Every flag left unset keeps the value from the
//! config file (or `FleetConfig::default()` when no file is given).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use fc_core::FleetConfig;

#[derive(Parser, Debug)]
#[command(
    name = "fleetctl",
    about = "Keep a simulated fleet at its target size and force scheduled parkings",
    long_about = "Runs the fleet controller against the in-process loopback simulator\n\
                  on a synthetic grid network and writes a per-tick trace."
)]
pub struct Cli {
    /// JSON run configuration; missing fields take their defaults
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Headerless `second,density` CSV; uniform over the run window if absent
    #[arg(long)]
    pub density: Option<PathBuf>,

    /// Output directory for trace files
    #[arg(long, default_value = "output/fleetctl")]
    pub out: PathBuf,

    #[arg(value_enum, long, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Write trace rows only, no per-agent events
    #[arg(long)]
    pub no_events: bool,

    // ── Config overrides ──────────────────────────────────────────────────
    #[arg(long, env = "FLEETCTL_SEED")]
    pub seed: Option<u64>,

    /// Minimum trip distance in metres
    #[arg(long)]
    pub min_distance: Option<f64>,

    #[arg(long)]
    pub fringe_factor: Option<f64>,

    /// Start of the run, `HH:MM` or seconds of day
    #[arg(long, value_parser = parse_time_of_day)]
    pub begin: Option<u64>,

    /// End of the run, `HH:MM` or seconds of day
    #[arg(long, value_parser = parse_time_of_day)]
    pub end: Option<u64>,

    /// Agents introduced per tick at most
    #[arg(long)]
    pub max_new: Option<u32>,

    #[arg(long)]
    pub target: Option<u32>,

    #[arg(long)]
    pub parking_events: Option<u64>,

    #[arg(long)]
    pub trace_every: Option<u64>,

    /// Log every controller decision
    #[arg(long)]
    pub debug: bool,

    // ── Network and simulator ─────────────────────────────────────────────
    #[arg(long, default_value_t = 6)]
    pub grid_rows: u32,

    #[arg(long, default_value_t = 6)]
    pub grid_cols: u32,

    /// Block length in metres
    #[arg(long, default_value_t = 200.0)]
    pub grid_spacing: f32,

    /// Leave out the one-way boundary stubs
    #[arg(long)]
    pub no_stubs: bool,

    /// Simulator step length in milliseconds
    #[arg(long, default_value_t = 1_000)]
    pub step_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Sqlite,
    Parquet,
}

impl Cli {
    /// Lay the flag overrides over `config`.
    pub fn apply(&self, config: &mut FleetConfig) {
        if let Some(v) = self.seed           { config.seed = v; }
        if let Some(v) = self.min_distance   { config.min_trip_distance_m = v; }
        if let Some(v) = self.fringe_factor  { config.fringe_factor = v; }
        if let Some(v) = self.begin          { config.start_secs = v; }
        if let Some(v) = self.end            { config.stop_secs = v; }
        if let Some(v) = self.max_new        { config.max_new_per_second = v; }
        if let Some(v) = self.target         { config.target_active = v; }
        if let Some(v) = self.parking_events { config.parking_events = v; }
        if let Some(v) = self.trace_every    { config.trace_interval_ticks = v; }
        config.debug |= self.debug;
    }
}

fn parse_time_of_day(s: &str) -> Result<u64, String> {
    let secs = match s.split_once(':') {
        Some((h, m)) => {
            let h: u64 = h.parse().map_err(|_| format!("bad hour in {s:?}"))?;
            let m: u64 = m.parse().map_err(|_| format!("bad minute in {s:?}"))?;
            if m >= 60 {
                return Err(format!("minute out of range in {s:?}"));
            }
            h * 3600 + m * 60
        }
        None => s.parse().map_err(|_| format!("expected HH:MM or seconds, got {s:?}"))?,
    };
    if secs > 86_400 {
        return Err(format!("{s:?} lies beyond the end of the day"));
    }
    Ok(secs)
}
