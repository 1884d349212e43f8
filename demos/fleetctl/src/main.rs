//! fleetctl: run the fleet controller against the loopback simulator.
//!
//! Builds a synthetic grid (stand-in for a real road network), keeps
//! `target_active` vehicles driving on it, forces `parking_events` removals
//! spread over the run window and writes the trace to `--out`.
//!
//! ```text
//! fleetctl --config run.json --target 80 --begin 06:00 --end 10:00
//! RUST_LOG=fc_control=debug fleetctl --parking-events 200
//! ```

mod cli;

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fc_control::{ControllerBuilder, LoopbackSimulator, RunSummary};
use fc_core::{FleetConfig, format_hm};
use fc_network::{GridSpec, RoadNetwork, build_grid};
use fc_output::{CsvWriter, OutputWriter, TraceObserver};
use fc_schedule::load_density_csv;

use cli::{Cli, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<FleetConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => FleetConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(config.debug);

    // 1. Network.
    let spec = GridSpec {
        rows:           cli.grid_rows,
        cols:           cli.grid_cols,
        spacing_m:      cli.grid_spacing,
        boundary_stubs: !cli.no_stubs,
        ..GridSpec::default()
    };
    let network = Arc::new(build_grid(&spec));
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        diagonal_m = network.bbox_diagonal_m(),
        "grid network built"
    );

    // 2. Output.
    fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating output dir {}", cli.out.display()))?;

    println!("=== fleetctl ===");
    println!(
        "Target {} vehicles  |  {} to {}  |  {} parking events  |  seed {}",
        config.target_active,
        format_hm(config.start_secs),
        format_hm(config.stop_secs),
        config.parking_events,
        config.seed,
    );

    // 3. Run with the chosen backend.
    match cli.format {
        OutputFormat::Csv => run(&cli, config, network, CsvWriter::new(&cli.out)?),
        #[cfg(feature = "sqlite")]
        OutputFormat::Sqlite => run(&cli, config, network, fc_output::SqliteWriter::new(&cli.out)?),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => run(&cli, config, network, fc_output::ParquetWriter::new(&cli.out)?),
        #[allow(unreachable_patterns)]
        other => bail!("output format {other:?} needs fleetctl built with that feature"),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn run<W: OutputWriter>(
    cli:     &Cli,
    config:  FleetConfig,
    network: Arc<RoadNetwork>,
    writer:  W,
) -> Result<()> {
    let sim = LoopbackSimulator::new(Arc::clone(&network)).with_delta_t_ms(cli.step_ms);
    let mut builder = ControllerBuilder::new(config, sim, network);
    if let Some(path) = &cli.density {
        builder = builder.density(load_density_csv(path)?);
    }
    let mut controller = builder.build()?;

    let mut obs = TraceObserver::new(writer);
    if cli.no_events {
        obs = obs.without_events();
    }

    let t0 = Instant::now();
    let summary = controller.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }

    println!(
        "Run complete in {:.3} s ({} vehicles arrived)",
        elapsed.as_secs_f64(),
        controller.simulator().arrivals()
    );
    print_summary(&summary);
    println!("Trace written to {}", cli.out.display());
    Ok(())
}

fn print_summary(s: &RunSummary) {
    let stable = s.stable_at.map_or_else(|| "never".to_owned(), |t| format!("tick {}", t.0));
    let rows: [(&str, String); 12] = [
        ("ticks",                 s.ticks.to_string()),
        ("stable at",             stable),
        ("introduced",            s.introduced.to_string()),
        ("rerouted",              s.rerouted.to_string()),
        ("forced parkings",       s.forced_parkings.to_string()),
        ("uncontrolled parkings", s.uncontrolled_parkings.to_string()),
        ("ramp-up departures",    s.ramp_up_departures.to_string()),
        ("reactivations",         s.reactivations.to_string()),
        ("trip failures",         s.trip_failures.to_string()),
        ("parking shortfall",     s.parking_shortfall.to_string()),
        ("final active",          s.final_active.to_string()),
        ("final parked",          s.final_parked.to_string()),
    ];
    println!();
    println!("{:<24} {:>10}", "Counter", "Value");
    println!("{}", "-".repeat(35));
    for (name, value) in rows {
        println!("{name:<24} {value:>10}");
    }
    println!();
}
