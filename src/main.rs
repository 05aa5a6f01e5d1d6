use chrono::Utc;
use clap::Parser;
use log::{LevelFilter, info, warn};

use solarsim::output::{
    default_csv_name, print_position, print_simulation_summary, print_table, save_csv, save_json,
};
use solarsim::simulation::simulate_day;
use solarsim::solar::{reference_position, solar_position};
use solarsim::time::{parse_local_date, parse_local_datetime, to_utc};
use solarsim::{GeoLocation, PanelConfig};

mod cli;

use cli::{Cli, Command, LocationArgs, PositionArgs, SimulateArgs};

// ===================== MAIN =====================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Position(args) => run_position(args),
        Command::Simulate(args) => run_simulate(args),
    }
}

/// Warn by default; each `-v` raises the level. `RUST_LOG` takes precedence.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn location(args: &LocationArgs) -> GeoLocation {
    GeoLocation::new(args.latitude, args.longitude)
}

// ===================== SUBCOMMANDS =====================

fn run_position(args: PositionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loc = location(&args.location);
    let offset = args.location.utc_offset;
    let local = parse_local_datetime(&args.datetime)?;
    let utc = to_utc(local, offset);

    let pos = solar_position(&loc, &utc);
    let reference = if args.reference {
        match reference_position(&loc, &utc) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("SPA reference unavailable for {}: {}", utc, e);
                None
            }
        }
    } else {
        None
    };

    print_position(&loc, local, offset, &pos, reference.as_ref());
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loc = location(&args.location);
    let offset = args.location.utc_offset;
    let date = parse_local_date(&args.date, Utc::now(), offset)?;

    let panel = PanelConfig::new(args.tilt, args.azimuth, args.area, args.efficiency)?
        .with_albedo(args.albedo)
        .with_clearness(args.tau)
        .with_diffuse_fraction(args.diffuse_fraction);

    let series = simulate_day(&loc, &panel, date, offset, args.step_minutes)?;

    print_simulation_summary(&series);
    if args.table {
        print_table(&series);
    }

    if !args.no_csv {
        let path = args.csv.unwrap_or_else(|| default_csv_name(date));
        save_csv(&series, &path)?;
        info!("wrote {} rows to {}", series.rows.len(), path.display());
        println!("CSV saved to {}", path.display());
    }

    if let Some(path) = args.json {
        save_json(&series, &path)?;
        info!("wrote JSON report to {}", path.display());
        println!("JSON saved to {}", path.display());
    }

    Ok(())
}
