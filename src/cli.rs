//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the solarsim application.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use solarsim::atmosphere::DEFAULT_CLEARNESS;
use solarsim::simulation::DEFAULT_STEP_MINUTES;
use solarsim::solar_panel::{
    DEFAULT_ALBEDO, DEFAULT_AREA_M2, DEFAULT_DIFFUSE_FRACTION, DEFAULT_EFFICIENCY,
};

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG also works
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sun altitude and azimuth for a location and local time
    Position(PositionArgs),
    /// Irradiance and PV output across one day, with CSV/JSON export
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
pub struct LocationArgs {
    /// Observer latitude in decimal degrees (-90 to 90)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_latitude, env = "SOLARSIM_LATITUDE")]
    pub latitude: f64,
    /// Observer longitude in decimal degrees (-180 to 180)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_longitude, env = "SOLARSIM_LONGITUDE")]
    pub longitude: f64,
    /// Fixed offset of local time from UTC in hours (e.g. 2, -5, 5.5); no DST applied
    #[arg(long, allow_hyphen_values = true, value_parser = parse_utc_offset, env = "SOLARSIM_UTC_OFFSET")]
    pub utc_offset: f64,
}

#[derive(Args, Debug)]
pub struct PositionArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Local date and time ("YYYY-MM-DD HH:MM[:SS]")
    #[arg(long)]
    pub datetime: String,

    /// Also show the NREL SPA position for comparison
    #[arg(long)]
    pub reference: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Date to simulate (e.g., "2024-06-21" or "today")
    #[arg(long)]
    pub date: String,

    // ===================== SOLAR PANEL OPTIONS =====================
    /// Panel tilt in degrees (0 = flat facing up, 90 = vertical, 180 = facing down)
    #[arg(long, default_value_t = 30.0, value_parser = parse_tilt, env = "SOLARSIM_TILT")]
    pub tilt: f64,

    /// Panel azimuth in degrees (180 = facing south); taken mod 360
    #[arg(long, default_value_t = 180.0, allow_hyphen_values = true, value_parser = parse_finite, env = "SOLARSIM_AZIMUTH")]
    pub azimuth: f64,

    /// Panel area in square meters
    #[arg(long, default_value_t = DEFAULT_AREA_M2, value_parser = parse_positive_f64, env = "SOLARSIM_AREA")]
    pub area: f64,

    /// Panel efficiency (0.0-1.0, typical ~0.18-0.22 for silicon)
    #[arg(long, default_value_t = DEFAULT_EFFICIENCY, value_parser = parse_efficiency, env = "SOLARSIM_EFFICIENCY")]
    pub efficiency: f64,

    /// Ground albedo for reflected radiation (0.0-1.0, 0.2 = grass, 0.8 = snow)
    #[arg(long, default_value_t = DEFAULT_ALBEDO, value_parser = parse_fraction, env = "SOLARSIM_ALBEDO")]
    pub albedo: f64,

    /// Atmospheric clearness index τ (beam transmittance, 0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_CLEARNESS, value_parser = parse_fraction, env = "SOLARSIM_TAU")]
    pub tau: f64,

    /// Diffuse share of global horizontal irradiance (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_DIFFUSE_FRACTION, value_parser = parse_fraction, env = "SOLARSIM_DIFFUSE_FRACTION")]
    pub diffuse_fraction: f64,

    /// Sampling interval in minutes; must divide 1440
    #[arg(long, default_value_t = DEFAULT_STEP_MINUTES, value_parser = parse_step_minutes, env = "SOLARSIM_STEP_MINUTES")]
    pub step_minutes: u32,

    // ===================== OUTPUT OPTIONS =====================
    /// CSV output path (default: sim_YYYYMMDD.csv in the current directory)
    #[arg(long, conflicts_with = "no_csv")]
    pub csv: Option<PathBuf>,

    /// Do not write a CSV file
    #[arg(long)]
    pub no_csv: bool,

    /// Also write the full series as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Print the per-step table
    #[arg(long)]
    pub table: bool,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_f64(s: &str) -> Result<f64, String> {
    s.trim().parse().map_err(|_| format!("Invalid number: {}", s))
}

fn parse_finite(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !v.is_finite() {
        return Err(format!("Value must be finite, got {}", v));
    }
    Ok(v)
}

fn parse_latitude(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(-90.0..=90.0).contains(&v) {
        return Err(format!("Latitude must be between -90 and 90, got {}", v));
    }
    Ok(v)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(-180.0..=180.0).contains(&v) {
        return Err(format!("Longitude must be between -180 and 180, got {}", v));
    }
    Ok(v)
}

fn parse_utc_offset(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(-14.0..=14.0).contains(&v) {
        return Err(format!("UTC offset must be between -14 and 14 hours, got {}", v));
    }
    Ok(v)
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(v > 0.0 && v.is_finite()) {
        return Err(format!("Value must be positive, got {}", v));
    }
    Ok(v)
}

fn parse_tilt(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(0.0..=180.0).contains(&v) {
        return Err(format!("Tilt must be between 0 and 180 degrees, got {}", v));
    }
    Ok(v)
}

fn parse_efficiency(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(v > 0.0 && v <= 1.0) {
        return Err(format!("Efficiency must be greater than 0 and at most 1, got {}", v));
    }
    Ok(v)
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let v = parse_f64(s)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("Value must be between 0.0 and 1.0, got {}", v));
    }
    Ok(v)
}

fn parse_step_minutes(s: &str) -> Result<u32, String> {
    let v: u32 = s.trim().parse().map_err(|_| format!("Invalid integer: {}", s))?;
    if v == 0 || 1440 % v != 0 {
        return Err(format!("Step must divide 1440 minutes evenly, got {}", v));
    }
    Ok(v)
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from([
            "solarsim",
            "simulate",
            "--latitude",
            "40.4168",
            "--longitude",
            "-3.7038",
            "--utc-offset",
            "2",
            "--date",
            "2024-06-21",
        ])
        .unwrap();

        let Command::Simulate(args) = cli.command else { panic!("expected simulate") };
        assert_eq!(args.location.longitude, -3.7038);
        assert_eq!(args.tilt, 30.0);
        assert_eq!(args.azimuth, 180.0);
        assert_eq!(args.area, 1.6);
        assert_eq!(args.efficiency, 0.18);
        assert_eq!(args.step_minutes, 30);
        assert!(args.csv.is_none() && !args.no_csv);
    }

    #[test]
    fn test_parse_position_negative_offset() {
        let cli = Cli::try_parse_from([
            "solarsim",
            "position",
            "--latitude",
            "-33.9",
            "--longitude",
            "18.4",
            "--utc-offset",
            "-5",
            "--datetime",
            "2024-06-21 12:00",
            "--reference",
        ])
        .unwrap();

        let Command::Position(args) = cli.command else { panic!("expected position") };
        assert_eq!(args.location.utc_offset, -5.0);
        assert!(args.reference);
    }

    #[test]
    fn test_rejects_tilt_200() {
        let res = Cli::try_parse_from([
            "solarsim",
            "simulate",
            "--latitude",
            "40",
            "--longitude",
            "0",
            "--utc-offset",
            "0",
            "--date",
            "2024-06-21",
            "--tilt",
            "200",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_value_parsers() {
        assert!(parse_latitude("91").is_err());
        assert!(parse_latitude("abc").is_err());
        assert_eq!(parse_longitude("-180").unwrap(), -180.0);
        assert!(parse_efficiency("1.5").is_err());
        assert!(parse_efficiency("0").is_err());
        assert_eq!(parse_efficiency("1").unwrap(), 1.0);
        assert!(parse_positive_f64("0").is_err());
        assert!(parse_fraction("1.01").is_err());
        assert_eq!(parse_step_minutes("15").unwrap(), 15);
        assert!(parse_step_minutes("7").is_err());
        assert!(parse_utc_offset("15").is_err());
        assert!(parse_finite("inf").is_err());
        assert_eq!(parse_finite("-90").unwrap(), -90.0);
    }
}
