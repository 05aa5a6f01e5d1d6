//! Output Formatting Module
//!
//! Terminal reports and the tabular/JSON exports of a simulated day. These
//! are the hand-off to any plotting or spreadsheet tool; nothing here renders
//! charts.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::geo::GeoLocation;
use crate::simulation::DailySeries;
use crate::solar::SolarPosition;
use crate::solar_panel::{format_energy, format_irradiance, format_power};
use crate::time::DATETIME_FORMAT;

// ===================== TERMINAL OUTPUT =====================

/// Print the sun position for one local instant.
///
/// # Arguments
/// * `location` - Observer location
/// * `datetime_local` - Local wall-clock time
/// * `utc_offset_hours` - Offset of local time from UTC
/// * `pos` - Position from the simplified model
/// * `reference` - Optional NREL SPA position for comparison
pub fn print_position(
    location: &GeoLocation,
    datetime_local: NaiveDateTime,
    utc_offset_hours: f64,
    pos: &SolarPosition,
    reference: Option<&SolarPosition>,
) {
    println!("Location : lat={:.4}, lon={:.4}", location.latitude, location.longitude);
    println!(
        "Sun position at {} (UTC{:+}):",
        datetime_local.format("%Y-%m-%d %H:%M"),
        utc_offset_hours
    );
    println!(" - Altitude: {:.2}°", pos.altitude_deg);
    println!(" - Azimuth: {:.2}°", pos.azimuth_deg);
    if !pos.is_sun_up() {
        println!("   (sun below the horizon)");
    }

    if let Some(r) = reference {
        println!();
        println!("NREL SPA reference (no refraction):");
        println!(
            " - Altitude: {:.2}° (diff {:+.2}°)",
            r.altitude_deg,
            pos.altitude_deg - r.altitude_deg
        );
        println!(" - Azimuth: {:.2}° (diff {:+.2}°)", r.azimuth_deg, azimuth_difference(pos, r));
    }
}

/// Signed azimuth difference in degrees, wrapped to (-180, 180].
fn azimuth_difference(a: &SolarPosition, b: &SolarPosition) -> f64 {
    let d = (a.azimuth_deg - b.azimuth_deg).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Print the configuration and results of a simulated day.
pub fn print_simulation_summary(series: &DailySeries) {
    let panel = &series.panel;

    println!("=== Clear-Sky PV Simulation ===");
    println!(
        "Location  : lat={:.4}, lon={:.4} (UTC{:+})",
        series.location.latitude, series.location.longitude, series.utc_offset_hours
    );
    println!("Date      : {}", series.date);
    println!(
        "Panel     : {:.2} m² @ {:.0}° tilt, {:.0}° azimuth",
        panel.area_m2, panel.tilt_deg, panel.azimuth_deg
    );
    println!(
        "Efficiency: {:.1}% | Clearness τ: {:.2} | Albedo: {:.2} | Diffuse: {:.2}",
        panel.efficiency * 100.0,
        panel.clearness,
        panel.albedo,
        panel.diffuse_fraction
    );
    println!("Steps     : {} x {} min", series.rows.len(), series.step_minutes);
    println!();

    let daylight: Vec<_> = series.daylight_rows().collect();
    match (daylight.first(), daylight.last()) {
        (Some(first), Some(last)) => {
            println!("First step with sun up : {}", first.datetime_local.format("%H:%M"));
            println!("Last step with sun up  : {}", last.datetime_local.format("%H:%M"));
        }
        _ => println!("Sun stays below the horizon all day."),
    }

    if let Some(peak) = series.peak() {
        println!(
            "Peak      : {} at {} (POA {}, altitude {:.1}°)",
            format_power(peak.power_w),
            peak.datetime_local.format("%H:%M"),
            format_irradiance(peak.irradiance_wm2),
            peak.altitude_deg
        );
    }
    println!();
    println!(
        "Total energy generated on {}: {}",
        series.date,
        format_energy(series.total_energy_kwh())
    );
}

/// Print the per-step table to stdout.
pub fn print_table(series: &DailySeries) {
    println!();
    println!("{:-<78}", "");
    println!(
        "{:<20} {:>9} {:>9} {:>12} {:>10} {:>12}",
        "Local time", "Alt (°)", "Az (°)", "POA (W/m²)", "Power (W)", "Energy"
    );
    println!("{:-<78}", "");
    for (row, energy) in series.rows.iter().zip(series.cumulative_energy_kwh()) {
        println!(
            "{:<20} {:>9.2} {:>9.2} {:>12.1} {:>10.1} {:>12}",
            row.datetime_local.format(DATETIME_FORMAT),
            row.altitude_deg,
            row.azimuth_deg,
            row.irradiance_wm2,
            row.power_w,
            format_energy(energy)
        );
    }
    println!("{:-<78}", "");
}

// ===================== EXPORT =====================

#[derive(Serialize)]
struct CsvRecord {
    datetime_local: String,
    alt_deg: f64,
    az_deg: f64,
    #[serde(rename = "Irradiance_Wm2")]
    irradiance_wm2: f64,
    #[serde(rename = "Power_W")]
    power_w: f64,
    #[serde(rename = "Energy_kWh_cumulative")]
    energy_kwh_cumulative: f64,
}

/// Default export file name for a simulated day, e.g. `sim_20240621.csv`.
pub fn default_csv_name(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!("sim_{}.csv", date.format("%Y%m%d")))
}

/// Write the series as CSV with a header row.
pub fn write_csv<W: io::Write>(series: &DailySeries, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (row, energy) in series.rows.iter().zip(series.cumulative_energy_kwh()) {
        wtr.serialize(CsvRecord {
            datetime_local: row.datetime_local.format(DATETIME_FORMAT).to_string(),
            alt_deg: row.altitude_deg,
            az_deg: row.azimuth_deg,
            irradiance_wm2: row.irradiance_wm2,
            power_w: row.power_w,
            energy_kwh_cumulative: energy,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the series as CSV to a file.
pub fn save_csv(series: &DailySeries, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_csv(series, io::BufWriter::new(file))
}

#[derive(Serialize)]
struct SeriesReport<'a> {
    #[serde(flatten)]
    series: &'a DailySeries,
    total_energy_kwh: f64,
    cumulative_energy_kwh: Vec<f64>,
}

/// Write the series, its total and the cumulative energy curve as JSON.
pub fn write_json<W: io::Write>(series: &DailySeries, writer: W) -> serde_json::Result<()> {
    let report = SeriesReport {
        series,
        total_energy_kwh: series.total_energy_kwh(),
        cumulative_energy_kwh: series.cumulative_energy_kwh(),
    };
    serde_json::to_writer_pretty(writer, &report)
}

/// Write the JSON report to a file.
pub fn save_json(series: &DailySeries, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    write_json(series, io::BufWriter::new(file))?;
    Ok(())
}

// ===================== TESTS =====================
