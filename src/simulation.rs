//! Day Simulation Module
//!
//! Runs the position → irradiance → power chain once per time step across one
//! local calendar day and collects the results into a [`DailySeries`].
//!
//! Steps are independent of each other. The time grid is a lazy, restartable
//! iterator ([`DayStepper`]) and each step is a pure function of its
//! timestamp, so the `parallel` feature can evaluate them with rayon without
//! changing the output or its order.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info, trace};
use serde::Serialize;

use crate::atmosphere::extraterrestrial_irradiance;
use crate::error::{Error, Result};
use crate::geo::GeoLocation;
use crate::solar::solar_position;
use crate::solar_panel::{PanelConfig, calculate_output};
use crate::time::{day_of_year, to_utc};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Default sampling interval in minutes
pub const DEFAULT_STEP_MINUTES: u32 = 30;

// ===================== TIME GRID =====================

/// Local timestamps 00:00, 00:00 + step, ... covering one calendar day.
#[derive(Debug, Clone)]
pub struct DayStepper {
    start: NaiveDateTime,
    step_minutes: u32,
    next: u32,
    count: u32,
}

impl DayStepper {
    /// # Errors
    /// `InvalidTimeStep` unless the step is positive and divides 1440
    pub fn new(date: NaiveDate, step_minutes: u32) -> Result<Self> {
        if step_minutes == 0 || MINUTES_PER_DAY % step_minutes != 0 {
            return Err(Error::InvalidTimeStep { minutes: step_minutes });
        }
        Ok(Self {
            start: date.and_time(chrono::NaiveTime::MIN),
            step_minutes,
            next: 0,
            count: MINUTES_PER_DAY / step_minutes,
        })
    }
}

impl Iterator for DayStepper {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let t = self.start + Duration::minutes((self.next * self.step_minutes) as i64);
        self.next += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for DayStepper {}

// ===================== SERIES =====================

/// One time step of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    /// Local wall-clock time
    pub datetime_local: NaiveDateTime,
    /// Same instant in UTC
    pub datetime_utc: NaiveDateTime,
    /// Sun altitude (degrees)
    pub altitude_deg: f64,
    /// Sun azimuth (degrees)
    pub azimuth_deg: f64,
    /// Plane-of-array irradiance (W/m²)
    pub irradiance_wm2: f64,
    /// Instantaneous power (W)
    pub power_w: f64,
}

/// Fixed-step time series over one local day.
#[derive(Debug, Clone, Serialize)]
pub struct DailySeries {
    pub date: NaiveDate,
    pub location: GeoLocation,
    pub panel: PanelConfig,
    pub utc_offset_hours: f64,
    pub step_minutes: u32,
    pub rows: Vec<SeriesRow>,
}

impl DailySeries {
    /// Step length in hours.
    pub fn step_hours(&self) -> f64 {
        self.step_minutes as f64 / 60.0
    }

    /// Daily energy in kWh: left-point rectangle rule, `Σ P · Δt / 1000`.
    pub fn total_energy_kwh(&self) -> f64 {
        let power_sum: f64 = self.rows.iter().map(|r| r.power_w).sum();
        power_sum * self.step_hours() / 1000.0
    }

    /// Running energy total in kWh, one value per row.
    pub fn cumulative_energy_kwh(&self) -> Vec<f64> {
        let dt = self.step_hours();
        self.rows
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r.power_w * dt;
                Some(*acc / 1000.0)
            })
            .collect()
    }

    /// Row with the highest power, if the panel produced anything.
    pub fn peak(&self) -> Option<&SeriesRow> {
        self.rows
            .iter()
            .filter(|r| r.power_w > 0.0)
            .max_by(|a, b| a.power_w.total_cmp(&b.power_w))
    }

    /// Rows with the sun above the horizon.
    pub fn daylight_rows(&self) -> impl Iterator<Item = &SeriesRow> {
        self.rows.iter().filter(|r| r.altitude_deg > 0.0)
    }
}

// ===================== SIMULATION =====================

/// Evaluate the full chain for one local timestamp.
///
/// # Arguments
/// * `location` - Observer location
/// * `panel` - Panel configuration
/// * `datetime_local` - Local wall-clock time
/// * `utc_offset_hours` - Fixed offset of local time from UTC
pub fn simulate_instant(
    location: &GeoLocation,
    panel: &PanelConfig,
    datetime_local: NaiveDateTime,
    utc_offset_hours: f64,
) -> Result<SeriesRow> {
    let datetime_utc = to_utc(datetime_local, utc_offset_hours);
    let position = solar_position(location, &datetime_utc);
    let gon = extraterrestrial_irradiance(day_of_year(&datetime_utc));
    let output = calculate_output(panel, gon, &position)?;

    trace!(
        "{} alt={:.2} az={:.2} poa={:.1} P={:.1}",
        datetime_local, position.altitude_deg, position.azimuth_deg, output.irradiance.poa,
        output.power_w
    );

    Ok(SeriesRow {
        datetime_local,
        datetime_utc,
        altitude_deg: position.altitude_deg,
        azimuth_deg: position.azimuth_deg,
        irradiance_wm2: output.irradiance.poa,
        power_w: output.power_w,
    })
}

/// Simulate one local calendar day at a fixed step.
///
/// # Errors
/// `InvalidTimeStep` for a step that does not divide the day; panel
/// validation errors from the irradiance/power chain
pub fn simulate_day(
    location: &GeoLocation,
    panel: &PanelConfig,
    date: NaiveDate,
    utc_offset_hours: f64,
    step_minutes: u32,
) -> Result<DailySeries> {
    let stepper = DayStepper::new(date, step_minutes)?;
    debug!(
        "simulating {} at lat={:.4} lon={:.4} (UTC{:+}) in {} steps of {} min",
        date,
        location.latitude,
        location.longitude,
        utc_offset_hours,
        stepper.len(),
        step_minutes
    );

    let rows = evaluate_steps(location, panel, stepper, utc_offset_hours)?;

    let series = DailySeries {
        date,
        location: *location,
        panel: *panel,
        utc_offset_hours,
        step_minutes,
        rows,
    };
    info!("daily energy for {}: {:.3} kWh", date, series.total_energy_kwh());
    Ok(series)
}

#[cfg(not(feature = "parallel"))]
fn evaluate_steps(
    location: &GeoLocation,
    panel: &PanelConfig,
    stepper: DayStepper,
    utc_offset_hours: f64,
) -> Result<Vec<SeriesRow>> {
    stepper.map(|t| simulate_instant(location, panel, t, utc_offset_hours)).collect()
}

#[cfg(feature = "parallel")]
fn evaluate_steps(
    location: &GeoLocation,
    panel: &PanelConfig,
    stepper: DayStepper,
    utc_offset_hours: f64,
) -> Result<Vec<SeriesRow>> {
    use rayon::prelude::*;

    let times: Vec<NaiveDateTime> = stepper.collect();
    times.into_par_iter().map(|t| simulate_instant(location, panel, t, utc_offset_hours)).collect()
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn madrid() -> GeoLocation {
        GeoLocation::new(40.4168, -3.7038)
    }

    fn panel() -> PanelConfig {
        PanelConfig::new(30.0, 180.0, 1.6, 0.18).unwrap()
    }

    fn solstice() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
    }

    #[test]
    fn test_stepper_counts() {
        assert_eq!(DayStepper::new(solstice(), 30).unwrap().count(), 48);
        assert_eq!(DayStepper::new(solstice(), 60).unwrap().len(), 24);
        assert_eq!(DayStepper::new(solstice(), 1).unwrap().len(), 1440);
        assert_eq!(DayStepper::new(solstice(), 1440).unwrap().len(), 1);
    }

    #[test]
    fn test_stepper_rejects_uneven_steps() {
        for bad in [0, 7, 91, 2000] {
            assert_eq!(
                DayStepper::new(solstice(), bad).unwrap_err(),
                Error::InvalidTimeStep { minutes: bad }
            );
        }
        // Steps longer than an hour are fine as long as they divide the day
        assert_eq!(DayStepper::new(solstice(), 90).unwrap().len(), 16);
    }

    #[test]
    fn test_stepper_timestamps_and_restart() {
        let stepper = DayStepper::new(solstice(), 30).unwrap();
        let first: Vec<_> = stepper.clone().collect();
        let again: Vec<_> = stepper.collect();
        assert_eq!(first, again);

        assert_eq!(first[0], solstice().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(first[1], solstice().and_hms_opt(0, 30, 0).unwrap());
        assert_eq!(first[47], solstice().and_hms_opt(23, 30, 0).unwrap());
        assert!(first.iter().all(|t| t.date() == solstice()));
    }

    #[test]
    fn test_simulate_instant_night_and_noon() {
        let night =
            simulate_instant(&madrid(), &panel(), solstice().and_hms_opt(2, 0, 0).unwrap(), 2.0)
                .unwrap();
        assert!(night.altitude_deg < 0.0);
        assert_eq!(night.irradiance_wm2, 0.0);
        assert_eq!(night.power_w, 0.0);
        assert_eq!(night.datetime_utc, solstice().and_hms_opt(0, 0, 0).unwrap());

        let noon =
            simulate_instant(&madrid(), &panel(), solstice().and_hms_opt(14, 0, 0).unwrap(), 2.0)
                .unwrap();
        assert!(noon.altitude_deg > 70.0);
        assert!(noon.irradiance_wm2 > 800.0);
        assert_abs_diff_eq!(noon.power_w, noon.irradiance_wm2 * 1.6 * 0.18, epsilon = 1e-9);
    }

    #[test]
    fn test_energy_is_left_point_rectangle_sum() {
        let series = simulate_day(&madrid(), &panel(), solstice(), 2.0, 30).unwrap();
        let manual: f64 = series.rows.iter().map(|r| r.power_w * 0.5).sum::<f64>() / 1000.0;
        assert_abs_diff_eq!(series.total_energy_kwh(), manual, epsilon = 1e-9);

        let cumulative = series.cumulative_energy_kwh();
        assert_eq!(cumulative.len(), series.rows.len());
        assert!(cumulative.windows(2).all(|w| w[1] >= w[0]));
        assert_abs_diff_eq!(*cumulative.last().unwrap(), series.total_energy_kwh(), epsilon = 1e-9);
    }

    #[test]
    fn test_finer_steps_converge() {
        let coarse = simulate_day(&madrid(), &panel(), solstice(), 2.0, 60).unwrap();
        let fine = simulate_day(&madrid(), &panel(), solstice(), 2.0, 5).unwrap();
        let (a, b) = (coarse.total_energy_kwh(), fine.total_energy_kwh());
        assert!((a - b).abs() / b < 0.05, "coarse {} vs fine {}", a, b);
    }

    #[test]
    fn test_peak_and_daylight_rows() {
        let series = simulate_day(&madrid(), &panel(), solstice(), 2.0, 30).unwrap();
        let peak = series.peak().unwrap();
        // Solar noon in Madrid in summer is around 14:15 local
        let hour = peak.datetime_local.time().format("%H").to_string();
        assert!(hour == "13" || hour == "14", "peak at {}", peak.datetime_local);

        let daylight = series.daylight_rows().count();
        // ~15 h of daylight in 30-minute steps
        assert!((28..=32).contains(&daylight), "daylight rows {}", daylight);
    }

    #[test]
    fn test_polar_night_produces_nothing() {
        let tromso = GeoLocation::new(69.65, 18.96);
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let series = simulate_day(&tromso, &panel(), date, 1.0, 30).unwrap();
        assert_eq!(series.total_energy_kwh(), 0.0);
        assert!(series.peak().is_none());
    }

    #[test]
    fn test_bad_step_is_reported_before_any_work() {
        let err = simulate_day(&madrid(), &panel(), solstice(), 2.0, 7).unwrap_err();
        assert_eq!(err, Error::InvalidTimeStep { minutes: 7 });
    }
}
