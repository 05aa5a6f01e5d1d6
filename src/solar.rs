//! Solar Geometry Module
//!
//! Apparent sun position from location and UTC instant, using Cooper's
//! declination, an empirical equation of time and spherical trigonometry.
//!
//! Accuracy is on the order of a degree, which is adequate for clear-sky
//! energy estimates. For high-precision work use the NREL SPA implementation
//! from the `solar-positioning` crate (see [`reference_position`]).
//!
//! Azimuth convention: degrees clockwise from north (90 = east, 180 = south).

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use solar_positioning::{spa, time::DeltaT};

use crate::geo::GeoLocation;
use crate::time::{day_of_year, decimal_hour};

// ===================== CONSTANTS =====================

/// Maximum declination (Earth's axial tilt) used by Cooper's formula, degrees
const MAX_DECLINATION_DEG: f64 = 23.45;

/// Keeps the azimuth denominator away from zero with the sun at the zenith or
/// the observer at a pole.
const AZIMUTH_EPSILON: f64 = 1e-12;

// ===================== TYPES =====================

/// Sun position seen from the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Altitude above the horizon in degrees (negative = below horizon)
    pub altitude_deg: f64,
    /// Azimuth in degrees, 0..360 clockwise from north
    pub azimuth_deg: f64,
}

impl SolarPosition {
    /// Zenith angle in degrees.
    pub fn zenith_deg(&self) -> f64 {
        90.0 - self.altitude_deg
    }

    pub fn is_sun_up(&self) -> bool {
        self.altitude_deg > 0.0
    }
}

// ===================== ANGLES =====================

/// Solar declination in radians (Cooper, 1969).
///
/// `23.45° · sin(360° · (284 + n) / 365)`. Defined for any integer day; no
/// bounds check.
pub fn declination(day_of_year: u32) -> f64 {
    let n = day_of_year as f64;
    (MAX_DECLINATION_DEG * (360.0 * (284.0 + n) / 365.0).to_radians().sin()).to_radians()
}

/// Equation of time in minutes.
///
/// `9.87·sin(2B) − 7.53·cos(B) − 1.5·sin(B)` with `B = 360°·(n − 81)/364`.
pub fn equation_of_time_minutes(day_of_year: u32) -> f64 {
    let b = (360.0 * (day_of_year as f64 - 81.0) / 364.0).to_radians();
    9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()
}

/// Local solar time in hours, wrapped to [0, 24).
pub fn local_solar_time_hours(utc: &NaiveDateTime, longitude_deg: f64) -> f64 {
    let n = day_of_year(utc);
    let lst = decimal_hour(utc) + longitude_deg / 15.0 + equation_of_time_minutes(n) / 60.0;
    lst.rem_euclid(24.0)
}

/// Hour angle in radians: 15° per hour away from local solar noon.
///
/// Negative in the morning, zero at solar noon, positive in the afternoon.
pub fn hour_angle(local_solar_time_hours: f64) -> f64 {
    (15.0 * (local_solar_time_hours - 12.0)).to_radians()
}

/// Turn the azimuth magnitude from the inverse cosine into a bearing.
///
/// Afternoon (hour angle > 0) maps to the western half, `360° − A`; morning
/// and exact solar noon keep `A`. The rule assumes the fixed orientation of the
/// `cos(A)` expression and is not adapted for southern-hemisphere observers.
pub fn resolve_azimuth(hour_angle_rad: f64, magnitude_deg: f64) -> f64 {
    if hour_angle_rad > 0.0 { 360.0 - magnitude_deg } else { magnitude_deg }
}

// ===================== POSITION =====================

/// Compute the sun's altitude and azimuth for a location and UTC instant.
///
/// # Arguments
/// * `location` - Observer latitude/longitude
/// * `utc` - Instant in UTC (naive, already offset-corrected)
pub fn solar_position(location: &GeoLocation, utc: &NaiveDateTime) -> SolarPosition {
    let n = day_of_year(utc);
    let delta = declination(n);
    let phi = location.latitude.to_radians();
    let lst = local_solar_time_hours(utc, location.longitude);
    let h = hour_angle(lst);

    // Clamp: rounding can push the sine just past ±1 at the zenith
    let sin_alt = delta.sin() * phi.sin() + delta.cos() * phi.cos() * h.cos();
    let alt = sin_alt.clamp(-1.0, 1.0).asin();

    let cos_az = (delta.sin() - alt.sin() * phi.sin()) / (alt.cos() * phi.cos() + AZIMUTH_EPSILON);
    let magnitude = cos_az.clamp(-1.0, 1.0).acos().to_degrees();

    SolarPosition { altitude_deg: alt.to_degrees(), azimuth_deg: resolve_azimuth(h, magnitude) }
}

/// High-precision position from the NREL SPA algorithm, for comparison.
///
/// Uses sea-level elevation and no refraction so that it describes the same
/// geometric quantity as [`solar_position`].
///
/// # Errors
/// Returns an error if the instant lies outside the SPA/ΔT validity range
pub fn reference_position(
    location: &GeoLocation,
    utc: &NaiveDateTime,
) -> Result<SolarPosition, solar_positioning::Error> {
    let t = Utc.from_utc_datetime(utc);
    let delta_t = DeltaT::estimate_from_date_like(t)?;
    let pos = spa::solar_position(t, location.latitude, location.longitude, 0.0, delta_t, None)?;
    Ok(SolarPosition { altitude_deg: pos.elevation_angle(), azimuth_deg: pos.azimuth() })
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_declination_extremes() {
        let (n_max, d_max) = (1..=365)
            .map(|n| (n, declination(n).to_degrees()))
            .fold((0, f64::NEG_INFINITY), |a, b| if b.1 > a.1 { b } else { a });
        let (n_min, d_min) = (1..=365)
            .map(|n| (n, declination(n).to_degrees()))
            .fold((0, f64::INFINITY), |a, b| if b.1 < a.1 { b } else { a });

        // June solstice
        assert!((170..=174).contains(&n_max), "max at day {}", n_max);
        assert!((d_max - 23.45).abs() < 0.1, "max declination {}", d_max);
        // December solstice
        assert!((353..=357).contains(&n_min), "min at day {}", n_min);
        assert!((d_min + 23.45).abs() < 0.1, "min declination {}", d_min);
    }

    #[test]
    fn test_declination_near_zero_at_equinoxes() {
        assert!(declination(81).to_degrees().abs() < 1.0);
        assert!(declination(264).to_degrees().abs() < 1.5);
    }

    #[test]
    fn test_declination_any_day_is_finite() {
        for n in [0, 400, 10_000] {
            assert!(declination(n).is_finite());
            assert!(declination(n).to_degrees().abs() <= MAX_DECLINATION_DEG + 1e-9);
        }
    }

    #[test]
    fn test_equation_of_time_known_values() {
        // Early November: sundial fast by ~16 min
        assert!(equation_of_time_minutes(307) > 15.0);
        // Mid February: sundial slow by ~14 min
        assert!(equation_of_time_minutes(42) < -13.0);
        // Range bound
        for n in 1..=366 {
            assert!(equation_of_time_minutes(n).abs() < 17.5);
        }
    }

    #[test]
    fn test_local_solar_time_wraps() {
        // Far east longitude pushes past midnight
        let lst = local_solar_time_hours(&utc(2024, 3, 21, 23, 0), 179.0);
        assert!((0.0..24.0).contains(&lst));
        assert!(lst < 12.0, "expected wrap into early morning, got {}", lst);

        let lst = local_solar_time_hours(&utc(2024, 3, 21, 0, 30), -179.0);
        assert!((0.0..24.0).contains(&lst));
        assert!(lst > 12.0, "expected wrap into previous evening, got {}", lst);
    }

    #[test]
    fn test_resolve_azimuth_rule() {
        assert_eq!(resolve_azimuth(0.3, 120.0), 240.0);
        assert_eq!(resolve_azimuth(-0.3, 120.0), 120.0);
        // Exact solar noon keeps the raw magnitude
        assert_eq!(resolve_azimuth(0.0, 180.0), 180.0);
        assert_eq!(resolve_azimuth(0.0, 37.5), 37.5);
    }

    #[test]
    fn test_equinox_noon_on_equator_is_overhead() {
        // Find the UTC minute with the smallest |hour angle| on day 80 at lon 0
        let day = NaiveDate::from_ymd_opt(2023, 3, 21).unwrap();
        let noon = (0..24 * 60)
            .map(|m| day.and_hms_opt(m / 60, m % 60, 0).unwrap())
            .min_by(|a, b| {
                let ha = hour_angle(local_solar_time_hours(a, 0.0)).abs();
                let hb = hour_angle(local_solar_time_hours(b, 0.0)).abs();
                ha.total_cmp(&hb)
            })
            .unwrap();

        let pos = solar_position(&GeoLocation::new(0.0, 0.0), &noon);
        assert!((pos.altitude_deg - 90.0).abs() < 1.0, "altitude {}", pos.altitude_deg);
    }

    #[test]
    fn test_morning_east_afternoon_west() {
        let madrid = GeoLocation::new(40.4168, -3.7038);

        let morning = solar_position(&madrid, &utc(2024, 6, 21, 7, 0));
        assert!(morning.is_sun_up());
        assert!(morning.azimuth_deg > 45.0 && morning.azimuth_deg < 120.0, "{:?}", morning);

        let afternoon = solar_position(&madrid, &utc(2024, 6, 21, 17, 0));
        assert!(afternoon.is_sun_up());
        assert!(afternoon.azimuth_deg > 240.0 && afternoon.azimuth_deg < 315.0, "{:?}", afternoon);

        let night = solar_position(&madrid, &utc(2024, 6, 21, 1, 0));
        assert!(!night.is_sun_up());
    }

    #[test]
    fn test_noon_altitude_matches_latitude_and_declination() {
        // At solar noon altitude = 90 - |lat - decl|
        let madrid = GeoLocation::new(40.4168, -3.7038);
        let day = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let best = (0..24 * 60)
            .map(|m| solar_position(&madrid, &day.and_hms_opt(m / 60, m % 60, 0).unwrap()))
            .max_by(|a, b| a.altitude_deg.total_cmp(&b.altitude_deg))
            .unwrap();

        let expected = 90.0 - (40.4168 - declination(173).to_degrees());
        assert_abs_diff_eq!(best.altitude_deg, expected, epsilon = 0.05);
        // Sun due south at culmination
        assert_abs_diff_eq!(best.azimuth_deg, 180.0, epsilon = 2.5);
    }

    #[test]
    fn test_azimuth_in_range() {
        let loc = GeoLocation::new(52.52, 13.405);
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        for m in (0..24 * 60).step_by(10) {
            let pos = solar_position(&loc, &day.and_hms_opt(m / 60, m % 60, 0).unwrap());
            assert!((0.0..=360.0).contains(&pos.azimuth_deg), "{:?}", pos);
            assert!((-90.0..=90.0).contains(&pos.altitude_deg), "{:?}", pos);
        }
    }

    #[test]
    fn test_pole_does_not_blow_up() {
        let pole = GeoLocation::new(90.0, 0.0);
        let pos = solar_position(&pole, &utc(2024, 6, 21, 12, 0));
        assert!(pos.altitude_deg.is_finite() && pos.azimuth_deg.is_finite());
        assert_abs_diff_eq!(pos.altitude_deg, declination(173).to_degrees(), epsilon = 1e-6);
    }

    #[test]
    fn test_reference_position_close_to_simplified_model() {
        let madrid = GeoLocation::new(40.4168, -3.7038);
        let t = utc(2024, 6, 21, 12, 0);
        let simple = solar_position(&madrid, &t);
        let reference = reference_position(&madrid, &t).unwrap();

        assert!((simple.altitude_deg - reference.altitude_deg).abs() < 1.5);
        assert!((simple.azimuth_deg - reference.azimuth_deg).abs() < 3.0);
    }
}
