//! Extraterrestrial and Atmospheric Model
//!
//! Top-of-atmosphere irradiance corrected for Earth-Sun distance, and a
//! single-parameter clear-sky beam attenuation: `DNI = G_on · τ^m`.
//!
//! References:
//! - Duffie, J.A. and Beckman, W.A. "Solar Engineering of Thermal Processes", eq. 1.4.1a
//! - Kasten, F. and Young, A.T. (1989). "Revised optical air mass tables and
//!   approximation formula"

// ===================== CONSTANTS =====================

/// Solar constant in W/m²
pub const SOLAR_CONSTANT: f64 = 1367.0;

/// Default atmospheric clearness (beam transmittance at air mass 1)
pub const DEFAULT_CLEARNESS: f64 = 0.75;

// ===================== EXTRATERRESTRIAL =====================

/// Extraterrestrial normal irradiance for a day of year, in W/m².
///
/// `1367 · (1 + 0.033 · cos(360° · n / 365))`
pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
    let n = day_of_year as f64;
    SOLAR_CONSTANT * (1.0 + 0.033 * (360.0 * n / 365.0).to_radians().cos())
}

// ===================== AIR MASS =====================

/// Relative optical air mass, Kasten-Young form with the offset term applied
/// to the zenith angle.
///
/// Returns infinity with the sun at or below the horizon.
pub fn air_mass(altitude_deg: f64) -> f64 {
    if altitude_deg <= 0.0 {
        return f64::INFINITY;
    }

    let zenith_deg = 90.0 - altitude_deg;
    1.0 / (zenith_deg.to_radians().cos() + 0.50572 * (6.07995 + zenith_deg).powf(-1.6364))
}

/// Clear-sky direct normal irradiance in W/m².
///
/// Zero with the sun at or below the horizon: no twilight contribution.
///
/// # Arguments
/// * `gon` - Extraterrestrial normal irradiance (W/m²)
/// * `altitude_deg` - Sun altitude in degrees
/// * `tau` - Atmospheric clearness index (0.75 typical)
pub fn direct_normal_irradiance(gon: f64, altitude_deg: f64, tau: f64) -> f64 {
    if altitude_deg <= 0.0 {
        return 0.0;
    }

    gon * tau.powf(air_mass(altitude_deg))
}

// ===================== TESTS =====================
