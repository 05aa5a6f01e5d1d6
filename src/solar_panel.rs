//! Solar Panel Output Calculations
//!
//! Plane-of-array irradiance on a single fixed flat panel and the resulting
//! electrical power.
//!
//! The beam component uses the angle of incidence between the sun vector and
//! the panel normal. Sky diffuse and ground-reflected components use isotropic
//! view factors. Global and diffuse horizontal irradiance are derived from DNI
//! by assuming a constant diffuse fraction of GHI.
//!
//! Frame: x = east, y = north, z = up. Azimuths clockwise from north.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::atmosphere::{DEFAULT_CLEARNESS, direct_normal_irradiance};
use crate::error::{Error, Result};
use crate::solar::SolarPosition;

// ===================== CONSTANTS =====================

/// Default ground albedo (typical grass/soil)
pub const DEFAULT_ALBEDO: f64 = 0.2;

/// Default share of GHI that is sky-diffuse
pub const DEFAULT_DIFFUSE_FRACTION: f64 = 0.15;

/// Default panel area in m² (one residential module)
pub const DEFAULT_AREA_M2: f64 = 1.6;

/// Default conversion efficiency
pub const DEFAULT_EFFICIENCY: f64 = 0.18;

// ===================== CONFIGURATION =====================

/// Fixed flat-panel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Tilt from horizontal in degrees (0 = facing up, 90 = vertical, 180 = facing down)
    pub tilt_deg: f64,
    /// Facing direction in degrees (180 = south); any value, taken mod 360
    pub azimuth_deg: f64,
    /// Panel area in square meters
    pub area_m2: f64,
    /// Conversion efficiency (0 < eff <= 1)
    pub efficiency: f64,
    /// Ground reflectance (0-1)
    pub albedo: f64,
    /// Atmospheric clearness index τ
    pub clearness: f64,
    /// Diffuse fraction of global horizontal irradiance
    pub diffuse_fraction: f64,
}

impl PanelConfig {
    /// Create a validated configuration with default albedo, clearness and
    /// diffuse fraction.
    ///
    /// # Errors
    /// `InvalidGeometryInput` for a tilt outside [0, 180], `InvalidPanelConfig`
    /// for a non-positive area or an efficiency outside (0, 1]
    pub fn new(tilt_deg: f64, azimuth_deg: f64, area_m2: f64, efficiency: f64) -> Result<Self> {
        validate_tilt(tilt_deg)?;
        validate_area_and_efficiency(area_m2, efficiency)?;
        Ok(Self {
            tilt_deg,
            azimuth_deg,
            area_m2,
            efficiency,
            albedo: DEFAULT_ALBEDO,
            clearness: DEFAULT_CLEARNESS,
            diffuse_fraction: DEFAULT_DIFFUSE_FRACTION,
        })
    }

    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_clearness(mut self, tau: f64) -> Self {
        self.clearness = tau;
        self
    }

    pub fn with_diffuse_fraction(mut self, fraction: f64) -> Self {
        self.diffuse_fraction = fraction;
        self
    }

    /// Upper bound on daily energy in kWh: the whole area at the solar
    /// constant around the clock.
    pub fn theoretical_max_daily_kwh(&self) -> f64 {
        self.area_m2 * crate::atmosphere::SOLAR_CONSTANT * 24.0 / 1000.0
    }
}

fn validate_tilt(tilt_deg: f64) -> Result<()> {
    if !(0.0..=180.0).contains(&tilt_deg) {
        return Err(Error::InvalidGeometryInput { tilt_deg });
    }
    Ok(())
}

fn validate_area_and_efficiency(area_m2: f64, efficiency: f64) -> Result<()> {
    // Written so that NaN fails both checks
    if !(area_m2 > 0.0) {
        return Err(Error::panel_config(format!("area must be positive, got {} m²", area_m2)));
    }
    if !(efficiency > 0.0 && efficiency <= 1.0) {
        return Err(Error::panel_config(format!(
            "efficiency must be in (0, 1], got {}",
            efficiency
        )));
    }
    Ok(())
}

// ===================== IRRADIANCE RESULTS =====================

/// Irradiance breakdown on the tilted surface. All zero at night.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IrradianceResult {
    /// Direct Normal Irradiance (W/m²)
    pub dni: f64,
    /// Global Horizontal Irradiance (W/m²)
    pub ghi: f64,
    /// Diffuse Horizontal Irradiance (W/m²)
    pub dhi: f64,
    /// Cosine of the angle of incidence (negative = sun behind the panel)
    pub cos_incidence: f64,
    /// POA beam component (W/m²)
    pub poa_beam: f64,
    /// POA sky diffuse component (W/m²)
    pub poa_sky_diffuse: f64,
    /// POA ground reflected component (W/m²)
    pub poa_ground_reflected: f64,
    /// Plane-of-Array irradiance (W/m²), total on the panel
    pub poa: f64,
}

impl IrradianceResult {
    /// Angle of incidence in degrees.
    pub fn aoi_deg(&self) -> f64 {
        self.cos_incidence.clamp(-1.0, 1.0).acos().to_degrees()
    }
}

// ===================== GEOMETRY =====================

/// Unit vector pointing at the sun.
pub fn sun_vector(altitude_deg: f64, azimuth_deg: f64) -> Vector3<f64> {
    let alt = altitude_deg.to_radians();
    let az = azimuth_deg.to_radians();
    Vector3::new(alt.cos() * az.sin(), alt.cos() * az.cos(), alt.sin())
}

/// Unit normal of a panel with the given tilt and facing direction.
///
/// # Errors
/// `InvalidGeometryInput` if the tilt is outside [0, 180]
pub fn panel_normal(tilt_deg: f64, azimuth_deg: f64) -> Result<Vector3<f64>> {
    validate_tilt(tilt_deg)?;
    let tilt = tilt_deg.to_radians();
    let az = azimuth_deg.rem_euclid(360.0).to_radians();
    Ok(Vector3::new(tilt.sin() * az.sin(), tilt.sin() * az.cos(), tilt.cos()))
}

// ===================== PLANE OF ARRAY IRRADIANCE =====================

/// Irradiance on a tilted surface under the clear-sky model.
///
/// # Arguments
/// * `gon` - Extraterrestrial normal irradiance (W/m²)
/// * `sun_altitude_deg` - Sun altitude in degrees
/// * `sun_azimuth_deg` - Sun azimuth in degrees
/// * `tilt_deg` - Panel tilt from horizontal in degrees, [0, 180]
/// * `panel_azimuth_deg` - Panel facing direction in degrees
/// * `albedo` - Ground reflectance (0-1)
/// * `tau` - Atmospheric clearness index
/// * `diffuse_fraction` - Share of GHI that is diffuse
///
/// # Errors
/// `InvalidGeometryInput` if the tilt is outside [0, 180], whatever the sun position
#[allow(clippy::too_many_arguments)]
pub fn plane_of_array_irradiance(
    gon: f64,
    sun_altitude_deg: f64,
    sun_azimuth_deg: f64,
    tilt_deg: f64,
    panel_azimuth_deg: f64,
    albedo: f64,
    tau: f64,
    diffuse_fraction: f64,
) -> Result<IrradianceResult> {
    let normal = panel_normal(tilt_deg, panel_azimuth_deg)?;

    if sun_altitude_deg <= 0.0 {
        return Ok(IrradianceResult::default());
    }
    // Facing down or edge-on: no view of the sky
    if normal.z <= 0.0 {
        return Ok(IrradianceResult::default());
    }

    let sun = sun_vector(sun_altitude_deg, sun_azimuth_deg);
    let dni = direct_normal_irradiance(gon, sun_altitude_deg, tau);

    let cos_zenith = sun_altitude_deg.to_radians().sin();
    let ghi = if dni > 0.0 && cos_zenith > 0.0 {
        dni * cos_zenith / (1.0 - diffuse_fraction).max(1e-6)
    } else {
        0.0
    };
    let dhi = diffuse_fraction * ghi;

    let cos_incidence = sun.dot(&normal);
    let poa_beam = (dni * cos_incidence).max(0.0);

    let cos_tilt = tilt_deg.to_radians().cos();
    let poa_sky_diffuse = dhi * (1.0 + cos_tilt) / 2.0;
    let poa_ground_reflected = albedo * ghi * (1.0 - cos_tilt) / 2.0;

    let poa = (poa_beam + poa_sky_diffuse + poa_ground_reflected).max(0.0);

    Ok(IrradianceResult {
        dni,
        ghi,
        dhi,
        cos_incidence,
        poa_beam,
        poa_sky_diffuse,
        poa_ground_reflected,
        poa,
    })
}

/// Total plane-of-array irradiance in W/m² with default albedo, clearness
/// and diffuse fraction.
pub fn irradiance_on_tilted_surface(
    gon: f64,
    sun_altitude_deg: f64,
    sun_azimuth_deg: f64,
    tilt_deg: f64,
    panel_azimuth_deg: f64,
) -> Result<f64> {
    plane_of_array_irradiance(
        gon,
        sun_altitude_deg,
        sun_azimuth_deg,
        tilt_deg,
        panel_azimuth_deg,
        DEFAULT_ALBEDO,
        DEFAULT_CLEARNESS,
        DEFAULT_DIFFUSE_FRACTION,
    )
    .map(|r| r.poa)
}

// ===================== POWER OUTPUT CALCULATION =====================

/// Instantaneous electrical power in W: `irradiance · area · efficiency`.
///
/// # Errors
/// `InvalidPanelConfig` for a non-positive area or an efficiency outside (0, 1]
pub fn power_from_irradiance(irradiance: f64, area_m2: f64, efficiency: f64) -> Result<f64> {
    validate_area_and_efficiency(area_m2, efficiency)?;
    Ok(irradiance * area_m2 * efficiency)
}

/// Solar panel output at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelOutput {
    /// Irradiance components
    pub irradiance: IrradianceResult,
    /// Instantaneous power output (W)
    pub power_w: f64,
}

/// Calculate panel output for a sun position.
///
/// # Arguments
/// * `config` - Panel configuration
/// * `gon` - Extraterrestrial normal irradiance for the day (W/m²)
/// * `position` - Sun position
pub fn calculate_output(
    config: &PanelConfig,
    gon: f64,
    position: &SolarPosition,
) -> Result<PanelOutput> {
    let irradiance = plane_of_array_irradiance(
        gon,
        position.altitude_deg,
        position.azimuth_deg,
        config.tilt_deg,
        config.azimuth_deg,
        config.albedo,
        config.clearness,
        config.diffuse_fraction,
    )?;
    let power_w = power_from_irradiance(irradiance.poa, config.area_m2, config.efficiency)?;
    Ok(PanelOutput { irradiance, power_w })
}

// ===================== FORMATTING HELPERS =====================

/// Format power output for display
pub fn format_power(watts: f64) -> String {
    if watts >= 1000.0 { format!("{:.2} kW", watts / 1000.0) } else { format!("{:.1} W", watts) }
}

/// Format energy for display
pub fn format_energy(kwh: f64) -> String {
    format!("{:.2} kWh", kwh)
}

/// Format irradiance for display
pub fn format_irradiance(w_per_m2: f64) -> String {
    format!("{:.0} W/m²", w_per_m2)
}

// ===================== TESTS =====================
