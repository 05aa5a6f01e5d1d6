//! Clear-sky solar position and photovoltaic output simulation.
//!
//! The chain runs from a local timestamp and location to the sun's altitude
//! and azimuth, the clear-sky irradiance components, the plane-of-array
//! irradiance on a tilted panel, and finally electrical power and daily
//! energy. Positions use a simplified declination/equation-of-time model;
//! [`solar::reference_position`] gives an NREL SPA value for comparison.

pub mod atmosphere;
pub mod error;
pub mod geo;
pub mod output;
pub mod simulation;
pub mod solar;
pub mod solar_panel;
pub mod time;

pub use error::{Error, Result};
pub use geo::GeoLocation;
pub use simulation::{DailySeries, DayStepper, SeriesRow, simulate_day, simulate_instant};
pub use solar::{SolarPosition, solar_position};
pub use solar_panel::{IrradianceResult, PanelConfig, PanelOutput};
