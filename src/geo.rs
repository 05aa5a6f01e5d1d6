//! Geographic Location Module
//!
//! The observer's position on Earth. Range checks live at the command-line
//! edge; the core accepts whatever coordinates it is handed.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees (-90 to 90, positive north)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180, positive east)
    pub longitude: f64,
}

impl GeoLocation {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both coordinates fall in their geographic ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}
