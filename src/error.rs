//! Error types for the solar simulation library.

use thiserror::Error;

/// Result type alias for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised synchronously at the point of invalid input.
///
/// Numeric edge cases (sun below the horizon, self-shaded panel, inverse-trig
/// overshoot) are clamped instead and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Panel tilt outside the closed range [0, 180] degrees.
    #[error("invalid geometry input: tilt {tilt_deg}° must be between 0° and 180°")]
    InvalidGeometryInput {
        /// The rejected tilt value.
        tilt_deg: f64,
    },
    /// Surface area or conversion efficiency out of range.
    #[error("invalid panel configuration: {reason}")]
    InvalidPanelConfig {
        /// Which constraint was violated.
        reason: String,
    },
    /// Simulation step that does not split a day into whole steps.
    #[error("invalid time step: {minutes} min must be positive and divide 1440 evenly")]
    InvalidTimeStep {
        /// The rejected step length.
        minutes: u32,
    },
}

impl Error {
    pub(crate) fn panel_config(reason: impl Into<String>) -> Self {
        Self::InvalidPanelConfig { reason: reason.into() }
    }
}
