//! Error Types for Cell Construction and Event Validation
//!
//! ## Design Philosophy
//!
//! The estimation loop must keep running through sensor flakiness, so nothing
//! on the per-event path returns an error to the runtime. Errors exist at the
//! two boundaries where a caller can still act on them:
//!
//! 1. **Construction** (`ConfigError`): a cell is built once from injected
//!    configuration. Inconsistent parameters or a role table that references
//!    an on-ramp the cell does not have are contract violations and are
//!    rejected here, never discovered during dispatch.
//!
//! 2. **Ingestion** (`EventError`): a measurement event can only be created
//!    through a validating constructor. A rejected event never reaches an
//!    estimator.
//!
//! Both enums are `Copy` and carry only `&'static str` context, so they can be
//! returned from no_std builds without allocation.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use freeflow_core::{EventError, EventKind, IntervalSample, MeasurementEvent, SensorId};
//!
//! let sample = IntervalSample::new(f64::NAN, 10.0, 80.0, 5.0, 1.0);
//! match MeasurementEvent::new(EventKind::MainlineInterval, SensorId(7), sample) {
//!     Ok(_event) => { /* route to the cell */ }
//!     Err(EventError::NonFinite { .. }) => { /* no information this interval */ }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for construction-time operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Construction-time contract violations
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A physical cell parameter is non-finite or outside its admissible range
    #[error("Invalid cell parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Critical density must lie strictly between zero and jam density
    #[error("Critical density {critical} must lie in (0, {jam})")]
    InconsistentDensities {
        /// Configured critical density
        critical: f64,
        /// Configured jam density
        jam: f64,
    },

    /// Two roles were assigned the same sensor identifier
    #[error("Sensor {sensor_id} assigned to more than one role")]
    DuplicateSensor {
        /// The repeated identifier
        sensor_id: u32,
    },

    /// The role table routes to an on-ramp the cell was built without
    #[error("Role {role} configured but the cell has no on-ramp")]
    MissingOnRamp {
        /// Name of the on-ramp role
        role: &'static str,
    },

    /// An estimation setting is non-finite or outside its admissible range
    #[error("Invalid estimation setting {name}: {value}")]
    InvalidSetting {
        /// Setting name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Reasons a measurement event is refused at construction
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EventError {
    /// One of the five numeric fields is NaN or infinite
    #[error("Field {field} is not finite")]
    NonFinite {
        /// Name of the first offending field
        field: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidParameter { name, value } =>
                defmt::write!(fmt, "Invalid parameter {}: {}", name, value),
            Self::InconsistentDensities { critical, jam } =>
                defmt::write!(fmt, "Critical density {} not in (0, {})", critical, jam),
            Self::DuplicateSensor { sensor_id } =>
                defmt::write!(fmt, "Sensor {} assigned twice", sensor_id),
            Self::MissingOnRamp { role } =>
                defmt::write!(fmt, "Role {} without on-ramp", role),
            Self::InvalidSetting { name, value } =>
                defmt::write!(fmt, "Invalid setting {}: {}", name, value),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NonFinite { field } => defmt::write!(fmt, "Field {} not finite", field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_small() {
        assert!(core::mem::size_of::<ConfigError>() <= 32);
        assert!(core::mem::size_of::<EventError>() <= 24);
    }

    #[cfg(feature = "std")]
    #[test]
    fn messages_name_the_offender() {
        let err = ConfigError::DuplicateSensor { sensor_id: 4 };
        assert_eq!(err.to_string(), "Sensor 4 assigned to more than one role");

        let err = EventError::NonFinite { field: "mean_speed" };
        assert!(err.to_string().contains("mean_speed"));
    }
}
