//! Constants for FreeFlow Core
//!
//! Centralised numeric values used by the estimators, the identifier and the
//! cell orchestrator. Deployment-specific values (unit conversions, metering
//! floor, ceilings, time step) are only *defaults* here; the live values come
//! from [`EstimationConfig`](crate::parameters::EstimationConfig).
//!
//! ## Organization
//!
//! - **Traffic**: physical limits and merge-area reconstruction constants
//! - **Filter**: recursive filter and online regression tuning
//!
//! ## Units
//!
//! Densities are vehicles per kilometre, flows vehicles per hour, lengths
//! kilometres, speeds kilometres per hour and the filter time step hours.

/// Physical limits, merge reconstruction and default conversions.
pub mod traffic;

/// Recursive filter and system identification tuning.
pub mod filter;

// Re-export commonly used constants for convenience
pub use traffic::{
    MAX_MAINLINE_DENSITY, MAX_ONRAMP_DENSITY, MERGE_FLOW_EPSILON,
    UNRELIABLE_DENSITY_STD, FREE_FLOW_SPEED_PRIOR_FACTOR, DEFAULT_TIME_STEP_H,
};

pub use filter::{
    VARIANCE_FLOOR, MIN_SPEED_FOR_DENSITY, OBSERVATION_WINDOW,
    DEFAULT_FORGETTING_FACTOR, DEFAULT_INITIAL_COVARIANCE,
};
