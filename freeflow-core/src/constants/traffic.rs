//! Traffic Constants
//!
//! Physical limits of a freeway cell and the constants used when
//! reconstructing the merge-area density downstream of an on-ramp.

// ===== DENSITY CEILINGS =====

/// Hard ceiling on mainline and merge-area density (veh/km).
///
/// Jam density of a multi-lane freeway section. No estimate ever reported by
/// a cell exceeds this value.
///
/// Source: jam spacing of ~7 m per vehicle over a 2-lane section
pub const MAX_MAINLINE_DENSITY: f64 = 250.0;

/// Ceiling on on-ramp queue density (veh/km).
///
/// Single-lane ramp storage, half the mainline ceiling.
pub const MAX_ONRAMP_DENSITY: f64 = 125.0;

// ===== MERGE AREA =====

/// Guard added to the mainline flow in the merge-density ratio (veh/h).
///
/// Keeps `(q_main + q_ramp) / (q_main + ε)` finite when the mainline is
/// empty. Flows are noisy at low volume, so the ratio saturates instead of
/// dividing by zero and the ceiling takes over.
pub const MERGE_FLOW_EPSILON: f64 = 0.1;

/// Density standard deviation forced on on-ramp samples (veh/km).
///
/// Occupancy at a queue or metering detector does not translate into ramp
/// density; this variance makes the occupancy term negligible in the fusion.
pub const UNRELIABLE_DENSITY_STD: f64 = 1000.0;

// ===== IDENTIFICATION PRIOR =====

/// Fraction of the configured free-flow speed used to seed the identifier.
///
/// Configured speeds are posted limits; observed free-flow speeds at merges
/// sit noticeably below them, so the fit starts from a conservative prior.
pub const FREE_FLOW_SPEED_PRIOR_FACTOR: f64 = 0.7;

// ===== DEFAULT CONVERSIONS =====

/// Default count-to-flow factor (samples already in veh/h).
pub const DEFAULT_CARS_TO_FLOW: f64 = 1.0;

/// Default occupancy-to-density factor (samples already in veh/km).
pub const DEFAULT_OCCUPANCY_TO_DENSITY: f64 = 1.0;

/// Default minimum metering rate (veh/h). Zero disables the floor.
pub const DEFAULT_MIN_METERING_RATE: f64 = 0.0;

/// Default filter time step: one 15 s aggregation interval, in hours.
pub const DEFAULT_TIME_STEP_H: f64 = 15.0 / 3600.0;
