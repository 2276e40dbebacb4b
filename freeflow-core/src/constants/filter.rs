//! Filter and Identification Constants
//!
//! Tuning values for the scalar Kalman filters inside each state estimator
//! and for the recursive least-squares fit inside the system identifier.

// ===== KALMAN FILTERS =====

/// Smallest variance admitted anywhere in a filter.
///
/// A sensor reporting a zero standard deviation would otherwise produce a
/// gain of exactly one and a `0 / 0` when the prior is also exact.
pub const VARIANCE_FLOOR: f64 = 1e-6;

/// Largest variance admitted anywhere in a filter.
///
/// Squaring a very large standard deviation overflows to infinity, and an
/// infinite prior turns the next gain into `inf / inf`.
pub const VARIANCE_CEILING: f64 = 1e18;

/// Speed below which `flow / speed` is not used as a density observation (km/h).
///
/// Stopped or crawling traffic makes the ratio explode; the occupancy term
/// alone carries the density in that regime.
pub const MIN_SPEED_FOR_DENSITY: f64 = 1.0;

/// Default flow process noise per update ((veh/h)²).
///
/// Allows the flow estimate to drift by roughly 20 veh/h per interval.
pub const DEFAULT_FLOW_PROCESS_NOISE: f64 = 400.0;

/// Default density process noise per update ((veh/km)²).
pub const DEFAULT_DENSITY_PROCESS_NOISE: f64 = 4.0;

// ===== SYSTEM IDENTIFICATION =====

/// Number of recent (flow, density) pairs retained for inspection.
pub const OBSERVATION_WINDOW: usize = 64;

/// Default exponential forgetting factor of the RLS fit.
///
/// 0.99 gives an effective memory of about 100 merge samples, roughly
/// 25 minutes at 15 s aggregation.
pub const DEFAULT_FORGETTING_FACTOR: f64 = 0.99;

/// Default initial (and maximum) diagonal of the RLS covariance.
///
/// Also the wind-up cap: with forgetting and no excitation the covariance
/// grows geometrically, so its diagonal is clipped to this value.
pub const DEFAULT_INITIAL_COVARIANCE: f64 = 1e4;

/// Congested samples required before the congested branch is trusted.
pub const MIN_CONGESTED_SAMPLES: u32 = 2;
