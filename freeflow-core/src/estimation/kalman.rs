//! Scalar Kalman filter
//!
//! The cell-level estimators need nothing heavier than one-dimensional
//! filters: each estimated quantity (boundary flow, segment density) is its
//! own scalar state with its own variance.
//!
//! ### Prediction
//! ```text
//! x̂⁻ = x̂ + u          (u: optional conservation input, default 0)
//! P⁻ = P + Q
//! ```
//!
//! ### Update
//! ```text
//! K  = P⁻ / (P⁻ + R)
//! x̂  = x̂⁻ + K·(z − x̂⁻)
//! P  = (1 − K)·P⁻
//! ```
//!
//! With `R = σ²` from the sensor, a noisy sample (large σ) barely moves the
//! state and a precise one dominates it. The very first sample has no prior
//! to blend with and initialises the state directly.
//!
//! A step whose result would not be finite is dropped and the state is left
//! as it was.

use crate::{
    constants::filter::{VARIANCE_CEILING, VARIANCE_FLOOR},
    traits::Validatable,
};

/// One-dimensional Kalman filter state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalman {
    estimate: f64,
    variance: f64,
    updates: u32,
}

impl Default for ScalarKalman {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarKalman {
    /// Create an uninitialised filter
    pub const fn new() -> Self {
        Self {
            estimate: 0.0,
            variance: 0.0,
            updates: 0,
        }
    }

    /// Whether at least one observation has been absorbed
    pub fn is_initialised(&self) -> bool {
        self.updates > 0
    }

    /// Current estimate (0 before the first observation)
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Current estimation variance
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Number of observations absorbed
    pub fn updates(&self) -> u32 {
        self.updates
    }

    /// Time update: shift the estimate by `input` and inflate the variance by `noise`
    ///
    /// No-op before the first observation, since there is no state to move.
    /// An input that would overflow the estimate is dropped; the variance is
    /// still inflated.
    pub fn predict(&mut self, input: f64, noise: f64) {
        if !self.is_initialised() {
            return;
        }
        let estimate = self.estimate + input;
        if estimate.is_valid() {
            self.estimate = estimate;
        }
        let variance = bounded(self.variance + noise);
        if variance.is_valid() {
            self.variance = variance;
        }
    }

    /// Measurement update with observation `z` of variance `r`
    ///
    /// Returns the gain applied (1 for the initialising observation, 0 when
    /// the observation was rejected).
    pub fn update(&mut self, z: f64, r: f64) -> f64 {
        let r = bounded(r);
        if !z.is_valid() || !r.is_valid() {
            return 0.0;
        }

        if !self.is_initialised() {
            self.estimate = z;
            self.variance = r;
            self.updates = 1;
            return 1.0;
        }

        let prior = bounded(self.variance);
        let gain = prior / (prior + r);
        let estimate = self.estimate + gain * (z - self.estimate);
        let variance = (1.0 - gain) * prior;
        if !estimate.is_valid() || !variance.is_valid() {
            return 0.0;
        }

        self.estimate = estimate;
        self.variance = variance;
        self.updates = self.updates.saturating_add(1);
        gain
    }

    /// Clamp the estimate into `[min, max]` without touching the variance
    pub fn clamp(&mut self, min: f64, max: f64) {
        self.estimate = self.estimate.clamp(min, max);
    }
}

/// Inverse-variance fusion of two observations of the same quantity
///
/// Returns the fused value and its variance.
pub fn fuse(z1: f64, r1: f64, z2: f64, r2: f64) -> (f64, f64) {
    let w1 = 1.0 / bounded(r1);
    let w2 = 1.0 / bounded(r2);
    let total = w1 + w2;
    ((w1 * z1 + w2 * z2) / total, 1.0 / total)
}

fn bounded(variance: f64) -> f64 {
    variance.clamp(VARIANCE_FLOOR, VARIANCE_CEILING)
}
