//! Boundary-pair state estimator

use crate::{
    constants::filter::MIN_SPEED_FOR_DENSITY,
    parameters::FilterTuning,
};

use super::kalman::{fuse, ScalarKalman};

/// Which boundary of the segment a sample was taken at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    In,
    Out,
}

/// Recursive density/flow estimator for one segment
///
/// One instance tracks the mainline of a cell, another the on-ramp queue.
/// Mutated only through [`process_in_measurement`](Self::process_in_measurement)
/// and [`process_out_measurement`](Self::process_out_measurement); every
/// other method is a pure read.
///
/// ```rust
/// use freeflow_core::StateEstimator;
///
/// // 500 m segment, 250 veh/km jam density, 15 s step
/// let mut estimator = StateEstimator::new(0.5, 250.0, 15.0 / 3600.0);
/// estimator.process_in_measurement(1800.0, 90.0, 20.0, 2.0, 90.0);
/// estimator.process_out_measurement(1750.0, 90.0, 21.0, 2.0, 85.0);
///
/// assert!(estimator.density() > 19.0 && estimator.density() < 22.0);
/// assert!(estimator.flow() > 1700.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StateEstimator {
    /// Segment (or queue) length, km
    length: f64,
    /// Density ceiling, veh/km
    max_density: f64,
    /// Time step, h
    time_step: f64,
    tuning: FilterTuning,
    inflow: ScalarKalman,
    outflow: ScalarKalman,
    density: ScalarKalman,
}

impl StateEstimator {
    /// Create an estimator with default process noise
    pub fn new(length: f64, max_density: f64, time_step: f64) -> Self {
        Self::with_tuning(length, max_density, time_step, FilterTuning::default())
    }

    /// Create an estimator with explicit process noise
    pub fn with_tuning(length: f64, max_density: f64, time_step: f64, tuning: FilterTuning) -> Self {
        Self {
            length,
            max_density,
            time_step,
            tuning,
            inflow: ScalarKalman::new(),
            outflow: ScalarKalman::new(),
            density: ScalarKalman::new(),
        }
    }

    /// Absorb a sample taken at the upstream boundary
    ///
    /// Arguments must be finite; the cell guarantees this.
    pub fn process_in_measurement(
        &mut self,
        flow: f64,
        flow_std: f64,
        density: f64,
        density_std: f64,
        speed: f64,
    ) {
        self.process(Boundary::In, flow, flow_std, density, density_std, speed);
    }

    /// Absorb a sample taken at the downstream boundary
    ///
    /// Arguments must be finite; the cell guarantees this.
    pub fn process_out_measurement(
        &mut self,
        flow: f64,
        flow_std: f64,
        density: f64,
        density_std: f64,
        speed: f64,
    ) {
        self.process(Boundary::Out, flow, flow_std, density, density_std, speed);
    }

    fn process(
        &mut self,
        boundary: Boundary,
        flow: f64,
        flow_std: f64,
        density: f64,
        density_std: f64,
        speed: f64,
    ) {
        // Boundary flow: random walk, never negative
        let channel = match boundary {
            Boundary::In => &mut self.inflow,
            Boundary::Out => &mut self.outflow,
        };
        channel.predict(0.0, self.tuning.flow_process_noise);
        channel.update(flow, flow_std * flow_std);
        channel.clamp(0.0, f64::MAX);

        // Both boundaries report once per interval, so each sample advances
        // the vehicle balance by half a step.
        let balance = match (self.inflow.is_initialised(), self.outflow.is_initialised()) {
            (true, true) => {
                0.5 * self.time_step / self.length
                    * (self.inflow.estimate() - self.outflow.estimate())
            }
            _ => 0.0,
        };
        self.density.predict(balance, self.tuning.density_process_noise);
        self.density.clamp(0.0, self.max_density);

        let (observed, variance) =
            observed_density(flow, flow_std, density, density_std, speed, self.max_density);
        self.density.update(observed, variance);
        self.density.clamp(0.0, self.max_density);
    }

    /// Current density estimate (veh/km), 0 before the first sample
    pub fn density(&self) -> f64 {
        self.density.estimate()
    }

    /// Current flow estimate (veh/h): the flow leaving the segment
    ///
    /// Falls back to the inflow until the downstream boundary has reported,
    /// and to 0 before any sample.
    pub fn flow(&self) -> f64 {
        if self.outflow.is_initialised() {
            self.outflow.estimate()
        } else {
            self.inflow.estimate()
        }
    }

    /// Upstream boundary flow, once reported
    pub fn inflow(&self) -> Option<f64> {
        self.inflow.is_initialised().then(|| self.inflow.estimate())
    }

    /// Downstream boundary flow, once reported
    pub fn outflow(&self) -> Option<f64> {
        self.outflow.is_initialised().then(|| self.outflow.estimate())
    }

    /// Standard deviation of the density estimate
    pub fn density_std(&self) -> f64 {
        libm::sqrt(self.density.variance())
    }

    /// Samples absorbed on both boundaries
    pub fn sample_count(&self) -> u32 {
        self.inflow.updates().saturating_add(self.outflow.updates())
    }

    /// Whether any sample has been absorbed
    pub fn is_initialised(&self) -> bool {
        self.density.is_initialised()
    }

    /// Segment (or queue) length, km
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Density ceiling, veh/km
    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    /// Vehicles currently stored in the segment
    pub fn vehicles(&self) -> f64 {
        self.density() * self.length
    }
}

/// Fuse occupancy density with the speed-implied density `q / v`
///
/// Both readings are clamped into `[0, max_density]` first.
fn observed_density(
    flow: f64,
    flow_std: f64,
    density: f64,
    density_std: f64,
    speed: f64,
    max_density: f64,
) -> (f64, f64) {
    let density = density.clamp(0.0, max_density);
    let occupancy_variance = density_std * density_std;
    if speed > MIN_SPEED_FOR_DENSITY {
        let implied = (flow / speed).clamp(0.0, max_density);
        let implied_std = flow_std / speed;
        fuse(density, occupancy_variance, implied, implied_std * implied_std)
    } else {
        (density, occupancy_variance)
    }
}
