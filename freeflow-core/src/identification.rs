//! Online Identification of the Flow-Density Diagram
//!
//! ## Model
//!
//! The triangular fundamental diagram has two straight branches meeting at
//! capacity:
//!
//! ```text
//!  q │        capacity
//!    │          /\
//!    │    v    /  \   -w
//!    │        /    \
//!    │       /      \
//!    │      /        \
//!    └─────/──────────\──── ρ
//!          0   ρ_c     ρ_j
//! ```
//!
//! - Free branch (`ρ ≤ ρ_c`): `q = v·ρ`
//! - Congested branch (`ρ > ρ_c`): `q = a + b·ρ` with `b = −w`, `a = w·ρ_j`
//!
//! Each branch is fitted by its own recursive least-squares estimator with
//! exponential forgetting, so the diagram tracks weather, incidents and
//! time-of-day shifts without storing history:
//!
//! ```text
//! k = P·φ / (λ + φᵀ·P·φ)
//! θ = θ + k·(q − φᵀ·θ)
//! P = (P − k·φᵀ·P) / λ
//! ```
//!
//! The covariance diagonal is capped at its initial value. Without the cap,
//! forgetting with no fresh excitation (hours of free flow, say) grows `P`
//! geometrically and the next congested sample is over-weighted.
//!
//! ## Derived parameters
//!
//! ```text
//! ρ_j = −a / b
//! ρ_c = a / (v − b)      (intersection of the two branches)
//! ```
//!
//! A candidate is only adopted when it is physically consistent:
//! `v > 0`, `0 < ρ_c < ρ_j`, everything finite. Otherwise the previous fit
//! stays in force.
//!
//! Data outside the physical envelope (`0 ≤ ρ ≤ 250`, `0 ≤ q ≤ v·ρ_j` of the
//! configured cell) are not fitted, and an update whose result would not be
//! finite is dropped whole.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use heapless::HistoryBuffer;

use crate::{
    constants::{
        filter::{MIN_CONGESTED_SAMPLES, OBSERVATION_WINDOW},
        traffic::{FREE_FLOW_SPEED_PRIOR_FACTOR, MAX_MAINLINE_DENSITY},
    },
    parameters::{CellParameters, IdentificationConfig},
    traits::Validatable,
};

/// Triangular flow-density model parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FundamentalDiagram {
    /// Slope of the free branch (km/h)
    pub free_flow_speed: f64,
    /// Density at capacity (veh/km)
    pub critical_density: f64,
    /// Density at which flow vanishes (veh/km)
    pub jam_density: f64,
}

impl FundamentalDiagram {
    /// Flow at the apex of the triangle (veh/h)
    pub fn capacity_flow(&self) -> f64 {
        self.free_flow_speed * self.critical_density
    }

    /// Backward wave speed `w` (km/h)
    pub fn wave_speed(&self) -> f64 {
        self.capacity_flow() / (self.jam_density - self.critical_density)
    }

    fn is_consistent(&self) -> bool {
        [self.free_flow_speed, self.critical_density, self.jam_density].is_valid()
            && self.free_flow_speed > 0.0
            && self.critical_density > 0.0
            && self.critical_density < self.jam_density
    }
}

/// One (flow, density) pair observed at the merge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Flow (veh/h)
    pub flow: f64,
    /// Density (veh/km)
    pub density: f64,
}

/// Recursive fit of the fundamental diagram
///
/// Seeded from the configured cell parameters with a deliberately low
/// free-flow speed, then refined by every [`add_datum`](Self::add_datum).
#[derive(Debug, Clone)]
pub struct SystemIdentifier {
    config: IdentificationConfig,
    diagram: FundamentalDiagram,
    /// Largest flow accepted as a datum (veh/h)
    flow_ceiling: f64,
    // Free branch: q = v·ρ
    speed: f64,
    speed_covariance: f64,
    // Congested branch: q = a + b·ρ
    theta: [f64; 2],
    covariance: [[f64; 2]; 2],
    congested_samples: u32,
    window: HistoryBuffer<Observation, OBSERVATION_WINDOW>,
    count: u64,
}

impl SystemIdentifier {
    /// Seed from the configured cell parameters
    pub fn new(parameters: &CellParameters, config: IdentificationConfig) -> Self {
        let diagram = FundamentalDiagram {
            free_flow_speed: FREE_FLOW_SPEED_PRIOR_FACTOR * parameters.free_flow_speed,
            critical_density: parameters.critical_density,
            jam_density: parameters.jam_density,
        };
        let wave = diagram.wave_speed();
        let p0 = config.initial_covariance;

        Self {
            config,
            diagram,
            flow_ceiling: parameters.free_flow_speed * parameters.jam_density,
            speed: diagram.free_flow_speed,
            speed_covariance: p0,
            theta: [wave * diagram.jam_density, -wave],
            covariance: [[p0, 0.0], [0.0, p0]],
            congested_samples: 0,
            window: HistoryBuffer::new(),
            count: 0,
        }
    }

    /// Absorb one (flow, density) observation
    ///
    /// Non-finite pairs and pairs outside the physical envelope are ignored.
    pub fn add_datum(&mut self, flow: f64, density: f64) {
        if !flow.is_valid() || !density.is_valid() {
            log_debug!("identifier: ignoring non-finite datum ({}, {})", flow, density);
            return;
        }
        if !(0.0..=self.flow_ceiling).contains(&flow)
            || !(0.0..=MAX_MAINLINE_DENSITY).contains(&density)
        {
            log_debug!("identifier: ignoring non-physical datum ({}, {})", flow, density);
            return;
        }

        self.window.write(Observation { flow, density });
        self.count = self.count.saturating_add(1);

        let fitted = if density <= self.diagram.critical_density {
            self.update_free_branch(flow, density)
        } else {
            self.update_congested_branch(flow, density)
        };
        if fitted {
            self.refit();
        } else {
            log_debug!("identifier: update on ({}, {}) overflowed, dropped", flow, density);
        }
    }

    fn update_free_branch(&mut self, flow: f64, density: f64) -> bool {
        let lambda = self.config.forgetting_factor;
        let p = self.speed_covariance;

        let gain = p * density / (lambda + density * density * p);
        let speed = self.speed + gain * (flow - self.speed * density);
        let covariance = ((p - gain * density * p) / lambda).clamp(0.0, self.config.initial_covariance);
        if !speed.is_valid() || !covariance.is_valid() {
            return false;
        }

        self.speed = speed;
        self.speed_covariance = covariance;
        true
    }

    fn update_congested_branch(&mut self, flow: f64, density: f64) -> bool {
        let lambda = self.config.forgetting_factor;
        let phi = [1.0, density];
        let p = self.covariance;

        let p_phi = [
            p[0][0] * phi[0] + p[0][1] * phi[1],
            p[1][0] * phi[0] + p[1][1] * phi[1],
        ];
        let denom = lambda + phi[0] * p_phi[0] + phi[1] * p_phi[1];
        let gain = [p_phi[0] / denom, p_phi[1] / denom];

        let residual = flow - (self.theta[0] + self.theta[1] * density);
        let theta = [
            self.theta[0] + gain[0] * residual,
            self.theta[1] + gain[1] * residual,
        ];

        let mut next = [[0.0; 2]; 2];
        for (i, row) in next.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (p[i][j] - gain[i] * p_phi[j]) / lambda;
            }
        }
        let covariance = bounded_covariance(next, self.config.initial_covariance);
        if !theta.is_valid() || !covariance.is_valid() {
            return false;
        }

        self.theta = theta;
        self.covariance = covariance;
        self.congested_samples = self.congested_samples.saturating_add(1);
        true
    }

    fn refit(&mut self) {
        let mut candidate = self.diagram;
        if self.speed.is_valid() && self.speed > 0.0 {
            candidate.free_flow_speed = self.speed;
        }

        let [a, b] = self.theta;
        if self.congested_samples >= MIN_CONGESTED_SAMPLES && b < 0.0 {
            candidate.jam_density = -a / b;
            candidate.critical_density = a / (candidate.free_flow_speed - b);
        }

        if candidate.is_consistent() {
            self.diagram = candidate;
        } else {
            log_debug!(
                "identifier: rejected candidate v={} rho_c={} rho_j={}",
                candidate.free_flow_speed,
                candidate.critical_density,
                candidate.jam_density
            );
        }
    }

    /// Fitted free-flow speed (km/h)
    pub fn free_flow_speed(&self) -> f64 {
        self.diagram.free_flow_speed
    }

    /// Fitted critical density (veh/km)
    pub fn critical_density(&self) -> f64 {
        self.diagram.critical_density
    }

    /// Fitted jam density (veh/km)
    pub fn jam_density(&self) -> f64 {
        self.diagram.jam_density
    }

    /// All fitted parameters
    pub fn parameters(&self) -> FundamentalDiagram {
        self.diagram
    }

    /// Fitted capacity (veh/h)
    pub fn capacity_flow(&self) -> f64 {
        self.diagram.capacity_flow()
    }

    /// Most recent observations, oldest first
    pub fn observations(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.window.oldest_ordered()
    }

    /// Total observations absorbed since construction
    pub fn observation_count(&self) -> u64 {
        self.count
    }
}

/// Symmetrise, cap the diagonal, and keep the matrix positive semi-definite
fn bounded_covariance(mut p: [[f64; 2]; 2], cap: f64) -> [[f64; 2]; 2] {
    let off = 0.5 * (p[0][1] + p[1][0]);
    p[0][0] = p[0][0].clamp(0.0, cap);
    p[1][1] = p[1][1].clamp(0.0, cap);

    let limit = libm::sqrt(p[0][0] * p[1][1]);
    let off = off.clamp(-limit, limit);
    p[0][1] = off;
    p[1][0] = off;
    p
}
