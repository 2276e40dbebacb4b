//! Traffic State Estimation for a Freeway Cell
//!
//! ## Overview
//!
//! Detectors at the two boundaries of a segment report interval averages of
//! flow, occupancy and speed, each with a standard deviation. The samples are
//! noisy, arrive asynchronously, and occasionally drop out. The
//! [`StateEstimator`] fuses them into one density and one flow estimate that
//! stay physically meaningful:
//!
//! ```text
//!  in-boundary samples ──► inflow filter ──┐
//!                                          ├─► density filter ─► ρ̂ ∈ [0, ρ_max]
//! out-boundary samples ──► outflow filter ─┘
//!                              │
//!                              └──────────────────────────────► q̂ (flow leaving)
//! ```
//!
//! ## Filter Equations
//!
//! Every quantity is a scalar Kalman filter ([`kalman::ScalarKalman`]).
//!
//! ### Boundary flows
//! Each channel owns a random-walk filter on its own flow. The in-channel is
//! touched only by in-samples and the out-channel only by out-samples, so the
//! two flow trajectories commute with respect to each other.
//! ```text
//! P⁻ = P + Q_flow;  K = P⁻/(P⁻ + σ_q²);  q̂ = max(q̂ + K(z − q̂), 0)
//! ```
//!
//! ### Density: conservation prediction
//! Vehicles entering raise the density, vehicles leaving lower it. Once both
//! boundaries have reported, every sample (on either side) advances the
//! balance by half a step:
//! ```text
//! ρ⁻ = clamp(ρ̂ + (Δt / 2L)·(q̂_in − q̂_out), 0, ρ_max)
//! P⁻ = P + Q_density
//! ```
//! One in-sample and one out-sample per interval together apply the full
//! conservation step `Δt·(q_in − q_out)/L`. Before both flows are known the
//! balance is zero and only the process noise is added.
//!
//! ### Density: observation
//! Two observations of the same density are fused by inverse variance before
//! the update: the occupancy-derived density (σ_ρ²), and, when the vehicles
//! are moving, the fundamental relation `ρ = q / v` with variance `(σ_q/v)²`.
//! On-ramp samples carry a huge σ_ρ, which leaves `q / v` in charge.
//!
//! ## Invariants
//!
//! - `density()` ∈ [0, ρ_max] after every update
//! - `flow()` ≥ 0
//! - Reads never mutate
//! - Identical sample sequences from fresh estimators give identical state

pub mod kalman;
mod state;

pub use kalman::ScalarKalman;
pub use state::StateEstimator;
