//! Freeway Cell
//!
//! ## Overview
//!
//! A cell is one freeway segment with its detectors. It owns a mainline
//! [`StateEstimator`], and, when the segment has an on-ramp, an [`OnRamp`]
//! bundling the ramp estimator with the [`SystemIdentifier`] fed from the
//! merge area. Events are routed by the role their detector plays:
//!
//! | role | action |
//! |---|---|
//! | mainline in | mainline in-boundary update |
//! | mainline out | mainline out-boundary update, then merge density with the caller's prior |
//! | merge | merge density with the detector's own density as prior |
//! | on-ramp in | ramp in-boundary update, density std-dev forced unreliable |
//! | on-ramp out | ramp out-boundary update, density std-dev forced unreliable, flow floored at the metering minimum |
//! | anything else | ignored |
//!
//! ## Merge Density
//!
//! Vehicles entering from the ramp compress the mainline stream just
//! downstream of the merge. Conservation across the merge gives
//!
//! ```text
//! raw   = ρ_main · (q_main + q_ramp) / (q_main + ε)
//! merge = min(max(raw, prior), ρ_ceiling)
//! ```
//!
//! The prior (an upstream estimate of the same quantity) is a floor, the
//! mainline ceiling is a hard cap. A cell without on-ramp has nothing to
//! correct and publishes `min(max(ρ_main, prior), ρ_ceiling)`.
//!
//! ## Failure Behaviour
//!
//! Nothing on the dispatch path returns an error. An event is either applied
//! in full or ignored in full; the [`Dispatch`] value says which.

use crate::{
    errors::{ConfigError, ConfigResult},
    estimation::StateEstimator,
    events::{IntervalSample, MeasurementEvent},
    identification::SystemIdentifier,
    parameters::{CellParameters, EstimationConfig},
    roles::{SensorId, SensorRole, SensorRoleTable},
    traits::Validatable,
};

/// Why an event left the cell untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The detector plays no role in this cell
    UnknownSensor,
    /// A field overflowed during unit conversion
    NonFinite,
    /// The detector feeds an on-ramp the cell does not have
    NoOnRamp,
}

/// Outcome of [`FreewayCell::process_measurement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The sample was applied for this role
    Applied(SensorRole),
    /// The sample was discarded
    Ignored(IgnoreReason),
}

impl Dispatch {
    /// Whether the event changed the cell
    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied(_))
    }
}

/// Ramp-side state of a cell
#[derive(Debug, Clone)]
pub struct OnRamp {
    estimator: StateEstimator,
    identifier: SystemIdentifier,
}

impl OnRamp {
    /// Ramp queue estimator
    pub fn estimator(&self) -> &StateEstimator {
        &self.estimator
    }

    /// Merge-area diagram fit
    pub fn identifier(&self) -> &SystemIdentifier {
        &self.identifier
    }
}

/// One freeway segment and its estimators
#[derive(Debug, Clone)]
pub struct FreewayCell {
    parameters: CellParameters,
    roles: SensorRoleTable,
    config: EstimationConfig,
    mainline: StateEstimator,
    onramp: Option<OnRamp>,
    merge_density: f64,
}

impl FreewayCell {
    /// Build a cell
    ///
    /// Fails when the parameters or settings are out of range, or when the
    /// role table names an on-ramp detector but `queue_length` is zero.
    pub fn new(
        parameters: CellParameters,
        roles: SensorRoleTable,
        config: EstimationConfig,
    ) -> ConfigResult<Self> {
        parameters.validate()?;
        config.validate()?;

        let onramp = if parameters.has_onramp() {
            Some(OnRamp {
                estimator: StateEstimator::with_tuning(
                    parameters.queue_length,
                    config.max_onramp_density,
                    config.time_step,
                    config.tuning,
                ),
                identifier: SystemIdentifier::new(&parameters, config.identification),
            })
        } else if let Some(role) = roles.onramp_role() {
            return Err(ConfigError::MissingOnRamp { role: role.name() });
        } else {
            None
        };

        Ok(Self {
            parameters,
            roles,
            config,
            mainline: StateEstimator::with_tuning(
                parameters.length,
                config.max_mainline_density,
                config.time_step,
                config.tuning,
            ),
            onramp,
            merge_density: 0.0,
        })
    }

    /// Route one event to the estimator its detector feeds
    ///
    /// `upstream_merge_density` is the merge density published by the cell
    /// upstream; it floors the merge estimate recomputed on mainline-out
    /// samples. Non-finite priors count as zero.
    pub fn process_measurement(
        &mut self,
        event: &MeasurementEvent,
        upstream_merge_density: f64,
    ) -> Dispatch {
        let Some(role) = self.roles.role_of(event.sensor_id()) else {
            log_debug!("cell: sensor {} not in role table", event.sensor_id());
            return Dispatch::Ignored(IgnoreReason::UnknownSensor);
        };

        let sample = event
            .sample()
            .to_physical(self.config.cars_to_flow, self.config.occupancy_to_density);
        if !sample.is_valid() {
            log_debug!(
                "cell: sensor {} {:?} overflowed on conversion",
                event.sensor_id(),
                sample.first_invalid()
            );
            return Dispatch::Ignored(IgnoreReason::NonFinite);
        }

        match role {
            SensorRole::MainlineIn => {
                apply(&mut self.mainline, role, &sample);
            }
            SensorRole::MainlineOut => {
                apply(&mut self.mainline, role, &sample);
                self.update_merge_density(upstream_merge_density);
            }
            SensorRole::Merge => {
                self.update_merge_density(sample.mean_occupancy);
            }
            SensorRole::OnRampIn | SensorRole::OnRampOut => {
                let Some(onramp) = self.onramp.as_mut() else {
                    return Dispatch::Ignored(IgnoreReason::NoOnRamp);
                };
                let mut ramp = sample;
                ramp.density_std = self.config.unreliable_density_std;
                if role == SensorRole::OnRampOut {
                    ramp.mean_flow = ramp.mean_flow.max(self.config.min_metering_rate);
                }
                apply(&mut onramp.estimator, role, &ramp);
            }
        }

        Dispatch::Applied(role)
    }

    fn update_merge_density(&mut self, prior: f64) {
        let ceiling = self.config.max_mainline_density;
        let prior = if prior.is_valid() { prior.clamp(0.0, ceiling) } else { 0.0 };

        let mainline_density = self.mainline.density();
        let mainline_flow = self.mainline.flow();

        let raw = match &self.onramp {
            Some(onramp) => {
                let ramp_flow = onramp.estimator.flow();
                mainline_density * (mainline_flow + ramp_flow)
                    / (mainline_flow + self.config.merge_epsilon)
            }
            None => mainline_density,
        };

        let merge = raw.max(prior).min(ceiling);
        if merge != raw {
            log_debug!("cell: merge density {} clamped to {}", raw, merge);
        }
        self.merge_density = merge;

        if let Some(onramp) = self.onramp.as_mut() {
            onramp.identifier.add_datum(mainline_flow, merge);
        }
    }

    /// Density just downstream of the merge (veh/km)
    pub fn merge_density(&self) -> f64 {
        self.merge_density
    }

    /// Mainline estimator
    pub fn mainline(&self) -> &StateEstimator {
        &self.mainline
    }

    /// Ramp-side state, if the cell has an on-ramp
    pub fn onramp(&self) -> Option<&OnRamp> {
        self.onramp.as_ref()
    }

    /// Merge-area diagram fit, if the cell has an on-ramp
    pub fn identifier(&self) -> Option<&SystemIdentifier> {
        self.onramp.as_ref().map(OnRamp::identifier)
    }

    /// Whether the cell has an on-ramp
    pub fn has_onramp(&self) -> bool {
        self.onramp.is_some()
    }

    /// Physical parameters
    pub fn parameters(&self) -> &CellParameters {
        &self.parameters
    }

    /// Detector role table
    pub fn roles(&self) -> &SensorRoleTable {
        &self.roles
    }

    /// Role of a detector in this cell
    pub fn role_of(&self, sensor_id: SensorId) -> Option<SensorRole> {
        self.roles.role_of(sensor_id)
    }

    /// Estimation settings
    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }
}

fn apply(estimator: &mut StateEstimator, role: SensorRole, s: &IntervalSample) {
    match role {
        SensorRole::MainlineIn | SensorRole::OnRampIn => estimator.process_in_measurement(
            s.mean_flow,
            s.flow_std,
            s.mean_occupancy,
            s.density_std,
            s.mean_speed,
        ),
        _ => estimator.process_out_measurement(
            s.mean_flow,
            s.flow_std,
            s.mean_occupancy,
            s.density_std,
            s.mean_speed,
        ),
    }
}
