//! Injected configuration for a freeway cell
//!
//! Two layers:
//!
//! - [`CellParameters`]: the physical constants of one segment, immutable for
//!   the cell's lifetime.
//! - [`EstimationConfig`]: deployment-wide settings shared by every cell
//!   (unit conversions, metering floor, ceilings, time step, filter tuning).
//!
//! Both validate once, when a cell is built. Nothing here is consulted for
//! correctness afterwards.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{filter, traffic},
    errors::{ConfigError, ConfigResult},
    traits::Validatable,
};

/// Physical constants of one freeway cell
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellParameters {
    /// Segment length (km)
    pub length: f64,
    /// Free-flow speed (km/h)
    pub free_flow_speed: f64,
    /// Critical density at capacity (veh/km)
    pub critical_density: f64,
    /// Jam density (veh/km)
    pub jam_density: f64,
    /// On-ramp queue length (km); zero when the cell has no on-ramp
    #[cfg_attr(feature = "serde", serde(default))]
    pub queue_length: f64,
}

impl CellParameters {
    /// Create parameters; call [`validate`](Self::validate) before use
    pub const fn new(
        length: f64,
        free_flow_speed: f64,
        critical_density: f64,
        jam_density: f64,
        queue_length: f64,
    ) -> Self {
        Self {
            length,
            free_flow_speed,
            critical_density,
            jam_density,
            queue_length,
        }
    }

    /// Whether the cell carries an on-ramp
    pub fn has_onramp(&self) -> bool {
        self.queue_length > 0.0
    }

    /// Check physical consistency
    pub fn validate(&self) -> ConfigResult<()> {
        positive("length", self.length)?;
        positive("free_flow_speed", self.free_flow_speed)?;
        positive("jam_density", self.jam_density)?;

        if !self.critical_density.is_valid() {
            return Err(ConfigError::InvalidParameter {
                name: "critical_density",
                value: self.critical_density,
            });
        }
        if self.critical_density <= 0.0 || self.critical_density >= self.jam_density {
            return Err(ConfigError::InconsistentDensities {
                critical: self.critical_density,
                jam: self.jam_density,
            });
        }

        if !self.queue_length.is_valid() || self.queue_length < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "queue_length",
                value: self.queue_length,
            });
        }

        Ok(())
    }
}

/// Process noise of the state estimator filters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterTuning {
    /// Flow random-walk variance added per update ((veh/h)²)
    pub flow_process_noise: f64,
    /// Density variance added per conservation step ((veh/km)²)
    pub density_process_noise: f64,
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self {
            flow_process_noise: filter::DEFAULT_FLOW_PROCESS_NOISE,
            density_process_noise: filter::DEFAULT_DENSITY_PROCESS_NOISE,
        }
    }
}

/// Settings of the online flow-density fit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IdentificationConfig {
    /// Exponential forgetting factor λ in (0, 1]
    pub forgetting_factor: f64,
    /// Initial and maximum covariance diagonal
    pub initial_covariance: f64,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            forgetting_factor: filter::DEFAULT_FORGETTING_FACTOR,
            initial_covariance: filter::DEFAULT_INITIAL_COVARIANCE,
        }
    }
}

/// Deployment-wide estimation settings
///
/// ```rust
/// use freeflow_core::EstimationConfig;
///
/// let config = EstimationConfig::default()
///     .with_min_metering_rate(240.0)
///     .with_conversions(120.0, 1.25);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EstimationConfig {
    /// Factor turning raw counts (and their std-dev) into flow
    pub cars_to_flow: f64,
    /// Factor turning occupancy (and its std-dev) into density
    pub occupancy_to_density: f64,
    /// Lowest physically possible metered flow (veh/h)
    pub min_metering_rate: f64,
    /// Mainline and merge-area density ceiling (veh/km)
    pub max_mainline_density: f64,
    /// On-ramp density ceiling (veh/km)
    pub max_onramp_density: f64,
    /// Filter time step (h)
    pub time_step: f64,
    /// Guard in the merge-density ratio (veh/h)
    pub merge_epsilon: f64,
    /// Density std-dev forced on on-ramp samples
    pub unreliable_density_std: f64,
    /// State estimator process noise
    pub tuning: FilterTuning,
    /// Online fit settings
    pub identification: IdentificationConfig,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            cars_to_flow: traffic::DEFAULT_CARS_TO_FLOW,
            occupancy_to_density: traffic::DEFAULT_OCCUPANCY_TO_DENSITY,
            min_metering_rate: traffic::DEFAULT_MIN_METERING_RATE,
            max_mainline_density: traffic::MAX_MAINLINE_DENSITY,
            max_onramp_density: traffic::MAX_ONRAMP_DENSITY,
            time_step: traffic::DEFAULT_TIME_STEP_H,
            merge_epsilon: traffic::MERGE_FLOW_EPSILON,
            unreliable_density_std: traffic::UNRELIABLE_DENSITY_STD,
            tuning: FilterTuning::default(),
            identification: IdentificationConfig::default(),
        }
    }
}

impl EstimationConfig {
    /// Set the raw-to-physical conversion factors
    pub fn with_conversions(mut self, cars_to_flow: f64, occupancy_to_density: f64) -> Self {
        self.cars_to_flow = cars_to_flow;
        self.occupancy_to_density = occupancy_to_density;
        self
    }

    /// Set the minimum metering rate
    pub fn with_min_metering_rate(mut self, rate: f64) -> Self {
        self.min_metering_rate = rate;
        self
    }

    /// Set the filter time step (h)
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set the filter process noise
    pub fn with_tuning(mut self, tuning: FilterTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the online fit settings
    pub fn with_identification(mut self, identification: IdentificationConfig) -> Self {
        self.identification = identification;
        self
    }

    /// Check every setting
    pub fn validate(&self) -> ConfigResult<()> {
        setting("cars_to_flow", self.cars_to_flow)?;
        setting("occupancy_to_density", self.occupancy_to_density)?;
        setting("max_mainline_density", self.max_mainline_density)?;
        setting("max_onramp_density", self.max_onramp_density)?;
        setting("time_step", self.time_step)?;
        setting("merge_epsilon", self.merge_epsilon)?;
        setting("unreliable_density_std", self.unreliable_density_std)?;

        if self.max_mainline_density > traffic::MAX_MAINLINE_DENSITY {
            return Err(ConfigError::InvalidSetting {
                name: "max_mainline_density",
                value: self.max_mainline_density,
            });
        }
        if !self.min_metering_rate.is_valid() || self.min_metering_rate < 0.0 {
            return Err(ConfigError::InvalidSetting {
                name: "min_metering_rate",
                value: self.min_metering_rate,
            });
        }

        let tuning = &self.tuning;
        non_negative("flow_process_noise", tuning.flow_process_noise)?;
        non_negative("density_process_noise", tuning.density_process_noise)?;

        let id = &self.identification;
        if !id.forgetting_factor.is_valid()
            || id.forgetting_factor <= 0.0
            || id.forgetting_factor > 1.0
        {
            return Err(ConfigError::InvalidSetting {
                name: "forgetting_factor",
                value: id.forgetting_factor,
            });
        }
        setting("initial_covariance", id.initial_covariance)?;

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_valid() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn setting(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_valid() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_valid() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting { name, value })
    }
}
