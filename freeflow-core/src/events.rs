//! Measurement Events
//!
//! ## Overview
//!
//! The sensing network aggregates raw detector pulses into interval samples
//! (typically 15 s to 1 min) and emits one event per detector and interval.
//! By the time an event reaches this crate it has been parsed into a
//! [`MeasurementEvent`]: a tag, the detector identifier, and five numbers.
//!
//! ## Validity
//!
//! A `MeasurementEvent` can only be built through [`MeasurementEvent::new`],
//! which refuses any non-finite field. The estimators therefore never see a
//! NaN: the recursive filters would carry it forward forever.
//!
//! ```text
//! attribute map ──parse──► IntervalSample ──validate──► MeasurementEvent ──► FreewayCell
//!                   │                          │
//!              missing field              NaN / Inf
//!                   ▼                          ▼
//!                dropped                    dropped
//! ```
//!
//! Missing fields are the ingestion layer's concern (see the schemas crate);
//! this module guarantees the second half.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    errors::EventError,
    roles::SensorId,
    traits::Validatable,
};

/// Kind of aggregated sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventKind {
    /// Density and speed averaged over an interval at a mainline location
    MainlineInterval,
    /// Ramp detector values averaged over an interval
    OnRampInterval,
}

impl EventKind {
    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            EventKind::MainlineInterval => "mainline_interval",
            EventKind::OnRampInterval => "onramp_interval",
        }
    }
}

/// The five numbers carried by an interval sample, in raw detector units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntervalSample {
    /// Mean vehicle count (or flow) over the interval
    pub mean_flow: f64,
    /// Mean occupancy, the density proxy
    pub mean_occupancy: f64,
    /// Mean speed (km/h)
    pub mean_speed: f64,
    /// Standard deviation of the flow
    pub flow_std: f64,
    /// Standard deviation of the density proxy
    pub density_std: f64,
}

impl IntervalSample {
    /// Create a sample
    pub const fn new(
        mean_flow: f64,
        mean_occupancy: f64,
        mean_speed: f64,
        flow_std: f64,
        density_std: f64,
    ) -> Self {
        Self {
            mean_flow,
            mean_occupancy,
            mean_speed,
            flow_std,
            density_std,
        }
    }

    /// Fields paired with their names, in declaration order
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("mean_flow", self.mean_flow),
            ("mean_occupancy", self.mean_occupancy),
            ("mean_speed", self.mean_speed),
            ("flow_std", self.flow_std),
            ("density_std", self.density_std),
        ]
    }

    /// Name of the first non-finite field, if any
    pub fn first_invalid(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| !value.is_valid())
            .map(|(name, _)| name)
    }

    /// Convert raw detector units into physical units
    ///
    /// Flow and its std-dev scale by `cars_to_flow`, occupancy and its std-dev
    /// by `occupancy_to_density`. Speed passes through.
    pub fn to_physical(&self, cars_to_flow: f64, occupancy_to_density: f64) -> Self {
        Self {
            mean_flow: cars_to_flow * self.mean_flow,
            mean_occupancy: occupancy_to_density * self.mean_occupancy,
            mean_speed: self.mean_speed,
            flow_std: cars_to_flow * self.flow_std,
            density_std: occupancy_to_density * self.density_std,
        }
    }
}

impl Validatable for IntervalSample {
    fn is_valid(&self) -> bool {
        self.first_invalid().is_none()
    }
}

/// A validated, fully-formed measurement event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementEvent {
    kind: EventKind,
    sensor_id: SensorId,
    sample: IntervalSample,
}

impl MeasurementEvent {
    /// Validate and wrap a sample
    pub fn new(
        kind: EventKind,
        sensor_id: SensorId,
        sample: IntervalSample,
    ) -> Result<Self, EventError> {
        if let Some(field) = sample.first_invalid() {
            return Err(EventError::NonFinite { field });
        }
        Ok(Self {
            kind,
            sensor_id,
            sample,
        })
    }

    /// Event kind
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Reporting detector
    pub fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    /// Raw sample values
    pub fn sample(&self) -> &IntervalSample {
        &self.sample
    }
}
