//! Event record ingestion
//!
//! The event runtime hands over records whose attributes are an untyped map.
//! [`parse_measurement`] checks every attribute the cells rely on and
//! produces a [`MeasurementEvent`], or says precisely what was wrong.
//!
//! | record name | event kind |
//! |---|---|
//! | `AverageDensityAndSpeedPerLocationOverInterval` | mainline interval |
//! | `AverageOnRampValuesOverInterval` | on-ramp interval |
//!
//! Any other name is an [`IngestError::UnknownEvent`]: the runtime
//! multiplexes many event types on one stream and callers drop these
//! silently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use freeflow_core::{EventError, EventKind, IntervalSample, MeasurementEvent, SensorId};

use crate::SchemaError;

/// Record name of mainline interval samples
pub const MAINLINE_EVENT: &str = "AverageDensityAndSpeedPerLocationOverInterval";
/// Record name of on-ramp interval samples
pub const ONRAMP_EVENT: &str = "AverageOnRampValuesOverInterval";

/// Attribute holding the detector identifier
pub const SENSOR_ID: &str = "sensorId";
/// Attribute holding the mean flow (raw counts)
pub const AVERAGE_FLOW: &str = "average_flow";
/// Attribute holding the mean occupancy
pub const AVERAGE_OCCUPANCY: &str = "average_occupancy";
/// Attribute holding the mean speed
pub const AVERAGE_SPEED: &str = "average_speed";
/// Attribute holding the flow std-dev
pub const STANDARD_DEV_FLOW: &str = "standard_dev_flow";
/// Attribute holding the occupancy std-dev
pub const STANDARD_DEV_DENSITY: &str = "standard_dev_density";

/// Reasons a record does not become a measurement event
#[derive(Debug, Clone, PartialEq, thiserror_no_std::Error)]
pub enum IngestError {
    /// The record is of a type the cells do not consume
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// A required attribute is absent or null
    #[error("Missing attribute: {0}")]
    MissingField(&'static str),

    /// A numeric attribute holds something else
    #[error("Attribute {field} is not a number: {value}")]
    NotANumber {
        /// Attribute name
        field: &'static str,
        /// Offending value, as JSON
        value: String,
    },

    /// The detector identifier is not an unsigned 32-bit integer
    #[error("Invalid sensor id: {0}")]
    InvalidSensorId(String),

    /// A numeric attribute is NaN or infinite
    #[error("Attribute {field} is not finite")]
    NonFinite {
        /// Name of the offending sample field
        field: &'static str,
    },
}

impl From<EventError> for IngestError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NonFinite { field } => IngestError::NonFinite { field },
        }
    }
}

/// Event as delivered by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event type name
    pub name: String,
    /// Untyped attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EventRecord {
    /// Create a record
    pub fn new(name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Deserialize a record from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Event kind, if the record is one the cells consume
    pub fn kind(&self) -> Option<EventKind> {
        match self.name.as_str() {
            MAINLINE_EVENT => Some(EventKind::MainlineInterval),
            ONRAMP_EVENT => Some(EventKind::OnRampInterval),
            _ => None,
        }
    }
}

/// Turn a record into a validated measurement event
pub fn parse_measurement(record: &EventRecord) -> Result<MeasurementEvent, IngestError> {
    let kind = record
        .kind()
        .ok_or_else(|| IngestError::UnknownEvent(record.name.clone()))?;

    let attributes = &record.attributes;
    let sample = IntervalSample::new(
        number(attributes, AVERAGE_FLOW)?,
        number(attributes, AVERAGE_OCCUPANCY)?,
        number(attributes, AVERAGE_SPEED)?,
        number(attributes, STANDARD_DEV_FLOW)?,
        number(attributes, STANDARD_DEV_DENSITY)?,
    );
    let sensor_id = sensor_id(attributes)?;

    Ok(MeasurementEvent::new(kind, sensor_id, sample)?)
}

fn number(attributes: &Map<String, Value>, field: &'static str) -> Result<f64, IngestError> {
    match attributes.get(field) {
        None | Some(Value::Null) => Err(IngestError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| IngestError::NotANumber {
            field,
            value: n.to_string(),
        }),
        Some(other) => Err(IngestError::NotANumber {
            field,
            value: other.to_string(),
        }),
    }
}

fn sensor_id(attributes: &Map<String, Value>) -> Result<SensorId, IngestError> {
    match attributes.get(SENSOR_ID) {
        None | Some(Value::Null) => Err(IngestError::MissingField(SENSOR_ID)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(SensorId)
            .map_err(|_| IngestError::InvalidSensorId(s.clone())),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .map(SensorId)
            .ok_or_else(|| IngestError::InvalidSensorId(n.to_string())),
        Some(other) => Err(IngestError::InvalidSensorId(other.to_string())),
    }
}
