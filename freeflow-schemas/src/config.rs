//! Deployment configuration
//!
//! One JSON document describes a whole freeway: the estimation settings
//! shared by every cell, then one entry per cell with its geometry and the
//! detectors wired to it.
//!
//! ```json
//! {
//!   "estimation": { "cars_to_flow": 240.0, "min_metering_rate": 180.0 },
//!   "cells": [
//!     {
//!       "name": "A41 km 12.4",
//!       "parameters": {
//!         "length": 0.5, "free_flow_speed": 100.0,
//!         "critical_density": 30.0, "jam_density": 200.0,
//!         "queue_length": 0.12
//!       },
//!       "sensors": {
//!         "mainline_in": 4086, "mainline_out": 4087, "merge": 4088,
//!         "onramp_in": 4090, "onramp_out": 4091
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Omitted settings take their defaults. Every contract violation is
//! reported when the cells are built, with the position of the offending
//! cell.

use std::path::Path;

use serde::{Deserialize, Serialize};

use freeflow_core::{
    CellParameters, ConfigResult, EstimationConfig, FreewayCell, SensorId, SensorRole,
    SensorRoleTable,
};

use crate::SchemaError;

/// Detector identifiers of one cell, by role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorIds {
    /// Upstream mainline detector
    pub mainline_in: Option<u32>,
    /// Downstream mainline detector
    pub mainline_out: Option<u32>,
    /// Merge-area detector
    pub merge: Option<u32>,
    /// Ramp queue detector
    pub onramp_in: Option<u32>,
    /// Ramp metering detector
    pub onramp_out: Option<u32>,
}

impl SensorIds {
    /// Build the role table, rejecting duplicate identifiers
    pub fn role_table(&self) -> ConfigResult<SensorRoleTable> {
        let assignments = [
            (SensorRole::MainlineIn, self.mainline_in),
            (SensorRole::MainlineOut, self.mainline_out),
            (SensorRole::Merge, self.merge),
            (SensorRole::OnRampIn, self.onramp_in),
            (SensorRole::OnRampOut, self.onramp_out),
        ];
        assignments
            .into_iter()
            .fold(SensorRoleTable::builder(), |builder, (role, id)| {
                builder.role(role, id.map(SensorId))
            })
            .build()
    }
}

/// Configuration of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellConfig {
    /// Free-form label used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Physical parameters
    pub parameters: CellParameters,
    /// Detector layout
    #[serde(default)]
    pub sensors: SensorIds,
}

impl CellConfig {
    /// Build the cell with the shared estimation settings
    pub fn build(&self, estimation: EstimationConfig) -> ConfigResult<FreewayCell> {
        FreewayCell::new(self.parameters, self.sensors.role_table()?, estimation)
    }
}

/// Configuration of a whole freeway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreewayConfig {
    /// Settings shared by every cell
    #[serde(default)]
    pub estimation: EstimationConfig,
    /// Cells, upstream first
    pub cells: Vec<CellConfig>,
}

impl FreewayConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize back to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build every cell, in configuration order
    pub fn build_cells(&self) -> Result<Vec<FreewayCell>, SchemaError> {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                cell.build(self.estimation).map_err(|source| {
                    log::warn!(
                        "cell {} ({}) rejected: {}",
                        index,
                        cell.name.as_deref().unwrap_or("unnamed"),
                        source
                    );
                    SchemaError::Config { index, source }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("built {} cells", cells.len());
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freeflow_core::ConfigError;

    const TWO_CELLS: &str = r#"{
        "estimation": { "cars_to_flow": 240.0, "min_metering_rate": 180.0 },
        "cells": [
            {
                "name": "upstream",
                "parameters": {
                    "length": 0.5, "free_flow_speed": 100.0,
                    "critical_density": 30.0, "jam_density": 200.0
                },
                "sensors": { "mainline_in": 1, "mainline_out": 2 }
            },
            {
                "parameters": {
                    "length": 0.4, "free_flow_speed": 90.0,
                    "critical_density": 28.0, "jam_density": 180.0,
                    "queue_length": 0.12
                },
                "sensors": {
                    "mainline_in": 2, "mainline_out": 3, "merge": 4,
                    "onramp_in": 5, "onramp_out": 6
                }
            }
        ]
    }"#;

    #[test]
    fn parses_and_builds() {
        let config = FreewayConfig::from_json_str(TWO_CELLS).unwrap();
        assert_eq!(config.estimation.cars_to_flow, 240.0);
        assert_eq!(config.estimation.occupancy_to_density, 1.0);
        assert_eq!(config.estimation.max_mainline_density, 250.0);

        let cells = config.build_cells().unwrap();
        assert_eq!(cells.len(), 2);
        assert!(!cells[0].has_onramp());
        assert!(cells[1].has_onramp());
        assert_eq!(cells[1].role_of(SensorId(6)), Some(SensorRole::OnRampOut));
        assert_eq!(cells[1].config().min_metering_rate, 180.0);
    }

    #[test]
    fn role_table_from_ids() {
        let ids = SensorIds {
            mainline_in: Some(1),
            merge: Some(9),
            ..SensorIds::default()
        };
        let table = ids.role_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.role_of(SensorId(9)), Some(SensorRole::Merge));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let ids = SensorIds {
            mainline_in: Some(1),
            mainline_out: Some(1),
            ..SensorIds::default()
        };
        assert_eq!(ids.role_table(), Err(ConfigError::DuplicateSensor { sensor_id: 1 }));
    }

    #[test]
    fn failing_cell_is_located() {
        let mut config = FreewayConfig::from_json_str(TWO_CELLS).unwrap();
        config.cells[1].parameters.queue_length = 0.0;

        let err = config.build_cells().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Config {
                index: 1,
                source: ConfigError::MissingOnRamp { .. }
            }
        ));
    }

    #[test]
    fn missing_cells_is_a_parse_error() {
        let err = FreewayConfig::from_json_str(r#"{"estimation": {}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn serializes_back() {
        let config = FreewayConfig::from_json_str(TWO_CELLS).unwrap();
        let json = config.to_json_string().unwrap();
        assert_eq!(FreewayConfig::from_json_str(&json).unwrap(), config);
    }
}
