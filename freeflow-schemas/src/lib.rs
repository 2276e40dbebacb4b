//! JSON Boundary for FreeFlow Cells
//!
//! ## Overview
//!
//! The estimation core is allocation-free and knows nothing about wire
//! formats. This crate sits between it and the outside world:
//!
//! - [`ingest`]: event records as delivered by the event runtime (a name and
//!   a loosely-typed attribute map) become validated
//!   [`MeasurementEvent`](freeflow_core::MeasurementEvent)s, or are refused
//!   with an [`IngestError`].
//! - [`config`]: the deployment configuration (cell geometry, detector
//!   layout, unit conversions, filter tuning) is read from JSON and turned
//!   into ready-to-run [`FreewayCell`](freeflow_core::FreewayCell)s.
//!
//! ## Event Record Format
//!
//! ```json
//! {
//!   "name": "AverageDensityAndSpeedPerLocationOverInterval",
//!   "attributes": {
//!     "sensorId": "4087",
//!     "average_flow": 7.5,
//!     "average_occupancy": 0.12,
//!     "average_speed": 84.0,
//!     "standard_dev_flow": 1.2,
//!     "standard_dev_density": 0.02
//!   }
//! }
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use freeflow_schemas::{parse_measurement, EventRecord, FreewayConfig};
//!
//! let config = FreewayConfig::from_json_str(r#"{
//!     "cells": [{
//!         "parameters": {
//!             "length": 0.5, "free_flow_speed": 100.0,
//!             "critical_density": 30.0, "jam_density": 200.0
//!         },
//!         "sensors": { "mainline_in": 4086, "mainline_out": 4087 }
//!     }]
//! }"#)?;
//! let mut cells = config.build_cells()?;
//!
//! let record = EventRecord::from_json_str(r#"{
//!     "name": "AverageDensityAndSpeedPerLocationOverInterval",
//!     "attributes": {
//!         "sensorId": "4087", "average_flow": 1500.0, "average_occupancy": 25.0,
//!         "average_speed": 0.0, "standard_dev_flow": 50.0, "standard_dev_density": 2.0
//!     }
//! }"#)?;
//! let event = parse_measurement(&record)?;
//! cells[0].process_measurement(&event, 0.0);
//! assert_eq!(cells[0].merge_density(), 25.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use freeflow_core::ConfigError;

pub mod config;
pub mod ingest;

pub use config::{CellConfig, FreewayConfig, SensorIds};
pub use ingest::{parse_measurement, EventRecord, IngestError};

/// Errors loading configuration or records
#[derive(Debug, Clone, PartialEq, thiserror_no_std::Error)]
pub enum SchemaError {
    /// The JSON text is malformed or does not match the expected shape
    #[error("Failed to parse JSON: {0}")]
    Parse(String),

    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// A cell's configuration violates a construction contract
    #[error("Cell {index}: {source}")]
    Config {
        /// Position of the cell in the configuration
        index: usize,
        /// Underlying violation
        source: ConfigError,
    },
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for SchemaError {
    fn from(err: std::io::Error) -> Self {
        SchemaError::Io(err.to_string())
    }
}
