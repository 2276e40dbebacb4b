//! Shared fixtures for schema integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

use freeflow_schemas::ingest::{MAINLINE_EVENT, ONRAMP_EVENT};

/// One cell with a full ramp layout: mainline 11/12, merge 13, ramp 21/22
pub const RAMP_CELL: &str = r#"{
    "estimation": { "min_metering_rate": 2.0 },
    "cells": [{
        "name": "merge cell",
        "parameters": {
            "length": 0.5, "free_flow_speed": 100.0,
            "critical_density": 30.0, "jam_density": 200.0,
            "queue_length": 0.1
        },
        "sensors": {
            "mainline_in": 11, "mainline_out": 12, "merge": 13,
            "onramp_in": 21, "onramp_out": 22
        }
    }]
}"#;

/// Record JSON for a detector sample; speed 0 keeps density on occupancy
pub fn record_json(sensor: &str, flow: f64, occupancy: f64) -> Value {
    let name = if sensor.starts_with('2') { ONRAMP_EVENT } else { MAINLINE_EVENT };
    json!({
        "name": name,
        "attributes": {
            "sensorId": sensor,
            "average_flow": flow,
            "average_occupancy": occupancy,
            "average_speed": 0.0,
            "standard_dev_flow": 1.0,
            "standard_dev_density": 1.0
        }
    })
}
