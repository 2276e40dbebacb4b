//! Core estimation engine for FreeFlow
//!
//! Turns streaming loop-detector samples into per-cell traffic state
//! (density, flow), reconstructs the density in the merge area downstream of
//! an on-ramp, and keeps the triangular flow-density model calibrated online.
//!
//! Key constraints:
//! - One writer per cell, no locking on the hot path
//! - No heap allocation; every update is a bounded-time numeric step
//! - A corrupt sample is dropped whole, never applied in part
//!
//! ```no_run
//! use freeflow_core::{
//!     CellParameters, EstimationConfig, EventKind, FreewayCell, IntervalSample,
//!     MeasurementEvent, SensorId, SensorRoleTable,
//! };
//!
//! let parameters = CellParameters::new(0.5, 100.0, 30.0, 200.0, 0.1);
//! let roles = SensorRoleTable::builder()
//!     .mainline_in(SensorId(1))
//!     .mainline_out(SensorId(2))
//!     .onramp_out(SensorId(3))
//!     .build()?;
//! let mut cell = FreewayCell::new(parameters, roles, EstimationConfig::default())?;
//!
//! let sample = IntervalSample::new(1800.0, 22.0, 80.0, 60.0, 3.0);
//! let event = MeasurementEvent::new(EventKind::MainlineInterval, SensorId(2), sample)?;
//! cell.process_measurement(&event, 0.0);
//!
//! let merge = cell.merge_density(); // feed to the metering controller
//! # let _ = merge;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod cell;
pub mod constants;
pub mod errors;
pub mod estimation;
pub mod events;
pub mod identification;
pub mod parameters;
pub mod roles;
#[cfg(feature = "std")]
pub mod sync;
pub mod traits;

// Public API
pub use cell::{Dispatch, FreewayCell, IgnoreReason, OnRamp};
pub use errors::{ConfigError, ConfigResult, EventError};
pub use estimation::StateEstimator;
pub use events::{EventKind, IntervalSample, MeasurementEvent};
pub use identification::{FundamentalDiagram, Observation, SystemIdentifier};
pub use parameters::{CellParameters, EstimationConfig, FilterTuning, IdentificationConfig};
pub use roles::{SensorId, SensorRole, SensorRoleTable};
#[cfg(feature = "std")]
pub use sync::SharedFreewayCell;
pub use traits::Validatable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
