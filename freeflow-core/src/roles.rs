//! Sensor roles within a cell
//!
//! Each cell is instrumented with up to five detectors. The role a detector
//! plays decides which estimator channel its samples feed and which
//! per-role adjustments apply before they do:
//!
//! ```text
//!            on-ramp in (queue)      on-ramp out (metering)
//!                   │                        │
//!                   ▼                        ▼
//! ──► mainline in ──────────── mainline out ──┴── merge ──►
//! ```
//!
//! The table is a closed mapping from [`SensorRole`] to [`SensorId`]; lookup
//! by identifier returns `None` for detectors that do not belong to the cell.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::fmt;

use crate::errors::{ConfigError, ConfigResult};

/// Detector identifier as assigned by the sensing network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SensorId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Logical role of a detector within a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum SensorRole {
    /// Upstream mainline boundary
    MainlineIn = 0,
    /// Downstream mainline boundary
    MainlineOut = 1,
    /// Merge-area detector downstream of the on-ramp
    Merge = 2,
    /// Queue detector at the ramp entrance
    OnRampIn = 3,
    /// Detector at the metering signal
    OnRampOut = 4,
}

impl SensorRole {
    /// Every role, in table order
    pub const ALL: [SensorRole; 5] = [
        SensorRole::MainlineIn,
        SensorRole::MainlineOut,
        SensorRole::Merge,
        SensorRole::OnRampIn,
        SensorRole::OnRampOut,
    ];

    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorRole::MainlineIn => "mainline_in",
            SensorRole::MainlineOut => "mainline_out",
            SensorRole::Merge => "merge",
            SensorRole::OnRampIn => "onramp_in",
            SensorRole::OnRampOut => "onramp_out",
        }
    }

    /// Whether samples for this role feed the on-ramp estimator
    pub const fn is_onramp(&self) -> bool {
        matches!(self, SensorRole::OnRampIn | SensorRole::OnRampOut)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable role → identifier mapping of one cell
///
/// Identifiers are unique across roles; [`SensorRoleTableBuilder::build`]
/// rejects a table that violates this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorRoleTable {
    slots: [Option<SensorId>; 5],
}

impl SensorRoleTable {
    /// Start an empty table
    pub fn builder() -> SensorRoleTableBuilder {
        SensorRoleTableBuilder::default()
    }

    /// Identifier assigned to `role`, if any
    pub fn sensor(&self, role: SensorRole) -> Option<SensorId> {
        self.slots[role.index()]
    }

    /// Role played by `sensor_id` in this cell, if any
    pub fn role_of(&self, sensor_id: SensorId) -> Option<SensorRole> {
        SensorRole::ALL
            .into_iter()
            .find(|role| self.slots[role.index()] == Some(sensor_id))
    }

    /// First configured on-ramp role, if any
    pub fn onramp_role(&self) -> Option<SensorRole> {
        SensorRole::ALL
            .into_iter()
            .filter(SensorRole::is_onramp)
            .find(|role| self.slots[role.index()].is_some())
    }

    /// Configured (role, identifier) pairs
    pub fn iter(&self) -> impl Iterator<Item = (SensorRole, SensorId)> + '_ {
        SensorRole::ALL
            .into_iter()
            .filter_map(|role| self.slots[role.index()].map(|id| (role, id)))
    }

    /// Number of configured roles
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no role is configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`SensorRoleTable`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorRoleTableBuilder {
    slots: [Option<SensorId>; 5],
}

impl SensorRoleTableBuilder {
    /// Assign (or clear) the detector of a role
    pub fn role(mut self, role: SensorRole, sensor_id: Option<SensorId>) -> Self {
        self.slots[role.index()] = sensor_id;
        self
    }

    /// Upstream mainline detector
    pub fn mainline_in(self, sensor_id: SensorId) -> Self {
        self.role(SensorRole::MainlineIn, Some(sensor_id))
    }

    /// Downstream mainline detector
    pub fn mainline_out(self, sensor_id: SensorId) -> Self {
        self.role(SensorRole::MainlineOut, Some(sensor_id))
    }

    /// Merge-area detector
    pub fn merge(self, sensor_id: SensorId) -> Self {
        self.role(SensorRole::Merge, Some(sensor_id))
    }

    /// Ramp queue detector
    pub fn onramp_in(self, sensor_id: SensorId) -> Self {
        self.role(SensorRole::OnRampIn, Some(sensor_id))
    }

    /// Ramp metering detector
    pub fn onramp_out(self, sensor_id: SensorId) -> Self {
        self.role(SensorRole::OnRampOut, Some(sensor_id))
    }

    /// Check identifier uniqueness and freeze the table
    pub fn build(self) -> ConfigResult<SensorRoleTable> {
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(id) = slot else { continue };
            if self.slots[i + 1..].contains(&Some(*id)) {
                return Err(ConfigError::DuplicateSensor { sensor_id: id.0 });
            }
        }
        Ok(SensorRoleTable { slots: self.slots })
    }
}
