//! Shared fixtures for cell integration tests
//!
//! - Sensor layout and cell builders for a ramp cell and a plain cell
//! - Event constructors in raw detector units
//! - A deterministic traffic generator for longer replays

#![allow(dead_code)]

use freeflow_core::{
    CellParameters, EstimationConfig, EventKind, FreewayCell, IntervalSample, MeasurementEvent,
    SensorId, SensorRoleTable,
};

pub const MAIN_IN: SensorId = SensorId(101);
pub const MAIN_OUT: SensorId = SensorId(102);
pub const MERGE: SensorId = SensorId(103);
pub const QUEUE: SensorId = SensorId(201);
pub const METER: SensorId = SensorId(202);

/// Every detector of the ramp layout
pub const ALL_SENSORS: [SensorId; 5] = [MAIN_IN, MAIN_OUT, MERGE, QUEUE, METER];

/// 500 m segment, 100 km/h, ρ_c = 30, ρ_j = 200
pub fn parameters(queue_length: f64) -> CellParameters {
    CellParameters::new(0.5, 100.0, 30.0, 200.0, queue_length)
}

pub fn ramp_cell(config: EstimationConfig) -> FreewayCell {
    let roles = SensorRoleTable::builder()
        .mainline_in(MAIN_IN)
        .mainline_out(MAIN_OUT)
        .merge(MERGE)
        .onramp_in(QUEUE)
        .onramp_out(METER)
        .build()
        .unwrap();
    FreewayCell::new(parameters(0.1), roles, config).unwrap()
}

pub fn plain_cell(config: EstimationConfig) -> FreewayCell {
    let roles = SensorRoleTable::builder()
        .mainline_in(MAIN_IN)
        .mainline_out(MAIN_OUT)
        .build()
        .unwrap();
    FreewayCell::new(parameters(0.0), roles, config).unwrap()
}

pub fn event(sensor: SensorId, sample: IntervalSample) -> MeasurementEvent {
    let kind = if sensor == QUEUE || sensor == METER {
        EventKind::OnRampInterval
    } else {
        EventKind::MainlineInterval
    };
    MeasurementEvent::new(kind, sensor, sample).unwrap()
}

/// Stopped traffic: speed below the q/v threshold, occupancy carries density
pub fn stopped(sensor: SensorId, flow: f64, density: f64) -> MeasurementEvent {
    event(sensor, IntervalSample::new(flow, density, 0.0, 1.0, 1.0))
}

/// Bit patterns of every published quantity
pub fn fingerprint(cell: &FreewayCell) -> [u64; 5] {
    let ramp = cell.onramp().map(|r| r.estimator());
    [
        cell.mainline().density().to_bits(),
        cell.mainline().flow().to_bits(),
        ramp.map_or(0, |r| r.density().to_bits()),
        ramp.map_or(0, |r| r.flow().to_bits()),
        cell.merge_density().to_bits(),
    ]
}

/// Xorshift generator, reproducible across runs
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u32() >> 8) as f64 / 16_777_216.0
    }

    pub fn gen_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// Interval samples for a rush-hour replay
///
/// Density ramps up to a congested plateau and back down; flow follows the
/// triangular diagram of [`parameters`] with detector noise.
pub struct RushHour {
    rng: TestRng,
    step: u32,
    steps: u32,
}

impl RushHour {
    pub fn new(seed: u32, steps: u32) -> Self {
        Self { rng: TestRng::new(seed), step: 0, steps }
    }

    fn density_profile(&self) -> f64 {
        let phase = self.step as f64 / self.steps as f64;
        let peak = 120.0;
        if phase < 0.5 {
            10.0 + 2.0 * phase * (peak - 10.0)
        } else {
            peak - 2.0 * (phase - 0.5) * (peak - 10.0)
        }
    }
}

/// Flow on the triangle with v = 100, ρ_c = 30, ρ_j = 200
pub fn triangle_flow(density: f64) -> f64 {
    if density <= 30.0 {
        100.0 * density
    } else {
        3000.0 / 170.0 * (200.0 - density)
    }
}

impl Iterator for RushHour {
    /// (mainline sample, ramp sample)
    type Item = (IntervalSample, IntervalSample);

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.steps {
            return None;
        }
        let density = self.density_profile() + self.rng.gen_range(-2.0, 2.0);
        let flow = triangle_flow(density) + self.rng.gen_range(-50.0, 50.0);
        let speed = if density > 0.0 { flow / density } else { 100.0 };
        let ramp_flow = self.rng.gen_range(200.0, 700.0);
        self.step += 1;

        Some((
            IntervalSample::new(flow, density, speed, 60.0, 3.0),
            IntervalSample::new(ramp_flow, 15.0, 30.0, 40.0, 5.0),
        ))
    }
}
