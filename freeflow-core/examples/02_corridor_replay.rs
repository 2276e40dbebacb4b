//! Corridor Replay Example
//!
//! Three consecutive cells, the middle one with an on-ramp. Each cell's
//! merge density is handed to the next cell downstream as its prior, the
//! way a deployment chains cells along a freeway. Cells are shared between
//! a producer thread per detector group through `SharedFreewayCell`.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_corridor_replay
//! ```

use std::thread;

use freeflow_core::{
    CellParameters, EstimationConfig, EventKind, FreewayCell, IntervalSample, MeasurementEvent,
    SensorId, SensorRoleTable, SharedFreewayCell,
};

const STEPS: u32 = 240;

fn cell(first_id: u32, with_ramp: bool) -> Result<FreewayCell, freeflow_core::ConfigError> {
    let mut roles = SensorRoleTable::builder()
        .mainline_in(SensorId(first_id))
        .mainline_out(SensorId(first_id + 1));
    let queue_length = if with_ramp {
        roles = roles
            .merge(SensorId(first_id + 2))
            .onramp_in(SensorId(first_id + 3))
            .onramp_out(SensorId(first_id + 4));
        0.15
    } else {
        0.0
    };
    FreewayCell::new(
        CellParameters::new(0.6, 110.0, 32.0, 190.0, queue_length),
        roles.build()?,
        EstimationConfig::default().with_min_metering_rate(180.0),
    )
}

/// Morning peak: density rises to 90 veh/km and falls back
fn mainline_sample(step: u32) -> IntervalSample {
    let phase = step as f64 / STEPS as f64;
    let density = 12.0 + 78.0 * (1.0 - (2.0 * phase - 1.0).abs());
    let flow = if density <= 32.0 {
        110.0 * density
    } else {
        3520.0 / 158.0 * (190.0 - density)
    };
    IntervalSample::new(flow, density, flow / density, 80.0, 4.0)
}

fn ramp_sample(step: u32) -> IntervalSample {
    let flow = 300.0 + 300.0 * ((step % 40) as f64 / 40.0);
    IntervalSample::new(flow, 10.0, 30.0, 50.0, 5.0)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("FreeFlow Corridor Replay");
    println!("========================\n");

    let corridor = [
        SharedFreewayCell::new(cell(100, false)?),
        SharedFreewayCell::new(cell(200, true)?),
        SharedFreewayCell::new(cell(300, false)?),
    ];

    // Ramp detectors report on their own thread
    let ramp_cell = corridor[1].clone();
    let ramp = thread::spawn(move || -> Result<(), freeflow_core::EventError> {
        for step in 0..STEPS {
            let sample = ramp_sample(step);
            for id in [203, 204] {
                let event = MeasurementEvent::new(EventKind::OnRampInterval, SensorId(id), sample)?;
                ramp_cell.process_measurement(&event, 0.0);
            }
        }
        Ok(())
    });

    for step in 0..STEPS {
        let sample = mainline_sample(step);
        let mut upstream = 0.0;
        for (index, shared) in corridor.iter().enumerate() {
            let base = 100 * (index as u32 + 1);
            for id in [base, base + 1] {
                let event = MeasurementEvent::new(EventKind::MainlineInterval, SensorId(id), sample)?;
                shared.process_measurement(&event, upstream);
            }
            upstream = shared.merge_density();
        }

        if step % 40 == 0 {
            let merges: Vec<String> = corridor
                .iter()
                .map(|c| format!("{:6.1}", c.merge_density()))
                .collect();
            println!("step {:>3}: merge densities {}", step, merges.join(" "));
        }
    }

    ramp.join().map_err(|_| "ramp thread panicked")??;

    corridor[1].with_cell(|c| {
        if let Some(identifier) = c.identifier() {
            let fit = identifier.parameters();
            println!(
                "\nMiddle cell diagram: v = {:.1} km/h, ρc = {:.1}, ρj = {:.1}, capacity {:.0} veh/h",
                fit.free_flow_speed,
                fit.critical_density,
                fit.jam_density,
                fit.capacity_flow()
            );
        }
    });

    Ok(())
}
