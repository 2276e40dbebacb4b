//! Single Freeway Cell Example
//!
//! One segment with an on-ramp, fed a short burst of detector samples. Shows
//! how the mainline and ramp estimators settle and how the merge density
//! reacts when the ramp starts discharging.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_single_cell
//! ```

use freeflow_core::{
    CellParameters, Dispatch, EstimationConfig, EventKind, FreewayCell, IntervalSample,
    MeasurementEvent, SensorId, SensorRoleTable,
};

const MAIN_IN: SensorId = SensorId(1);
const MAIN_OUT: SensorId = SensorId(2);
const QUEUE: SensorId = SensorId(3);
const METER: SensorId = SensorId(4);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("FreeFlow Single Cell Example");
    println!("============================\n");

    // 500 m segment, 100 km/h, capacity at 30 veh/km, jam at 200 veh/km,
    // 100 m ramp queue
    let parameters = CellParameters::new(0.5, 100.0, 30.0, 200.0, 0.1);
    let roles = SensorRoleTable::builder()
        .mainline_in(MAIN_IN)
        .mainline_out(MAIN_OUT)
        .onramp_in(QUEUE)
        .onramp_out(METER)
        .build()?;

    // Detectors report vehicles per 15 s and occupancy in percent
    let config = EstimationConfig::default()
        .with_conversions(240.0, 2.0)
        .with_min_metering_rate(240.0);
    let mut cell = FreewayCell::new(parameters, roles, config)?;

    println!("{:>4} {:>10} {:>10} {:>10} {:>10}", "step", "ρ_main", "q_main", "q_ramp", "ρ_merge");
    for step in 0..12u32 {
        // Mainline slowly loading, ramp opening at step 4
        let occupancy = 8.0 + step as f64;
        let counts = 6.0 + 0.3 * step as f64;
        let ramp_counts = if step < 4 { 0.0 } else { 2.0 };

        let mainline = IntervalSample::new(counts, occupancy, 90.0 - 2.0 * step as f64, 0.5, 0.8);
        let ramp = IntervalSample::new(ramp_counts, 5.0, 25.0, 0.3, 1.0);

        cell.process_measurement(&MeasurementEvent::new(EventKind::MainlineInterval, MAIN_IN, mainline)?, 0.0);
        cell.process_measurement(&MeasurementEvent::new(EventKind::OnRampInterval, QUEUE, ramp)?, 0.0);
        cell.process_measurement(&MeasurementEvent::new(EventKind::OnRampInterval, METER, ramp)?, 0.0);
        let outcome = cell.process_measurement(
            &MeasurementEvent::new(EventKind::MainlineInterval, MAIN_OUT, mainline)?,
            0.0,
        );
        debug_assert!(matches!(outcome, Dispatch::Applied(_)));

        let ramp_flow = cell.onramp().map_or(0.0, |r| r.estimator().flow());
        println!(
            "{:>4} {:>10.1} {:>10.0} {:>10.0} {:>10.1}",
            step,
            cell.mainline().density(),
            cell.mainline().flow(),
            ramp_flow,
            cell.merge_density()
        );
    }

    // A detector the cell does not know about changes nothing
    let stray = IntervalSample::new(50.0, 90.0, 5.0, 1.0, 1.0);
    let outcome = cell.process_measurement(
        &MeasurementEvent::new(EventKind::MainlineInterval, SensorId(77), stray)?,
        0.0,
    );
    println!("\nStray detector 77: {:?}", outcome);

    if let Some(identifier) = cell.identifier() {
        let fit = identifier.parameters();
        println!(
            "Fitted diagram after {} samples: v = {:.1} km/h, ρc = {:.1}, ρj = {:.1}",
            identifier.observation_count(),
            fit.free_flow_speed,
            fit.critical_density,
            fit.jam_density
        );
    }

    Ok(())
}
