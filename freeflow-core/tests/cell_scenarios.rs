//! Scenario tests for freeway cell dispatch and merge density
//!
//! Each test drives a cell through the public API only:
//! - Merge saturation from ramp inflow onto an empty mainline
//! - Cells without on-ramp
//! - Metering floor and on-ramp sentinels
//! - Dropped events leave the cell untouched
//! - Long replays stay within physical bounds

mod common;

use common::*;
use freeflow_core::{
    ConfigError, Dispatch, EstimationConfig, FreewayCell, IgnoreReason, IntervalSample, SensorId,
    SensorRole, SensorRoleTable,
};

#[test]
fn ramp_inflow_onto_empty_mainline_saturates_merge() {
    let mut cell = ramp_cell(EstimationConfig::default());

    cell.process_measurement(&stopped(METER, 5.0, 0.0), 0.0);
    cell.process_measurement(&stopped(MAIN_OUT, 0.0, 20.0), 0.0);

    assert_eq!(cell.mainline().flow(), 0.0);
    assert_eq!(cell.onramp().unwrap().estimator().flow(), 5.0);
    assert_eq!(cell.merge_density(), 250.0);
}

#[test]
fn plain_cell_merge_equals_mainline_density() {
    let mut cell = plain_cell(EstimationConfig::default());
    let outcome = cell.process_measurement(&stopped(MAIN_OUT, 600.0, 30.0), 0.0);

    assert_eq!(outcome, Dispatch::Applied(SensorRole::MainlineOut));
    assert_eq!(cell.merge_density(), 30.0);
    assert!(!cell.has_onramp());
}

#[test]
fn onramp_detectors_unknown_to_plain_cell() {
    let mut cell = plain_cell(EstimationConfig::default());
    let before = fingerprint(&cell);

    for sensor in [QUEUE, METER] {
        let outcome = cell.process_measurement(&stopped(sensor, 400.0, 50.0), 0.0);
        assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::UnknownSensor));
    }
    assert_eq!(fingerprint(&cell), before);
}

#[test]
fn metering_floor_lifts_zero_flow() {
    let config = EstimationConfig::default().with_min_metering_rate(2.0);
    let mut cell = ramp_cell(config);

    cell.process_measurement(&stopped(METER, 0.0, 10.0), 0.0);
    assert_eq!(cell.onramp().unwrap().estimator().flow(), 2.0);
}

#[test]
fn metering_floor_leaves_higher_flow_alone() {
    let config = EstimationConfig::default().with_min_metering_rate(2.0);
    let mut cell = ramp_cell(config);

    cell.process_measurement(&stopped(METER, 450.0, 10.0), 0.0);
    assert_eq!(cell.onramp().unwrap().estimator().flow(), 450.0);
}

#[test]
fn unit_conversion_is_applied_before_routing() {
    // 15 s counts to veh/h, occupancy fraction to veh/km
    let config = EstimationConfig::default().with_conversions(240.0, 200.0);
    let mut cell = plain_cell(config);

    cell.process_measurement(&stopped(MAIN_IN, 5.0, 0.1), 0.0);
    assert_eq!(cell.mainline().flow(), 1200.0);
    assert!((cell.mainline().density() - 20.0).abs() < 1e-9);
}

#[test]
fn prior_is_a_floor_after_mainline_out() {
    let mut cell = ramp_cell(EstimationConfig::default());
    cell.process_measurement(&stopped(MAIN_IN, 1200.0, 20.0), 0.0);

    for prior in [0.0, 15.0, 80.0, 249.0, 250.0, 1000.0, -30.0] {
        cell.process_measurement(&stopped(MAIN_OUT, 1200.0, 20.0), prior);
        let merge = cell.merge_density();
        assert!(merge >= prior.clamp(0.0, 250.0), "prior {prior} merge {merge}");
        assert!(merge <= 250.0);
    }
}

#[test]
fn merge_detector_feeds_identifier() {
    let mut cell = ramp_cell(EstimationConfig::default());
    cell.process_measurement(&stopped(MAIN_OUT, 1500.0, 25.0), 0.0);
    cell.process_measurement(&stopped(MERGE, 1500.0, 40.0), 0.0);

    let identifier = cell.identifier().unwrap();
    assert_eq!(identifier.observation_count(), 2);
    let last = identifier.observations().last().unwrap();
    assert_eq!(last.flow, 1500.0);
    assert!(last.density >= 40.0);
}

#[test]
fn overflowing_sample_is_dropped_whole() {
    let config = EstimationConfig::default().with_conversions(1.0e300, 1.0);
    let mut cell = ramp_cell(config);
    cell.process_measurement(&stopped(MAIN_IN, 1.0e-297, 20.0), 0.0);
    let before = fingerprint(&cell);

    for sensor in ALL_SENSORS {
        let outcome = cell.process_measurement(&stopped(sensor, 1.0e10, 20.0), 10.0);
        assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::NonFinite));
    }
    assert_eq!(fingerprint(&cell), before);
}

#[test]
fn unknown_detector_is_ignored() {
    let mut cell = ramp_cell(EstimationConfig::default());
    cell.process_measurement(&stopped(MAIN_OUT, 900.0, 30.0), 12.0);
    let before = fingerprint(&cell);

    let outcome = cell.process_measurement(&stopped(SensorId(999), 900.0, 180.0), 200.0);
    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::UnknownSensor));
    assert_eq!(fingerprint(&cell), before);
}

#[test]
fn ramp_samples_do_not_touch_mainline() {
    let mut cell = ramp_cell(EstimationConfig::default());
    cell.process_measurement(&stopped(MAIN_IN, 1300.0, 22.0), 0.0);
    let mainline = (cell.mainline().density(), cell.mainline().flow());

    cell.process_measurement(&stopped(QUEUE, 500.0, 90.0), 0.0);
    cell.process_measurement(&stopped(METER, 480.0, 60.0), 0.0);
    assert_eq!((cell.mainline().density(), cell.mainline().flow()), mainline);
    assert_eq!(cell.merge_density(), 0.0);
}

#[test]
fn mainline_samples_do_not_touch_ramp() {
    let mut cell = ramp_cell(EstimationConfig::default());
    cell.process_measurement(&stopped(QUEUE, 500.0, 90.0), 0.0);
    let ramp = cell.onramp().unwrap().estimator().clone();

    cell.process_measurement(&stopped(MAIN_IN, 1300.0, 22.0), 0.0);
    cell.process_measurement(&stopped(MAIN_OUT, 1250.0, 23.0), 0.0);
    assert_eq!(cell.onramp().unwrap().estimator(), &ramp);
}

#[test]
fn rush_hour_replay_stays_physical() {
    let mut cell = ramp_cell(EstimationConfig::default());
    let mut upstream = 0.0;

    for (main, ramp) in RushHour::new(7, 400) {
        cell.process_measurement(&event(MAIN_IN, main), upstream);
        cell.process_measurement(&event(QUEUE, ramp), upstream);
        cell.process_measurement(&event(METER, ramp), upstream);
        cell.process_measurement(&event(MAIN_OUT, main), upstream);
        assert!(cell.merge_density() >= upstream);
        cell.process_measurement(&event(MERGE, main), upstream);

        let merge = cell.merge_density();
        assert!((0.0..=250.0).contains(&merge));
        assert!((0.0..=250.0).contains(&cell.mainline().density()));
        assert!(cell.mainline().flow() >= 0.0);

        let ramp_density = cell.onramp().unwrap().estimator().density();
        assert!((0.0..=125.0).contains(&ramp_density));

        let fit = cell.identifier().unwrap().parameters();
        assert!(fit.free_flow_speed > 0.0);
        assert!(fit.critical_density > 0.0 && fit.critical_density < fit.jam_density);

        upstream = 0.5 * merge;
    }
    assert_eq!(cell.identifier().unwrap().observation_count(), 800);
}

#[test]
fn identical_replays_are_bit_identical() {
    let run = || {
        let mut cell = ramp_cell(EstimationConfig::default());
        for (main, ramp) in RushHour::new(99, 120) {
            cell.process_measurement(&event(MAIN_IN, main), 5.0);
            cell.process_measurement(&event(METER, ramp), 5.0);
            cell.process_measurement(&event(MAIN_OUT, main), 5.0);
        }
        let fit = cell.identifier().unwrap().parameters();
        (fingerprint(&cell), fit.free_flow_speed.to_bits(), fit.jam_density.to_bits())
    };
    assert_eq!(run(), run());
}

#[test]
fn construction_rejects_orphan_onramp_roles() {
    let roles = SensorRoleTable::builder()
        .mainline_out(MAIN_OUT)
        .onramp_in(QUEUE)
        .build()
        .unwrap();
    let result = FreewayCell::new(parameters(0.0), roles, EstimationConfig::default());
    assert_eq!(result.err(), Some(ConfigError::MissingOnRamp { role: "onramp_in" }));
}

#[test]
fn construction_rejects_bad_settings() {
    let roles = SensorRoleTable::builder().mainline_in(MAIN_IN).build().unwrap();
    let config = EstimationConfig::default().with_conversions(0.0, 1.0);
    let result = FreewayCell::new(parameters(0.0), roles, config);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidSetting { name: "cars_to_flow", .. })
    ));
}

#[test]
fn sample_values_pass_through_unchanged_by_default() {
    let mut cell = plain_cell(EstimationConfig::default());
    let sample = IntervalSample::new(1000.0, 10.0, 100.0, 10.0, 1.0);
    cell.process_measurement(&event(MAIN_IN, sample), 0.0);
    // Occupancy and q/v agree, so the fused density does too
    assert!((cell.mainline().density() - 10.0).abs() < 1e-9);
}
