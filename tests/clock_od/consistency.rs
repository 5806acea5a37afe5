extern crate nyx_clock as nyx;

use approx::assert_abs_diff_eq;
use nyx::io::FilterInputs;
use nyx::linalg::{Matrix2, Vector2};
use nyx::mc::ClockScenario;
use nyx::od::nis::chi2_threshold;
use nyx::od::prelude::*;
use rstest::*;

use super::sample_inputs;

fn scenario(steps: usize) -> ClockScenario {
    ClockScenario::new(
        Vector2::new(0.0, 1.0e-3),
        Matrix2::from_diagonal(&Vector2::new(1.0, 1.0e-4)),
        Matrix2::from_diagonal(&Vector2::new(1.0e-4, 1.0e-6)),
        Matrix2::from_diagonal(&Vector2::new(0.25, 1.0e-2)),
        1.0,
        steps,
    )
}

#[test]
fn single_sample_threshold() {
    assert_abs_diff_eq!(chi2_threshold(0.05, 2).unwrap(), 5.991_464_547, epsilon = 1e-4);
    assert_abs_diff_eq!(
        NisMonitor::default().threshold(),
        chi2_threshold(0.05, 2).unwrap(),
        epsilon = 1e-4
    );
    assert!(chi2_threshold(0.0, 2).is_err());
    assert!(chi2_threshold(0.05, 0).is_err());
}

#[rstest]
fn sample_data_is_consistent(#[from(sample_inputs)] inputs: FilterInputs) {
    let solution = ODProcess::clock(&inputs, &RunConfig::default())
        .unwrap()
        .process(&inputs.measurements)
        .unwrap();

    let report = solution.consistency(None).unwrap();
    println!("{report}");
    assert_eq!(report.samples, 1000);
    assert_eq!(report.dof, 2);
    assert!(
        report.mean > 1.8 && report.mean < 2.2,
        "mean NIS {} too far from 2",
        report.mean
    );
    assert!(
        report.fraction_above > 0.02 && report.fraction_above < 0.08,
        "fraction above threshold {}",
        report.fraction_above
    );
    assert_eq!(
        report.count_above,
        solution.nis_history()[1..]
            .iter()
            .filter(|nis| **nis > report.threshold)
            .count()
    );
    assert!(report.mean_bounds.0 < 2.0 && report.mean_bounds.1 > 2.0);
    assert!(report.is_consistent());
    assert_eq!(solution.mean_nis().unwrap(), report.mean);

    // A looser test has a higher threshold and a wider acceptance region
    let loose = solution.consistency(Some(0.01)).unwrap();
    assert_eq!(loose.mean, report.mean);
    assert!(loose.threshold > report.threshold);
    assert!(loose.count_above <= report.count_above);
    assert!(loose.mean_bounds.0 < report.mean_bounds.0);
    assert!(loose.mean_bounds.1 > report.mean_bounds.1);
    assert!(loose.is_consistent());

    assert!(solution.consistency(Some(1.5)).is_err());
}

#[test]
fn simulated_clock_is_consistent() {
    let _ = pretty_env_logger::try_init();
    let scen = scenario(1000);
    let arc = scen.simulate(2024).unwrap();

    let solution = scen.od_process().unwrap().process(&arc.measurements).unwrap();
    let report = solution.consistency(None).unwrap();
    println!("{report}");
    assert!(
        (report.mean - 2.0).abs() < 0.3,
        "mean NIS {} too far from 2",
        report.mean
    );
    assert!(report.fraction_above < 0.1);

    let truth = arc.truth.last().unwrap();
    assert!(solution.final_estimate().within_sigma(truth, 5.0));
}

#[rstest]
#[case::pessimistic(100.0)]
#[case::optimistic(0.01)]
fn mismodeled_noise_is_flagged(#[case] scale: f64) {
    let scen = scenario(500);
    let arc = scen.simulate(11).unwrap();

    let odp = ODProcess::new(
        KF::clock(scen.dt).unwrap(),
        KfEstimate::from_covar(scen.initial_state(), scen.p0.to_matrix()),
        scen.q.to_matrix(),
        scen.r.to_matrix() * scale,
        NisMonitor::default(),
    )
    .unwrap();

    let report = odp.process(&arc.measurements).unwrap().consistency(None).unwrap();
    println!("{report}");
    assert!(!report.is_consistent());
    if scale > 1.0 {
        assert!(report.mean < report.mean_bounds.0);
        assert_eq!(report.count_above, 0);
    } else {
        assert!(report.mean > report.mean_bounds.1);
        assert!(report.fraction_above > 0.5);
    }
}
