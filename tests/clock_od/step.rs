extern crate nyx_clock as nyx;

use super::{assert_psd, sample_inputs};
use approx::assert_abs_diff_eq;
use nyx::io::FilterInputs;
use nyx::linalg::{Matrix2, Vector2};
use nyx::od::prelude::*;
use rstest::*;

#[test]
fn unit_prior_measurement_update() {
    // Measurement update of a unit covariance prediction with unit measurement noise
    let kf = KF::clock(1.0).unwrap();
    let predicted = KfEstimate::from_covar(Vector2::zeros(), Matrix2::identity());

    let res = kf
        .measurement_update(&predicted, &Vector2::new(1.0, 0.0), &Matrix2::identity())
        .unwrap();

    assert_eq!(res.predicted_state, Vector2::zeros());
    assert_eq!(res.innovation(), Vector2::new(1.0, 0.0));
    assert_abs_diff_eq!(res.innovation_covar(), 2.0 * Matrix2::identity());
    assert_abs_diff_eq!(res.gain, 0.5 * Matrix2::identity(), epsilon = 1e-15);
    assert_abs_diff_eq!(res.state(), Vector2::new(0.5, 0.0), epsilon = 1e-15);
    assert_abs_diff_eq!(res.covar(), 0.5 * Matrix2::identity(), epsilon = 1e-15);
    assert_abs_diff_eq!(res.residual.nis().unwrap(), 0.5, epsilon = 1e-15);
}

#[test]
fn unit_prior_full_step() {
    // With dt = 1, the prediction of a unit covariance is [[2, 1], [1, 1]]
    let kf = KF::clock(1.0).unwrap();
    let prev = KfEstimate::from_covar(Vector2::zeros(), Matrix2::identity());

    let res = kf
        .step(
            &prev,
            &Matrix2::zeros(),
            &Vector2::new(1.0, 0.0),
            &Matrix2::identity(),
        )
        .unwrap();

    assert_eq!(res.predicted_state, Vector2::zeros());
    assert_abs_diff_eq!(res.estimate.covar_bar, Matrix2::new(2.0, 1.0, 1.0, 1.0));
    assert_abs_diff_eq!(res.innovation(), Vector2::new(1.0, 0.0));
    assert_abs_diff_eq!(res.innovation_covar(), Matrix2::new(3.0, 1.0, 1.0, 2.0));
    assert_abs_diff_eq!(
        res.gain,
        Matrix2::new(0.6, 0.2, 0.2, 0.4),
        epsilon = 1e-14
    );
    assert_abs_diff_eq!(res.state(), Vector2::new(0.6, 0.2), epsilon = 1e-14);
    // For the optimal gain, the Joseph form reduces to (I - KH) P = K here
    assert_abs_diff_eq!(
        res.covar(),
        Matrix2::new(0.6, 0.2, 0.2, 0.4),
        epsilon = 1e-14
    );
    // NIS = z' S^-1 z = 2/5
    assert_abs_diff_eq!(res.residual.nis().unwrap(), 0.4, epsilon = 1e-14);
}

#[rstest]
#[case(1.0)]
#[case(0.5)]
#[case(30.0)]
fn no_correction_without_discrepancy(#[case] dt: f64) {
    let kf = KF::clock(dt).unwrap();
    let prev = KfEstimate::from_covar(
        Vector2::new(12.5, -0.3),
        Matrix2::new(4.0, 0.1, 0.1, 0.2),
    );
    let q = Matrix2::from_diagonal(&Vector2::new(1e-2, 1e-4));
    let r = Matrix2::from_diagonal(&Vector2::new(0.5, 0.05));

    // Measure exactly what the filter predicts
    let predicted = kf.time_update(&prev, &q);
    let res = kf.step(&prev, &q, &predicted.state, &r).unwrap();

    assert_eq!(res.innovation(), Vector2::zeros());
    assert_eq!(res.state(), res.predicted_state);
    assert_eq!(res.state(), predicted.state);
    assert_eq!(res.residual.nis().unwrap(), 0.0);
    // The covariance still shrinks
    assert!(res.covar().trace() < predicted.covar.trace());
}

#[rstest]
fn step_is_pure(#[from(sample_inputs)] inputs: FilterInputs) {
    let kf = KF::clock(1.0).unwrap();
    let prior = inputs.initial_estimate();
    let prior_copy = prior;

    let first = kf
        .step(
            &prior,
            &inputs.process_noise,
            &inputs.measurements[0],
            &inputs.measurement_noise,
        )
        .unwrap();

    // Another step with different inputs must not affect a later call with the original ones
    let _ = kf
        .step(
            &first.estimate,
            &inputs.process_noise,
            &inputs.measurements[1],
            &inputs.measurement_noise,
        )
        .unwrap();

    let again = kf
        .step(
            &prior,
            &inputs.process_noise,
            &inputs.measurements[0],
            &inputs.measurement_noise,
        )
        .unwrap();

    assert_eq!(prior, prior_copy);
    assert_eq!(first, again);
}

#[rstest]
fn covariance_stays_psd(#[from(sample_inputs)] inputs: FilterInputs) {
    let kf = KF::clock(1.0).unwrap();
    let mut estimate = inputs.initial_estimate();

    for (idx, msr) in inputs.measurements.iter().enumerate() {
        let res = kf
            .step(
                &estimate,
                &inputs.process_noise,
                msr,
                &inputs.measurement_noise,
            )
            .unwrap();
        assert_psd(&res.covar(), idx + 1);
        assert_psd(&res.innovation_covar(), idx + 1);
        estimate = res.estimate;
    }
}

#[test]
fn covariance_psd_with_poor_conditioning() {
    // Very confident prior, very noisy measurements, and tiny process noise
    let kf = KF::clock(1.0).unwrap();
    let mut estimate = KfEstimate::from_diag(Vector2::zeros(), Vector2::new(1e-10, 1e-14));
    let q = Matrix2::from_diagonal(&Vector2::new(1e-14, 1e-18));
    let r = Matrix2::from_diagonal(&Vector2::new(1e6, 1e4));

    for step in 1..=500 {
        let msr = Vector2::new((step as f64).sin() * 1e3, (step as f64).cos() * 1e2);
        let res = kf.step(&estimate, &q, &msr, &r).unwrap();
        assert_psd(&res.covar(), step);
        estimate = res.estimate;
    }
}

#[test]
fn singular_measurement_noise() {
    let kf = KF::clock(1.0).unwrap();
    // Prediction is singular too, hence so is S
    let prev = KfEstimate::from_covar(Vector2::new(1.0, 0.0), Matrix2::zeros());
    let err = kf
        .step(
            &prev,
            &Matrix2::zeros(),
            &Vector2::new(1.5, 0.1),
            &Matrix2::zeros(),
        )
        .unwrap_err();

    assert!(matches!(err, ODError::SingularInnovation { .. }));
    assert!(err.is_numerical());
}

#[test]
fn singular_measurement_noise_with_uncertain_prior() {
    // A zero R is fine as long as the predicted covariance makes S invertible
    let kf = KF::clock(1.0).unwrap();
    let prev = KfEstimate::from_covar(Vector2::zeros(), Matrix2::identity());
    let res = kf
        .step(
            &prev,
            &Matrix2::zeros(),
            &Vector2::new(1.0, 0.5),
            &Matrix2::zeros(),
        )
        .unwrap();

    // The state then matches the measurement exactly
    assert_abs_diff_eq!(res.state(), Vector2::new(1.0, 0.5), epsilon = 1e-14);
    assert_abs_diff_eq!(res.covar(), Matrix2::zeros(), epsilon = 1e-14);
}

#[test]
fn large_bias_uncertainty_is_not_singular() {
    // S is nearly diagonal but its entries span fourteen orders of magnitude
    let odp = ODProcess::new(
        KF::clock(1.0).unwrap(),
        KfEstimate::from_diag(Vector2::zeros(), Vector2::new(1e10, 1e-4)),
        Matrix2::zeros(),
        Matrix2::from_diagonal(&Vector2::new(1e2, 1e-4)),
        NisMonitor::default(),
    )
    .unwrap();

    let msrs = (0..20)
        .map(|k| Vector2::new(10.0 + 0.01 * k as f64, 0.01))
        .collect::<Vec<_>>();
    let solution = odp.process(&msrs).unwrap();

    assert_abs_diff_eq!(
        solution.estimates[1].state,
        Vector2::new(9.999_999_900_05, 0.005),
        epsilon = 1e-9
    );
    for (step, covar) in solution.covar_history().iter().enumerate() {
        assert_psd(covar, step);
    }
}
