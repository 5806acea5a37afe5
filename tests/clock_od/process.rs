extern crate nyx_clock as nyx;

use super::{assert_psd, sample_inputs};
use crate::scratch_dir;
use approx::assert_abs_diff_eq;
use nyx::io::text::read_matrix;
use nyx::io::FilterInputs;
use nyx::linalg::{DMatrix, Matrix2, Vector2};
use nyx::od::prelude::*;
use rstest::*;

#[rstest]
fn histories_are_aligned(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    let solution = odp.process(&inputs.measurements).unwrap();

    let num_msrs = inputs.measurements.len();
    assert_eq!(num_msrs, 1000);
    assert_eq!(solution.num_measurements(), num_msrs);

    let states = solution.state_history();
    assert_eq!(states.nrows(), 2);
    assert_eq!(states.ncols(), num_msrs + 1);
    assert_eq!(solution.covar_history().len(), num_msrs + 1);
    assert_eq!(solution.nis_history().len(), num_msrs + 1);
    assert_eq!(solution.residuals().len(), num_msrs);
    assert_eq!(solution.gains().len(), num_msrs);

    // Index zero is the prior
    assert_eq!(solution.nis_history()[0], 0.0);
    assert_eq!(solution.prior(), &inputs.initial_estimate());
    assert_eq!(states.column(0), inputs.initial_state);
    assert_eq!(solution.covar_history()[0], inputs.initial_covar);
    assert!(solution.residuals[0].is_none());
    assert!(solution.gains[0].is_none());

    for (step, covar) in solution.covar_history().iter().enumerate() {
        assert_psd(covar, step);
    }

    // Every NIS of a measurement update is strictly positive on noisy data
    assert!(solution.nis_history()[1..].iter().all(|nis| *nis > 0.0));

    // The estimate changes at every step
    for pair in solution.estimates.windows(2) {
        assert_ne!(pair[0].state, pair[1].state);
    }

    // The filter converges well below the prior uncertainty
    let sigmas = solution.final_estimate().sigmas();
    assert!(sigmas[0] < 0.2, "{sigmas}");
    assert!(sigmas[1] < 0.01, "{sigmas}");

    println!("{solution}");
    println!(
        "RMS prefit {:.4} postfit {:.4}",
        solution.rms_prefit_residuals(),
        solution.rms_postfit_residuals()
    );
    assert!(solution.rms_postfit_residuals() < solution.rms_prefit_residuals());
}

#[rstest]
fn run_is_deterministic(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    let first = odp.process(&inputs.measurements).unwrap();
    let second = odp.process(&inputs.measurements).unwrap();
    assert_eq!(first, second);

    // A new process from the same inputs leads to the same solution too
    let other = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    assert_eq!(first, other.process(&inputs.measurements).unwrap());
}

#[rstest]
fn stepwise_matches_run(#[from(sample_inputs)] inputs: FilterInputs) {
    let conf = RunConfig::builder().dt(2.0).build();
    let odp = ODProcess::clock(&inputs, &conf).unwrap();
    let solution = odp.process(&inputs.measurements).unwrap();

    let kf = KF::clock(2.0).unwrap();
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
        estimate = res.estimate;

        let step = idx + 1;
        assert_eq!(solution.estimates[step], res.estimate, "step {step}");
        assert_eq!(solution.residuals[step], Some(res.residual), "step {step}");
        assert_eq!(solution.gains[step], Some(res.gain), "step {step}");
        assert_eq!(
            solution.nis_history()[step],
            res.residual.nis().unwrap(),
            "step {step}"
        );
    }
}

#[rstest]
fn prefix_of_measurements(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    let full = odp.process(&inputs.measurements).unwrap();
    let partial = odp.process(&inputs.measurements[..100]).unwrap();

    assert_eq!(partial.estimates.len(), 101);
    assert_eq!(&full.estimates[..101], &partial.estimates[..]);
    assert_eq!(&full.nis_history()[..101], partial.nis_history());
}

#[rstest]
fn empty_run(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    let solution = odp.process(&[]).unwrap();

    assert_eq!(solution.num_measurements(), 0);
    assert_eq!(solution.state_history().ncols(), 1);
    assert_eq!(solution.nis_history(), &[0.0]);
    assert_eq!(solution.rms_prefit_residuals(), 0.0);
    assert!(matches!(
        solution.consistency(None),
        Err(ODError::ODNoResiduals { .. })
    ));
}

#[test]
fn failing_step_aborts_run() {
    // Perfect prior and no noise at all: the very first innovation covariance is null
    let odp = ODProcess::new(
        KF::clock(1.0).unwrap(),
        KfEstimate::from_covar(Vector2::zeros(), Matrix2::zeros()),
        Matrix2::zeros(),
        Matrix2::zeros(),
        NisMonitor::default(),
    )
    .unwrap();

    let err = odp
        .process(&[Vector2::new(1.0, 0.0), Vector2::new(2.0, 0.0)])
        .unwrap_err();

    assert!(err.is_numerical());
    match err {
        ODError::StepFailed { step, source } => {
            assert_eq!(step, 1);
            assert!(matches!(*source, ODError::SingularInnovation { .. }));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn failing_later_step() {
    // The bias is perfectly known after the first update, and the rate is never uncertain: the second
    // innovation covariance is diag(0, 1).
    let odp = ODProcess::new(
        KF::clock(1.0).unwrap(),
        KfEstimate::from_diag(Vector2::zeros(), Vector2::new(1.0, 0.0)),
        Matrix2::zeros(),
        Matrix2::from_diagonal(&Vector2::new(0.0, 1.0)),
        NisMonitor::default(),
    )
    .unwrap();

    let err = odp
        .process(&[
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(3.0, 0.0),
        ])
        .unwrap_err();
    assert!(err.is_numerical());
    assert!(matches!(err, ODError::StepFailed { step: 2, .. }));
    assert!(err.to_string().starts_with("step 2 failed"));

    // The first step on its own is fine
    let solution = odp.process(&[Vector2::new(1.0, 0.0)]).unwrap();
    assert_eq!(solution.final_estimate().covar, Matrix2::zeros());
    assert_eq!(solution.final_estimate().state, Vector2::new(1.0, 0.0));
}

#[rstest]
fn invalid_measurements(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();

    let mut msrs = inputs.measurements.clone();
    msrs[10][1] = f64::NAN;
    assert!(matches!(
        odp.process(&msrs),
        Err(ODError::ODConfigError { .. })
    ));

    let three_rows = DMatrix::<f64>::zeros(3, 10);
    assert!(matches!(
        odp.process_history(&three_rows),
        Err(ODError::ODConfigError { .. })
    ));

    let two_rows = DMatrix::from_fn(2, 10, |row, col| (row + col) as f64);
    let solution = odp.process_history(&two_rows).unwrap();
    assert_eq!(solution.num_measurements(), 10);
}

#[rstest]
fn invalid_process(#[from(sample_inputs)] inputs: FilterInputs) {
    let asymmetric = Matrix2::new(1.0, 0.5, 0.0, 1.0);
    assert!(ODProcess::new(
        KF::clock(1.0).unwrap(),
        inputs.initial_estimate(),
        asymmetric,
        inputs.measurement_noise,
        NisMonitor::default(),
    )
    .is_err());

    let conf = RunConfig::builder().dt(-1.0).build();
    assert!(ODProcess::clock(&inputs, &conf).is_err());
}

#[rstest]
fn write_outputs(#[from(sample_inputs)] inputs: FilterInputs) {
    let odp = ODProcess::clock(&inputs, &RunConfig::default()).unwrap();
    let solution = odp.process(&inputs.measurements[..50]).unwrap();

    let out_dir = scratch_dir("write_outputs").join("filter_output");
    let paths = solution.write_outputs(&out_dir).unwrap();
    assert_eq!(paths.len(), 3);

    let states = read_matrix(out_dir.join(ODSolution::STATE_HISTORY_FILE)).unwrap();
    assert_eq!(states.shape(), (2, 51));
    let nis = read_matrix(out_dir.join(ODSolution::NIS_HISTORY_FILE)).unwrap();
    assert_eq!(nis.shape(), (1, 51));
    assert_eq!(nis[(0, 0)], 0.0);
    let covars = read_matrix(out_dir.join(ODSolution::COVAR_HISTORY_FILE)).unwrap();
    assert_eq!(covars.shape(), (51, 4));

    // Written with 16 digits, the values read back are within an ULP or so
    let final_est = solution.final_estimate();
    assert_abs_diff_eq!(states[(0, 50)], final_est.state[0], epsilon = 1e-14);
    assert_abs_diff_eq!(states[(1, 50)], final_est.state[1], epsilon = 1e-14);
    assert_abs_diff_eq!(covars[(50, 1)], final_est.covar[(0, 1)], epsilon = 1e-14);
    assert_abs_diff_eq!(nis[(0, 50)], solution.nis_history()[50], epsilon = 1e-12);

    let csv_path = out_dir.join("solution.csv");
    solution.to_csv(&csv_path).unwrap();
    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "step");
    assert_eq!(&headers[9], "nis");
    let rows = rdr.records().map(|rec| rec.unwrap()).collect::<Vec<_>>();
    assert_eq!(rows.len(), 51);
    // No innovation for the prior
    assert_eq!(&rows[0][7], "");
    assert_eq!(&rows[50][0], "50");
}
