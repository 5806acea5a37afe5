extern crate nyx_clock as nyx;

use nyx::io::FilterInputs;
use nyx::linalg::Matrix2;
use rstest::*;

mod consistency;
mod process;
mod step;

#[fixture]
pub fn sample_inputs() -> FilterInputs {
    let _ = pretty_env_logger::try_init();
    FilterInputs::load(crate::test_input_dir()).unwrap()
}

/// Checks that a covariance is symmetric and positive semi-definite, to a tolerance relative to its largest entry.
pub fn assert_psd(covar: &Matrix2<f64>, step: usize) {
    let scale = covar.amax();
    assert!(
        (covar[(0, 1)] - covar[(1, 0)]).abs() <= 1e-12 * scale,
        "step {step}: covariance not symmetric\n{covar}"
    );
    let min_eig = covar.symmetric_eigenvalues().min();
    assert!(
        min_eig >= -1e-12 * scale,
        "step {step}: covariance not PSD (min eigenvalue {min_eig:e})\n{covar}"
    );
}
