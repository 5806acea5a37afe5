/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::dynamics::TwoStateClock;
use crate::io::{
    measurements_from_dynamic, validate_covariance, ConfigError, FilterInputs, NonFiniteSnafu,
};
use crate::linalg::{DMatrix, Matrix2, Vector2};
use crate::od::estimate::KfEstimate;
use crate::od::filter::kalman::KF;
use crate::od::filter::Filter;
use crate::od::measurement::DirectObservation;
use crate::od::nis::NisMonitor;
use crate::od::{ODConfigSnafu, ODError, StepFailedSnafu};
use snafu::prelude::*;

mod conf;
pub use conf::RunConfig;
mod solution;
pub use solution::{ODSolution, StepRecord};

/// A clock determination process: runs the filter over a sequence of measurements, starting from a fixed prior.
///
/// Everything in this structure is read-only for the duration of a run, so a single process may be used
/// to process several independent measurement sequences, including from several threads.
#[derive(Clone, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub struct ODProcess<K: Filter> {
    /// Kalman filter itself
    pub kf: K,
    /// Prior estimate, stored at index zero of every solution
    pub initial_estimate: KfEstimate,
    /// Process noise covariance (Q)
    pub process_noise: Matrix2<f64>,
    /// Measurement noise covariance (R)
    pub measurement_noise: Matrix2<f64>,
    /// Computes the NIS of each innovation
    pub monitor: NisMonitor,
}

impl<K: Filter> ODProcess<K> {
    /// Initializes a new process after checking that the prior and the noise covariances are valid.
    pub fn new(
        kf: K,
        initial_estimate: KfEstimate,
        process_noise: Matrix2<f64>,
        measurement_noise: Matrix2<f64>,
        monitor: NisMonitor,
    ) -> Result<Self, ConfigError> {
        ensure!(
            initial_estimate.state.iter().all(|x| x.is_finite()),
            NonFiniteSnafu {
                what: "initial state estimate"
            }
        );
        validate_covariance("initial state covariance", &initial_estimate.covar)?;
        validate_covariance("process noise covariance", &process_noise)?;
        validate_covariance("measurement noise covariance", &measurement_noise)?;

        Ok(Self {
            kf,
            initial_estimate,
            process_noise,
            measurement_noise,
            monitor,
        })
    }

    /// Processes all of the measurements in order and returns the solution, with N+1 entries for N measurements.
    ///
    /// The run is aborted on the first step that fails, and the error includes the failed step number (starting at one).
    pub fn process(&self, measurements: &[Vector2<f64>]) -> Result<ODSolution, ODError> {
        if measurements
            .iter()
            .any(|msr| msr.iter().any(|x| !x.is_finite()))
        {
            return Err(ODError::ODConfigError {
                source: ConfigError::NonFinite {
                    what: "measurement history",
                },
            });
        }

        let num_msrs = measurements.len();
        info!(
            "Processing {num_msrs} measurements with {} from {}",
            self.kf, self.initial_estimate
        );

        let mut solution = ODSolution::new(self.initial_estimate, self.monitor, num_msrs);
        let mut prev_estimate = self.initial_estimate;

        for (msr_idx, real_obs) in measurements.iter().enumerate() {
            let step = msr_idx + 1;

            let result = self
                .kf
                .step(
                    &prev_estimate,
                    &self.process_noise,
                    real_obs,
                    &self.measurement_noise,
                )
                .context(StepFailedSnafu { step })?;

            let nis = self
                .monitor
                .nis(step, &result.residual)
                .context(StepFailedSnafu { step })?;

            debug!(
                "step {step}: bias {:e} rate {:e} NIS {nis:.3}, {}",
                result.state()[0],
                result.state()[1],
                result.residual
            );

            prev_estimate = result.estimate;
            solution.push_measurement_update(result, nis);
        }

        info!(
            "Processed {num_msrs} measurements: RMS prefit {:.3e}, RMS postfit {:.3e}",
            solution.rms_prefit_residuals(),
            solution.rms_postfit_residuals()
        );

        Ok(solution)
    }

    /// Processes a 2xN measurement history, one measurement per column.
    pub fn process_history(&self, history: &DMatrix<f64>) -> Result<ODSolution, ODError> {
        let measurements = measurements_from_dynamic(history).context(ODConfigSnafu)?;
        self.process(&measurements)
    }
}

impl ODProcess<KF<TwoStateClock, DirectObservation>> {
    /// Initializes the two-state clock estimation from the validated inputs and the run configuration.
    pub fn clock(inputs: &FilterInputs, conf: &RunConfig) -> Result<Self, ConfigError> {
        let kf = KF::new(conf.dynamics()?, DirectObservation);
        Self::new(
            kf,
            inputs.initial_estimate(),
            inputs.process_noise,
            inputs.measurement_noise,
            conf.monitor()?,
        )
    }
}
