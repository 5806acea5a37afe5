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

use crate::linalg::{Matrix2, Matrix2xX, Vector2};
use crate::od::estimate::KfEstimate;
use crate::od::filter::kalman::StepResult;
use crate::od::nis::NisMonitor;
use crate::od::residual::Residual;

mod display;
mod export;
mod stats;

pub use export::StepRecord;

/// The `ODSolution` stores the result of a clock determination run.
///
/// All of the histories are aligned and indexed by step number: index zero is the prior, and index `i`
/// is the posterior after processing the i-th measurement. There is no residual nor gain at index zero,
/// and the NIS at index zero is zero by convention.
///
/// A solution is never modified once the run is complete.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct ODSolution {
    /// Vector of estimates, starting with the prior
    pub estimates: Vec<KfEstimate>,
    /// Vector of residuals, None for the prior
    pub residuals: Vec<Option<Residual>>,
    /// Vector of filter gains used for each measurement update, None for the prior
    pub gains: Vec<Option<Matrix2<f64>>>,
    /// Normalized innovation squared of each step, zero for the prior
    pub nis: Vec<f64>,
    /// Monitor used to compute the NIS, kept to assess the consistency of the run
    pub monitor: NisMonitor,
}

impl ODSolution {
    pub(crate) fn new(prior: KfEstimate, monitor: NisMonitor, num_msrs: usize) -> Self {
        let mut estimates = Vec::with_capacity(num_msrs + 1);
        let mut residuals = Vec::with_capacity(num_msrs + 1);
        let mut gains = Vec::with_capacity(num_msrs + 1);
        let mut nis = Vec::with_capacity(num_msrs + 1);

        estimates.push(prior);
        residuals.push(None);
        gains.push(None);
        nis.push(0.0);

        Self {
            estimates,
            residuals,
            gains,
            nis,
            monitor,
        }
    }

    /// Pushes a new measurement update result, ensuring proper sizes of the arrays.
    pub(crate) fn push_measurement_update(&mut self, result: StepResult, nis: f64) {
        self.estimates.push(result.estimate);
        self.residuals.push(Some(result.residual));
        self.gains.push(Some(result.gain));
        self.nis.push(nis);
    }

    /// Number of measurements processed, i.e. one less than the length of every history.
    pub fn num_measurements(&self) -> usize {
        self.estimates.len() - 1
    }

    /// Prior estimate of the run
    pub fn prior(&self) -> &KfEstimate {
        &self.estimates[0]
    }

    /// Latest estimate of the run, which is the prior if no measurement was processed
    pub fn final_estimate(&self) -> &KfEstimate {
        &self.estimates[self.estimates.len() - 1]
    }

    /// State history, one column per step: the bias in the first row, the rate in the second.
    pub fn state_history(&self) -> Matrix2xX<f64> {
        let states = self
            .estimates
            .iter()
            .map(|est| est.state)
            .collect::<Vec<Vector2<f64>>>();
        Matrix2xX::from_columns(&states)
    }

    /// Covariance history, one matrix per step.
    pub fn covar_history(&self) -> Vec<Matrix2<f64>> {
        self.estimates.iter().map(|est| est.covar).collect()
    }

    /// NIS history, starting with a zero for the prior.
    pub fn nis_history(&self) -> &[f64] {
        &self.nis
    }

    /// Returns the residuals of all of the measurement updates.
    pub fn residuals(&self) -> Vec<Residual> {
        self.residuals.iter().flatten().copied().collect()
    }

    /// Returns the gains of all of the measurement updates.
    pub fn gains(&self) -> Vec<Matrix2<f64>> {
        self.gains.iter().flatten().copied().collect()
    }
}
