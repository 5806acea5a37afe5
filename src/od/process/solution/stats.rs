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

use crate::od::nis::{ConsistencyReport, NisMonitor};
use crate::od::{ODConfigSnafu, ODError};
use snafu::ResultExt;

use super::ODSolution;

impl ODSolution {
    /// Returns the root mean square of the prefit residuals
    pub fn rms_prefit_residuals(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0;
        for residual in self.residuals.iter().flatten() {
            sum += residual.prefit.dot(&residual.prefit);
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        (sum / (count as f64)).sqrt()
    }

    /// Returns the root mean square of the postfit residuals
    pub fn rms_postfit_residuals(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0;
        for residual in self.residuals.iter().flatten() {
            sum += residual.postfit.dot(&residual.postfit);
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        (sum / (count as f64)).sqrt()
    }

    /// Mean of the NIS of the measurement updates, i.e. excluding the prior.
    pub fn mean_nis(&self) -> Result<f64, ODError> {
        Ok(self.consistency(None)?.mean)
    }

    /// Evaluates the consistency of this run from the NIS of every measurement update (the prior is excluded).
    ///
    /// The significance level defaults to that of the run.
    pub fn consistency(&self, alpha: Option<f64>) -> Result<ConsistencyReport, ODError> {
        let monitor = match alpha {
            Some(alpha) => {
                NisMonitor::with_dof(alpha, self.monitor.dof()).context(ODConfigSnafu)?
            }
            None => self.monitor,
        };
        monitor.evaluate(&self.nis[1..])
    }
}
