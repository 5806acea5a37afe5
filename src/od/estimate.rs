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

use crate::linalg::{Matrix2, Vector2};
use std::fmt;

/// Kalman filter Estimate of the clock state
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KfEstimate {
    /// The estimated state: clock bias and clock drift-rate
    pub state: Vector2<f64>,
    /// The Covariance of this estimate
    pub covar: Matrix2<f64>,
    /// The predicted covariance of this estimate
    pub covar_bar: Matrix2<f64>,
    /// Whether or not this is a predicted estimate from a time update, or an estimate from a measurement
    pub predicted: bool,
    /// The STM used to compute this Estimate
    pub stm: Matrix2<f64>,
}

impl KfEstimate {
    /// Initializes a new filter estimate from the state and the full covariance
    pub fn from_covar(state: Vector2<f64>, covar: Matrix2<f64>) -> Self {
        Self {
            state,
            covar,
            covar_bar: covar,
            predicted: true,
            stm: Matrix2::identity(),
        }
    }

    /// Initializes a new filter estimate from the state and the diagonal of the covariance
    pub fn from_diag(state: Vector2<f64>, diag: Vector2<f64>) -> Self {
        Self::from_covar(state, Matrix2::from_diagonal(&diag))
    }

    /// Estimated clock bias
    pub fn bias(&self) -> f64 {
        self.state[0]
    }

    /// Estimated clock drift-rate
    pub fn rate(&self) -> f64 {
        self.state[1]
    }

    /// One sigma uncertainty of the bias and of the rate
    pub fn sigmas(&self) -> Vector2<f64> {
        self.covar.diagonal().map(|var| var.sqrt())
    }

    /// Returns whether the error between this estimate and the provided truth is within some bound
    /// The 68-95-99.7 rule is a good way to assess whether the filter is operating normally
    pub fn within_sigma(&self, truth: &Vector2<f64>, sigma: f64) -> bool {
        let error = self.state - truth;
        let sigmas = self.sigmas();
        error
            .iter()
            .zip(sigmas.iter())
            .all(|(err, one_sigma)| err.abs() <= one_sigma * sigma)
    }

    /// Returns whether the error with respect to the truth is within 3 sigma, which represent 99.7% for a Normal distribution
    pub fn within_3sigma(&self, truth: &Vector2<f64>) -> bool {
        self.within_sigma(truth, 3.0)
    }
}

impl fmt::Display for KfEstimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let word = if self.predicted {
            "Prediction"
        } else {
            "Estimate"
        };
        let sigmas = self.sigmas();
        write!(
            f,
            "=== {} ===\nbias {:e} rate {:e}\nsigmas [{:e}, {:e}]\n",
            word,
            self.bias(),
            self.rate(),
            sigmas[0],
            sigmas[1]
        )
    }
}
