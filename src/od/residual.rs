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

use super::nis::nis;
use super::ODError;
use crate::linalg::{Matrix2, Vector2};
use std::fmt;

/// Stores the innovation of a measurement update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Residual {
    /// The prefit residual, or innovation: real observation minus computed observation
    pub prefit: Vector2<f64>,
    /// The postfit residual: real observation minus the observation of the updated state
    pub postfit: Vector2<f64>,
    /// The innovation covariance (S), i.e. the predicted covariance projected in the measurement space plus the measurement noise
    pub innovation_covar: Matrix2<f64>,
    /// The real observation
    pub real_obs: Vector2<f64>,
    /// The computed observation as expected from the dynamics of the filter.
    pub computed_obs: Vector2<f64>,
}

impl Residual {
    /// Normalized innovation squared of this residual.
    pub fn nis(&self) -> Result<f64, ODError> {
        nis(&self.prefit, &self.innovation_covar)
    }
}

impl fmt::Display for Residual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Residual: prefit [{:e}, {:e}] postfit [{:e}, {:e}]",
            self.prefit[0], self.prefit[1], self.postfit[0], self.postfit[1]
        )
    }
}
