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

/// Output of a call to [`MeasurementModel::compute`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComputedObservation {
    /// The observation expected from the provided state
    pub obs: Vector2<f64>,
    /// The measurement sensitivity (often referred to as H tilde)
    pub h_tilde: Matrix2<f64>,
}

/// A trait defining how a state is observed.
///
/// As for [`crate::Dynamics`], implementations must be pure functions of their inputs.
pub trait MeasurementModel: Clone + Send + Sync + fmt::Display {
    /// Computes the observation of the provided state, given a sample of the measurement noise.
    fn compute(&self, state: &Vector2<f64>, noise: &Vector2<f64>) -> ComputedObservation;

    /// Computes the noiseless observation, as expected by the filter.
    fn expected(&self, state: &Vector2<f64>) -> ComputedObservation {
        self.compute(state, &Vector2::zeros())
    }
}

/// Direct observation of both the clock bias and the clock drift-rate, i.e. the sensitivity is the identity.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DirectObservation;

impl MeasurementModel for DirectObservation {
    fn compute(&self, state: &Vector2<f64>, noise: &Vector2<f64>) -> ComputedObservation {
        let h_tilde = Matrix2::identity();
        ComputedObservation {
            obs: h_tilde * state + noise,
            h_tilde,
        }
    }
}

impl fmt::Display for DirectObservation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "direct bias and rate observation")
    }
}
