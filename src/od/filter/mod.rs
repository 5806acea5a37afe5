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

use self::kalman::StepResult;
use super::estimate::KfEstimate;
use super::ODError;
use crate::linalg::{Matrix2, Vector2};
use std::fmt;

pub mod kalman;

/// Defines a Filter trait for the two-state clock estimation.
///
/// None of these methods take a mutable reference: a filter only holds its models, and every
/// estimate is passed in and returned by value. The same filter may hence serve several runs at once.
pub trait Filter: Clone + Send + Sync + fmt::Display {
    /// Computes a time update/prediction of the previous estimate, adding the process noise to the propagated covariance.
    fn time_update(&self, prev_estimate: &KfEstimate, process_noise: &Matrix2<f64>) -> KfEstimate;

    /// Computes the measurement update of a predicted estimate with the provided real observation.
    ///
    /// Returns an error if the innovation covariance cannot be inverted, or if the update is not finite.
    fn measurement_update(
        &self,
        predicted: &KfEstimate,
        real_obs: &Vector2<f64>,
        measurement_noise: &Matrix2<f64>,
    ) -> Result<StepResult, ODError>;

    /// Performs a full filter step: a time update immediately followed by a measurement update.
    fn step(
        &self,
        prev_estimate: &KfEstimate,
        process_noise: &Matrix2<f64>,
        real_obs: &Vector2<f64>,
        measurement_noise: &Matrix2<f64>,
    ) -> Result<StepResult, ODError> {
        let predicted = self.time_update(prev_estimate, process_noise);
        self.measurement_update(&predicted, real_obs, measurement_noise)
    }
}
