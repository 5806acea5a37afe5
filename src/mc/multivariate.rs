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

use super::rand_distr::{Distribution, StandardNormal};
use crate::io::{validate_covariance, ConfigError};
use crate::linalg::{Matrix2, Vector2};

/// A two dimensional multivariate normal distribution, used to draw clock states and noise samples.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MultivariateNormal2 {
    /// The mean of the multivariate normal distribution
    pub mean: Vector2<f64>,
    /// The product `V * sqrt(S)`, where S holds the singular values and V the right singular vectors of the covariance
    pub sqrt_s_v: Matrix2<f64>,
}

impl MultivariateNormal2 {
    /// Creates a new distribution from a mean and covariance.
    /// The covariance must be positive semi definite. The algorithm is the one from numpy
    /// <https://github.com/numpy/numpy/blob/6c16f23c30fe490422959d30c2e22345211a2fe3/numpy/random/mtrand.pyx#L3979>
    pub fn new(mean: Vector2<f64>, cov: Matrix2<f64>) -> Result<Self, ConfigError> {
        validate_covariance("sampling covariance", &cov)?;

        let svd = cov.svd_unordered(false, true);
        let v_t = svd.v_t.ok_or(ConfigError::NotPositiveSemiDefinite {
            what: "sampling covariance",
        })?;

        let sqrt_s = svd.singular_values.map(|x| x.sqrt());
        let sqrt_s_v_t = Matrix2::from_diagonal(&sqrt_s) * v_t;

        Ok(Self {
            mean,
            sqrt_s_v: sqrt_s_v_t.transpose(),
        })
    }

    /// Same as `new` but with a zero mean
    pub fn zero_mean(cov: Matrix2<f64>) -> Result<Self, ConfigError> {
        Self::new(Vector2::zeros(), cov)
    }
}

impl Distribution<Vector2<f64>> for MultivariateNormal2 {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vector2<f64> {
        let x_rng = Vector2::<f64>::from_fn(|_, _| StandardNormal.sample(rng));
        self.sqrt_s_v * x_rng + self.mean
    }
}
