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

use super::residual::Residual;
use super::{ODError, ODNoResidualsSnafu};
use crate::io::{ConfigError, InvalidSignificanceSnafu, NoDegreesOfFreedomSnafu};
use crate::linalg::{Matrix2, Vector2};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;

/// Computes the normalized innovation squared, `z' * S^-1 * z`.
///
/// For a consistent filter, this is chi-squared distributed with as many degrees of freedom as there are measurements.
pub fn nis(innovation: &Vector2<f64>, innovation_covar: &Matrix2<f64>) -> Result<f64, ODError> {
    let s_inv = innovation_covar
        .try_inverse()
        .ok_or(ODError::SingularInnovation {
            det: innovation_covar.determinant(),
        })?;
    Ok(innovation.dot(&(s_inv * innovation)))
}

/// Inverse of the chi-squared cumulative distribution evaluated at `1 - alpha`.
///
/// For two degrees of freedom and alpha = 0.05, this is 5.9915.
pub fn chi2_threshold(alpha: f64, dof: usize) -> Result<f64, ConfigError> {
    ensure!(alpha > 0.0 && alpha < 1.0, InvalidSignificanceSnafu { alpha });
    chi2_inverse_cdf(1.0 - alpha, dof)
}

fn chi2_inverse_cdf(prob: f64, dof: usize) -> Result<f64, ConfigError> {
    ensure!(dof > 0, NoDegreesOfFreedomSnafu);
    let distr = ChiSquared::new(dof as f64).map_err(|_| ConfigError::NoDegreesOfFreedom)?;
    Ok(distr.inverse_cdf(prob))
}

/// Flags innovations which are statistically inconsistent with the innovation covariance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NisMonitor {
    alpha: f64,
    dof: usize,
    threshold: f64,
}

impl NisMonitor {
    /// Number of measurements of the clock model, i.e. the degrees of freedom of the NIS.
    pub const MSR_DOF: usize = 2;

    /// Initializes a monitor for two dimensional measurements with the provided significance level.
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        Self::with_dof(alpha, Self::MSR_DOF)
    }

    pub fn with_dof(alpha: f64, dof: usize) -> Result<Self, ConfigError> {
        let threshold = chi2_threshold(alpha, dof)?;
        Ok(Self {
            alpha,
            dof,
            threshold,
        })
    }

    /// Significance level of this monitor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Degrees of freedom of the NIS
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// NIS value above which a single innovation is flagged
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Computes the NIS of the residual of the provided step.
    pub fn nis(&self, step: usize, residual: &Residual) -> Result<f64, ODError> {
        let value = residual.nis()?;
        if value > self.threshold {
            debug!(
                "step {step}: NIS {value:.3} above the {:.4} threshold",
                self.threshold
            );
        }
        Ok(value)
    }

    /// Summarizes the provided NIS samples.
    pub fn evaluate(&self, samples: &[f64]) -> Result<ConsistencyReport, ODError> {
        ensure!(
            !samples.is_empty(),
            ODNoResidualsSnafu {
                action: "evaluate the filter consistency"
            }
        );

        let n = samples.len();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let count_above = samples.iter().filter(|v| **v > self.threshold).count();

        // The sum of N independent NIS values is chi-squared with N * dof degrees of freedom.
        let total_dof = n * self.dof;
        let mean_bounds = match (
            chi2_inverse_cdf(self.alpha / 2.0, total_dof),
            chi2_inverse_cdf(1.0 - self.alpha / 2.0, total_dof),
        ) {
            (Ok(lower), Ok(upper)) => (lower / n as f64, upper / n as f64),
            _ => (f64::NAN, f64::NAN),
        };

        let report = ConsistencyReport {
            samples: n,
            mean,
            count_above,
            fraction_above: count_above as f64 / n as f64,
            threshold: self.threshold,
            alpha: self.alpha,
            dof: self.dof,
            mean_bounds,
        };

        if !report.is_consistent() {
            warn!("filter may be inconsistent: {report}");
        }

        Ok(report)
    }
}

impl Default for NisMonitor {
    fn default() -> Self {
        // Two degrees of freedom at 5%: -2 ln(0.05)
        Self {
            alpha: 0.05,
            dof: Self::MSR_DOF,
            threshold: -2.0 * 0.05_f64.ln(),
        }
    }
}

/// Summary of the NIS of a run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Number of NIS samples
    pub samples: usize,
    /// Mean of the NIS samples, which should be close to the degrees of freedom
    pub mean: f64,
    /// Number of samples above the threshold
    pub count_above: usize,
    /// Fraction of samples above the threshold, which should be close to alpha
    pub fraction_above: f64,
    /// Chi-squared threshold for a single sample
    pub threshold: f64,
    /// Significance level
    pub alpha: f64,
    /// Degrees of freedom of each sample
    pub dof: usize,
    /// Two-sided acceptance region of the mean NIS at the significance level
    pub mean_bounds: (f64, f64),
}

impl ConsistencyReport {
    /// Averaged NIS test: the filter is consistent if the mean NIS lies within its acceptance region.
    pub fn is_consistent(&self) -> bool {
        self.mean >= self.mean_bounds.0 && self.mean <= self.mean_bounds.1
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "NIS, {:.3} above the {} threshold ({} of {} samples above {:.4}), mean {:.3} in [{:.3}, {:.3}]",
            self.fraction_above,
            self.alpha,
            self.count_above,
            self.samples,
            self.threshold,
            self.mean,
            self.mean_bounds.0,
            self.mean_bounds.1
        )
    }
}
