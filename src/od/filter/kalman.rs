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

use super::Filter;
use crate::dynamics::{Dynamics, TwoStateClock};
use crate::io::ConfigError;
use crate::linalg::{Matrix2, Vector2};
use crate::od::estimate::KfEstimate;
use crate::od::measurement::{DirectObservation, MeasurementModel};
use crate::od::residual::Residual;
use crate::od::{NonFiniteEstimateSnafu, ODError};
use snafu::ensure;
use std::fmt;

/// The innovation covariance is deemed singular when the determinant of its correlation matrix, `1 - rho^2`,
/// drops below this value. The correlation matrix does not depend on the units of the bias and of the rate.
pub const INNOVATION_CONDITION_TOL: f64 = 1e-12;

/// Returns true if the innovation covariance cannot be safely inverted.
///
/// The check is made on the correlation matrix `D^-1/2 S D^-1/2` with `D = diag(S)`, so that rescaling
/// either state component leaves the outcome unchanged.
pub fn innovation_is_singular(s_k: &Matrix2<f64>) -> bool {
    let (var_0, var_1) = (s_k[(0, 0)], s_k[(1, 1)]);
    if !(var_0.is_finite() && var_1.is_finite() && var_0 > 0.0 && var_1 > 0.0) {
        return true;
    }
    let rho_sq = (s_k[(0, 1)] / var_0.sqrt()) * (s_k[(1, 0)] / var_1.sqrt());
    let corr_det = 1.0 - rho_sq;
    !corr_det.is_finite() || corr_det <= INNOVATION_CONDITION_TOL
}

/// Defines an Extended Kalman filter (EKF) from a dynamics model and a measurement model.
#[derive(Clone, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub struct KF<D: Dynamics, M: MeasurementModel> {
    /// Dynamics used for the time update
    pub dynamics: D,
    /// Measurement model used for the measurement update
    pub msr_model: M,
}

/// Output of one filter step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepResult {
    /// The posterior estimate
    pub estimate: KfEstimate,
    /// The innovation and its covariance
    pub residual: Residual,
    /// The Kalman gain used in the update
    pub gain: Matrix2<f64>,
    /// The predicted state prior to the measurement update
    pub predicted_state: Vector2<f64>,
}

impl StepResult {
    /// The posterior state
    pub fn state(&self) -> Vector2<f64> {
        self.estimate.state
    }

    /// The posterior covariance
    pub fn covar(&self) -> Matrix2<f64> {
        self.estimate.covar
    }

    /// The innovation (z), i.e. the prefit residual
    pub fn innovation(&self) -> Vector2<f64> {
        self.residual.prefit
    }

    /// The innovation covariance (S)
    pub fn innovation_covar(&self) -> Matrix2<f64> {
        self.residual.innovation_covar
    }
}

impl<D: Dynamics, M: MeasurementModel> KF<D, M> {
    pub fn new(dynamics: D, msr_model: M) -> Self {
        Self {
            dynamics,
            msr_model,
        }
    }
}

impl KF<TwoStateClock, DirectObservation> {
    /// Initializes the two-state clock filter with a direct observation of bias and rate.
    pub fn clock(dt: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(TwoStateClock::new(dt)?, DirectObservation))
    }
}

impl<D: Dynamics, M: MeasurementModel> Filter for KF<D, M> {
    fn time_update(&self, prev_estimate: &KfEstimate, process_noise: &Matrix2<f64>) -> KfEstimate {
        let prop = self.dynamics.predict(&prev_estimate.state);

        let covar_bar = prop.stm * prev_estimate.covar * prop.stm.transpose()
            + prop.noise_input * process_noise * prop.noise_input.transpose();

        KfEstimate {
            state: prop.state,
            covar: covar_bar,
            covar_bar,
            predicted: true,
            stm: prop.stm,
        }
    }

    fn measurement_update(
        &self,
        predicted: &KfEstimate,
        real_obs: &Vector2<f64>,
        r_k: &Matrix2<f64>,
    ) -> Result<StepResult, ODError> {
        let covar_bar = predicted.covar;

        let computed = self.msr_model.expected(&predicted.state);
        let h_tilde = computed.h_tilde;

        // Compute observation deviation/error, i.e. the innovation
        let prefit = real_obs - computed.obs;

        // Compute the innovation matrix (S_k).
        let s_k = h_tilde * covar_bar * h_tilde.transpose() + r_k;

        let det = s_k.determinant();
        if innovation_is_singular(&s_k) {
            error!("innovation covariance is singular (det = {det:e}):\n{s_k}");
            return Err(ODError::SingularInnovation { det });
        }

        // Invert the innovation covariance through its Cholesky factor, which also fails if S is not positive definite.
        let s_k_inv = s_k
            .cholesky()
            .ok_or(ODError::SingularInnovation { det })?
            .inverse();

        let gain = covar_bar * h_tilde.transpose() * s_k_inv;

        // Compute the state estimate
        let state_hat = predicted.state + gain * prefit;

        // Compute covariance (Joseph update)
        let first_term = Matrix2::identity() - gain * h_tilde;
        let covar = first_term * covar_bar * first_term.transpose() + gain * r_k * gain.transpose();

        ensure!(
            state_hat.iter().chain(covar.iter()).all(|x| x.is_finite()),
            NonFiniteEstimateSnafu
        );

        let postfit = real_obs - self.msr_model.expected(&state_hat).obs;

        Ok(StepResult {
            estimate: KfEstimate {
                state: state_hat,
                covar,
                covar_bar,
                predicted: false,
                stm: predicted.stm,
            },
            residual: Residual {
                prefit,
                postfit,
                innovation_covar: s_k,
                real_obs: *real_obs,
                computed_obs: computed.obs,
            },
            gain,
            predicted_state: predicted.state,
        })
    }
}

impl<D: Dynamics, M: MeasurementModel> fmt::Display for KF<D, M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EKF with {} and {}", self.dynamics, self.msr_model)
    }
}
