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

use super::{Dynamics, Propagated};
use crate::io::{ConfigError, InvalidTimeStepSnafu};
use crate::linalg::{Matrix2, Vector2};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Two-state clock model: the state is the clock bias and the clock drift-rate.
///
/// Over one step of duration `dt`, the drift integrates into the bias and the drift itself is a random walk:
///
/// ```text
/// bias_{k+1}  = bias_k + dt * rate_k + w_0
/// rate_{k+1}  = rate_k + w_1
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoStateClock {
    dt: f64,
}

impl TwoStateClock {
    /// Initializes a new clock model with the provided time step, which must be finite and strictly positive.
    pub fn new(dt: f64) -> Result<Self, ConfigError> {
        ensure!(dt.is_finite() && dt > 0.0, InvalidTimeStepSnafu { dt });
        Ok(Self { dt })
    }

    /// Time step of this model
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// State transition matrix: identity with the time step in the (0, 1) entry
    pub fn stm(&self) -> Matrix2<f64> {
        Matrix2::new(1.0, self.dt, 0.0, 1.0)
    }
}

impl Default for TwoStateClock {
    fn default() -> Self {
        Self { dt: 1.0 }
    }
}

impl Dynamics for TwoStateClock {
    fn propagate(&self, state: &Vector2<f64>, noise: &Vector2<f64>) -> Propagated {
        let stm = self.stm();
        let noise_input = Matrix2::identity();

        Propagated {
            state: stm * state + noise_input * noise,
            stm,
            noise_input,
        }
    }
}

impl fmt::Display for TwoStateClock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "two-state clock (dt = {})", self.dt)
    }
}
