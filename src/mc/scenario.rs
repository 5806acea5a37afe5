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

use super::rand_distr::Distribution;
use super::{MultivariateNormal2, Pcg64Mcg};
use crate::dynamics::{Dynamics, TwoStateClock};
use crate::io::matrices::Matrix2Serde;
use crate::io::{ConfigError, ConfigRepr, FilterInputs, NonFiniteSnafu};
use crate::linalg::{Matrix2, Vector2};
use crate::od::filter::kalman::KF;
use crate::od::measurement::{DirectObservation, MeasurementModel};
use crate::od::process::{ODProcess, RunConfig};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

fn default_dt() -> f64 {
    1.0
}

fn default_alpha() -> f64 {
    0.05
}

/// Describes a simulated clock: its prior, its noises, and how many measurements to generate.
///
/// ```yaml
/// x0: [0.0, 1.0e-3]
/// p0: [1.0, 1.0e-4]
/// q:
///   - [1.0e-4, 0.0]
///   - [0.0, 1.0e-6]
/// r: [0.25, 1.0e-2]
/// steps: 1000
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockScenario {
    /// Prior estimate of the bias and rate
    pub x0: [f64; 2],
    /// Prior covariance, from which the true initial state is drawn
    pub p0: Matrix2Serde,
    /// Process noise covariance
    pub q: Matrix2Serde,
    /// Measurement noise covariance
    pub r: Matrix2Serde,
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Number of measurements to simulate
    pub steps: usize,
    /// Significance level of the NIS check of each run
    #[serde(default = "default_alpha")]
    pub nis_alpha: f64,
}

/// A simulated truth and the measurements of that truth.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedArc {
    /// True state at every step, starting with the true initial state (N+1 entries)
    pub truth: Vec<Vector2<f64>>,
    /// Noisy measurements of the truth, from the first step onward (N entries)
    pub measurements: Vec<Vector2<f64>>,
}

impl ClockScenario {
    pub fn new(
        x0: Vector2<f64>,
        p0: Matrix2<f64>,
        q: Matrix2<f64>,
        r: Matrix2<f64>,
        dt: f64,
        steps: usize,
    ) -> Self {
        Self {
            x0: [x0[0], x0[1]],
            p0: p0.into(),
            q: q.into(),
            r: r.into(),
            dt,
            steps,
            nis_alpha: default_alpha(),
        }
    }

    pub fn initial_state(&self) -> Vector2<f64> {
        Vector2::new(self.x0[0], self.x0[1])
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::builder()
            .dt(self.dt)
            .nis_alpha(self.nis_alpha)
            .build()
    }

    /// Filter inputs from the prior of this scenario and the provided measurements.
    pub fn filter_inputs(&self, measurements: Vec<Vector2<f64>>) -> FilterInputs {
        FilterInputs {
            initial_state: self.initial_state(),
            initial_covar: self.p0.to_matrix(),
            process_noise: self.q.to_matrix(),
            measurement_noise: self.r.to_matrix(),
            measurements,
        }
    }

    /// Builds the clock determination process matching this scenario, which also validates it.
    pub fn od_process(&self) -> Result<ODProcess<KF<TwoStateClock, DirectObservation>>, ConfigError> {
        ensure!(
            self.x0.iter().all(|x| x.is_finite()),
            NonFiniteSnafu {
                what: "scenario initial state"
            }
        );
        ODProcess::clock(&self.filter_inputs(Vec::new()), &self.run_config())
    }

    /// Simulates a truth and its measurements. The same seed always leads to the same arc.
    ///
    /// The true initial state is drawn from the prior, then each step follows the clock dynamics driven by
    /// the process noise, and each measurement is the true state plus measurement noise.
    pub fn simulate(&self, seed: u64) -> Result<SimulatedArc, ConfigError> {
        let clock = TwoStateClock::new(self.dt)?;
        let msr_model = DirectObservation;

        let prior = MultivariateNormal2::new(self.initial_state(), self.p0.to_matrix())?;
        let process_noise = MultivariateNormal2::zero_mean(self.q.to_matrix())?;
        let msr_noise = MultivariateNormal2::zero_mean(self.r.to_matrix())?;

        let mut rng = Pcg64Mcg::new(seed.into());

        let mut truth = Vec::with_capacity(self.steps + 1);
        let mut measurements = Vec::with_capacity(self.steps);

        let mut state = prior.sample(&mut rng);
        truth.push(state);

        for _ in 0..self.steps {
            state = clock
                .propagate(&state, &process_noise.sample(&mut rng))
                .state;
            truth.push(state);
            measurements.push(msr_model.compute(&state, &msr_noise.sample(&mut rng)).obs);
        }

        debug!(
            "simulated {} measurements with seed {seed}: final truth {:e}",
            self.steps, state
        );

        Ok(SimulatedArc {
            truth,
            measurements,
        })
    }
}

impl ConfigRepr for ClockScenario {}

impl fmt::Display for ClockScenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} steps of {} from [{:e}, {:e}]",
            self.steps, self.dt, self.x0[0], self.x0[1]
        )
    }
}
