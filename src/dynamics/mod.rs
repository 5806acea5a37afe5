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

/// The two-state (bias and drift) clock model.
pub mod clock;
pub use self::clock::TwoStateClock;

/// Output of a call to [`Dynamics::propagate`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Propagated {
    /// The predicted state at the next step
    pub state: Vector2<f64>,
    /// Partial derivatives of the dynamics with respect to the state, i.e. the state transition matrix (often noted A or Phi)
    pub stm: Matrix2<f64>,
    /// Partial derivatives of the dynamics with respect to the process noise (often noted B or Gamma)
    pub noise_input: Matrix2<f64>,
}

/// A trait for discrete time dynamics of a two dimensional state.
///
/// Implementations must be pure: propagating the same state with the same noise sample must always
/// return the same prediction, and must not mutate the model. This allows a single dynamics model to be
/// shared between independent runs, including across threads.
pub trait Dynamics: Clone + Send + Sync + fmt::Display {
    /// Propagates the state by one step given a sample of the process noise.
    fn propagate(&self, state: &Vector2<f64>, noise: &Vector2<f64>) -> Propagated;

    /// Propagates the state by one step with a nil process noise sample, as done by the filter time update.
    fn predict(&self, state: &Vector2<f64>) -> Propagated {
        self.propagate(state, &Vector2::zeros())
    }
}
