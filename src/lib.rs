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

/*! # nyx-clock

Estimation of the bias and drift-rate of a clock (e.g. a GNSS receiver clock) from a sequence of noisy
timing measurements, using an extended Kalman filter specialized to the two-state clock model.

The filter step is a pure function of its inputs: the previous posterior goes in, a new posterior,
the innovation and the innovation covariance come out. Independent runs may therefore be processed
in parallel (cf. the [`mc`] module) without sharing any mutable state.
*/

/// Provides the clock dynamics, i.e. how the bias and drift are propagated from one step to the next.
pub mod dynamics;

/// All of the clock determination tools: measurement model, Kalman filter, NIS monitor and the estimation process.
pub mod od;

/// Loading of filter inputs, writing of filter outputs, and configuration handling.
pub mod io;

/// Monte Carlo module
pub mod mc;

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

pub use self::dynamics::{Dynamics, TwoStateClock};
pub use self::od::ODError;
