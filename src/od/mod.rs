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

pub use crate::dynamics::{Dynamics, TwoStateClock};
use crate::io::{ConfigError, InputOutputError};
use snafu::prelude::Snafu;

pub mod filter;
pub use filter::kalman::{StepResult, KF};
pub use filter::Filter;

/// Provides the measurement models.
pub mod measurement;
pub use measurement::{ComputedObservation, DirectObservation, MeasurementModel};

/// Provides Estimate handling functionalities.
pub mod estimate;

/// Innovation (prefit residual) bookkeeping.
pub mod residual;

/// Normalized innovation squared, used to assess the filter consistency.
pub mod nis;

/// Provides the interfaces to the clock determination process
pub mod process;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::estimate::*;
    pub use super::filter::kalman::*;
    pub use super::filter::*;
    pub use super::measurement::*;
    pub use super::nis::*;
    pub use super::process::*;
    pub use super::residual::*;
    pub use super::*;

    pub use crate::io::{ConfigRepr, FilterInputs};
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ODError {
    #[snafu(display("innovation covariance is singular or ill-conditioned (det = {det:e})"))]
    SingularInnovation { det: f64 },
    #[snafu(display("measurement update produced a non-finite estimate"))]
    NonFiniteEstimate,
    #[snafu(display("step {step} failed: {source}"))]
    StepFailed {
        step: usize,
        #[snafu(source(from(ODError, Box::new)))]
        source: Box<ODError>,
    },
    #[snafu(display("clock determination failed because {source}"))]
    ODConfigError { source: ConfigError },
    #[snafu(display("clock determination failed because of an I/O error: {source}"))]
    ODIOError { source: InputOutputError },
    #[snafu(display("not enough residuals to {action}"))]
    ODNoResiduals { action: &'static str },
}

impl ODError {
    /// Returns true if this error, or the error it wraps, is a numerical fault of the filter.
    pub fn is_numerical(&self) -> bool {
        match self {
            Self::SingularInnovation { .. } | Self::NonFiniteEstimate => true,
            Self::StepFailed { source, .. } => source.is_numerical(),
            _ => false,
        }
    }
}
