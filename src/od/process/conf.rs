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

use crate::dynamics::TwoStateClock;
use crate::io::{ConfigError, ConfigRepr};
use crate::od::nis::NisMonitor;
use serde_derive::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;
use typed_builder::TypedBuilder;

fn default_dt() -> f64 {
    1.0
}

fn default_nis_alpha() -> f64 {
    0.05
}

/// Configuration of a clock estimation run. All values are fixed for the whole run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct RunConfig {
    /// Time step between two consecutive measurements
    #[serde(default = "default_dt")]
    #[builder(default = 1.0)]
    pub dt: f64,
    /// Significance level of the NIS consistency check
    #[serde(default = "default_nis_alpha")]
    #[builder(default = 0.05)]
    pub nis_alpha: f64,
}

impl RunConfig {
    /// Ensures that the time step is finite and strictly positive, and that the significance level is within (0, 1).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dynamics()?;
        self.monitor()?;
        Ok(())
    }

    /// Builds the clock dynamics for this time step.
    pub fn dynamics(&self) -> Result<TwoStateClock, ConfigError> {
        TwoStateClock::new(self.dt)
    }

    /// Builds the NIS monitor for this significance level.
    pub fn monitor(&self) -> Result<NisMonitor, ConfigError> {
        NisMonitor::new(self.nis_alpha)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            nis_alpha: default_nis_alpha(),
        }
    }
}

impl ConfigRepr for RunConfig {}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "dt = {}, NIS alpha = {}", self.dt, self.nis_alpha)
    }
}
