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

use super::results::{Results, Run, RunSummary};
use super::ClockScenario;
use crate::dynamics::TwoStateClock;
use crate::io::ConfigError;
use crate::od::filter::kalman::KF;
use crate::od::measurement::DirectObservation;
use crate::od::process::ODProcess;
use crate::od::{ODConfigSnafu, ODError};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use snafu::ResultExt;
use std::fmt;
use std::time::Instant as StdInstant;

/// A Monte Carlo framework, automatically running on all threads via a thread pool.
///
/// Each run simulates its own truth and measurements from its own seeded generator, and processes them
/// with a filter shared read-only by all of the runs.
#[derive(Clone, Debug)]
pub struct MonteCarlo {
    /// Seed of the [64bit PCG random number generator](https://www.pcg-random.org/index.html), run `i` uses `seed + i`
    pub seed: u64,
    /// The simulated clock
    pub scenario: ClockScenario,
    /// Name of this run, will be reflected in the progress bar and in the output structure
    pub name: String,
}

impl MonteCarlo {
    pub fn new(seed: u64, scenario: ClockScenario, name: String) -> Self {
        Self {
            seed,
            scenario,
            name,
        }
    }

    // Just the template for the progress bar
    fn progress_bar(&self, num_runs: usize) -> ProgressBar {
        let pb = ProgressBar::new(num_runs as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:100.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_message(format!("{self}"));
        pb
    }

    /// Seed of the provided run
    pub fn seed_of(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }

    /// Simulates and filters `num_runs` independent arcs. Runs that fail are kept in the results with their error.
    #[must_use = "Monte Carlo result must be used"]
    pub fn run(&self, num_runs: usize) -> Result<Results, ConfigError> {
        self.resume_run(0, num_runs)
    }

    /// Resumes a Monte Carlo by skipping the first `skip` runs, which leads to the same runs as a longer `run`.
    #[must_use = "Monte Carlo result must be used"]
    pub fn resume_run(&self, skip: usize, num_runs: usize) -> Result<Results, ConfigError> {
        let od_process = self.scenario.od_process()?;

        let pb = self.progress_bar(num_runs);

        let start = StdInstant::now();
        let runs = (skip..skip + num_runs)
            .into_par_iter()
            .progress_with(pb)
            .map(|index| {
                let seed = self.seed_of(index);
                Run {
                    index,
                    seed,
                    result: self.single_run(&od_process, seed),
                }
            })
            .collect::<Vec<Run>>();

        info!(
            "Processed {num_runs} runs of {} in {:.3} s",
            self.name,
            start.elapsed().as_secs_f64()
        );

        Ok(Results {
            runs,
            scenario: self.name.clone(),
        })
    }

    fn single_run(
        &self,
        od_process: &ODProcess<KF<TwoStateClock, DirectObservation>>,
        seed: u64,
    ) -> Result<RunSummary, ODError> {
        let arc = self.scenario.simulate(seed).context(ODConfigSnafu)?;
        let solution = od_process.process(&arc.measurements)?;
        let report = solution.consistency(None)?;

        let final_est = solution.final_estimate();
        // There is one more truth than there are measurements, like in the solution
        let final_truth = arc.truth[arc.truth.len() - 1];

        Ok(RunSummary {
            mean_nis: report.mean,
            fraction_above: report.fraction_above,
            consistent: report.is_consistent(),
            final_error: final_est.state - final_truth,
            within_3sigma: final_est.within_3sigma(&final_truth),
            rms_prefit: solution.rms_prefit_residuals(),
        })
    }
}

impl fmt::Display for MonteCarlo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Clock Monte Carlo - seed: {}",
            self.name, self.seed
        )
    }
}

impl fmt::LowerHex for MonteCarlo {
    /// Returns a filename friendly name
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mc-data-{}-seed-{}",
            self.name.replace(' ', "-"),
            self.seed
        )
    }
}
