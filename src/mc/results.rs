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

use crate::io::{CsvExportSnafu, InputOutputError, WriteOutputSnafu};
use crate::linalg::Vector2;
use crate::od::ODError;
use serde_derive::Serialize;
use snafu::ResultExt;
use statrs::statistics::Statistics;
use std::path::{Path, PathBuf};

/// Summary of a single filter run against its simulated truth
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Mean NIS of the measurement updates
    pub mean_nis: f64,
    /// Fraction of the NIS above the single sample threshold
    pub fraction_above: f64,
    /// Outcome of the averaged NIS test of this run
    pub consistent: bool,
    /// Final estimate minus the final truth
    pub final_error: Vector2<f64>,
    /// Whether the final error is within the 3 sigma bounds of the final covariance
    pub within_3sigma: bool,
    /// Root mean square of the prefit residuals
    pub rms_prefit: f64,
}

/// A structure storing the result of a single Monte Carlo run
#[derive(Debug)]
pub struct Run {
    /// The index of this run
    pub index: usize,
    /// Seed used to simulate this run
    pub seed: u64,
    /// The result from this run
    pub result: Result<RunSummary, ODError>,
}

/// A structure of Monte Carlo results
#[derive(Debug)]
pub struct Results {
    /// Raw data from each run, sorted by run index for O(1) access to each run
    pub runs: Vec<Run>,
    /// Name of this scenario
    pub scenario: String,
}

#[derive(Serialize)]
struct RunRecord {
    index: usize,
    seed: u64,
    mean_nis: Option<f64>,
    fraction_above: Option<f64>,
    consistent: Option<bool>,
    bias_error: Option<f64>,
    rate_error: Option<f64>,
    within_3sigma: Option<bool>,
    error: Option<String>,
}

impl Results {
    /// Iterates over the summaries of the runs which succeeded, warning about the others
    fn successes(&self) -> impl Iterator<Item = &RunSummary> {
        self.runs.iter().filter_map(|run| match &run.result {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("run #{} failed with {}, skipping it in report", run.index, e);
                None
            }
        })
    }

    /// Number of runs which failed
    pub fn num_failed(&self) -> usize {
        self.runs.iter().filter(|run| run.result.is_err()).count()
    }

    /// Returns the mean NIS of each run, using the value of `value_if_run_failed` if set and skipping that run if the run failed
    pub fn mean_nis_values(&self, value_if_run_failed: Option<f64>) -> Vec<f64> {
        let mut report = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            match &run.result {
                Ok(summary) => report.push(summary.mean_nis),
                Err(e) => match value_if_run_failed {
                    Some(val) => report.push(val),
                    None => warn!(
                        "run #{} failed with {}, skipping its NIS in report",
                        run.index, e
                    ),
                },
            }
        }
        report
    }

    /// Returns the final estimation error of each successful run
    pub fn final_errors(&self) -> Vec<Vector2<f64>> {
        self.successes().map(|summary| summary.final_error).collect()
    }

    /// Average of the mean NIS of the successful runs, which should be close to two for a consistent filter
    pub fn average_nis(&self) -> f64 {
        self.successes().map(|summary| summary.mean_nis).mean()
    }

    /// Standard deviation of the mean NIS of the successful runs
    pub fn std_dev_nis(&self) -> f64 {
        self.successes().map(|summary| summary.mean_nis).std_dev()
    }

    /// Fraction of successful runs whose final error is within three sigma
    pub fn fraction_within_3sigma(&self) -> f64 {
        let (within, total) = self.successes().fold((0, 0), |(within, total), summary| {
            (within + usize::from(summary.within_3sigma), total + 1)
        });
        if total == 0 {
            return f64::NAN;
        }
        within as f64 / total as f64
    }

    /// Fraction of successful runs passing the averaged NIS test
    pub fn fraction_consistent(&self) -> f64 {
        let (passed, total) = self.successes().fold((0, 0), |(passed, total), summary| {
            (passed + usize::from(summary.consistent), total + 1)
        });
        if total == 0 {
            return f64::NAN;
        }
        passed as f64 / total as f64
    }

    /// Exports one row per run to a CSV file, including the failed runs with their error.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, InputOutputError> {
        let path = path.as_ref();
        let mut wtr = csv::Writer::from_path(path).context(CsvExportSnafu { path })?;

        for run in &self.runs {
            let record = match &run.result {
                Ok(summary) => RunRecord {
                    index: run.index,
                    seed: run.seed,
                    mean_nis: Some(summary.mean_nis),
                    fraction_above: Some(summary.fraction_above),
                    consistent: Some(summary.consistent),
                    bias_error: Some(summary.final_error[0]),
                    rate_error: Some(summary.final_error[1]),
                    within_3sigma: Some(summary.within_3sigma),
                    error: None,
                },
                Err(e) => RunRecord {
                    index: run.index,
                    seed: run.seed,
                    mean_nis: None,
                    fraction_above: None,
                    consistent: None,
                    bias_error: None,
                    rate_error: None,
                    within_3sigma: None,
                    error: Some(e.to_string()),
                },
            };
            wtr.serialize(record).context(CsvExportSnafu { path })?;
        }

        wtr.flush().context(WriteOutputSnafu { path })?;
        Ok(path.to_path_buf())
    }
}
