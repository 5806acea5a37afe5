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

use crate::io::text::write_matrix;
use crate::io::{CsvExportSnafu, WriteOutputSnafu};
use crate::linalg::DMatrix;
use crate::od::{ODError, ODIOSnafu};
use serde_derive::Serialize;
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::ODSolution;

/// One row of the CSV export of a solution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub bias: f64,
    pub rate: f64,
    pub covar_bias_bias: f64,
    pub covar_bias_rate: f64,
    pub covar_rate_bias: f64,
    pub covar_rate_rate: f64,
    /// Innovation on the bias, empty for the prior
    pub innovation_bias: Option<f64>,
    /// Innovation on the rate, empty for the prior
    pub innovation_rate: Option<f64>,
    pub nis: f64,
}

impl ODSolution {
    pub const STATE_HISTORY_FILE: &'static str = "filter_output.txt";
    pub const NIS_HISTORY_FILE: &'static str = "nis_hist.txt";
    pub const COVAR_HISTORY_FILE: &'static str = "covariance_hist.txt";

    /// Flattens this solution into one record per step.
    pub fn records(&self) -> Vec<StepRecord> {
        self.estimates
            .iter()
            .zip(self.residuals.iter())
            .zip(self.nis.iter())
            .enumerate()
            .map(|(step, ((est, residual), nis))| StepRecord {
                step,
                bias: est.state[0],
                rate: est.state[1],
                covar_bias_bias: est.covar[(0, 0)],
                covar_bias_rate: est.covar[(0, 1)],
                covar_rate_bias: est.covar[(1, 0)],
                covar_rate_rate: est.covar[(1, 1)],
                innovation_bias: residual.map(|r| r.prefit[0]),
                innovation_rate: residual.map(|r| r.prefit[1]),
                nis: *nis,
            })
            .collect()
    }

    /// Writes the state history (2 rows), the NIS history (1 row) and the covariance history (one row of
    /// four row-major entries per step) as text files in the provided directory, creating it if needed.
    pub fn write_outputs<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, ODError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .context(WriteOutputSnafu { path: dir })
            .context(ODIOSnafu)?;

        let num_steps = self.estimates.len();

        let states = DMatrix::from_fn(2, num_steps, |row, col| self.estimates[col].state[row]);
        let nis = DMatrix::from_row_slice(1, num_steps, &self.nis);
        let covars = DMatrix::from_fn(num_steps, 4, |row, col| {
            self.estimates[row].covar[(col / 2, col % 2)]
        });

        let mut paths = Vec::with_capacity(3);
        for (name, mat) in [
            (Self::STATE_HISTORY_FILE, &states),
            (Self::NIS_HISTORY_FILE, &nis),
            (Self::COVAR_HISTORY_FILE, &covars),
        ] {
            let path = dir.join(name);
            write_matrix(&path, mat).context(ODIOSnafu)?;
            paths.push(path);
        }

        info!("Wrote {num_steps} steps to {}", dir.display());

        Ok(paths)
    }

    /// Exports this solution to a CSV file with one row per step.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, ODError> {
        let path = path.as_ref();

        let mut wtr = csv::Writer::from_path(path)
            .context(CsvExportSnafu { path })
            .context(ODIOSnafu)?;

        for record in self.records() {
            wtr.serialize(record)
                .context(CsvExportSnafu { path })
                .context(ODIOSnafu)?;
        }

        wtr.flush()
            .context(WriteOutputSnafu { path })
            .context(ODIOSnafu)?;

        info!("Exported solution to {}", path.display());

        Ok(path.to_path_buf())
    }
}
