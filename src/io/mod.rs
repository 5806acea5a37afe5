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

use crate::linalg::{DMatrix, Matrix2, Vector2};
use crate::od::estimate::KfEstimate;
use crate::od::{ODConfigSnafu, ODError, ODIOSnafu};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::prelude::*;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Serde representations of small matrices
pub mod matrices;
/// Whitespace delimited numeric text files
pub mod text;

/// Relative tolerance used to check the symmetry and positive semi-definiteness of input covariances.
const COVAR_TOL: f64 = 1e-9;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("{what} must be {expected_rows}x{expected_cols} but is {rows}x{cols}"))]
    InvalidShape {
        what: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[snafu(display("{what} contains non-finite values"))]
    NonFinite { what: &'static str },
    #[snafu(display("{what} is not symmetric"))]
    Asymmetric { what: &'static str },
    #[snafu(display("{what} is not positive semi-definite"))]
    NotPositiveSemiDefinite { what: &'static str },
    #[snafu(display("time step must be finite and strictly positive, got {dt}"))]
    InvalidTimeStep { dt: f64 },
    #[snafu(display("significance level must be within (0, 1), got {alpha}"))]
    InvalidSignificance { alpha: f64 },
    #[snafu(display("chi-squared distribution requires at least one degree of freedom"))]
    NoDegreesOfFreedom,
    #[snafu(display("failed to read configuration file {}: {source}", path.display()))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to parse YAML configuration: {source}"))]
    ParseConfig { source: serde_yaml::Error },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InputOutputError {
    #[snafu(display("could not read {}: {source}", path.display()))]
    MissingInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("{} line {line}: `{token}` is not a number", path.display()))]
    ParseValue {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[snafu(display("{} line {line}: expected {expected} values but found {found}", path.display()))]
    RaggedRows {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[snafu(display("{} does not contain any value", path.display()))]
    EmptyInput { path: PathBuf },
    #[snafu(display("could not write {}: {source}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("could not export {} to CSV: {source}", path.display()))]
    CsvExport { path: PathBuf, source: csv::Error },
}

pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).context(ReadConfigSnafu { path })?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).context(ParseConfigSnafu)
    }

    /// Builds the configuration representation from the provided string of a yaml
    fn loads(data: &str) -> Result<Self, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseConfigSnafu)
    }
}

/// All of the inputs of a clock estimation run, validated to the dimensions of the two-state clock model.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterInputs {
    /// Initial estimate of the clock bias and drift
    pub initial_state: Vector2<f64>,
    /// Covariance of the initial estimate
    pub initial_covar: Matrix2<f64>,
    /// Process noise covariance (Q)
    pub process_noise: Matrix2<f64>,
    /// Measurement noise covariance (R)
    pub measurement_noise: Matrix2<f64>,
    /// Measurements, one per step
    pub measurements: Vec<Vector2<f64>>,
}

impl FilterInputs {
    pub const INITIAL_STATE_FILE: &'static str = "initial_state_estimate.txt";
    pub const INITIAL_COVAR_FILE: &'static str = "initial_state_estimate_covariance.txt";
    pub const PROCESS_NOISE_FILE: &'static str = "process_noise_covariance.txt";
    pub const MEASUREMENT_NOISE_FILE: &'static str = "measurement_noise_covariance.txt";
    pub const MEASUREMENTS_FILE: &'static str = "measurement_history.txt";

    /// Loads the five input files from the provided directory.
    ///
    /// All files are read before any of them is validated, so that a missing file is always reported as such.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ODError> {
        let dir = dir.as_ref();
        let read = |name: &str| text::read_matrix(dir.join(name)).context(ODIOSnafu);

        let initial_state = read(Self::INITIAL_STATE_FILE)?;
        let initial_covar = read(Self::INITIAL_COVAR_FILE)?;
        let process_noise = read(Self::PROCESS_NOISE_FILE)?;
        let measurement_noise = read(Self::MEASUREMENT_NOISE_FILE)?;
        let measurements = read(Self::MEASUREMENTS_FILE)?;

        info!(
            "Loaded filter inputs from {} ({} measurements)",
            dir.display(),
            measurements.ncols()
        );

        Self::from_dynamic(
            &initial_state,
            &initial_covar,
            &process_noise,
            &measurement_noise,
            &measurements,
        )
        .context(ODConfigSnafu)
    }

    /// Builds the filter inputs from dynamically sized matrices, checking their dimensions and contents.
    pub fn from_dynamic(
        initial_state: &DMatrix<f64>,
        initial_covar: &DMatrix<f64>,
        process_noise: &DMatrix<f64>,
        measurement_noise: &DMatrix<f64>,
        measurement_history: &DMatrix<f64>,
    ) -> Result<Self, ConfigError> {
        let initial_state = to_vector2("initial state estimate", initial_state)?;
        let initial_covar = to_matrix2("initial state covariance", initial_covar)?;
        validate_covariance("initial state covariance", &initial_covar)?;
        let process_noise = to_matrix2("process noise covariance", process_noise)?;
        validate_covariance("process noise covariance", &process_noise)?;
        let measurement_noise = to_matrix2("measurement noise covariance", measurement_noise)?;
        validate_covariance("measurement noise covariance", &measurement_noise)?;
        let measurements = measurements_from_dynamic(measurement_history)?;

        Ok(Self {
            initial_state,
            initial_covar,
            process_noise,
            measurement_noise,
            measurements,
        })
    }

    /// The initial estimate (prior) built from the initial state and covariance.
    pub fn initial_estimate(&self) -> KfEstimate {
        KfEstimate::from_covar(self.initial_state, self.initial_covar)
    }
}

/// Checks that a dynamically sized matrix is a column of two finite values and converts it.
pub fn to_vector2(what: &'static str, mat: &DMatrix<f64>) -> Result<Vector2<f64>, ConfigError> {
    check_shape(what, mat, 2, 1)?;
    ensure!(mat.iter().all(|x| x.is_finite()), NonFiniteSnafu { what });
    Ok(Vector2::new(mat[(0, 0)], mat[(1, 0)]))
}

/// Checks that a dynamically sized matrix is a 2x2 matrix of finite values and converts it.
pub fn to_matrix2(what: &'static str, mat: &DMatrix<f64>) -> Result<Matrix2<f64>, ConfigError> {
    check_shape(what, mat, 2, 2)?;
    ensure!(mat.iter().all(|x| x.is_finite()), NonFiniteSnafu { what });
    Ok(Matrix2::new(
        mat[(0, 0)],
        mat[(0, 1)],
        mat[(1, 0)],
        mat[(1, 1)],
    ))
}

/// Converts a 2xN measurement history into one measurement vector per step.
pub fn measurements_from_dynamic(
    history: &DMatrix<f64>,
) -> Result<Vec<Vector2<f64>>, ConfigError> {
    let what = "measurement history";
    ensure!(
        history.nrows() == 2,
        InvalidShapeSnafu {
            what,
            expected_rows: 2_usize,
            expected_cols: history.ncols(),
            rows: history.nrows(),
            cols: history.ncols(),
        }
    );
    ensure!(history.iter().all(|x| x.is_finite()), NonFiniteSnafu { what });
    Ok(history
        .column_iter()
        .map(|col| Vector2::new(col[0], col[1]))
        .collect())
}

/// Ensures that the covariance is finite, symmetric and positive semi-definite, to a relative tolerance.
pub fn validate_covariance(what: &'static str, covar: &Matrix2<f64>) -> Result<(), ConfigError> {
    ensure!(covar.iter().all(|x| x.is_finite()), NonFiniteSnafu { what });
    let scale = covar.amax().max(f64::MIN_POSITIVE);
    ensure!(
        (covar[(0, 1)] - covar[(1, 0)]).abs() <= COVAR_TOL * scale,
        AsymmetricSnafu { what }
    );
    ensure!(
        covar.symmetric_eigenvalues().min() >= -COVAR_TOL * scale,
        NotPositiveSemiDefiniteSnafu { what }
    );
    Ok(())
}

fn check_shape(
    what: &'static str,
    mat: &DMatrix<f64>,
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), ConfigError> {
    ensure!(
        mat.nrows() == expected_rows && mat.ncols() == expected_cols,
        InvalidShapeSnafu {
            what,
            expected_rows,
            expected_cols,
            rows: mat.nrows(),
            cols: mat.ncols(),
        }
    );
    Ok(())
}
