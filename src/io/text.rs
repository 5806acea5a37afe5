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

use super::{
    EmptyInputSnafu, InputOutputError, MissingInputSnafu, ParseValueSnafu, RaggedRowsSnafu,
    WriteOutputSnafu,
};
use crate::linalg::DMatrix;
use snafu::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Reads a matrix from a text file where each line is a row and values are separated by whitespace.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<DMatrix<f64>, InputOutputError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).context(MissingInputSnafu { path })?;
    parse_matrix(&contents, path)
}

/// Parses the content of a matrix text file, `path` is only used for error reporting.
pub fn parse_matrix(contents: &str, path: &Path) -> Result<DMatrix<f64>, InputOutputError> {
    let mut values = Vec::new();
    let mut ncols = None;
    let mut nrows = 0;

    for (lno, line) in contents.lines().enumerate() {
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let val = token.parse::<f64>().ok().context(ParseValueSnafu {
                path,
                line: lno + 1,
                token,
            })?;
            row.push(val);
        }

        if row.is_empty() {
            continue;
        }

        match ncols {
            None => ncols = Some(row.len()),
            Some(expected) => ensure!(
                row.len() == expected,
                RaggedRowsSnafu {
                    path,
                    line: lno + 1,
                    expected,
                    found: row.len(),
                }
            ),
        }

        nrows += 1;
        values.extend(row);
    }

    let ncols = ncols.context(EmptyInputSnafu { path })?;

    Ok(DMatrix::from_row_slice(nrows, ncols, &values))
}

/// Formats a matrix with one row per line, in scientific notation with 16 digits of precision.
pub fn format_matrix(mat: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for row in mat.row_iter() {
        let line = row
            .iter()
            .map(|val| format!("{val:.16e}"))
            .collect::<Vec<String>>()
            .join(" ");
        // Writing to a String cannot fail
        let _ = writeln!(out, "{line}");
    }
    out
}

/// Writes a matrix to a text file, in the same format as read by [`read_matrix`].
pub fn write_matrix<P: AsRef<Path>>(path: P, mat: &DMatrix<f64>) -> Result<(), InputOutputError> {
    let path = path.as_ref();
    fs::write(path, format_matrix(mat)).context(WriteOutputSnafu { path })?;
    debug!(
        "Wrote {}x{} matrix to {}",
        mat.nrows(),
        mat.ncols(),
        path.display()
    );
    Ok(())
}
