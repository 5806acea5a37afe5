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
use either::Either;
use serde_derive::{Deserialize, Serialize};

/// A 2x2 matrix as written in a configuration file: either its diagonal `[a, b]`, or the list of its rows.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix2Serde {
    #[serde(with = "either::serde_untagged")]
    inner: Either<Diag2, Mat2>,
}

impl Matrix2Serde {
    /// A diagonal matrix
    pub fn diagonal(diag: [f64; 2]) -> Self {
        Self {
            inner: Either::Left(Diag2(diag)),
        }
    }

    /// A full matrix, provided row by row
    pub fn full(rows: [[f64; 2]; 2]) -> Self {
        Self {
            inner: Either::Right(Mat2(rows)),
        }
    }

    pub fn to_matrix(&self) -> Matrix2<f64> {
        match self.inner {
            Either::Left(diag) => Matrix2::from_diagonal(&Vector2::from_iterator(diag.0)),
            Either::Right(mat2) => {
                let rows = mat2.0;
                Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1])
            }
        }
    }
}

impl From<Matrix2<f64>> for Matrix2Serde {
    fn from(mat: Matrix2<f64>) -> Self {
        if mat[(0, 1)] == 0.0 && mat[(1, 0)] == 0.0 {
            Self::diagonal([mat[(0, 0)], mat[(1, 1)]])
        } else {
            Self::full([[mat[(0, 0)], mat[(0, 1)]], [mat[(1, 0)], mat[(1, 1)]]])
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diag2([f64; 2]);

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat2([[f64; 2]; 2]);

#[test]
fn test_serde2() {
    use serde_yaml;

    let m_diag = Matrix2Serde::diagonal([1.0, 2.0]);

    println!("Diag -- \n{}", serde_yaml::to_string(&m_diag).unwrap());
    // Load from one line list
    let diag_s = "[1.0, 2.0]";
    let diag_loaded: Matrix2Serde = serde_yaml::from_str(diag_s).unwrap();
    assert_eq!(diag_loaded, m_diag);
    assert_eq!(
        diag_loaded.to_matrix(),
        Matrix2::from_diagonal(&Vector2::new(1.0, 2.0))
    );

    let m_full = Matrix2Serde::full([[1.0, 0.5], [0.5, 2.0]]);

    // Serialization will print this as an exhaustive list of lists.
    println!("Full -- \n{}", serde_yaml::to_string(&m_full).unwrap());
    // Load from list
    let full_mat = r#"
- [1.0, 0.5] # Row 1
- [0.5, 2.0] # Row 2
    "#;

    let full_loaded: Matrix2Serde = serde_yaml::from_str(full_mat).unwrap();

    assert_eq!(full_loaded, m_full);
    assert_eq!(full_loaded.to_matrix(), Matrix2::new(1.0, 0.5, 0.5, 2.0));

    assert_eq!(
        Matrix2Serde::from(Matrix2::new(1.0, 0.5, 0.5, 2.0)),
        m_full
    );
    assert_eq!(
        Matrix2Serde::from(Matrix2::new(1.0, 0.0, 0.0, 2.0)),
        m_diag
    );
}
