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

use std::fmt;

use super::ODSolution;

impl fmt::Display for ODSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_measurements() == 0 {
            writeln!(f, "Clock solution without any measurement")
        } else {
            let last = self.final_estimate();
            let sigmas = last.sigmas();
            writeln!(
                f,
                "Clock solution with {} estimates: final bias {:e} ± {:e}, rate {:e} ± {:e}",
                self.estimates.len(),
                last.bias(),
                sigmas[0],
                last.rate(),
                sigmas[1]
            )
        }
    }
}
