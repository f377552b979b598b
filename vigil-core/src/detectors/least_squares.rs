// Copyright 2025 Vigil Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use super::DetectorVote;
use crate::stats;
use crate::timeseries::TimeSeries;

/// Anomalous if the mean of the last three residuals from a
/// least-squares line fit exceeds 3 sigma of all residuals, guarding
/// against the degenerate case where both round to zero.
pub fn least_squares(ts: &TimeSeries) -> DetectorVote {
    let timestamps = ts.timestamps();
    let values = ts.values();
    if values.len() < 3 {
        return DetectorVote::Normal;
    }
    let t: Vec<f64> = timestamps.iter().map(|&t| t as f64).collect();
    let (m, c) = stats::least_squares_fit(&t, &values);
    let errors: Vec<f64> = t
        .iter()
        .zip(values.iter())
        .map(|(&ti, &vi)| vi - (m * ti + c))
        .collect();

    let std_dev = stats::stddev(&errors);
    let n = errors.len();
    let tail_mean = (errors[n - 1] + errors[n - 2] + errors[n - 3]) / 3.0;

    let anomalous =
        tail_mean.abs() > 3.0 * std_dev && std_dev.round() != 0.0 && tail_mean.round() != 0.0;

    if anomalous {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}
