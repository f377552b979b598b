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

/// EWMA center-of-mass; 50 is the commonly used smoothing window
/// for this style of anomaly check.
const COM: f64 = 50.0;

/// Anomalous if the last raw value is more than 3 EWMA-sigma from the
/// EWMA mean. Better at catching short-term trend
/// breaks than [`super::stddev_from_average`], which looks at the
/// whole window unweighted.
pub fn stddev_from_moving_average(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.is_empty() {
        return DetectorVote::Undetermined;
    }
    let (means, stds) = stats::ewma_mean_std(&values, COM);
    let last_mean = *means.last().unwrap();
    let last_std = *stds.last().unwrap();
    if !last_std.is_finite() {
        return DetectorVote::Undetermined;
    }
    let last_value = *values.last().unwrap();
    if (last_value - last_mean).abs() > 3.0 * last_std {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_is_normal() {
        let samples: Vec<(i64, f64)> = (0..500).map(|i| (i, 1.0)).collect();
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(
            stddev_from_moving_average(&owned.view()),
            DetectorVote::Normal
        );
    }

    #[test]
    fn flags_sudden_jump() {
        let mut samples: Vec<(i64, f64)> = (0..200).map(|i| (i, 1.0)).collect();
        samples.push((200, 500.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(
            stddev_from_moving_average(&owned.view()),
            DetectorVote::Anomalous
        );
    }
}
