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

/// Anomalous if the latest value, after subtracting the mean of all
/// prior values, is farther than 3 sigma of those prior (also
/// mean-subtracted) values out in cumulative terms.
pub fn mean_subtraction_cumulation(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.len() < 2 {
        return DetectorVote::Undetermined;
    }
    let prior = &values[..values.len() - 1];
    let prior_mean = stats::mean(prior);
    let u: Vec<f64> = values.iter().map(|v| v - prior_mean).collect();
    let prior_u = &u[..u.len() - 1];
    let std_dev = stats::stddev(prior_u);
    if std_dev == 0.0 {
        return DetectorVote::Normal;
    }
    let last = *u.last().unwrap();
    if last.abs() > 3.0 * std_dev {
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
            mean_subtraction_cumulation(&owned.view()),
            DetectorVote::Normal
        );
    }

    #[test]
    fn flags_cumulative_drift() {
        let mut samples: Vec<(i64, f64)> = (0..200).map(|i| (i, 1.0)).collect();
        samples.push((200, 500.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(
            mean_subtraction_cumulation(&owned.view()),
            DetectorVote::Anomalous
        );
    }
}
