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

/// Anomalous if the tail average is more than 3 sigma from the mean
/// of the whole series. Unlike
/// [`super::stddev_from_moving_average`] this compares against the
/// entire window rather than an exponentially weighted recent one.
pub fn stddev_from_average(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.is_empty() {
        return DetectorVote::Undetermined;
    }
    let mean = stats::mean(&values);
    let std_dev = stats::stddev(&values);
    if std_dev == 0.0 {
        return DetectorVote::Normal;
    }
    if (ts.tail_avg() - mean).abs() > 3.0 * std_dev {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stddev_is_normal() {
        let samples: Vec<(i64, f64)> = (0..500).map(|i| (i, 1.0)).collect();
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(stddev_from_average(&owned.view()), DetectorVote::Normal);
    }

    #[test]
    fn flags_tail_far_from_mean() {
        let mut samples: Vec<(i64, f64)> = (0..200)
            .map(|i| (i, ((i as f64) * 0.0001).sin()))
            .collect();
        samples.push((200, 500.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(stddev_from_average(&owned.view()), DetectorVote::Anomalous);
    }
}
