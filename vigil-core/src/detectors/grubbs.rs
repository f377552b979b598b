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

/// Anomalous if the tail's z-score exceeds the Grubbs critical value
/// for this series length.
pub fn grubbs(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.len() < 3 {
        return DetectorVote::Undetermined;
    }
    let std_dev = stats::stddev(&values);
    if std_dev == 0.0 {
        return DetectorVote::Normal;
    }
    let mean = stats::mean(&values);
    let z_score = (ts.tail_avg() - mean) / std_dev;
    let g = stats::grubbs_critical_value(values.len());

    if z_score > g {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stddev_is_normal_not_undetermined() {
        let samples: Vec<(i64, f64)> = (0..500).map(|i| (i, 1.0)).collect();
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(grubbs(&owned.view()), DetectorVote::Normal);
    }

    #[test]
    fn flags_extreme_tail() {
        let mut samples: Vec<(i64, f64)> = (0..200)
            .map(|i| (i, ((i as f64) * 0.0001).sin()))
            .collect();
        samples.push((200, 500.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(grubbs(&owned.view()), DetectorVote::Anomalous);
    }
}
