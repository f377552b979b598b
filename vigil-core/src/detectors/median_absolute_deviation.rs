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

/// Anomalous if the last deviation-from-median is more than 6x the
/// median of all deviations.
pub fn median_absolute_deviation(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.is_empty() {
        return DetectorVote::Undetermined;
    }
    let med = stats::median(&values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = stats::median(&deviations);

    if mad == 0.0 {
        return DetectorVote::Normal;
    }
    let last_deviation = *deviations.last().unwrap();
    if last_deviation / mad > 6.0 {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_large_outlier() {
        let mut samples: Vec<(i64, f64)> = (0..500).map(|i| (i, 0.0)).collect();
        samples.push((500, 100.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(
            median_absolute_deviation(&owned.view()),
            DetectorVote::Anomalous
        );
    }

    #[test]
    fn zero_mad_is_normal_not_undetermined() {
        let samples: Vec<(i64, f64)> = (0..500).map(|i| (i, 1.0)).collect();
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(
            median_absolute_deviation(&owned.view()),
            DetectorVote::Normal
        );
    }
}
