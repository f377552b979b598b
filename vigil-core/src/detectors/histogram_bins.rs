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

const NBINS: usize = 15;
const MIN_BIN_COUNT: u64 = 20;

/// Anomalous if the tail average falls into a histogram bin holding
/// `MIN_BIN_COUNT` or fewer of the series' own values. Bin 0 is
/// treated left-inclusive at its lower edge; every
/// other bin is left-inclusive / right-exclusive, matching
/// `numpy.histogram`'s bucketing convention.
pub fn histogram_bins(ts: &TimeSeries) -> DetectorVote {
    let values = ts.values();
    if values.is_empty() {
        return DetectorVote::Undetermined;
    }
    let (counts, edges) = stats::histogram(&values, NBINS);
    let t = ts.tail_avg();

    for (index, &count) in counts.iter().enumerate() {
        if count > MIN_BIN_COUNT {
            continue;
        }
        let in_bin = if index == 0 {
            t <= edges[0]
        } else {
            t >= edges[index] && t < edges[index + 1]
        };
        if in_bin {
            return DetectorVote::Anomalous;
        }
    }
    DetectorVote::Normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_uniform_series_is_normal() {
        let samples: Vec<(i64, f64)> = (0..300).map(|i| (i, (i % 15) as f64)).collect();
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(histogram_bins(&owned.view()), DetectorVote::Normal);
    }

    #[test]
    fn flags_rare_outlier_bin() {
        let mut samples: Vec<(i64, f64)> = (0..300).map(|i| (i, 1.0)).collect();
        samples.push((300, 1000.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        assert_eq!(histogram_bins(&owned.view()), DetectorVote::Anomalous);
    }
}
