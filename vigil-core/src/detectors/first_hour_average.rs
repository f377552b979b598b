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
use crate::config::default_full_duration;
use crate::stats;
use crate::timeseries::TimeSeries;

/// Anomalous if the tail average deviates from the mean of the first
/// hour of the retention window by more than 3 sigma. "First
/// hour" is measured relative to the series' own tail
/// timestamp rather than the wall clock, so the detector stays a
/// pure function of its input.
pub fn first_hour_average(ts: &TimeSeries) -> DetectorVote {
    if ts.is_empty() {
        return DetectorVote::Undetermined;
    }
    let (tail_t, _) = ts.tail();
    let cutoff = tail_t - (default_full_duration() - 3600);
    let subset = ts.filter_by_time(|t| t < cutoff);
    if subset.is_empty() {
        return DetectorVote::Undetermined;
    }
    let values: Vec<f64> = subset.iter().map(|(_, v)| *v).collect();
    let mean = stats::mean(&values);
    let std_dev = stats::stddev(&values);

    if (ts.tail_avg() - mean).abs() > 3.0 * std_dev {
        DetectorVote::Anomalous
    } else {
        DetectorVote::Normal
    }
}
