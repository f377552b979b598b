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

//! The filesystem surface: per-detector count and timing files, and
//! per-process-per-detector error files, all appended-to only and
//! drained by the supervisor. [`FileRunMetricsSink`] is the write
//! side, used from the hot evaluation path; [`drain`] is the
//! read-and-clear side, called once per run by whatever plays the
//! supervisor role (`vigil-cli`).

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vigil_core::ensemble::RunMetricsSink;

use crate::error::StoreResult;

/// Writes one line per call to `<dir>/<app>.<detector>.count` and
/// `<dir>/<app>.<detector>.timings`, and one line per panic to
/// `<dir>/<app>.<pid>.<detector>.algorithm.error`.
pub struct FileRunMetricsSink {
    dir: PathBuf,
    app: String,
    pid: u32,
}

impl FileRunMetricsSink {
    pub fn new(dir: impl Into<PathBuf>, app: impl Into<String>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            app: app.into(),
            pid: std::process::id(),
        })
    }

    fn append(&self, file_name: String, line: &str) {
        if let Ok(mut f) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))
        {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl RunMetricsSink for FileRunMetricsSink {
    fn record_timing(&self, detector: &str, elapsed: Duration) {
        self.append(
            format!("{}.{}.timings", self.app, detector),
            &elapsed.as_micros().to_string(),
        );
    }

    fn record_count(&self, detector: &str) {
        self.append(format!("{}.{}.count", self.app, detector), "1");
    }

    fn record_error(&self, detector: &str, message: &str) {
        self.append(
            format!("{}.{}.{}.algorithm.error", self.app, self.pid, detector),
            message,
        );
    }
}

/// Aggregate of one supervisor drain pass over the directory a
/// [`FileRunMetricsSink`] writes into.
#[derive(Debug, Default, Clone)]
pub struct DrainReport {
    /// detector name -> invocation count
    pub counts: std::collections::HashMap<String, u64>,
    /// detector name -> (sum of microseconds, sample count)
    pub timings: std::collections::HashMap<String, (u64, u64)>,
    /// (detector name, error message) for every error line read
    pub errors: Vec<(String, String)>,
}

/// Reads every `<app>.*` file under `dir`, aggregates it into a
/// [`DrainReport`], and truncates what it read so the next run starts
/// from empty files.
pub fn drain(dir: &Path, app: &str) -> StoreResult<DrainReport> {
    let mut report = DrainReport::default();
    let prefix = format!("{app}.");

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(report),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        let rest = &name[prefix.len()..];

        if let Some(detector) = rest.strip_suffix(".count") {
            let count = count_lines(&path)?;
            *report.counts.entry(detector.to_string()).or_insert(0) += count;
        } else if let Some(detector) = rest.strip_suffix(".timings") {
            let (sum, n) = sum_timing_lines(&path)?;
            let entry = report.timings.entry(detector.to_string()).or_insert((0, 0));
            entry.0 += sum;
            entry.1 += n;
        } else if rest.ends_with(".algorithm.error") {
            // name shape: <pid>.<detector>.algorithm.error
            let detector = rest
                .strip_suffix(".algorithm.error")
                .and_then(|s| s.split_once('.'))
                .map(|(_, detector)| detector.to_string())
                .unwrap_or_else(|| rest.to_string());
            for line in read_lines(&path)? {
                report.errors.push((detector.clone(), line));
            }
        } else {
            continue;
        }
        fs::write(&path, b"")?;
    }

    Ok(report)
}

fn read_lines(path: &Path) -> StoreResult<Vec<String>> {
    let file = fs::File::open(path)?;
    Ok(BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|l| !l.is_empty())
        .collect())
}

fn count_lines(path: &Path) -> StoreResult<u64> {
    Ok(read_lines(path)?.len() as u64)
}

fn sum_timing_lines(path: &Path) -> StoreResult<(u64, u64)> {
    let lines = read_lines(path)?;
    let n = lines.len() as u64;
    let sum = lines.iter().filter_map(|l| l.parse::<u64>().ok()).sum();
    Ok((sum, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn sink_writes_counts_and_timings() {
        let dir = tempdir().unwrap();
        let sink = FileRunMetricsSink::new(dir.path(), "vigil").unwrap();
        sink.record_count("grubbs");
        sink.record_count("grubbs");
        sink.record_timing("grubbs", Duration::from_micros(42));

        let report = drain(dir.path(), "vigil").unwrap();
        assert_eq!(report.counts.get("grubbs"), Some(&2));
        assert_eq!(report.timings.get("grubbs"), Some(&(42, 1)));
    }

    #[test]
    fn sink_writes_error_files_keyed_by_pid_and_detector() {
        let dir = tempdir().unwrap();
        let sink = FileRunMetricsSink::new(dir.path(), "vigil").unwrap();
        sink.record_error("ks_test", "boom");

        let report = drain(dir.path(), "vigil").unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, "ks_test");
        assert_eq!(report.errors[0].1, "boom");
    }

    #[test]
    fn drain_truncates_files_so_next_run_starts_empty() {
        let dir = tempdir().unwrap();
        let sink = FileRunMetricsSink::new(dir.path(), "vigil").unwrap();
        sink.record_count("grubbs");
        let _ = drain(dir.path(), "vigil").unwrap();
        let second = drain(dir.path(), "vigil").unwrap();
        assert!(second.counts.is_empty());
    }
}
