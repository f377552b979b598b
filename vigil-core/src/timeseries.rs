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

//! A zero-copy, indexed view over a packed sample buffer.
//! Construction validates the header and length only
//! — individual samples are decoded lazily on access, so a series
//! that's only ever pre-filtered (and rejected) never pays for a full
//! decode.

use crate::codec;
use crate::error::{CoreError, CoreResult};

const HEADER_LEN: usize = 5;
const SAMPLE_LEN: usize = 16;

/// A single `(timestamp_seconds, value)` sample.
pub type Sample = (i64, f64);

/// Borrowed, ordered view over a packed sample buffer.
///
/// Invariants upheld by [`TimeSeries::from_bytes`]: `len() >= 0` (an
/// empty series is a construction error, not a valid zero-length
/// view — see [`CoreError::EmptySeries`]); timestamps are assumed
/// non-decreasing by the upstream ingestion layer and are not
/// re-validated here.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeries<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> TimeSeries<'a> {
    /// Parse the header of `buf` and build a view. Fails with
    /// [`CoreError::MalformedSeries`] if the header/length don't
    /// check out, or [`CoreError::EmptySeries`] if `buf` decodes to
    /// zero samples.
    pub fn from_bytes(buf: &'a [u8]) -> CoreResult<Self> {
        if buf.is_empty() {
            return Err(CoreError::EmptySeries);
        }
        if buf.len() < HEADER_LEN {
            return Err(CoreError::MalformedSeries(
                "buffer too short for header".to_string(),
            ));
        }
        let tag = buf[0];
        if tag != codec::FORMAT_VERSION_1 {
            return Err(CoreError::MalformedSeries(format!(
                "unexpected tag byte 0x{tag:02x}"
            )));
        }
        let len = u32::from_le_bytes(buf[1..5].try_into().unwrap()) as usize;
        let expected = HEADER_LEN + len * SAMPLE_LEN;
        if buf.len() != expected {
            return Err(CoreError::MalformedSeries(format!(
                "expected {expected} bytes for {len} samples, got {}",
                buf.len()
            )));
        }
        if len == 0 {
            return Err(CoreError::EmptySeries);
        }
        Ok(Self { buf, len })
    }

    /// Build a view directly from already-decoded samples (useful in
    /// tests and for the detector battery's pure-function contract,
    /// which takes a `TimeSeries` rather than raw bytes).
    pub fn from_samples_owned(samples: &[Sample]) -> OwnedTimeSeries {
        OwnedTimeSeries {
            bytes: codec::encode(samples),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Random access by index. Panics on out-of-range `i`, matching
    /// slice indexing conventions — callers are expected to check
    /// `len()` first (as every detector does).
    pub fn get(&self, i: usize) -> Sample {
        assert!(i < self.len, "index {i} out of range for len {}", self.len);
        let pos = HEADER_LEN + i * SAMPLE_LEN;
        let t = i64::from_le_bytes(self.buf[pos..pos + 8].try_into().unwrap());
        let v = f64::from_le_bytes(self.buf[pos + 8..pos + 16].try_into().unwrap());
        (t, v)
    }

    pub fn tail(&self) -> Sample {
        self.get(self.len - 1)
    }

    /// Last `k` samples, oldest-first. If `k > len()`, returns the
    /// whole series.
    pub fn tail_n(&self, k: usize) -> Vec<Sample> {
        let k = k.min(self.len);
        (self.len - k..self.len).map(|i| self.get(i)).collect()
    }

    /// Samples whose timestamp satisfies `pred`.
    pub fn filter_by_time<F: Fn(i64) -> bool>(&self, pred: F) -> Vec<Sample> {
        (0..self.len)
            .map(|i| self.get(i))
            .filter(|(t, _)| pred(*t))
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.get(i).1).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        (0..self.len).map(|i| self.get(i).0).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Mean of the last three values, or the last value alone if the
    /// series has fewer than three samples.
    pub fn tail_avg(&self) -> f64 {
        if self.len >= 3 {
            let a = self.get(self.len - 1).1;
            let b = self.get(self.len - 2).1;
            let c = self.get(self.len - 3).1;
            (a + b + c) / 3.0
        } else {
            self.get(self.len - 1).1
        }
    }
}

/// Owns a packed buffer so a caller can build a `TimeSeries` from an
/// in-memory sample list without going through the shared store.
pub struct OwnedTimeSeries {
    bytes: Vec<u8>,
}

impl OwnedTimeSeries {
    pub fn view(&self) -> TimeSeries<'_> {
        TimeSeries::from_bytes(&self.bytes).expect("encode/from_bytes round trip")
    }
}
