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

//! Packed `(timestamp, value)` sample encoding, self-describing and
//! tagged so a corrupt or foreign
//! buffer is rejected rather than silently misparsed. Used both for
//! the raw time-series buffer and for `trigger_history.<metric>`.

use crate::error::{CoreError, CoreResult};

pub(crate) const FORMAT_VERSION_1: u8 = 0x51;

/// Encode an ordered list of `(timestamp_seconds, value)` pairs.
///
/// Layout: `[tag: u8][count: u32 LE]{[t: i64 LE][v: f64 LE]}*count`.
pub fn encode(samples: &[(i64, f64)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 4 + samples.len() * 16);
    buf.push(FORMAT_VERSION_1);
    buf.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    for (t, v) in samples {
        buf.extend_from_slice(&t.to_le_bytes());
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode a buffer produced by [`encode`]. Returns
/// [`CoreError::MalformedSeries`] on any structural mismatch.
pub fn decode(buf: &[u8]) -> CoreResult<Vec<(i64, f64)>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    if buf[0] != FORMAT_VERSION_1 {
        return Err(CoreError::MalformedSeries(format!(
            "unexpected tag byte 0x{:02x}",
            buf[0]
        )));
    }
    if buf.len() < 5 {
        return Err(CoreError::MalformedSeries(
            "buffer too short for count header".to_string(),
        ));
    }
    let count = u32::from_le_bytes(buf[1..5].try_into().unwrap()) as usize;
    let expected_len = 5 + count * 16;
    if buf.len() != expected_len {
        return Err(CoreError::MalformedSeries(format!(
            "expected {expected_len} bytes for {count} samples, got {}",
            buf.len()
        )));
    }
    let mut out = Vec::with_capacity(count);
    let mut pos = 5;
    for _ in 0..count {
        let t = i64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
        let v = f64::from_le_bytes(buf[pos + 8..pos + 16].try_into().unwrap());
        out.push((t, v));
        pos += 16;
    }
    Ok(out)
}
