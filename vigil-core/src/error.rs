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

use thiserror::Error;

/// Failures of the core (codec, series construction, detector registry).
///
/// These are genuine errors, unlike [`PreFilterReject`] below.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("series buffer could not be decoded: {0}")]
    MalformedSeries(String),

    #[error("series has no samples")]
    EmptySeries,

    #[error("unknown detector name in ALGORITHMS config: {0}")]
    UnknownDetector(String),

    #[error("invalid pattern in alert rule: {0}")]
    InvalidPattern(String),
}

/// A pre-filter rejection: the sample is *declined*,
/// not a failure. Kept deliberately outside the `thiserror::Error`
/// hierarchy so callers can't accidentally `log::error!` it or retry
/// it like a store fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreFilterReject {
    /// Fewer than `MIN_TOLERABLE_LENGTH` samples.
    TooShort,
    /// Tail sample older than `STALE_PERIOD`.
    Stale,
    /// The trailing `MAX_TOLERABLE_BOREDOM` samples collapse to
    /// `BOREDOM_SET_SIZE` distinct values.
    Boring,
}

impl std::fmt::Display for PreFilterReject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PreFilterReject::TooShort => "too short",
            PreFilterReject::Stale => "stale",
            PreFilterReject::Boring => "boring",
        };
        write!(f, "{s}")
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
