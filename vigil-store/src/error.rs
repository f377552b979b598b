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

/// The kind of value stored under a key, used to report a
/// [`StoreError::TypeMismatch`] without exposing the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreValueKind {
    Bytes,
    Set,
    Hash,
}

impl std::fmt::Display for StoreValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreValueKind::Bytes => "bytes",
            StoreValueKind::Set => "set",
            StoreValueKind::Hash => "hash",
        };
        write!(f, "{s}")
    }
}

/// Store faults: callers retry once with a
/// fresh connection and abandon the operation on a second failure.
/// `vigil-store` itself never retries -- that policy lives in the
/// caller (`vigil-manager`, the worker pool).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rename failed: source key {0:?} does not exist")]
    RenameSourceMissing(String),

    #[error("key {key:?} holds a {actual}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: StoreValueKind,
        actual: StoreValueKind,
    },

    #[error("I/O error in observability sink: {0}")]
    Io(#[from] std::io::Error),

    #[error("value for {0:?} could not be serialized or deserialized")]
    Codec(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
