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
use vigil_core::CoreError;
use vigil_store::StoreError;

/// A manager-tick failure. Any error inside a stage aborts that
/// stage only; subsequent stages proceed with stale-but-consistent
/// data -- so these are returned from individual stage functions and
/// logged by the caller, not propagated out of [`crate::tick`] itself
/// except where a stage is a hard precondition for the ones after it.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("shared store fault: {0}")]
    Store(#[from] StoreError),

    #[error("alert rule compile fault: {0}")]
    Config(#[from] CoreError),

    #[error("no metrics present in the live universe")]
    EmptyUniverse,
}

pub type ManagerResult<T> = Result<T, ManagerError>;
