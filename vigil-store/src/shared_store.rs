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

//! The shared store: the single mutable resource the whole engine
//! reads and writes -- time series, routing sets, expiration/resolution
//! hashes, trigger histories, and the metrics-manager liveness guard.
//!
//! [`InMemoryStore`] is the only implementation shipped here. A
//! Redis-backed implementation is a drop-in behind the same trait;
//! nothing in `vigil-core` or `vigil-manager` depends on which one is
//! wired up.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{StoreError, StoreResult, StoreValueKind};

#[derive(Debug, Clone)]
enum StoreValue {
    Bytes(Vec<u8>),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

impl StoreValue {
    fn kind(&self) -> StoreValueKind {
        match self {
            StoreValue::Bytes(_) => StoreValueKind::Bytes,
            StoreValue::Set(_) => StoreValueKind::Set,
            StoreValue::Hash(_) => StoreValueKind::Hash,
        }
    }
}

struct Entry {
    value: StoreValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            None => true,
            Some(at) => now < at,
        }
    }
}

/// Everything the engine needs from its backing store: plain values,
/// sets (for routing), hashes (for expiration/resolution maps), an
/// atomic-ish rename for the manager's staged publish, and a
/// TTL-guarded key for the liveness lock.
pub trait SharedStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<bool>;
    fn exists(&self, key: &str) -> bool;
    /// Renames `from` to `to`, overwriting any existing value at `to`.
    /// Fails with [`StoreError::RenameSourceMissing`] if `from` is
    /// absent -- the manager's publish sequence depends on this being
    /// detectable rather than silently creating an empty `to`.
    fn rename(&self, from: &str, to: &str) -> StoreResult<()>;

    fn sadd(&self, key: &str, member: &str) -> StoreResult<bool>;
    fn srem(&self, key: &str, member: &str) -> StoreResult<bool>;
    fn smembers(&self, key: &str) -> StoreResult<HashSet<String>>;
    /// Empties `key`, creating it as an empty set if absent. Used by
    /// the manager's staged publish so a staging key exists even when
    /// the rebuilt set has zero members.
    fn sclear(&self, key: &str) -> StoreResult<()>;
    /// Replaces `dest` with the union of `sources`, returning the
    /// resulting set's size.
    fn sunionstore(&self, dest: &str, sources: &[&str]) -> StoreResult<usize>;

    fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;
    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;
    fn hdel(&self, key: &str, field: &str) -> StoreResult<bool>;
    fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// `SET key 1 EX ttl NX` in Redis terms: true if the key was
    /// absent or expired and is now held by the caller, false if
    /// another tick already holds it.
    fn acquire_guard(&self, key: &str, ttl: Duration) -> StoreResult<bool>;
}

/// An in-process, `DashMap`-backed store. Suitable for tests, for a
/// single-binary deployment, and as the seam an external Redis client
/// would otherwise occupy.
#[derive(Default)]
pub struct InMemoryStore {
    data: DashMap<String, Entry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                StoreValue::Bytes(b) => Ok(Some(b.clone())),
                other => Err(StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: StoreValueKind::Bytes,
                    actual: other.kind(),
                }),
            },
            _ => Ok(None),
        }
    }

    fn with_set<F, R>(&self, key: &str, default_if_absent: bool, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut HashSet<String>) -> R,
    {
        let now = Instant::now();
        let mut entry = self.data.entry(key.to_string()).or_insert_with(|| Entry {
            value: StoreValue::Set(HashSet::new()),
            expires_at: None,
        });
        if !entry.is_live(now) {
            entry.value = StoreValue::Set(HashSet::new());
            entry.expires_at = None;
        }
        let _ = default_if_absent;
        match &mut entry.value {
            StoreValue::Set(set) => Ok(f(set)),
            other => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: StoreValueKind::Set,
                actual: other.kind(),
            }),
        }
    }

    fn with_hash<F, R>(&self, key: &str, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut HashMap<String, String>) -> R,
    {
        let now = Instant::now();
        let mut entry = self.data.entry(key.to_string()).or_insert_with(|| Entry {
            value: StoreValue::Hash(HashMap::new()),
            expires_at: None,
        });
        if !entry.is_live(now) {
            entry.value = StoreValue::Hash(HashMap::new());
            entry.expires_at = None;
        }
        match &mut entry.value {
            StoreValue::Hash(map) => Ok(f(map)),
            other => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: StoreValueKind::Hash,
                actual: other.kind(),
            }),
        }
    }
}

impl SharedStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.get_bytes(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.data.insert(
            key.to_string(),
            Entry {
                value: StoreValue::Bytes(value),
                expires_at: None,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        self.data.get(key).map(|e| e.is_live(now)).unwrap_or(false)
    }

    fn rename(&self, from: &str, to: &str) -> StoreResult<()> {
        let now = Instant::now();
        let (_, entry) = self
            .data
            .remove(from)
            .filter(|(_, e)| e.is_live(now))
            .ok_or_else(|| StoreError::RenameSourceMissing(from.to_string()))?;
        self.data.insert(to.to_string(), entry);
        Ok(())
    }

    fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.with_set(key, true, |set| set.insert(member.to_string()))
    }

    fn srem(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.with_set(key, true, |set| set.remove(member))
    }

    fn sclear(&self, key: &str) -> StoreResult<()> {
        self.with_set(key, true, |set| set.clear())
    }

    fn smembers(&self, key: &str) -> StoreResult<HashSet<String>> {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                StoreValue::Set(set) => Ok(set.clone()),
                other => Err(StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: StoreValueKind::Set,
                    actual: other.kind(),
                }),
            },
            _ => Ok(HashSet::new()),
        }
    }

    fn sunionstore(&self, dest: &str, sources: &[&str]) -> StoreResult<usize> {
        let mut union = HashSet::new();
        for src in sources {
            union.extend(self.smembers(src)?);
        }
        let len = union.len();
        self.data.insert(
            dest.to_string(),
            Entry {
                value: StoreValue::Set(union),
                expires_at: None,
            },
        );
        Ok(len)
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.with_hash(key, |map| {
            map.insert(field.to_string(), value.to_string());
        })
    }

    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                StoreValue::Hash(map) => Ok(map.get(field).cloned()),
                other => Err(StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: StoreValueKind::Hash,
                    actual: other.kind(),
                }),
            },
            _ => Ok(None),
        }
    }

    fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        self.with_hash(key, |map| map.remove(field).is_some())
    }

    fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                StoreValue::Hash(map) => Ok(map.clone()),
                other => Err(StoreError::TypeMismatch {
                    key: key.to_string(),
                    expected: StoreValueKind::Hash,
                    actual: other.kind(),
                }),
            },
            _ => Ok(HashMap::new()),
        }
    }

    fn acquire_guard(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut acquired = false;
        self.data
            .entry(key.to_string())
            .and_modify(|entry| {
                if !entry.is_live(now) {
                    entry.value = StoreValue::Bytes(vec![1]);
                    entry.expires_at = Some(now + ttl);
                    acquired = true;
                }
            })
            .or_insert_with(|| {
                acquired = true;
                Entry {
                    value: StoreValue::Bytes(vec![1]),
                    expires_at: Some(now + ttl),
                }
            });
        Ok(acquired)
    }
}
