//! In-process implementation of the store backend.
//!
//! Used by tests and by deployments that run without Redis: the caching
//! layer keeps working against local process memory, with the same TTL and
//! pattern-deletion semantics.

use crate::backend::{KeyTtl, ScanPage, StoreBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use recache_core::{RecacheError, RecacheResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store with per-entry expiry.
///
/// Expired entries are dropped lazily on access. The map lock is never held
/// across an await point.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    /// Live scan cursors: cursor id -> last key returned on that scan.
    /// Resuming skips to strictly after that key in sort order, so a key
    /// present for the whole scan is returned exactly once no matter what
    /// is deleted between pages.
    scan_cursors: Mutex<HashMap<u64, String>>,
    next_cursor: AtomicU64,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> RecacheResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RecacheError::NotConnected);
        }
        Ok(())
    }

    fn wrong_type(key: &str) -> RecacheError {
        RecacheError::StoreUnavailable(format!(
            "WRONGTYPE operation against key '{}' holding the wrong kind of value",
            key
        ))
    }

    /// Remove an entry if it has expired, then return whether it is live.
    fn purge_expired(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) -> bool {
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

/// Matches `text` against a Redis-style glob pattern (`*` and `?`).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0usize, 0usize);
    let (mut star, mut mark) = (None::<usize>, 0usize);

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last '*' absorb one more character.
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get(&self, key: &str) -> RecacheResult<Option<String>> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        if !Self::purge_expired(&mut entries, key, Instant::now()) {
            return Ok(None);
        }
        match &entries[key].value {
            Value::Str(s) => Ok(Some(s.clone())),
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> RecacheResult<()> {
        self.check_open()?;
        let entry = Entry {
            value: Value::Str(value.to_string()),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> RecacheResult<u64> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        let live = Self::purge_expired(&mut entries, key, Instant::now());
        if live && entries.remove(key).is_some() {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn delete_many(&self, keys: &[String]) -> RecacheResult<u64> {
        self.check_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut deleted = 0u64;
        for key in keys {
            if Self::purge_expired(&mut entries, key, now) && entries.remove(key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> RecacheResult<bool> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        Ok(Self::purge_expired(&mut entries, key, Instant::now()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> RecacheResult<bool> {
        self.check_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if !Self::purge_expired(&mut entries, key, now) {
            return Ok(false);
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + ttl);
        }
        Ok(true)
    }

    async fn ttl_remaining(&self, key: &str) -> RecacheResult<KeyTtl> {
        self.check_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if !Self::purge_expired(&mut entries, key, now) {
            return Ok(KeyTtl::Missing);
        }
        Ok(match entries[key].expires_at {
            Some(at) => KeyTtl::Remaining(at - now),
            None => KeyTtl::Persistent,
        })
    }

    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> RecacheResult<ScanPage> {
        self.check_open()?;
        let count = count.max(1);

        // A non-zero cursor resumes strictly after the last key it
        // returned; an unknown cursor is treated as an exhausted scan.
        let resume_after = if cursor == 0 {
            None
        } else {
            match self.scan_cursors.lock().remove(&cursor) {
                Some(last) => Some(last),
                None => return Ok(ScanPage::default()),
            }
        };

        let now = Instant::now();
        let entries = self.entries.lock();
        let mut matching: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        drop(entries);
        matching.sort();
        if let Some(last) = &resume_after {
            matching.retain(|key| key > last);
        }

        let has_more = matching.len() > count;
        matching.truncate(count);

        let cursor = if has_more {
            let id = self.next_cursor.fetch_add(1, Ordering::Relaxed) + 1;
            // has_more implies the page is non-empty.
            let last = matching.last().cloned().unwrap_or_default();
            self.scan_cursors.lock().insert(id, last);
            id
        } else {
            0
        };
        Ok(ScanPage {
            cursor,
            keys: matching,
        })
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: &HashMap<String, String>,
        ttl: Option<Duration>,
    ) -> RecacheResult<()> {
        self.check_open()?;
        if fields.is_empty() {
            return Ok(());
        }
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, key, now);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(hash) => {
                hash.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => return Err(Self::wrong_type(key)),
        }
        if let Some(ttl) = ttl {
            entry.expires_at = Some(now + ttl);
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> RecacheResult<Option<HashMap<String, String>>> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        if !Self::purge_expired(&mut entries, key, Instant::now()) {
            return Ok(None);
        }
        match &entries[key].value {
            Value::Hash(hash) => Ok(Some(hash.clone())),
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn set_add(&self, key: &str, members: &[String]) -> RecacheResult<u64> {
        self.check_open()?;
        if members.is_empty() {
            return Ok(0);
        }
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, key, Instant::now());
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(set) => {
                let mut added = 0u64;
                for member in members {
                    if set.insert(member.clone()) {
                        added += 1;
                    }
                }
                Ok(added)
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn set_members(&self, key: &str) -> RecacheResult<HashSet<String>> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        if !Self::purge_expired(&mut entries, key, Instant::now()) {
            return Ok(HashSet::new());
        }
        match &entries[key].value {
            Value::Set(set) => Ok(set.clone()),
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn increment(&self, key: &str, by: i64) -> RecacheResult<i64> {
        self.check_open()?;
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, key, Instant::now());
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Str("0".to_string()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Str(s) => {
                let current: i64 = s.parse().map_err(|_| {
                    RecacheError::StoreUnavailable(format!(
                        "value at '{}' is not an integer",
                        key
                    ))
                })?;
                let next = current + by;
                *s = next.to_string();
                Ok(next)
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn decrement(&self, key: &str, by: i64) -> RecacheResult<i64> {
        self.increment(key, -by).await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.entries.lock().clear();
        self.scan_cursors.lock().clear();
    }
}
