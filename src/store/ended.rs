//! Record of recently ended calls.
//!
//! The platform may redeliver a call-ended event. The first delivery removes
//! the session and may notify; later deliveries for the same call id must be
//! no-ops, even when they carry post-call analysis that would otherwise look
//! like a fresh, substantive lead.
//!
//! # TTL-based Expiration
//!
//! Entries older than the retention period (default 24 hours) are pruned on
//! every insertion to prevent unbounded growth.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::types::CallId;

/// Default retention period for ended-call markers, in hours.
pub const DEFAULT_ENDED_TTL_HOURS: i64 = 24;

/// Set of call ids whose end has already been processed.
#[derive(Debug)]
pub struct EndedCalls {
    seen: Mutex<HashMap<CallId, DateTime<Utc>>>,
    ttl: Duration,
}

impl Default for EndedCalls {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_ENDED_TTL_HOURS))
    }
}

impl EndedCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        EndedCalls {
            seen: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Marks the call as ended at `now`.
    ///
    /// Returns `true` if this is the first time the end is seen (within the
    /// retention period), `false` for a duplicate.
    pub fn mark_ended(&self, call_id: &CallId, now: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        prune_expired(&mut seen, now, self.ttl);
        if seen.contains_key(call_id) {
            return false;
        }
        seen.insert(call_id.clone(), now);
        true
    }

    /// Returns true if the call's end was already processed.
    pub fn is_ended(&self, call_id: &CallId) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(call_id)
    }

    /// Drops the marker so a redelivered end is processed again.
    ///
    /// Used when the end could not be completed after it was marked.
    pub fn forget(&self, call_id: &CallId) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(call_id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes markers older than `ttl`. Returns how many were removed.
fn prune_expired(
    seen: &mut HashMap<CallId, DateTime<Utc>>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> usize {
    let cutoff = now - ttl;
    let before = seen.len();
    seen.retain(|_, ended_at| *ended_at > cutoff);
    before - seen.len()
}
