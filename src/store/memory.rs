//! Process-local session store.

use std::collections::HashMap;
use std::convert::Infallible;

use tokio::sync::RwLock;
use tracing::trace;

use super::SessionStore;
use crate::types::{CallId, LeadFields};

/// Session store backed by a `HashMap` behind an async `RwLock`.
///
/// Every mutating operation holds the write guard for its whole
/// read-modify-write, which serializes merges and removals per key.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<CallId, LeadFields>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    type Error = Infallible;

    async fn upsert(&self, call_id: &CallId, fields: LeadFields) -> Result<LeadFields, Infallible> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(call_id.clone()).or_default();
        entry.merge(fields);
        trace!(call_id = %call_id, "Session upserted");
        Ok(entry.clone())
    }

    async fn seed(&self, call_id: &CallId, defaults: LeadFields) -> Result<LeadFields, Infallible> {
        let mut sessions = self.sessions.write().await;
        let merged = match sessions.remove(call_id) {
            Some(existing) => defaults.merged(existing),
            None => defaults,
        };
        sessions.insert(call_id.clone(), merged.clone());
        trace!(call_id = %call_id, "Session seeded");
        Ok(merged)
    }

    async fn upsert_with_defaults(
        &self,
        call_id: &CallId,
        fields: LeadFields,
        defaults: LeadFields,
    ) -> Result<LeadFields, Infallible> {
        let mut sessions = self.sessions.write().await;
        let mut merged = sessions.remove(call_id).unwrap_or_default();
        merged.merge(fields);
        let merged = defaults.merged(merged);
        sessions.insert(call_id.clone(), merged.clone());
        trace!(call_id = %call_id, "Session upserted with defaults");
        Ok(merged)
    }

    async fn get(&self, call_id: &CallId) -> Result<Option<LeadFields>, Infallible> {
        Ok(self.sessions.read().await.get(call_id).cloned())
    }

    async fn remove(&self, call_id: &CallId) -> Result<Option<LeadFields>, Infallible> {
        let removed = self.sessions.write().await.remove(call_id);
        trace!(call_id = %call_id, found = removed.is_some(), "Session removed");
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, Infallible> {
        Ok(self.sessions.read().await.len())
    }
}
