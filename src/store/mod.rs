//! Per-call session storage.
//!
//! The store maps a [`CallId`] to the [`LeadFields`] accumulated so far. It is
//! a transient cache: entries are created when a call starts (or lazily on the
//! first tool invocation), merged into on every tool invocation, and removed
//! when the call ends.
//!
//! The dispatcher only talks to the [`SessionStore`] trait, so a shared cache
//! can replace [`InMemorySessionStore`] for multi-instance deployments.
//!
//! # Atomicity
//!
//! Each operation is a single read-modify-write. Implementations must make it
//! atomic with respect to other operations on the same key; in particular,
//! `remove` must return the final merged snapshot and evict it in one step, so
//! that a tool invocation racing a call end cannot resurrect or lose fields.

use std::future::Future;

use crate::types::{CallId, LeadFields};

pub mod ended;
pub mod memory;

pub use ended::EndedCalls;
pub use memory::InMemorySessionStore;

/// Storage for in-progress call sessions.
pub trait SessionStore: Send + Sync {
    /// The error type returned by this store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Merges `fields` into the session, creating it if absent.
    ///
    /// Returns the merged snapshot.
    fn upsert(
        &self,
        call_id: &CallId,
        fields: LeadFields,
    ) -> impl Future<Output = Result<LeadFields, Self::Error>> + Send;

    /// Creates the session if absent, filling only fields it does not yet have.
    ///
    /// Existing values win over `defaults`, so a late or duplicated call-start
    /// event never clobbers data a tool invocation already wrote.
    fn seed(
        &self,
        call_id: &CallId,
        defaults: LeadFields,
    ) -> impl Future<Output = Result<LeadFields, Self::Error>> + Send;

    /// Merges `fields` into the session, then fills whatever is still absent
    /// from `defaults`, all under one write.
    ///
    /// Creates the session if absent and returns the merged snapshot.
    fn upsert_with_defaults(
        &self,
        call_id: &CallId,
        fields: LeadFields,
        defaults: LeadFields,
    ) -> impl Future<Output = Result<LeadFields, Self::Error>> + Send;

    /// Returns a copy of the session, if one exists.
    fn get(
        &self,
        call_id: &CallId,
    ) -> impl Future<Output = Result<Option<LeadFields>, Self::Error>> + Send;

    /// Removes the session and returns its final snapshot.
    fn remove(
        &self,
        call_id: &CallId,
    ) -> impl Future<Output = Result<Option<LeadFields>, Self::Error>> + Send;

    /// Number of live sessions.
    fn len(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}
