//! The current schedule, replaced atomically as fetches complete.
//!
//! Every fetch takes a [`FetchTicket`] before it starts. When fetches
//! overlap, only a result whose ticket is newer than the last applied one is
//! installed; a slow, older fetch finishing late is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eventpass_core::Schedule;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Proof that a fetch was started, ordered by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct StoreState {
    schedule: Option<Arc<Schedule>>,
    applied: u64,
}

/// Holds the single current schedule.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    state: RwLock<StoreState>,
    issued: AtomicU64,
}

/// Shared store handle.
pub type SharedStore = Arc<ScheduleStore>;

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store behind an `Arc`.
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    /// Issues a ticket for a fetch that is about to start.
    pub fn begin_fetch(&self) -> FetchTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "fetch started");
        FetchTicket { generation }
    }

    /// Installs `schedule` if `ticket` is newer than the last applied fetch.
    ///
    /// Returns false, leaving the current schedule in place, when a fetch
    /// started later has already been applied.
    pub async fn complete(&self, ticket: FetchTicket, schedule: Schedule) -> bool {
        let mut state = self.state.write().await;
        if ticket.generation <= state.applied {
            debug!(
                generation = ticket.generation,
                applied = state.applied,
                "discarding stale fetch result"
            );
            return false;
        }

        info!(
            generation = ticket.generation,
            days = schedule.days().len(),
            sessions = schedule.session_count(),
            "schedule updated"
        );
        state.applied = ticket.generation;
        state.schedule = Some(Arc::new(schedule));
        true
    }

    /// Returns a snapshot of the current schedule.
    pub async fn current(&self) -> Option<Arc<Schedule>> {
        self.state.read().await.schedule.clone()
    }

    /// Generation of the schedule currently installed; 0 if none.
    pub async fn applied_generation(&self) -> u64 {
        self.state.read().await.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventpass_core::{NormalizeOptions, normalize_slice};

    fn schedule_with(ids: &[&str]) -> Schedule {
        let sessions: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id": "{id}", "start": "2024-03-01T09:00:00+08:00", "end": "2024-03-01T10:00:00+08:00"}}"#
                )
            })
            .collect();
        let json = format!(r#"{{"sessions": [{}]}}"#, sessions.join(","));
        normalize_slice(json.as_bytes(), &NormalizeOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn empty_until_first_fetch() {
        let store = ScheduleStore::new();
        assert!(store.current().await.is_none());
        assert_eq!(store.applied_generation().await, 0);
    }

    #[tokio::test]
    async fn tickets_increase() {
        let store = ScheduleStore::new();
        let first = store.begin_fetch();
        let second = store.begin_fetch();
        assert!(second > first);
        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
    }

    #[tokio::test]
    async fn newer_fetch_wins_when_older_finishes_last() {
        let store = ScheduleStore::new();
        let old = store.begin_fetch();
        let new = store.begin_fetch();

        assert!(store.complete(new, schedule_with(&["new"])).await);
        assert!(!store.complete(old, schedule_with(&["old"])).await);

        let current = store.current().await.unwrap();
        assert!(current.session("new").is_some());
        assert!(current.session("old").is_none());
        assert_eq!(store.applied_generation().await, 2);
    }

    #[tokio::test]
    async fn in_order_completion_applies_both() {
        let store = ScheduleStore::new();
        let first = store.begin_fetch();
        let second = store.begin_fetch();

        assert!(store.complete(first, schedule_with(&["a"])).await);
        assert!(store.complete(second, schedule_with(&["b"])).await);
        assert!(store.current().await.unwrap().session("b").is_some());
    }

    #[tokio::test]
    async fn same_ticket_applies_once() {
        let store = ScheduleStore::new();
        let ticket = store.begin_fetch();
        assert!(store.complete(ticket, schedule_with(&["a"])).await);
        assert!(!store.complete(ticket, schedule_with(&["b"])).await);
        assert!(store.current().await.unwrap().session("a").is_some());
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot() {
        let store = ScheduleStore::shared();
        let first = store.begin_fetch();
        store.complete(first, schedule_with(&["a"])).await;
        let snapshot = store.current().await.unwrap();

        let second = store.begin_fetch();
        store.complete(second, schedule_with(&["b"])).await;

        assert!(snapshot.session("a").is_some());
        assert!(store.current().await.unwrap().session("b").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_keep_newest() {
        let store = ScheduleStore::shared();
        let tickets: Vec<FetchTicket> = (0..8).map(|_| store.begin_fetch()).collect();

        let handles: Vec<_> = tickets
            .into_iter()
            .rev()
            .map(|ticket| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let id = format!("gen{}", ticket.generation());
                    store.complete(ticket, schedule_with(&[id.as_str()])).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.applied_generation().await, 8);
        assert!(store.current().await.unwrap().session("gen8").is_some());
    }
}
