//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of live estimates.

use crate::config::Config;
use protolab_core::catalog::LoadedCatalog;
use protolab_core::ports::{AccountService, RequestStore};
use protolab_core::selection::{SelectionCommand, SelectionStore};
use protolab_core::triage::TriageStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub requests: Arc<dyn RequestStore>,
    pub accounts: Arc<dyn AccountService>,
    pub catalog: Arc<LoadedCatalog>,
    pub triage: Arc<TriageStore>,
    pub estimates: Arc<EstimateSessions>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        requests: Arc<dyn RequestStore>,
        accounts: Arc<dyn AccountService>,
        catalog: LoadedCatalog,
    ) -> Self {
        let estimates = EstimateSessions::new(
            Duration::from_secs(config.estimate_idle_minutes.saturating_mul(60)),
            config.max_estimates,
        );
        Self {
            triage: Arc::new(TriageStore::new(requests.clone())),
            requests,
            accounts,
            catalog: Arc::new(catalog),
            estimates: Arc::new(estimates),
            config,
        }
    }
}

//=========================================================================================
// EstimateSessions (One SelectionStore per Estimate)
//=========================================================================================

struct Session {
    store: SelectionStore,
    touched: Instant,
}

impl Session {
    fn is_idle(&self, idle_ttl: Duration) -> bool {
        self.touched.elapsed() >= idle_ttl
    }
}

/// Owns every in-progress selection, keyed by estimate id.
///
/// Estimates untouched for `idle_ttl` are dropped, and at most `capacity`
/// are kept; creating one past that evicts the least recently used.
pub struct EstimateSessions {
    sessions: Mutex<HashMap<Uuid, Session>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl EstimateSessions {
    pub fn new(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    /// Starts an empty estimate and returns its id.
    pub async fn create(&self) -> Uuid {
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle(self.idle_ttl));
        if sessions.len() < before {
            debug!("Dropped {} idle estimates", before - sessions.len());
        }

        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.touched)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            warn!("Estimate capacity {} reached, evicted {}", self.capacity, oldest);
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            Session {
                store: SelectionStore::new(),
                touched: Instant::now(),
            },
        );
        id
    }

    /// A copy of the estimate's current selection. Counts as a touch.
    pub async fn get(&self, id: Uuid) -> Option<SelectionStore> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live(&mut sessions, id)?;
        Some(session.store.clone())
    }

    /// Applies one command and returns the resulting selection.
    pub async fn apply(&self, id: Uuid, command: SelectionCommand) -> Option<SelectionStore> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live(&mut sessions, id)?;
        session.store.apply(command);
        Some(session.store.clone())
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Looks up a session and refreshes its timestamp; an idle one is removed instead.
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Session>,
        id: Uuid,
    ) -> Option<&'a mut Session> {
        if sessions.get(&id)?.is_idle(self.idle_ttl) {
            sessions.remove(&id);
            return None;
        }
        let session = sessions.get_mut(&id)?;
        session.touched = Instant::now();
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protolab_core::domain::ItemClass;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn estimates_are_isolated_from_each_other() {
        let sessions = EstimateSessions::new(HOUR, 10);
        let a = sessions.create().await;
        let b = sessions.create().await;

        let toggle = SelectionCommand::Toggle {
            class: ItemClass::Sensor,
            item_id: "dht22".into(),
        };
        let after = sessions.apply(a, toggle).await.unwrap();
        assert!(after.is_selected(ItemClass::Sensor, "dht22"));
        assert!(sessions.get(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_estimate_is_none() {
        let sessions = EstimateSessions::new(HOUR, 10);
        assert!(sessions.get(Uuid::new_v4()).await.is_none());
        assert!(sessions
            .apply(Uuid::new_v4(), SelectionCommand::Reset)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn idle_estimates_are_swept_on_create() {
        let sessions = EstimateSessions::new(Duration::ZERO, 10);
        let first = sessions.create().await;
        let second = sessions.create().await;

        assert_eq!(sessions.count().await, 1);
        assert!(sessions.get(first).await.is_none());
        // With a zero idle window even the newest one is gone on lookup.
        assert!(sessions.get(second).await.is_none());
        assert_eq!(sessions.count().await, 0);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let sessions = EstimateSessions::new(HOUR, 2);
        let a = sessions.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = sessions.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        sessions.get(a).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let c = sessions.create().await;
        assert_eq!(sessions.count().await, 2);
        assert!(sessions.get(b).await.is_none());
        assert!(sessions.get(a).await.is_some());
        assert!(sessions.get(c).await.is_some());
    }

    #[tokio::test]
    async fn many_creates_stay_within_capacity() {
        let sessions = EstimateSessions::new(HOUR, 3);
        for _ in 0..50 {
            sessions.create().await;
        }
        assert_eq!(sessions.count().await, 3);
    }
}
