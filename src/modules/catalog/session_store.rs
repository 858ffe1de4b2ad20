//! Server-held search sessions, bounded by idle time and count.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use bookworm_kernel::settings::CatalogSettings;

use super::session::SearchSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle_ttl: Duration,
    pub max_sessions: usize,
}

impl From<&CatalogSettings> for SessionLimits {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            idle_ttl: Duration::from_secs(settings.session_idle_ttl_secs),
            max_sessions: settings.max_sessions.max(1),
        }
    }
}

struct OpenSession {
    session: Arc<SearchSession>,
    last_used: Instant,
}

/// Open sessions keyed by id.
///
/// Lookups refresh a session's idle clock. Opening a session first drops expired
/// ones, then the least recently used while the store is full.
pub struct SessionStore {
    sessions: DashMap<Uuid, OpenSession>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            sessions: DashMap::new(),
            limits,
        }
    }

    pub fn open(&self, session: SearchSession) -> (Uuid, Arc<SearchSession>) {
        let now = Instant::now();
        let expired = self.evict_expired(now);
        let mut evicted = 0;
        while self.sessions.len() >= self.limits.max_sessions && self.evict_least_recent() {
            evicted += 1;
        }
        if expired + evicted > 0 {
            tracing::debug!(
                target: "bookworm.catalog",
                expired,
                evicted,
                "dropped search sessions"
            );
        }

        let id = Uuid::now_v7();
        let session = Arc::new(session);
        self.sessions.insert(
            id,
            OpenSession {
                session: session.clone(),
                last_used: now,
            },
        );
        (id, session)
    }

    /// The session for `id`, unless it is unknown or has been idle too long.
    pub fn get(&self, id: &Uuid) -> Option<Arc<SearchSession>> {
        let now = Instant::now();
        if self
            .sessions
            .remove_if(id, |_, open| self.is_expired(open, now))
            .is_some()
        {
            tracing::debug!(target: "bookworm.catalog", session_id = %id, "search session expired");
            return None;
        }

        let mut open = self.sessions.get_mut(id)?;
        open.last_used = now;
        Some(open.session.clone())
    }

    pub fn close(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every session; returns how many were open.
    pub fn clear(&self) -> usize {
        let open = self.sessions.len();
        self.sessions.clear();
        open
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, open: &OpenSession, now: Instant) -> bool {
        now.saturating_duration_since(open.last_used) > self.limits.idle_ttl
    }

    fn evict_expired(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, open| !self.is_expired(open, now));
        before.saturating_sub(self.sessions.len())
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| *entry.key());
        match oldest {
            Some(id) => self.sessions.remove(&id).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::search::testing::ScriptedClient;
    use crate::modules::catalog::search::Catalog;

    fn new_session() -> SearchSession {
        SearchSession::new(Catalog::new(Arc::new(ScriptedClient::default()), 2))
    }

    fn store(idle_ttl: Duration, max_sessions: usize) -> SessionStore {
        SessionStore::new(SessionLimits {
            idle_ttl,
            max_sessions,
        })
    }

    #[test]
    fn full_store_drops_least_recently_used() {
        let store = store(Duration::from_secs(60), 2);
        let (first, _) = store.open(new_session());
        std::thread::sleep(Duration::from_millis(2));
        let (second, _) = store.open(new_session());
        std::thread::sleep(Duration::from_millis(2));

        assert!(store.get(&first).is_some());
        let (third, _) = store.open(new_session());

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_some());
        assert!(store.get(&second).is_none());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = store(Duration::from_millis(20), 10);
        let (id, _) = store.open(new_session());
        assert!(store.get(&id).is_some());

        std::thread::sleep(Duration::from_millis(50));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn opening_sweeps_expired_sessions() {
        let store = store(Duration::from_millis(20), 10);
        store.open(new_session());
        store.open(new_session());

        std::thread::sleep(Duration::from_millis(50));
        store.open(new_session());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn close_and_clear() {
        let store = store(Duration::from_secs(60), 10);
        let (id, _) = store.open(new_session());
        store.open(new_session());

        assert!(store.close(&id));
        assert!(!store.close(&id));
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
    }
}
