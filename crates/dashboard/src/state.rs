use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use engine::{ColumnMap, EventTable};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(config.sessions.max_sessions));
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    pub fn session(&self, id: Uuid) -> ApiResult<Arc<Session>> {
        self.sessions.get(id).ok_or(ApiError::SessionNotFound(id))
    }
}

/// One uploaded log and its column bindings.
///
/// The table is immutable for the session's lifetime; the column map can
/// be re-bound by an explicit user confirmation, so it sits behind a lock.
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub table: EventTable,
    columns: RwLock<ColumnMap>,
}

impl Session {
    pub fn column_map(&self) -> ColumnMap {
        self.columns.read().clone()
    }

    pub fn set_column_map(&self, map: ColumnMap) {
        *self.columns.write() = map;
    }
}

/// Bounded in-memory session store keyed by upload id.
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Session>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            // A zero capacity would make insertion impossible.
            capacity: capacity.max(1),
        }
    }

    /// Register a freshly parsed log. At capacity, the oldest upload is
    /// evicted first.
    pub fn insert(&self, file_name: String, table: EventTable, columns: ColumnMap) -> Arc<Session> {
        while self.sessions.len() >= self.capacity {
            self.evict_oldest();
        }

        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            file_name,
            uploaded_at: Utc::now(),
            table,
            columns: RwLock::new(columns),
        });
        self.sessions.insert(session.id, session.clone());
        debug!(session = %session.id, total = self.sessions.len(), "session created");
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().uploaded_at)
            .map(|entry| *entry.key());
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            debug!(session = %id, "evicted oldest session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EventTable {
        EventTable::new(vec!["case".into(), "activity".into()]).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new(4);
        let session = store.insert("a.csv".into(), table(), ColumnMap::default());
        assert_eq!(store.count(), 1);
        let fetched = store.get(session.id).unwrap();
        assert_eq!(fetched.file_name, "a.csv");
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(4);
        let session = store.insert("a.csv".into(), table(), ColumnMap::default());
        assert!(store.remove(session.id));
        assert!(!store.remove(session.id));
        assert!(store.get(session.id).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = SessionStore::new(2);
        let first = store.insert("first.csv".into(), table(), ColumnMap::default());
        let second = store.insert("second.csv".into(), table(), ColumnMap::default());
        let third = store.insert("third.csv".into(), table(), ColumnMap::default());

        assert_eq!(store.count(), 2);
        assert!(store.get(first.id).is_none());
        assert!(store.get(second.id).is_some());
        assert!(store.get(third.id).is_some());
    }

    #[test]
    fn test_column_map_rebinding() {
        let store = SessionStore::new(2);
        let session = store.insert("a.csv".into(), table(), ColumnMap::default());
        assert!(!session.column_map().has_essential());

        session.set_column_map(ColumnMap {
            case_id: Some("case".into()),
            activity: Some("activity".into()),
            ..Default::default()
        });
        assert!(session.column_map().has_essential());
    }
}
